use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor};
use uuid::Uuid;

use crate::route::tag::{
	model::{CreateTagInput, Tag},
	store,
};

use super::model::Post;

#[derive(sqlx::FromRow)]
struct PostTag {
	post_id: Uuid,
	#[sqlx(flatten)]
	tag: Tag,
}

/// Fetches a post by id, only if it is owned by `user_id`. Tags are not loaded.
pub async fn fetch_owned<'e, E>(
	executor: E,
	post_id: Uuid,
	user_id: Uuid,
) -> Result<Option<Post>, sqlx::Error>
where
	E: SqliteExecutor<'e>,
{
	sqlx::query_as::<_, Post>("SELECT * FROM post WHERE id = ? AND user_id = ?")
		.bind(post_id)
		.bind(user_id)
		.fetch_optional(executor)
		.await
}

/// Fills in the tags of every post with a single query.
pub async fn load_tags<'e, E>(executor: E, posts: &mut [Post]) -> Result<(), sqlx::Error>
where
	E: SqliteExecutor<'e>,
{
	if posts.is_empty() {
		return Ok(());
	}

	let mut query = QueryBuilder::<Sqlite>::new(
		"SELECT post_tag.post_id, tag.* FROM tag INNER JOIN post_tag ON post_tag.tag_id = tag.id WHERE post_tag.post_id IN (",
	);

	let mut separated = query.separated(", ");
	for post in posts.iter() {
		separated.push_bind(post.id);
	}
	separated.push_unseparated(") ORDER BY tag.name");

	let rows = query.build_query_as::<PostTag>().fetch_all(executor).await?;

	let mut tags = HashMap::<Uuid, Vec<Tag>>::new();
	for row in rows {
		tags.entry(row.post_id).or_default().push(row.tag);
	}

	for post in posts {
		post.tags = tags.remove(&post.id).unwrap_or_default();
	}

	Ok(())
}

/// Replaces the tags of a post with the resolved `inputs`, creating missing tags
/// for the post's owner.
pub async fn set_tags(
	conn: &mut SqliteConnection,
	post: &mut Post,
	inputs: &[CreateTagInput],
) -> Result<(), sqlx::Error> {
	sqlx::query("DELETE FROM post_tag WHERE post_id = ?")
		.bind(post.id)
		.execute(&mut *conn)
		.await?;

	let names = inputs
		.iter()
		.map(|input| input.name.as_str())
		.collect::<Vec<_>>();

	let mut tags = store::get_or_create_all(&mut *conn, post.user_id, &names).await?;

	for tag in &tags {
		sqlx::query("INSERT INTO post_tag (post_id, tag_id) VALUES (?, ?)")
			.bind(post.id)
			.bind(tag.id)
			.execute(&mut *conn)
			.await?;
	}

	tags.sort_by(|a, b| a.name.cmp(&b.name));
	post.tags = tags;

	Ok(())
}
