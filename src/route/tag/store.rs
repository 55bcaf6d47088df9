use sqlx::SqliteConnection;
use uuid::Uuid;

use super::model::Tag;

/// Returns the caller's tag with this name, creating it first if needed.
///
/// The `(user_id, name)` unique index turns concurrent creations of the same
/// tag into a single row.
pub async fn get_or_create(
	conn: &mut SqliteConnection,
	user_id: Uuid,
	name: &str,
) -> Result<Tag, sqlx::Error> {
	sqlx::query_as::<_, Tag>(
		r#"
			INSERT INTO tag (id, user_id, name) VALUES (?, ?, ?)
			ON CONFLICT (user_id, name) DO UPDATE SET name = excluded.name
			RETURNING *
		"#,
	)
	.bind(Uuid::new_v4())
	.bind(user_id)
	.bind(name)
	.fetch_one(conn)
	.await
}

/// Resolves every name with [`get_or_create`], keeping the first occurrence of
/// repeated names.
pub async fn get_or_create_all(
	conn: &mut SqliteConnection,
	user_id: Uuid,
	names: &[&str],
) -> Result<Vec<Tag>, sqlx::Error> {
	let mut tags: Vec<Tag> = Vec::new();

	for &name in names {
		if tags.iter().any(|tag| tag.name == name) {
			continue;
		}

		tags.push(get_or_create(&mut *conn, user_id, name).await?);
	}

	Ok(tags)
}
