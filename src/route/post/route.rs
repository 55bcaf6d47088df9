use std::slice;

use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use macros::route;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::{
	extract::{ImageUpload, Json, Path, Query, Session},
	openapi::tag,
	AppState, Database,
};

use super::{model, store, Error, RouteError};

/// List posts
/// Returns a paginated response of your posts, newest first.
#[route(tag = tag::POST)]
pub async fn list_posts(
	State(database): State<Database>,
	session: Session,
	Query(filter): Query<model::PostFilter>,
) -> Result<Json<Vec<model::Post>>, RouteError> {
	let tag_ids = filter.tag_ids()?;

	let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM post WHERE user_id = ");
	query.push_bind(session.user.id);

	if !tag_ids.is_empty() {
		query.push(" AND id IN (SELECT post_id FROM post_tag WHERE tag_id IN (");

		let mut separated = query.separated(", ");
		for id in tag_ids {
			separated.push_bind(id);
		}
		separated.push_unseparated("))");
	}

	query
		.push(" ORDER BY created_at DESC LIMIT ")
		.push_bind(filter.limit())
		.push(" OFFSET ")
		.push_bind(filter.offset());

	let mut posts = query
		.build_query_as::<model::Post>()
		.fetch_all(&database)
		.await?;

	store::load_tags(&database, &mut posts).await?;

	Ok(Json(posts))
}

/// Get post
/// Returns one of your posts by its unique id.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::IdInput>,
) -> Result<Json<model::Post>, RouteError> {
	let mut post = store::fetch_owned(&database, path.id, session.user.id)
		.await?
		.ok_or(Error::UnknownPost(path.id))?;

	store::load_tags(&database, slice::from_mut(&mut post)).await?;

	Ok(Json(post))
}

/// Create post
/// Creates a new post owned by you. Tags are matched by name and created when missing.
#[route(tag = tag::POST)]
pub async fn create_post(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::CreatePostInput>,
) -> Result<Json<model::Post>, RouteError> {
	input.reject_owner()?;

	let now = Utc::now();
	let mut tx = database.begin().await?;

	let mut post = sqlx::query_as::<_, model::Post>(
		r#"
			INSERT INTO post (id, user_id, title, content, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?)
			RETURNING *
		"#,
	)
	.bind(Uuid::new_v4())
	.bind(session.user.id)
	.bind(&input.title)
	.bind(&input.content)
	.bind(now)
	.bind(now)
	.fetch_one(&mut *tx)
	.await?;

	if let Some(ref tags) = input.tags {
		store::set_tags(&mut tx, &mut post, tags).await?;
	}

	tx.commit().await?;

	tracing::debug!(post = %post.id, user = %session.user.id, "created post");

	Ok(Json(post))
}

/// Replace post
/// Replaces the title and content of one of your posts. Tags are replaced only when given.
#[route(tag = tag::POST)]
pub async fn replace_post(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::IdInput>,
	Json(input): Json<model::CreatePostInput>,
) -> Result<Json<model::Post>, RouteError> {
	input.reject_owner()?;

	save_post(
		&database,
		&session,
		path.id,
		model::UpdatePostInput {
			user_id: None,
			title: Some(input.title),
			content: Some(input.content),
			tags: input.tags,
		},
	)
	.await
}

/// Update post
/// Updates the given fields of one of your posts. An empty `tags` list removes every tag,
/// while leaving `tags` out keeps them as they are.
#[route(tag = tag::POST)]
pub async fn update_post(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::IdInput>,
	Json(input): Json<model::UpdatePostInput>,
) -> Result<Json<model::Post>, RouteError> {
	input.reject_owner()?;

	save_post(&database, &session, path.id, input).await
}

async fn save_post(
	database: &Database,
	session: &Session,
	post_id: Uuid,
	input: model::UpdatePostInput,
) -> Result<Json<model::Post>, RouteError> {
	let mut tx = database.begin().await?;

	let post = sqlx::query_as::<_, model::Post>(
		r#"
			UPDATE post
			SET title = COALESCE(?, title), content = COALESCE(?, content), updated_at = ?
			WHERE id = ? AND user_id = ?
			RETURNING *
		"#,
	)
	.bind(input.title.as_deref())
	.bind(input.content.as_deref())
	.bind(Utc::now())
	.bind(post_id)
	.bind(session.user.id)
	.fetch_optional(&mut *tx)
	.await?;

	let mut post = post.ok_or(Error::UnknownPost(post_id))?;

	match input.tags {
		Some(ref tags) => store::set_tags(&mut tx, &mut post, tags).await?,
		None => store::load_tags(&mut *tx, slice::from_mut(&mut post)).await?,
	}

	tx.commit().await?;

	Ok(Json(post))
}

/// Delete post
/// Deletes one of your posts by its unique id, along with its uploaded image.
#[route(tag = tag::POST, response(status = 204, description = "Post deleted."))]
pub async fn delete_post(
	State(state): State<AppState>,
	session: Session,
	Path(path): Path<model::IdInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let image = sqlx::query_scalar::<_, Option<String>>(
		"DELETE FROM post WHERE id = ? AND user_id = ? RETURNING image",
	)
	.bind(path.id)
	.bind(session.user.id)
	.fetch_optional(&state.database)
	.await?;

	let Some(image) = image else {
		return Err(Error::UnknownPost(path.id).into());
	};

	if let Some(image) = image {
		state.media.remove(&image).await;
	}

	Ok(StatusCode::NO_CONTENT.into_response())
}

/// Upload image
/// Attaches an image to one of your posts, replacing the previous one. The file is sent
/// as `multipart/form-data` in the `image` field and must be a PNG, JPEG, GIF, WebP or BMP image.
#[route(tag = tag::POST)]
pub async fn upload_image(
	State(state): State<AppState>,
	session: Session,
	Path(path): Path<model::IdInput>,
	image: ImageUpload,
) -> Result<Json<model::Post>, RouteError> {
	let previous = store::fetch_owned(&state.database, path.id, session.user.id)
		.await?
		.ok_or(Error::UnknownPost(path.id))?;

	let stored = state.media.save_post_image(&image).await?;

	let post = sqlx::query_as::<_, model::Post>(
		r#"
			UPDATE post SET image = ?, updated_at = ?
			WHERE id = ? AND user_id = ?
			RETURNING *
		"#,
	)
	.bind(&stored)
	.bind(Utc::now())
	.bind(path.id)
	.bind(session.user.id)
	.fetch_optional(&state.database)
	.await;

	let mut post = match post {
		Ok(Some(post)) => post,
		// The post disappeared or the update failed, so the new file is orphaned.
		Ok(None) => {
			state.media.remove(&stored).await;
			return Err(Error::UnknownPost(path.id).into());
		}
		Err(error) => {
			state.media.remove(&stored).await;
			return Err(error.into());
		}
	};

	if let Some(ref image) = previous.image {
		state.media.remove(image).await;
	}

	store::load_tags(&state.database, slice::from_mut(&mut post)).await?;

	tracing::debug!(post = %post.id, image = %stored, "stored post image");

	Ok(Json(post))
}
