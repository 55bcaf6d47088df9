use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use macros::route;
use sqlx::{QueryBuilder, Sqlite};

use crate::{
	extract::{Json, Path, Query, Session},
	openapi::tag,
	route::model::IdInput,
	Database,
};

use super::{model, Error, RouteError};

/// List tags
/// Lists the tags owned by the authenticated user, ordered by name.
#[route(tag = tag::TAG)]
pub async fn list_tags(
	State(database): State<Database>,
	session: Session,
	Query(filter): Query<model::TagFilter>,
) -> Result<Json<Vec<model::Tag>>, RouteError> {
	let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM tag WHERE user_id = ");
	query.push_bind(session.user.id);

	if filter.assigned_only {
		query.push(" AND EXISTS (SELECT 1 FROM post_tag WHERE post_tag.tag_id = tag.id)");
	}

	query.push(" ORDER BY name");

	let tags = query
		.build_query_as::<model::Tag>()
		.fetch_all(&database)
		.await?;

	Ok(Json(tags))
}

/// Get tag
/// Gets a tag owned by the authenticated user by id.
#[route(tag = tag::TAG)]
pub async fn get_tag(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<IdInput>,
) -> Result<Json<model::Tag>, RouteError> {
	let tag = sqlx::query_as::<_, model::Tag>("SELECT * FROM tag WHERE id = ? AND user_id = ?")
		.bind(path.id)
		.bind(session.user.id)
		.fetch_optional(&database)
		.await?;

	Ok(Json(tag.ok_or(Error::UnknownTag(path.id))?))
}

/// Update tag
/// Renames a tag owned by the authenticated user. Every post carrying the tag sees the new name.
#[route(tag = tag::TAG)]
pub async fn update_tag(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<IdInput>,
	Json(input): Json<model::UpdateTagInput>,
) -> Result<Json<model::Tag>, RouteError> {
	input.reject_read_only()?;

	let tag = sqlx::query_as::<_, model::Tag>(
		r#"
			UPDATE tag SET name = COALESCE(?, name)
			WHERE id = ? AND user_id = ?
			RETURNING *
		"#,
	)
	.bind(input.name.as_deref())
	.bind(path.id)
	.bind(session.user.id)
	.fetch_optional(&database)
	.await
	.map_err(|error| match error {
		sqlx::Error::Database(ref database) if database.is_unique_violation() => {
			Error::NameTaken(input.name.clone().unwrap_or_default()).into()
		}
		error => RouteError::from(error),
	})?;

	Ok(Json(tag.ok_or(Error::UnknownTag(path.id))?))
}

/// Delete tag
/// Deletes a tag owned by the authenticated user and detaches it from every post.
#[route(tag = tag::TAG, response(status = 204, description = "Tag deleted."))]
pub async fn delete_tag(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<IdInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let status = sqlx::query("DELETE FROM tag WHERE id = ? AND user_id = ?")
		.bind(path.id)
		.bind(session.user.id)
		.execute(&database)
		.await?;

	if status.rows_affected() == 0 {
		return Err(Error::UnknownTag(path.id).into());
	}

	Ok(StatusCode::NO_CONTENT.into_response())
}
