mod image;
mod session;

pub use image::ImageUpload;
pub use session::Session;

use aide::OperationIo;
use axum::{
	body::Body,
	extract::{FromRequest, FromRequestParts, Request},
	http::{request, Response},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::de;
use validator::Validate;

use crate::error::AppError;

fn validated<T: Validate>(value: T) -> Result<T, AppError> {
	value.validate()?;
	Ok(value)
}

/// A JSON request body that has passed both its JSON schema and its
/// `validator` rules, or a JSON response body.
///
/// Schema failures answer with the `axum_jsonschema` rejection, rule failures
/// with one `400` message per failing field:
///
/// ```ignore
/// async fn create_post(Json(input): Json<CreatePostInput>) -> Json<Post> {
///     // `input.title` is already known to be non-empty here.
/// }
/// ```
#[derive(OperationIo)]
#[aide(
	input_with = "axum_jsonschema::Json<T>",
	output_with = "axum_jsonschema::Json<T>",
	json_schema
)]
pub struct Json<T>(pub T);

impl<T> IntoResponse for Json<T>
where
	T: serde::Serialize,
{
	fn into_response(self) -> Response<Body> {
		axum::extract::Json(self.0).into_response()
	}
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
	T: de::DeserializeOwned + Validate + JsonSchema + 'static,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let axum_jsonschema::Json(body) = axum_jsonschema::Json::<T>::from_request(req, state).await?;

		validated(body).map(Self)
	}
}

/// Validated query string, such as the `page`, `size` and `tags` filters of
/// the post list.
#[derive(OperationIo)]
#[aide(
	input_with = "axum::extract::Query<T>",
	output_with = "axum_jsonschema::Json<T>",
	json_schema
)]
pub struct Query<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Query<T>
where
	T: de::DeserializeOwned + Validate,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let axum::extract::Query(query) =
			axum::extract::Query::<T>::from_request_parts(parts, state).await?;

		validated(query).map(Self)
	}
}

/// Validated path parameters. A malformed id is a `400 invalid_path`.
#[derive(OperationIo)]
#[aide(
	input_with = "axum::extract::Path<T>",
	output_with = "axum_jsonschema::Json<T>",
	json_schema
)]
pub struct Path<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
	T: de::DeserializeOwned + Validate + Send,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let axum::extract::Path(path) =
			axum::extract::Path::<T>::from_request_parts(parts, state).await?;

		validated(path).map(Self)
	}
}

#[cfg(test)]
mod test {
	use axum::{extract::FromRequestParts, http::Request};

	use super::Query;
	use crate::{error::AppError, route::post::model::PostFilter};

	async fn filter(uri: &str) -> Result<PostFilter, AppError> {
		let (mut parts, _) = Request::get(uri).body(()).unwrap().into_parts();

		Query::<PostFilter>::from_request_parts(&mut parts, &())
			.await
			.map(|Query(filter)| filter)
	}

	#[tokio::test]
	async fn test_query_applies_defaults() {
		let filter = filter("/api/post/post").await.unwrap();

		assert_eq!(filter.page, 1);
		assert!(filter.tags.is_none());
	}

	#[tokio::test]
	async fn test_query_rejects_failed_rule() {
		let error = filter("/api/post/post?page=0").await.unwrap_err();

		assert!(matches!(error, AppError::Validation(..)));
	}

	#[tokio::test]
	async fn test_query_rejects_wrong_type() {
		let error = filter("/api/post/post?size=many").await.unwrap_err();

		assert!(matches!(error, AppError::Query(..)));
	}
}
