use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod route;
pub mod store;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	#[error("post_not_found")]
	UnknownPost(Uuid),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/post",
			get_with(list_posts, list_posts_docs).post_with(create_post, create_post_docs),
		)
		.api_route(
			"/post/:id",
			get_with(get_post, get_post_docs)
				.put_with(replace_post, replace_post_docs)
				.patch_with(update_post, update_post_docs)
				.delete_with(delete_post, delete_post_docs),
		)
		.api_route(
			"/post/:id/upload-image",
			post_with(upload_image, upload_image_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		let message = match self {
			Self::UnknownPost(..) => "The post you provided does not exist.",
		};

		let message = error::Message::new(self.to_string()).content(message);
		let Self::UnknownPost(post) = self;

		message.detail("post", post.to_string()).into_vec()
	}
}
