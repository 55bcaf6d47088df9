use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod route;
pub mod store;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	#[error("tag_not_found")]
	UnknownTag(Uuid),
	#[error("tag_exists")]
	NameTaken(String),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/tags", get_with(list_tags, list_tags_docs))
		.api_route(
			"/tags/:id",
			get_with(get_tag, get_tag_docs)
				.patch_with(update_tag, update_tag_docs)
				.delete_with(delete_tag, delete_tag_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownTag(..) => StatusCode::NOT_FOUND,
			Self::NameTaken(..) => StatusCode::BAD_REQUEST,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		let message = error::Message::new(self.to_string());

		match self {
			Self::UnknownTag(tag) => message
				.content("The tag you provided does not exist.")
				.detail("tag", tag.to_string())
				.into_vec(),
			Self::NameTaken(name) => message
				.content("You already have a tag with this name.")
				.field("name")
				.detail("name", name)
				.into_vec(),
		}
	}
}
