use std::borrow::Cow;

use axum::{
	body::Body,
	extract::{
		multipart::{MultipartError, MultipartRejection},
		rejection,
	},
	http::{Response, StatusCode},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::Serialize;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::extract::Json;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message sent to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message<'a> {
	/// A machine-readable error code, such as `unknown_post`.
	pub code: Cow<'a, str>,
	/// A human-readable description of the error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub content: Option<Cow<'a, str>>,
	/// The request field the error refers to, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	/// Extra context, such as the id of a missing resource.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Map>,
}

impl<'a> Message<'a> {
	pub fn new(code: impl Into<Cow<'a, str>>) -> Self {
		Self {
			code: code.into(),
			content: None,
			field: None,
			details: None,
		}
	}

	#[must_use]
	pub fn content(mut self, content: impl Into<Cow<'a, str>>) -> Self {
		self.content = Some(content.into());
		self
	}

	#[must_use]
	pub fn field(mut self, field: impl Into<Cow<'a, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	#[must_use]
	pub fn detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.details
			.get_or_insert_with(Map::new)
			.insert(key.into(), value.into());
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

/// The body of every error response.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse {
	pub success: bool,
	pub errors: Vec<Message<'static>>,
}

impl ErrorResponse {
	pub fn new(errors: Vec<Message<'static>>) -> Self {
		Self {
			success: false,
			errors,
		}
	}
}

/// Describes how a route-specific error is presented to the client.
///
/// The messages are sent as-is, so they must not contain sensitive information.
pub trait ErrorShape {
	fn status(&self) -> StatusCode;

	fn into_errors(self) -> Vec<Message<'static>>;
}

/// Errors shared by every route.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] ValidationErrors),
	#[error("json error: {0:?}")]
	Json(axum_jsonschema::JsonSchemaRejection),
	#[error("query error: {0}")]
	Query(#[from] rejection::QueryRejection),
	#[error("path error: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("multipart rejection: {0}")]
	MultipartRejection(#[from] MultipartRejection),
	#[error("multipart error: {0}")]
	Multipart(#[from] MultipartError),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}

impl From<axum_jsonschema::JsonSchemaRejection> for AppError {
	fn from(rejection: axum_jsonschema::JsonSchemaRejection) -> Self {
		Self::Json(rejection)
	}
}

/// Flattens nested validation errors into one message per failing rule,
/// using `a.b[0].c` paths for the field name.
fn validation_messages(prefix: &str, errors: &ValidationErrors, out: &mut Vec<Message<'static>>) {
	for (field, kind) in errors.errors() {
		let path = if prefix.is_empty() {
			field.to_string()
		} else {
			format!("{prefix}.{field}")
		};

		match kind {
			ValidationErrorsKind::Field(errors) => {
				out.extend(errors.iter().map(|error| {
					let message = Message::new(error.code.clone()).field(path.clone());

					match error.message {
						Some(ref content) => message.content(content.clone()),
						None => message,
					}
				}));
			}
			ValidationErrorsKind::Struct(errors) => validation_messages(&path, errors, out),
			ValidationErrorsKind::List(list) => {
				for (index, errors) in list {
					validation_messages(&format!("{path}[{index}]"), errors, out);
				}
			}
		}
	}
}

fn respond(status: StatusCode, errors: Vec<Message<'static>>) -> Response<Body> {
	(status, Json(ErrorResponse::new(errors))).into_response()
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Validation(errors) => {
				let mut messages = Vec::new();

				validation_messages("", &errors, &mut messages);
				messages.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.code.cmp(&b.code)));

				respond(StatusCode::BAD_REQUEST, messages)
			}
			Self::Json(rejection) => rejection.into_response(),
			Self::Query(rejection) => respond(
				rejection.status(),
				Message::new("invalid_query")
					.content(rejection.body_text())
					.into_vec(),
			),
			Self::Path(rejection) => respond(
				rejection.status(),
				Message::new("invalid_path")
					.content(rejection.body_text())
					.into_vec(),
			),
			Self::MultipartRejection(rejection) => respond(
				rejection.status(),
				Message::new("invalid_multipart")
					.content(rejection.body_text())
					.into_vec(),
			),
			Self::Multipart(error) => respond(
				StatusCode::BAD_REQUEST,
				Message::new("invalid_multipart")
					.content(error.to_string())
					.into_vec(),
			),
			Self::Database(..) | Self::Io(..) => {
				tracing::error!(error = %self, "request failed");

				respond(StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
			}
		}
	}
}

/// The error returned by route handlers: either a route-specific error
/// or one of the shared [`AppError`]s.
#[derive(Debug)]
pub enum RouteError<E> {
	Route(E),
	App(AppError),
}

impl<E: std::fmt::Display> std::fmt::Display for RouteError<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Route(error) => std::fmt::Display::fmt(error, f),
			Self::App(error) => std::fmt::Display::fmt(error, f),
		}
	}
}

impl<E: std::error::Error + 'static> std::error::Error for RouteError<E> {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Route(error) => Some(error),
			Self::App(error) => Some(error),
		}
	}
}

impl<E: ErrorShape> From<E> for RouteError<E> {
	fn from(error: E) -> Self {
		Self::Route(error)
	}
}

impl<E> From<AppError> for RouteError<E> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

macro_rules! impl_from_app_error {
	($($ty:ty),* $(,)?) => {
		$(
			impl<E> From<$ty> for RouteError<E> {
				fn from(error: $ty) -> Self {
					Self::App(AppError::from(error))
				}
			}
		)*
	};
}

impl_from_app_error!(
	ValidationErrors,
	sqlx::Error,
	std::io::Error,
	MultipartError,
);

impl<E: ErrorShape> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Route(error) => {
				let status = error.status();

				respond(status, error.into_errors())
			}
			Self::App(error) => error.into_response(),
		}
	}
}

impl<E> aide::OperationOutput for RouteError<E> {
	type Inner = Self;
}

#[cfg(test)]
mod test {
	use validator::{ValidationError, ValidationErrors};

	use super::{validation_messages, Message};

	#[test]
	fn test_message_builder() {
		let message = Message::new("unknown_post")
			.content("The post does not exist.")
			.detail("post", "abc");

		let json = serde_json::to_value(&message).unwrap();

		assert_eq!(json["code"], "unknown_post");
		assert_eq!(json["content"], "The post does not exist.");
		assert_eq!(json["details"]["post"], "abc");
		assert!(json.get("field").is_none());
	}

	#[test]
	fn test_validation_messages_carry_field() {
		let mut errors = ValidationErrors::new();
		errors.add("user_id", ValidationError::new("read_only"));

		let mut messages = Vec::new();
		validation_messages("", &errors, &mut messages);

		assert_eq!(messages.len(), 1);
		assert_eq!(messages[0].code, "read_only");
		assert_eq!(messages[0].field.as_deref(), Some("user_id"));
	}
}
