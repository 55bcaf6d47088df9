use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod account;
pub mod model;
pub mod route;

/// An error that can occur during authentication or account management.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid email or password")]
	InvalidCredentials,
	#[error("password hashing error")]
	Argon(#[from] argon2::Error),
	#[error("no authorization token")]
	MissingToken,
	#[error("invalid authorization token")]
	InvalidToken,
	#[error("user inactive or deleted")]
	InactiveUser,
	#[error("users must have an email address")]
	MissingEmail,
	#[error("email already taken")]
	EmailTaken,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/create", post_with(create_user, create_user_docs))
		.api_route(
			"/token",
			post_with(create_token, create_token_docs).delete_with(delete_token, delete_token_docs),
		)
		.api_route(
			"/me",
			get_with(get_me, get_me_docs)
				.put_with(replace_me, replace_me_docs)
				.patch_with(update_me, update_me_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidCredentials
			| Self::MissingToken
			| Self::InvalidToken
			| Self::InactiveUser => StatusCode::UNAUTHORIZED,
			Self::Argon(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::MissingEmail | Self::EmailTaken => StatusCode::BAD_REQUEST,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		let code = match self {
			Self::InvalidCredentials => "invalid_credentials",
			Self::Argon(ref error) => {
				tracing::error!(%error, "failed to hash password");
				return error::Message::new("internal").into_vec();
			}
			Self::MissingToken => "not_authenticated",
			Self::InvalidToken => "invalid_token",
			Self::InactiveUser => "inactive_user",
			Self::MissingEmail => "required",
			Self::EmailTaken => "unique",
		};

		let message = error::Message::new(code).content(self.to_string());

		match self {
			Self::MissingEmail | Self::EmailTaken => message.field("email").into_vec(),
			_ => message.into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	async fn test_signup_flow(pool: Database) {
		let app = app(pool);

		let response = app
			.post("/api/user/create")
			.json(&json!({
				"email": "John@EXAMPLE.com",
				"name": "John",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let user = response.json::<Value>();

		assert_eq!(user["email"], "John@example.com");
		assert_eq!(user["name"], "John");
		assert!(user.get("password").is_none());

		let response = app
			.post("/api/user/token")
			.json(&json!({
				"email": "John@EXAMPLE.com",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let token = response.json::<Value>()["token"]
			.as_str()
			.unwrap()
			.to_owned();

		let response = app
			.get("/api/user/me")
			.add_header(AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["name"], "John");
	}

	#[sqlx::test]
	async fn test_signup_rejects_invalid_email(pool: Database) {
		let app = app(pool);

		let response = app
			.post("/api/user/create")
			.json(&json!({
				"email": "",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[sqlx::test]
	async fn test_token_wrong_password(pool: Database) {
		let app = app(pool);

		authorize(&app, "user@example.com").await;

		let response = app
			.post("/api/user/token")
			.json(&json!({
				"email": "user@example.com",
				"password": "not-the-password",
			}))
			.await;

		assert_eq!(response.status_code(), 401);
	}

	#[sqlx::test]
	async fn test_me_requires_token(pool: Database) {
		let app = app(pool);

		let response = app.get("/api/user/me").await;

		assert_eq!(response.status_code(), 401);

		let response = app
			.get("/api/user/me")
			.add_header(AUTHORIZATION, bearer(&uuid::Uuid::new_v4().to_string()))
			.await;

		assert_eq!(response.status_code(), 401);
	}

	#[sqlx::test]
	async fn test_update_me(pool: Database) {
		let app = app(pool);
		let token = authorize(&app, "user@example.com").await;

		let response = app
			.patch("/api/user/me")
			.add_header(AUTHORIZATION, token.clone())
			.json(&json!({ "name": "Renamed", "password": "a-new-password" }))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["name"], "Renamed");

		let response = app
			.post("/api/user/token")
			.json(&json!({
				"email": "user@example.com",
				"password": "a-new-password",
			}))
			.await;

		assert_eq!(response.status_code(), 200);
	}

	#[sqlx::test]
	async fn test_revoked_token_is_rejected(pool: Database) {
		let app = app(pool);
		let token = authorize(&app, "user@example.com").await;

		let response = app
			.delete("/api/user/token")
			.add_header(AUTHORIZATION, token.clone())
			.await;

		assert_eq!(response.status_code(), 204);

		let response = app
			.get("/api/user/me")
			.add_header(AUTHORIZATION, token)
			.await;

		assert_eq!(response.status_code(), 401);
	}

	#[sqlx::test]
	async fn test_inactive_user_is_rejected(pool: Database) {
		let app = app(pool.clone());
		let token = authorize(&app, "user@example.com").await;

		sqlx::query(r#"UPDATE "user" SET is_active = FALSE"#)
			.execute(&pool)
			.await
			.unwrap();

		let response = app
			.get("/api/user/me")
			.add_header(AUTHORIZATION, token)
			.await;

		assert_eq!(response.status_code(), 401);
	}

	#[sqlx::test]
	async fn test_deleting_user_removes_owned_rows(pool: Database) {
		let app = app(pool.clone());
		let token = authorize(&app, "user@example.com").await;

		let response = app
			.post("/api/post/post")
			.add_header(AUTHORIZATION, token)
			.json(&json!({ "title": "Curry", "content": "", "tags": [{ "name": "Thai" }] }))
			.await;

		assert_eq!(response.status_code(), 200);

		sqlx::query(r#"DELETE FROM "user""#)
			.execute(&pool)
			.await
			.unwrap();

		for table in ["token", "post", "tag", "post_tag"] {
			let count = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
				.fetch_one(&pool)
				.await
				.unwrap();

			assert_eq!(count, 0, "{table} still has rows");
		}
	}
}
