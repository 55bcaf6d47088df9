use std::str::FromStr;

use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};
use uuid::Uuid;

use crate::{error::RouteError, openapi::SECURITY_SCHEME_TOKEN, route::user, Database};

pub const BEARER_PREFIX: &str = "Bearer ";
/// Accepted for clients that still send the older `Token <key>` form.
pub const TOKEN_PREFIX: &str = "Token ";

/// The authenticated caller, resolved from the `Authorization` header.
///
/// If the header is missing, a [`user::Error::MissingToken`] is returned.
/// If the token is malformed or unknown, a [`user::Error::InvalidToken`] is returned.
/// If the owner has been deactivated, a [`user::Error::InactiveUser`] is returned.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub token: Uuid,
	pub user: user::model::User,
}

/// Strips the scheme from an `Authorization` header value.
fn parse_token(value: &str) -> Option<Uuid> {
	let token = value
		.strip_prefix(BEARER_PREFIX)
		.or_else(|| value.strip_prefix(TOKEN_PREFIX))?;

	Uuid::from_str(token.trim()).ok()
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<user::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let header = parts
			.headers
			.get(header::AUTHORIZATION)
			.ok_or(user::Error::MissingToken)?;

		let token = header
			.to_str()
			.ok()
			.and_then(parse_token)
			.ok_or(user::Error::InvalidToken)?;

		let database = Database::from_ref(state);
		let user = sqlx::query_as::<_, user::model::User>(
			r#"
				SELECT "user".* FROM "user"
				INNER JOIN token ON token.user_id = "user".id
				WHERE token.id = ?
			"#,
		)
		.bind(token)
		.fetch_optional(&database)
		.await?;

		let user = user.ok_or(user::Error::InvalidToken)?;

		if !user.is_active {
			return Err(user::Error::InactiveUser.into());
		}

		Ok(Self { token, user })
	}
}

impl OperationInput for Session {
	/// Operation input for the session extractor.
	///
	/// This adds a bearer token requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.push(
			[(SECURITY_SCHEME_TOKEN.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		);
	}
}

#[cfg(test)]
mod test {
	use uuid::Uuid;

	use super::parse_token;

	#[test]
	fn test_parse_token_schemes() {
		let id = Uuid::new_v4();

		assert_eq!(parse_token(&format!("Bearer {id}")), Some(id));
		assert_eq!(parse_token(&format!("Token {id}")), Some(id));
		assert_eq!(parse_token(&format!("Basic {id}")), None);
		assert_eq!(parse_token("Bearer not-a-uuid"), None);
		assert_eq!(parse_token(&id.to_string()), None);
	}
}
