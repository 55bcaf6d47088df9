use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A single user.
#[derive(Debug, Serialize, JsonSchema, sqlx::FromRow)]
pub struct User {
	/// The unique identifier of the user.
	pub id: Uuid,
	/// The user's email address, used for logging in.
	pub email: String,
	/// The name that is displayed to other people.
	pub name: String,
	/// The Argon2 hash of the password, salted with `id`.
	#[serde(skip)]
	pub password: Vec<u8>,
	/// Inactive users cannot authenticate.
	#[serde(skip)]
	pub is_active: bool,
	#[serde(skip)]
	pub is_staff: bool,
	#[serde(skip)]
	pub is_superuser: bool,
	/// The creation time of the user.
	pub created_at: chrono::DateTime<chrono::Utc>,
}

/// An authentication token, sent as `Authorization: Bearer <token>`.
#[derive(Debug, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Token {
	/// The token itself.
	#[serde(rename = "token")]
	pub id: Uuid,
	/// The user that owns the token.
	#[serde(skip)]
	#[allow(dead_code)]
	pub user_id: Uuid,
	/// The creation time of the token.
	pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct CreateUserInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
	/// The name that is displayed to other people.
	#[validate(length(max = 255))]
	#[serde(default)]
	pub name: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct UpdateUserInput {
	#[validate(email)]
	pub email: Option<String>,
	#[validate(length(min = 8, max = 128))]
	pub password: Option<String>,
	#[validate(length(max = 255))]
	pub name: Option<String>,
}

impl From<CreateUserInput> for UpdateUserInput {
	fn from(input: CreateUserInput) -> Self {
		Self {
			email: Some(input.email),
			password: Some(input.password),
			name: Some(input.name),
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct TokenInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 1, max = 128))]
	pub password: String,
}
