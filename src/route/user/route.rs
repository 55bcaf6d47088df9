use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Session},
	openapi::tag,
	AppState, Database,
};

use super::{
	account::{self, email_taken, hash_password, normalize_email, NewUser},
	model, Error, RouteError,
};

/// Create user
/// Registers a new account. Use `POST /api/user/token` afterwards to authenticate.
#[route(tag = tag::USER)]
pub async fn create_user(
	State(state): State<AppState>,
	Json(input): Json<model::CreateUserInput>,
) -> Result<Json<model::User>, RouteError> {
	let user = account::create_user(
		&state.database,
		&state.hasher,
		NewUser {
			email: &input.email,
			password: &input.password,
			name: &input.name,
			..Default::default()
		},
	)
	.await?;

	Ok(Json(user))
}

/// Create token
/// Exchanges an email and password for an authentication token.
#[route(tag = tag::USER)]
pub async fn create_token(
	State(state): State<AppState>,
	Json(input): Json<model::TokenInput>,
) -> Result<Json<model::Token>, RouteError> {
	let user = sqlx::query_as::<_, model::User>(r#"SELECT * FROM "user" WHERE email = ?"#)
		.bind(normalize_email(&input.email))
		.fetch_optional(&state.database)
		.await?;

	let Some(user) = user else {
		return Err(Error::InvalidCredentials.into());
	};

	let hashed = hash_password(&state.hasher, &input.password, &user.id).map_err(Error::Argon)?;

	if user.password != hashed {
		return Err(Error::InvalidCredentials.into());
	}

	if !user.is_active {
		return Err(Error::InactiveUser.into());
	}

	let token = sqlx::query_as::<_, model::Token>(
		r#"
			INSERT INTO token (id, user_id, created_at) VALUES (?, ?, ?)
			RETURNING *
		"#,
	)
	.bind(Uuid::new_v4())
	.bind(user.id)
	.bind(Utc::now())
	.fetch_one(&state.database)
	.await?;

	Ok(Json(token))
}

/// Delete token
/// Revokes the token used to authenticate this request.
#[route(tag = tag::USER, response(status = 204, description = "Token revoked."))]
pub async fn delete_token(
	State(database): State<Database>,
	session: Session,
) -> Result<impl IntoApiResponse, RouteError> {
	sqlx::query("DELETE FROM token WHERE id = ?")
		.bind(session.token)
		.execute(&database)
		.await?;

	Ok(StatusCode::NO_CONTENT.into_response())
}

/// Get user
/// Returns the authenticated user.
#[route(tag = tag::USER)]
pub async fn get_me(session: Session) -> Json<model::User> {
	Json(session.user)
}

/// Replace user
/// Replaces the email, name and password of the authenticated user.
#[route(tag = tag::USER)]
pub async fn replace_me(
	State(state): State<AppState>,
	session: Session,
	Json(input): Json<model::CreateUserInput>,
) -> Result<Json<model::User>, RouteError> {
	save_me(&state, &session, input.into()).await
}

/// Update user
/// Updates the given fields of the authenticated user. A new password is hashed before it is stored.
#[route(tag = tag::USER)]
pub async fn update_me(
	State(state): State<AppState>,
	session: Session,
	Json(input): Json<model::UpdateUserInput>,
) -> Result<Json<model::User>, RouteError> {
	save_me(&state, &session, input).await
}

async fn save_me(
	state: &AppState,
	session: &Session,
	input: model::UpdateUserInput,
) -> Result<Json<model::User>, RouteError> {
	let password = input
		.password
		.map(|password| hash_password(&state.hasher, &password, &session.user.id))
		.transpose()
		.map_err(Error::Argon)?;

	let user = sqlx::query_as::<_, model::User>(
		r#"
			UPDATE "user"
			SET email = COALESCE(?, email), name = COALESCE(?, name), password = COALESCE(?, password)
			WHERE id = ?
			RETURNING *
		"#,
	)
	.bind(input.email.as_deref().map(normalize_email))
	.bind(input.name)
	.bind(password.as_ref().map(|hash| &hash[..]))
	.bind(session.user.id)
	.fetch_one(&state.database)
	.await
	.map_err(email_taken)?;

	Ok(Json(user))
}
