use argon2::Argon2;
use chrono::Utc;
use uuid::Uuid;

use crate::Database;

use super::{model, Error, RouteError};

pub const KEY_LENGTH: usize = 32;

/// The fields needed to create a user.
#[derive(Debug, Default)]
pub struct NewUser<'a> {
	pub email: &'a str,
	pub password: &'a str,
	pub name: &'a str,
	pub is_staff: bool,
	pub is_superuser: bool,
}

/// Lower-cases the domain part of an email address.
///
/// The local part is left alone since it may be case-sensitive.
pub fn normalize_email(email: &str) -> String {
	let email = email.trim();

	match email.rsplit_once('@') {
		Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
		None => email.to_owned(),
	}
}

/// Hashes a password with Argon2, using the user's id as a salt.
pub fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Maps a unique violation on `user.email` to [`Error::EmailTaken`].
pub(super) fn email_taken(error: sqlx::Error) -> RouteError {
	match error {
		sqlx::Error::Database(ref database) if database.is_unique_violation() => {
			Error::EmailTaken.into()
		}
		error => error.into(),
	}
}

/// Creates, saves and returns a new active user.
///
/// The email must not be empty and is normalized with [`normalize_email`].
pub async fn create_user(
	database: &Database,
	hasher: &Argon2<'_>,
	user: NewUser<'_>,
) -> Result<model::User, RouteError> {
	if user.email.trim().is_empty() {
		return Err(Error::MissingEmail.into());
	}

	let id = Uuid::new_v4();
	let hashed = hash_password(hasher, user.password, &id).map_err(Error::Argon)?;

	let user = sqlx::query_as::<_, model::User>(
		r#"
			INSERT INTO "user" (id, email, name, password, is_active, is_staff, is_superuser, created_at)
			VALUES (?, ?, ?, ?, TRUE, ?, ?, ?)
			RETURNING *
		"#,
	)
	.bind(id)
	.bind(normalize_email(user.email))
	.bind(user.name)
	.bind(&hashed[..])
	.bind(user.is_staff)
	.bind(user.is_superuser)
	.bind(Utc::now())
	.fetch_one(database)
	.await
	.map_err(email_taken)?;

	tracing::info!(user = %user.id, "created user");

	Ok(user)
}

/// Creates a user with the staff and superuser flags set.
pub async fn create_superuser(
	database: &Database,
	hasher: &Argon2<'_>,
	email: &str,
	password: &str,
) -> Result<model::User, RouteError> {
	create_user(
		database,
		hasher,
		NewUser {
			email,
			password,
			is_staff: true,
			is_superuser: true,
			..Default::default()
		},
	)
	.await
}

#[cfg(test)]
mod test {
	use crate::{error, route::user::Error, test::*};

	use super::{create_superuser, create_user, normalize_email, NewUser};

	#[test]
	fn test_normalize_email() {
		let samples = [
			("test1@EXAMPLE.com", "test1@example.com"),
			("Test2@Example.com", "Test2@example.com"),
			("TEST3@EXAMPLE.com", "TEST3@example.com"),
			("test4@example.COM", "test4@example.com"),
		];

		for (email, expected) in samples {
			assert_eq!(normalize_email(email), expected);
		}
	}

	#[sqlx::test]
	async fn test_create_user_with_email(pool: Database) {
		let user = create_user(
			&pool,
			&hasher(),
			NewUser {
				email: "test@EXAMPLE.com",
				password: "testpass123",
				..Default::default()
			},
		)
		.await
		.unwrap();

		assert_eq!(user.email, "test@example.com");
		assert!(user.is_active);
		assert!(!user.is_staff);
		assert!(!user.is_superuser);
		assert_ne!(user.password, b"testpass123");
	}

	#[sqlx::test]
	async fn test_create_user_without_email_fails(pool: Database) {
		let result = create_user(
			&pool,
			&hasher(),
			NewUser {
				email: "",
				password: "test123",
				..Default::default()
			},
		)
		.await;

		assert!(matches!(
			result,
			Err(error::RouteError::Route(Error::MissingEmail))
		));
	}

	#[sqlx::test]
	async fn test_create_user_duplicate_email(pool: Database) {
		let user = NewUser {
			email: "dup@example.com",
			password: "testpass123",
			..Default::default()
		};

		create_user(&pool, &hasher(), user).await.unwrap();

		let result = create_user(
			&pool,
			&hasher(),
			NewUser {
				email: "dup@EXAMPLE.COM",
				password: "testpass123",
				..Default::default()
			},
		)
		.await;

		assert!(matches!(
			result,
			Err(error::RouteError::Route(Error::EmailTaken))
		));
	}

	#[sqlx::test]
	async fn test_create_superuser(pool: Database) {
		let user = create_superuser(&pool, &hasher(), "admin@example.com", "test123")
			.await
			.unwrap();

		assert!(user.is_staff);
		assert!(user.is_superuser);
	}
}
