pub use axum::http::{header::AUTHORIZATION, HeaderValue};
pub use axum_test::TestServer;
pub use serde_json::{json, Value};

pub use crate::Database;

use std::ops::Deref;

use argon2::{Algorithm, Argon2, Params, Version};
use tempfile::TempDir;

use crate::{
	media::Media,
	route::user::{
		account::{self, NewUser},
		model::User,
	},
	State,
};

/// An Argon2 hasher with minimal cost, so tests stay fast.
pub fn hasher() -> Argon2<'static> {
	Argon2::new(
		Algorithm::Argon2id,
		Version::V0x13,
		Params::new(8, 1, 1, Some(account::KEY_LENGTH)).unwrap(),
	)
}

/// The full application behind a test server. Media is stored in a temporary
/// directory that is removed when the app is dropped.
pub struct TestApp {
	pub server: TestServer,
	pub media: Media,
	_media_dir: TempDir,
}

impl Deref for TestApp {
	type Target = TestServer;

	fn deref(&self) -> &Self::Target {
		&self.server
	}
}

pub fn app(pool: Database) -> TestApp {
	let media_dir = tempfile::Builder::new()
		.prefix("blog-api-media-")
		.tempdir()
		.unwrap();

	let media = Media::new(media_dir.path().to_path_buf());
	let state = State {
		database: pool,
		hasher: hasher(),
		media: media.clone(),
	};

	let server = TestServer::new(crate::app(state, crate::config::DEFAULT_MAX_UPLOAD_BYTES)).unwrap();

	TestApp {
		server,
		media,
		_media_dir: media_dir,
	}
}

pub fn bearer(token: &str) -> HeaderValue {
	HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

/// Signs up `email` through the API and returns an `Authorization` header for it.
pub async fn authorize(app: &TestServer, email: &str) -> HeaderValue {
	let password = "testpass123";

	let response = app
		.post("/api/user/create")
		.json(&json!({ "email": email, "name": "Test User", "password": password }))
		.await;

	assert_eq!(response.status_code(), 200, "{}", response.text());

	let token = app
		.post("/api/user/token")
		.json(&json!({ "email": email, "password": password }))
		.await
		.json::<Value>();

	bearer(token["token"].as_str().unwrap())
}

/// Creates a user directly in the database.
pub async fn create_user(pool: &Database, email: &str) -> User {
	account::create_user(
		pool,
		&hasher(),
		NewUser {
			email,
			password: "testpass123",
			..Default::default()
		},
	)
	.await
	.unwrap()
}

#[sqlx::test]
async fn test_media_dir_removed_on_drop(pool: Database) {
	let app = app(pool);
	let root = app.media.root().to_path_buf();

	assert!(root.is_dir());

	drop(app);

	assert!(!root.exists());
}
