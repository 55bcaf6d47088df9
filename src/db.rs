use std::{path::Path, str::FromStr, time::Duration};

use sqlx::{
	migrate::MigrateError,
	sqlite::{SqliteConnectOptions, SqlitePoolOptions},
	ConnectOptions, Connection,
};

use crate::Database;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("database error: {0}")]
	Sqlx(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] MigrateError),
	#[error("could not create the database directory: {0}")]
	Io(#[from] std::io::Error),
}

fn options(url: &str) -> Result<SqliteConnectOptions, sqlx::Error> {
	Ok(SqliteConnectOptions::from_str(url)?
		.create_if_missing(true)
		.foreign_keys(true))
}

/// Opens a pool on `url`, creating the database file and its directory if
/// needed, and applies pending migrations.
pub async fn connect(url: &str) -> Result<Database, Error> {
	let options = options(url)?;

	let filename = options.clone().get_filename();

	if let Some(parent) = filename.parent() {
		if parent != Path::new("") {
			tokio::fs::create_dir_all(parent).await?;
		}
	}

	let database = SqlitePoolOptions::new().connect_with(options).await?;

	sqlx::migrate!().run(&database).await?;

	tracing::info!(url, "database ready");

	Ok(database)
}

/// Tries to connect every `interval` until it succeeds, returning the number of
/// attempts it took. Fails with the last error once `max_attempts` is reached.
pub async fn wait_for_db(
	url: &str,
	interval: Duration,
	max_attempts: u32,
) -> Result<u32, sqlx::Error> {
	let options = options(url)?;
	let mut attempt = 1;

	loop {
		match options.connect().await {
			Ok(connection) => {
				connection.close().await?;
				tracing::info!(attempt, "database available");

				return Ok(attempt);
			}
			Err(error) if attempt < max_attempts => {
				tracing::warn!(%error, attempt, "database unavailable, waiting");
				tokio::time::sleep(interval).await;
				attempt += 1;
			}
			Err(error) => {
				tracing::error!(%error, attempt, "database unavailable, giving up");
				return Err(error);
			}
		}
	}
}

#[cfg(test)]
mod test {
	use std::time::Duration;

	use super::{connect, wait_for_db};

	#[tokio::test]
	async fn test_connect_creates_directory_and_migrates() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested/blog.db");
		let url = format!("sqlite:{}", path.display());

		let database = connect(&url).await.unwrap();

		let users = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM "user""#)
			.fetch_one(&database)
			.await
			.unwrap();

		assert_eq!(users, 0);
		assert!(path.exists());

		database.close().await;
	}

	#[tokio::test]
	async fn test_wait_for_db_succeeds() {
		let attempts = wait_for_db("sqlite::memory:", Duration::ZERO, 3)
			.await
			.unwrap();

		assert_eq!(attempts, 1);
	}

	#[tokio::test]
	async fn test_wait_for_db_gives_up() {
		let dir = tempfile::tempdir().unwrap();
		let url = format!("sqlite:{}", dir.path().join("missing/blog.db").display());

		assert!(wait_for_db(&url, Duration::from_millis(1), 2).await.is_err());
	}
}
