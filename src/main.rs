#![warn(clippy::pedantic)]

mod cli;
mod config;
mod db;
mod error;
mod extract;
mod media;
mod openapi;
mod route;
#[cfg(test)]
mod test;
mod trace;

use std::{error::Error, sync::Arc, time::Duration};

use aide::{axum::ApiRouter, openapi::OpenApi};
use argon2::Argon2;
use axum::{
	body::Body,
	extract::{DefaultBodyLimit, Request},
	http::{header, HeaderName, Method, Response},
	Extension, Router, ServiceExt,
};
use clap::Parser;
use tower::Layer;
use tower_http::{
	compression::CompressionLayer,
	cors::{Any, CorsLayer},
	normalize_path::NormalizePathLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	services::ServeDir,
	trace::TraceLayer,
};
use tracing::Span;

use crate::{cli::Command, config::Config, media::Media};

pub type Database = sqlx::Pool<sqlx::Sqlite>;
pub type AppState = State;

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as a database connection pool, a hash configuration (since it's expensive to create),
/// or the media store.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub media: Media,
}

/// Builds the full application router, including docs, media files and middleware.
pub fn app(state: State, upload_limit: usize) -> Router {
	let mut api = OpenApi::default();
	let media_root = state.media.root().to_path_buf();

	let router = ApiRouter::new()
		.nest("/api/user", route::user::routes())
		.nest(
			"/api/post",
			route::post::routes().merge(route::tag::routes()),
		)
		.merge(route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.with_state(state);

	router
		.nest_service("/media", ServeDir::new(media_root))
		.layer(DefaultBodyLimit::max(upload_limit))
		.layer(Extension(Arc::new(api)))
		.layer(
			TraceLayer::new_for_http()
				.make_span_with(|request: &Request| {
					let id = request
						.headers()
						.get(&REQUEST_ID_HEADER)
						.and_then(|id| id.to_str().ok())
						.unwrap_or_default();

					tracing::info_span!(
						"request",
						method = %request.method(),
						uri = %request.uri(),
						request_id = %id,
					)
				})
				.on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
					tracing::info!(
						histogram.latency_ms = latency.as_secs_f64() * 1000.0,
						status = response.status().as_u16(),
						"finished request"
					);
				}),
		)
		.layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
		.layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
		.layer(CompressionLayer::new())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods([
					Method::GET,
					Method::POST,
					Method::PUT,
					Method::PATCH,
					Method::DELETE,
				])
				.allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
		)
}

async fn serve(config: Config) -> Result<(), Box<dyn Error>> {
	let state = State {
		database: db::connect(&config.database_url).await?,
		hasher: Argon2::default(),
		media: Media::new(&config.media_root),
	};

	tokio::fs::create_dir_all(state.media.root()).await?;

	let app = NormalizePathLayer::trim_trailing_slash().layer(app(state, config.max_upload_bytes));
	let listener = tokio::net::TcpListener::bind((config.host, config.port)).await?;

	tracing::info!(address = %listener.local_addr()?, "listening");

	axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;

	Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
	dotenvy::dotenv().ok();

	let cli = cli::Cli::parse();
	let config = Config::from_env()?;
	let _guard = trace::init_tracing_subscriber(&config.trace);

	match cli.command() {
		Command::Serve => serve(config).await,
		Command::WaitForDb {
			interval_ms,
			max_attempts,
		} => {
			db::wait_for_db(
				&config.database_url,
				Duration::from_millis(interval_ms),
				max_attempts,
			)
			.await?;

			Ok(())
		}
		Command::CreateSuperuser { email, password } => {
			let database = db::connect(&config.database_url).await?;
			let user = route::user::account::create_superuser(
				&database,
				&Argon2::default(),
				&email,
				&password,
			)
			.await?;

			tracing::info!(user = %user.id, email = %user.email, "created superuser");

			Ok(())
		}
	}
}
