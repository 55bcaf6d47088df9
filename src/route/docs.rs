use std::sync::Arc;

use aide::{
	axum::{
		routing::{get, get_with},
		ApiRouter, IntoApiResponse,
	},
	openapi::OpenApi,
	scalar::Scalar,
};
use axum::{response::IntoResponse, Extension};

use crate::{extract::Json, AppState};

pub const SCHEMA_PATH: &str = "/api/schema";

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.api_route(
			"/api/docs",
			get_with(
				Scalar::new(SCHEMA_PATH).with_title("Blog API").axum_handler(),
				|op| op.description("This documentation page."),
			),
		)
		.route(SCHEMA_PATH, get(serve_schema))
}

async fn serve_schema(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
	Json(api.as_ref()).into_response()
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	async fn test_schema_lists_routes(pool: Database) {
		let app = app(pool);

		let response = app.get("/api/schema").await;

		assert_eq!(response.status_code(), 200);

		let schema = response.json::<Value>();

		assert_eq!(schema["info"]["title"], "Blog API");
		assert!(schema["paths"]["/api/post/post"].is_object());
		assert!(schema["paths"]["/api/post/post/{id}/upload-image"].is_object());
		assert!(schema["components"]["securitySchemes"]["Token"].is_object());
	}
}
