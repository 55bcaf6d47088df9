use aide::{
	openapi::{SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{error, extract::Json};

pub const SECURITY_SCHEME_TOKEN: &str = "Token";

pub mod tag {
	pub const USER: &str = "User";
	pub const POST: &str = "Post";
	pub const TAG: &str = "Tag";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Blog API")
		.summary("Posts, tags and image uploads for token-authenticated users")
		.description(include_str!("../README.md"))
		.tag(Tag {
			name: tag::USER.into(),
			description: Some("Accounts and tokens".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Post management".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::TAG.into(),
			description: Some("Tag management".into()),
			..Default::default()
		})
		.security_scheme(
			SECURITY_SCHEME_TOKEN,
			SecurityScheme::Http {
				scheme: "bearer".into(),
				bearer_format: Some("UUID".into()),
				description: Some("A token issued by `POST /api/user/token`".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<error::ErrorResponse>, _>(|res| {
			res.example(error::ErrorResponse::new(
				error::Message::new("error_code")
					.content("A human-readable message.")
					.field("optional field")
					.into_vec(),
			))
		})
}
