use aide::{
	openapi::{MediaType, ReferenceOr, RequestBody},
	OperationInput,
};
use axum::{
	body::Bytes,
	extract::{FromRequest, Multipart, Request},
};
use image::ImageFormat;
use validator::{ValidationError, ValidationErrors};

use crate::error::AppError;

/// The multipart field that carries the file.
pub const FIELD_NAME: &str = "image";

/// A single image file submitted as `multipart/form-data`.
///
/// The bytes are fully decoded before the handler runs, so anything that
/// is not a supported image is rejected with a validation error on the
/// `image` field.
#[derive(Debug)]
pub struct ImageUpload {
	/// The file name given by the client, if any.
	pub file_name: Option<String>,
	pub format: ImageFormat,
	pub bytes: Bytes,
}

fn invalid(code: &'static str, message: &'static str) -> ValidationErrors {
	let mut error = ValidationError::new(code);
	error.message = Some(message.into());

	let mut errors = ValidationErrors::new();
	errors.add(FIELD_NAME, error);
	errors
}

/// Detects the format of `bytes` and checks that they decode as an image.
pub fn decode(bytes: &[u8]) -> Result<ImageFormat, image::ImageError> {
	let format = image::guess_format(bytes)?;

	image::load_from_memory_with_format(bytes, format)?;
	Ok(format)
}

#[axum::async_trait]
impl<S> FromRequest<S> for ImageUpload
where
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let mut multipart = Multipart::from_request(req, state).await?;

		while let Some(field) = multipart.next_field().await? {
			if field.name() != Some(FIELD_NAME) {
				continue;
			}

			let file_name = field.file_name().map(str::to_owned);
			let bytes = field.bytes().await?;

			let format = decode(&bytes).map_err(|error| {
				tracing::debug!(%error, "rejected upload");
				invalid("invalid_image", "Upload a valid image.")
			})?;

			return Ok(Self {
				file_name,
				format,
				bytes,
			});
		}

		Err(invalid("required", "No image was submitted.").into())
	}
}

impl OperationInput for ImageUpload {
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		let mut body = RequestBody {
			description: Some(format!("A single image file in the `{FIELD_NAME}` field.")),
			required: true,
			..Default::default()
		};

		body.content
			.insert("multipart/form-data".into(), MediaType::default());
		operation.request_body = Some(ReferenceOr::Item(body));
	}
}

#[cfg(test)]
mod test {
	use std::io::Cursor;

	use image::{DynamicImage, ImageFormat};

	use super::decode;

	#[test]
	fn test_decode_png() {
		let mut bytes = Vec::new();
		DynamicImage::new_rgb8(4, 4)
			.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
			.unwrap();

		assert_eq!(decode(&bytes).unwrap(), ImageFormat::Png);
	}

	#[test]
	fn test_decode_rejects_text() {
		assert!(decode(b"definitely not an image").is_err());
	}

	#[test]
	fn test_decode_rejects_truncated_png() {
		let mut bytes = Vec::new();
		DynamicImage::new_rgb8(4, 4)
			.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
			.unwrap();
		bytes.truncate(bytes.len() / 2);

		assert!(decode(&bytes).is_err());
	}
}
