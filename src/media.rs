use std::{
	path::{Path, PathBuf},
	sync::Arc,
};

use image::ImageFormat;
use uuid::Uuid;

use crate::extract::ImageUpload;

/// Directory, relative to the media root, that holds post images.
pub const POST_IMAGE_DIR: &str = "uploads/post";

/// Local file storage for uploaded media, served under `/media`.
#[derive(Clone, Debug)]
pub struct Media {
	root: Arc<PathBuf>,
}

impl Media {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self {
			root: Arc::new(root.into()),
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Writes a post image to a fresh location and returns its path relative to the root.
	pub async fn save_post_image(&self, image: &ImageUpload) -> std::io::Result<String> {
		let relative = post_image_path(image.file_name.as_deref(), image.format);
		let path = self.root.join(&relative);

		if let Some(parent) = path.parent() {
			tokio::fs::create_dir_all(parent).await?;
		}

		tokio::fs::write(&path, &image.bytes).await?;

		Ok(relative)
	}

	/// Removes a stored file. Failures are logged and otherwise ignored.
	pub async fn remove(&self, relative: &str) {
		let path = self.root.join(relative);

		if let Err(error) = tokio::fs::remove_file(&path).await {
			tracing::warn!(%error, path = %path.display(), "failed to remove media file");
		}
	}
}

/// Builds `uploads/post/<uuid>.<ext>`, keeping the client's extension when it looks sane
/// and falling back to the detected format otherwise.
pub fn post_image_path(file_name: Option<&str>, format: ImageFormat) -> String {
	let extension = file_name
		.and_then(|name| Path::new(name).extension())
		.and_then(|extension| extension.to_str())
		.filter(|extension| {
			!extension.is_empty() && extension.chars().all(|c| c.is_ascii_alphanumeric())
		})
		.map(str::to_ascii_lowercase)
		.or_else(|| {
			format
				.extensions_str()
				.first()
				.map(|extension| (*extension).to_owned())
		});

	match extension {
		Some(extension) => format!("{POST_IMAGE_DIR}/{}.{extension}", Uuid::new_v4()),
		None => format!("{POST_IMAGE_DIR}/{}", Uuid::new_v4()),
	}
}

#[cfg(test)]
mod test {
	use image::ImageFormat;

	use super::{post_image_path, POST_IMAGE_DIR};

	#[test]
	fn test_post_image_path_keeps_extension() {
		let path = post_image_path(Some("example.jpg"), ImageFormat::Jpeg);
		let name = path.strip_prefix(&format!("{POST_IMAGE_DIR}/")).unwrap();
		let (id, extension) = name.split_once('.').unwrap();

		assert_eq!(extension, "jpg");
		assert!(uuid::Uuid::parse_str(id).is_ok());
	}

	#[test]
	fn test_post_image_path_is_unique() {
		assert_ne!(
			post_image_path(Some("a.png"), ImageFormat::Png),
			post_image_path(Some("a.png"), ImageFormat::Png)
		);
	}

	#[test]
	fn test_post_image_path_falls_back_to_format() {
		for name in [None, Some("noext"), Some("bad.p/g"), Some("../../etc.passwd?")] {
			assert!(post_image_path(name, ImageFormat::Png).ends_with(".png"));
		}
	}
}
