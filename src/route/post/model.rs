pub use crate::route::model::IdInput;

use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::route::{
	model::{default_page_size, one},
	tag::model::{CreateTagInput, Tag},
};

/// A single post, created by a user.
#[model]
#[derive(Debug, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct Post {
	/// The unique identifier of the post.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The user that created the post. It is assigned by the server.
	#[model(read_only, alias = "user")]
	#[serde(skip)]
	pub user_id: Uuid,
	/// The title of the post.
	#[validate(length(min = 1, max = 255))]
	pub title: String,
	/// The content of the post.
	pub content: String,
	/// The tags attached to the post. When given, they replace the current tags;
	/// tags that do not exist yet are created.
	#[model(input = "Option<Vec<CreateTagInput>>")]
	#[serde(default)]
	#[validate(nested)]
	#[sqlx(skip)]
	pub tags: Vec<Tag>,
	/// The path of the uploaded image, relative to `/media/`.
	#[serde(skip_deserializing)]
	pub image: Option<String>,
	/// The creation time of the post.
	#[serde(skip_deserializing)]
	pub created_at: chrono::DateTime<chrono::Utc>,
	/// The last time the post was changed.
	#[serde(skip_deserializing)]
	pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl std::fmt::Display for Post {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.title)
	}
}

/// Rejects the owner field on the post itself and on every nested tag.
fn reject_owner(
	post: Result<(), ValidationErrors>,
	tags: Option<&[CreateTagInput]>,
) -> Result<(), ValidationErrors> {
	let mut errors = post.err().unwrap_or_else(ValidationErrors::new);

	let nested_owner = tags
		.unwrap_or_default()
		.iter()
		.any(|tag| tag.reject_read_only().is_err());

	if nested_owner {
		let mut error = ValidationError::new("read_only");
		error.message = Some("Tags cannot set their owner.".into());
		errors.add("tags", error);
	}

	if errors.errors().is_empty() {
		Ok(())
	} else {
		Err(errors)
	}
}

impl CreatePostInput {
	pub fn reject_owner(&self) -> Result<(), ValidationErrors> {
		reject_owner(self.reject_read_only(), self.tags.as_deref())
	}
}

impl UpdatePostInput {
	pub fn reject_owner(&self) -> Result<(), ValidationErrors> {
		reject_owner(self.reject_read_only(), self.tags.as_deref())
	}
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct PostFilter {
	/// The page number to return (1-indexed). Bounded so the offset always fits in an `i64`.
	#[validate(range(min = 1, max = 1_000_000))]
	#[serde(default = "one")]
	pub page: i64,
	/// The number of posts to return per page.
	#[validate(range(min = 1, max = 100))]
	#[serde(default = "default_page_size")]
	pub size: i64,
	/// A comma-separated list of tag ids. Only posts carrying at least one of them are returned.
	pub tags: Option<String>,
}

impl PostFilter {
	pub fn offset(&self) -> i64 {
		self.page.saturating_sub(1).saturating_mul(self.size)
	}

	pub fn limit(&self) -> i64 {
		self.size
	}

	/// Parses the `tags` filter, failing on the first id that is not a UUID.
	pub fn tag_ids(&self) -> Result<Vec<Uuid>, ValidationErrors> {
		let Some(ref tags) = self.tags else {
			return Ok(Vec::new());
		};

		tags.split(',')
			.map(str::trim)
			.filter(|id| !id.is_empty())
			.map(|id| {
				Uuid::parse_str(id).map_err(|_| {
					let mut errors = ValidationErrors::new();
					errors.add("tags", ValidationError::new("invalid_uuid"));
					errors
				})
			})
			.collect()
	}
}

#[cfg(test)]
mod test {
	use uuid::Uuid;

	use validator::Validate;

	use super::{Post, PostFilter};

	fn filter(tags: Option<&str>) -> PostFilter {
		PostFilter {
			page: 1,
			size: 25,
			tags: tags.map(str::to_owned),
		}
	}

	#[test]
	fn test_post_display_is_title() {
		let post = Post {
			id: Uuid::new_v4(),
			user_id: Uuid::new_v4(),
			title: "New Post".into(),
			content: "Post Content".into(),
			tags: Vec::new(),
			image: None,
			created_at: chrono::Utc::now(),
			updated_at: chrono::Utc::now(),
		};

		assert_eq!(post.to_string(), "New Post");
	}

	#[test]
	fn test_offset() {
		let mut filter = filter(None);
		filter.size = 10;

		assert_eq!(filter.offset(), 0);

		filter.page = 2;

		assert_eq!(filter.offset(), 10);

		filter.size = 5;
		filter.page = 3;

		assert_eq!(filter.offset(), 10);
		assert_eq!(filter.limit(), 5);
	}

	#[test]
	fn test_page_is_bounded() {
		let mut filter = filter(None);
		filter.size = 100;
		filter.page = 1_000_000;

		assert!(filter.validate().is_ok());
		assert_eq!(filter.offset(), 99_999_900);

		filter.page = i64::MAX;

		assert!(filter.validate().is_err());
		assert_eq!(filter.offset(), i64::MAX);
	}

	#[test]
	fn test_filter_defaults() {
		let filter: PostFilter = serde_json::from_str("{}").unwrap();

		assert_eq!(filter.page, 1);
		assert_eq!(filter.limit(), 25);
		assert!(filter.tags.is_none());
	}

	#[test]
	fn test_tag_ids() {
		let a = Uuid::new_v4();
		let b = Uuid::new_v4();

		assert!(filter(None).tag_ids().unwrap().is_empty());
		assert_eq!(
			filter(Some(&format!("{a}, {b},"))).tag_ids().unwrap(),
			[a, b]
		);
		assert!(filter(Some("1,2")).tag_ids().is_err());
	}
}
