use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A label for grouping posts, owned by a user.
///
/// A user has at most one tag with a given name.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct Tag {
	/// The unique identifier of the tag.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The user that owns the tag.
	#[model(read_only, alias = "user")]
	#[serde(skip)]
	pub user_id: Uuid,
	/// The name of the tag.
	#[validate(length(min = 1, max = 150))]
	pub name: String,
}

impl std::fmt::Display for Tag {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.name)
	}
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct TagFilter {
	/// Only return tags that are attached to at least one post.
	#[serde(default)]
	pub assigned_only: bool,
}
