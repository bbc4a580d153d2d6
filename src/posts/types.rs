use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A curated entry: which post on which site, plus free-form metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRef {
  pub site_id: u64,
  pub post_id: u64,
  #[serde(flatten)]
  pub meta: Map<String, Value>,
}

/// The curated list stored for a group/section
#[derive(Debug, Clone, Default)]
pub struct PostsList {
  /// `None` when the stored list has no `posts` field
  pub posts: Option<Vec<PostRef>>,
}

impl PostsList {
  /// Parse a stored list. A missing `posts` field is not an error.
  pub fn from_value(value: &serde_yaml::Value) -> Result<Self, serde_yaml::Error> {
    let posts = match value.get("posts") {
      Some(posts) => Some(serde_yaml::from_value(posts.clone())?),
      None => None,
    };
    Ok(Self { posts })
  }
}

/// A site of the network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
  pub id: u64,
  pub name: String,
  pub domain: String,
  #[serde(default, skip_serializing)]
  pub posts: Vec<Post>,
}

/// Full post record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
  pub id: u64,
  pub title: String,
  #[serde(default)]
  pub excerpt: String,
  #[serde(default)]
  pub content: String,
  pub author: Option<String>,
  pub date: Option<DateTime<Utc>>,
  pub permalink: Option<String>,
}
