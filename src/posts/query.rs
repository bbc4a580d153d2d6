//! Offset/limit slicing of curated lists.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::source::PostSource;
use super::types::PostRef;

/// Slicing parameters. Extra parameters only take part in the fragment key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub offset: Option<usize>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub limit: Option<usize>,
  #[serde(flatten)]
  pub extra: BTreeMap<String, String>,
}

#[cfg(test)]
impl QueryParams {
  pub fn with_offset(mut self, offset: usize) -> Self {
    self.offset = Some(offset);
    self
  }

  pub fn with_limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }

  pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.extra.insert(key.into(), value.into());
    self
  }
}

/// A post of a section, with its position in the full curated list.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionPost {
  pub position: usize,
  pub post: PostRef,
}

/// Entries `offset..offset + limit` of `posts`, keeping their source positions.
pub fn slice(posts: &[PostRef], offset: usize, limit: usize) -> Vec<SectionPost> {
  posts
    .iter()
    .enumerate()
    .skip(offset)
    .take(limit)
    .map(|(position, post)| SectionPost {
      position,
      post: post.clone(),
    })
    .collect()
}

/// The slice of group/section selected by `params`.
///
/// `None` when the list is missing or malformed; an empty list gives `Some(vec![])`.
pub fn get_posts_section<P: PostSource + ?Sized>(
  source: &P,
  group: &str,
  section: &str,
  params: &QueryParams,
) -> Option<Vec<SectionPost>> {
  let posts = source.get_posts_list(group, section)?.posts?;
  let offset = params.offset.unwrap_or(0);
  let limit = params.limit.unwrap_or(posts.len());
  Some(slice(&posts, offset, limit))
}

#[cfg(test)]
mod tests {
  use serde_json::Map;

  use super::*;
  use crate::posts::types::PostsList;

  fn post(post_id: u64) -> PostRef {
    PostRef {
      site_id: 1,
      post_id,
      meta: Map::new(),
    }
  }

  fn ids(section: &[SectionPost]) -> Vec<(usize, u64)> {
    section.iter().map(|p| (p.position, p.post.post_id)).collect()
  }

  struct Fixed(Option<PostsList>);

  impl PostSource for Fixed {
    fn get_posts_list(&self, _group: &str, _section: &str) -> Option<PostsList> {
      self.0.clone()
    }
  }

  #[test]
  fn test_full_slice_is_identity() {
    let posts = vec![post(1), post(2), post(3)];
    let section = slice(&posts, 0, posts.len());
    assert_eq!(ids(&section), vec![(0, 1), (1, 2), (2, 3)]);
  }

  #[test]
  fn test_middle_slice_keeps_position() {
    let posts = vec![post(1), post(2), post(3)];
    assert_eq!(ids(&slice(&posts, 1, 1)), vec![(1, 2)]);
  }

  #[test]
  fn test_out_of_range_slices() {
    let posts = vec![post(1), post(2)];
    assert!(slice(&posts, 5, 2).is_empty());
    assert_eq!(ids(&slice(&posts, 1, 10)), vec![(1, 2)]);
    assert!(slice(&posts, 0, 0).is_empty());
  }

  #[test]
  fn test_defaults_select_everything() {
    let source = Fixed(Some(PostsList {
      posts: Some(vec![post(1), post(2), post(3)]),
    }));
    let section = get_posts_section(&source, "home", "featured", &QueryParams::default()).unwrap();
    assert_eq!(section.len(), 3);

    let params = QueryParams::default().with_offset(2);
    let section = get_posts_section(&source, "home", "featured", &params).unwrap();
    assert_eq!(ids(&section), vec![(2, 3)]);
  }

  #[test]
  fn test_missing_or_malformed_list_is_no_section() {
    assert!(get_posts_section(&Fixed(None), "g", "s", &QueryParams::default()).is_none());

    let malformed = Fixed(Some(PostsList { posts: None }));
    assert!(get_posts_section(&malformed, "g", "s", &QueryParams::default()).is_none());

    let empty = Fixed(Some(PostsList {
      posts: Some(Vec::new()),
    }));
    assert_eq!(
      get_posts_section(&empty, "g", "s", &QueryParams::default()),
      Some(Vec::new())
    );
  }
}
