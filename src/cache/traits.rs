//! Storage traits the cache is built on.

use chrono::Duration;
use color_eyre::Result;
use serde::{de::DeserializeOwned, Serialize};

/// Durable key-value storage shared across the network (site options).
pub trait OptionStore: Send + Sync {
  /// Read an option, `None` if it was never set.
  fn get_option<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>>;

  /// Write an option, replacing any previous value.
  fn set_option<T: Serialize>(&self, name: &str, value: &T) -> Result<()>;
}

/// Store for rendered fragments, keyed by opaque strings.
pub trait FragmentStore: Send + Sync {
  /// Get an unexpired fragment.
  fn get_fragment(&self, key: &str) -> Result<Option<String>>;

  /// Store a fragment. A zero `ttl` never expires.
  fn set_fragment(&self, key: &str, body: &str, ttl: Duration) -> Result<()>;

  /// Delete a fragment, returning whether one was stored.
  fn delete_fragment(&self, key: &str) -> Result<bool>;
}

/// A whole-site cache that can only be flushed as a unit.
pub trait SiteCache {
  fn flush_all(&self) -> Result<()>;
}
