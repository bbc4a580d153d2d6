//! Key registry.
//!
//! Records which fragment keys were generated for each group/section so that
//! all of them can be flushed when the curated list changes.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::traits::{FragmentStore, OptionStore};

/// Option name under which the registry is persisted.
pub const CACHE_KEYS_OPTION: &str = "cache_keys";

/// group -> section -> keys, in insertion order
type KeyMap = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Tracks group/section -> fragment keys in durable option storage.
///
/// Storage failures are logged and treated as an empty registry.
pub struct KeyRegistry<'a, S: OptionStore> {
  storage: &'a S,
}

impl<'a, S: OptionStore> KeyRegistry<'a, S> {
  pub fn new(storage: &'a S) -> Self {
    Self { storage }
  }

  fn load(&self) -> KeyMap {
    match self.storage.get_option::<KeyMap>(CACHE_KEYS_OPTION) {
      Ok(keys) => keys.unwrap_or_default(),
      Err(e) => {
        warn!(error = %e, "failed to read cache key registry, treating as empty");
        KeyMap::new()
      }
    }
  }

  fn save(&self, keys: &KeyMap) {
    if let Err(e) = self.storage.set_option(CACHE_KEYS_OPTION, keys) {
      warn!(error = %e, "failed to persist cache key registry");
    }
  }

  /// Record `key` under group/section. Only writes when the key is new.
  ///
  /// Returns whether the key was added.
  pub fn add_key(&self, group: &str, section: &str, key: &str) -> bool {
    let mut keys = self.load();
    let entry = keys
      .entry(group.to_string())
      .or_default()
      .entry(section.to_string())
      .or_default();

    if entry.iter().any(|k| k == key) {
      return false;
    }

    entry.push(key.to_string());
    self.save(&keys);
    debug!(group, section, key, "cache key registered");
    true
  }

  /// Keys recorded for group/section, empty if none.
  pub fn get_keys(&self, group: &str, section: &str) -> Vec<String> {
    self
      .load()
      .get(group)
      .and_then(|sections| sections.get(section))
      .cloned()
      .unwrap_or_default()
  }

  /// Delete every recorded fragment of group/section, then forget the keys.
  ///
  /// Returns the number of fragments that were actually deleted.
  pub fn invalidate<F: FragmentStore>(&self, group: &str, section: &str, fragments: &F) -> usize {
    let mut keys = self.load();
    let Some(recorded) = keys.get_mut(group).and_then(|s| s.remove(section)) else {
      return 0;
    };

    let mut deleted = 0;
    for key in &recorded {
      match fragments.delete_fragment(&fragment_name(key)) {
        Ok(true) => deleted += 1,
        Ok(false) => {}
        Err(e) => warn!(error = %e, key = %key, "failed to delete fragment"),
      }
    }

    if keys.get(group).is_some_and(|s| s.is_empty()) {
      keys.remove(group);
    }
    self.save(&keys);

    debug!(group, section, recorded = recorded.len(), deleted, "fragments invalidated");
    deleted
  }
}

/// Name of the stored fragment for a registry key.
pub fn fragment_name(key: &str) -> String {
  format!("cpn-fragments_{}", key)
}
