//! Fragment cache adapter: deterministic keys plus lookup/store of rendered HTML.

use std::io::Write;

use chrono::Duration;
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;

use super::registry::fragment_name;
use super::traits::FragmentStore;

/// Compute the fragment key for a group/section rendered with `template` and `params`.
///
/// SHA256 over `"{group}-{section}/"` followed by the JSON of template and params,
/// so identical inputs always produce the same key.
pub fn compute_key<T: Serialize, P: Serialize>(
  group: &str,
  section: &str,
  template: &T,
  params: &P,
) -> Result<String> {
  let template =
    serde_json::to_string(template).map_err(|e| eyre!("Failed to serialize template: {}", e))?;
  let params =
    serde_json::to_string(params).map_err(|e| eyre!("Failed to serialize params: {}", e))?;

  let mut hasher = Sha256::new();
  hasher.update(format!("{}-{}/", group, section).as_bytes());
  hasher.update(template.as_bytes());
  hasher.update(params.as_bytes());
  Ok(hex::encode(hasher.finalize()))
}

/// Reads and writes fragments with a fixed time-to-live.
///
/// Store errors never fail a render: reads degrade to a miss, writes are skipped.
pub struct FragmentCache<'a, S: FragmentStore> {
  storage: &'a S,
  expiration: Duration,
}

impl<'a, S: FragmentStore> FragmentCache<'a, S> {
  pub fn new(storage: &'a S, expiration: Duration) -> Self {
    Self {
      storage,
      expiration,
    }
  }

  /// Stored fragment for `key`, if any.
  pub fn lookup(&self, key: &str) -> Option<String> {
    match self.storage.get_fragment(&fragment_name(key)) {
      Ok(body) => body,
      Err(e) => {
        warn!(error = %e, key, "fragment lookup failed, rendering instead");
        None
      }
    }
  }

  /// Emit the stored fragment for `key` to `out`. Returns whether one was emitted.
  pub fn try_output<W: Write>(&self, key: &str, out: &mut W) -> Result<bool> {
    match self.lookup(key) {
      Some(body) => {
        out
          .write_all(body.as_bytes())
          .map_err(|e| eyre!("Failed to write cached fragment: {}", e))?;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  /// Persist a rendered fragment under `key`.
  pub fn store(&self, key: &str, body: &str) {
    if let Err(e) = self
      .storage
      .set_fragment(&fragment_name(key), body, self.expiration)
    {
      warn!(error = %e, key, "failed to store fragment");
    }
  }
}
