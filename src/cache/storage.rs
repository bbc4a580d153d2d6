//! Cache storage implementations: a no-op store and SQLite.

use chrono::{DateTime, Duration, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Mutex;

use super::traits::{FragmentStore, OptionStore, SiteCache};
use crate::db::Database;

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl OptionStore for NoopStorage {
  fn get_option<T: DeserializeOwned>(&self, _name: &str) -> Result<Option<T>> {
    Ok(None) // Always empty
  }

  fn set_option<T: Serialize>(&self, _name: &str, _value: &T) -> Result<()> {
    Ok(()) // Discard
  }
}

impl FragmentStore for NoopStorage {
  fn get_fragment(&self, _key: &str) -> Result<Option<String>> {
    Ok(None) // Always miss
  }

  fn set_fragment(&self, _key: &str, _body: &str, _ttl: Duration) -> Result<()> {
    Ok(()) // Discard
  }

  fn delete_fragment(&self, _key: &str) -> Result<bool> {
    Ok(false)
  }
}

impl SiteCache for NoopStorage {
  fn flush_all(&self) -> Result<()> {
    Ok(())
  }
}

/// SQLite-backed options and fragments.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  pub fn new(db: Database) -> Self {
    Self {
      conn: Mutex::new(db.into_connection()),
    }
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  /// Number of stored fragments, expired ones included.
  #[cfg(test)]
  pub fn fragment_count(&self) -> Result<usize> {
    let conn = self.lock()?;
    let count: i64 = conn
      .query_row("SELECT COUNT(*) FROM fragments", [], |row| row.get(0))
      .map_err(|e| eyre!("Failed to count fragments: {}", e))?;
    Ok(usize::try_from(count).unwrap_or_default())
  }
}

impl OptionStore for SqliteStorage {
  fn get_option<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
    let conn = self.lock()?;

    let value: Option<String> = conn
      .query_row(
        "SELECT value FROM options WHERE name = ?",
        params![name],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read option {}: {}", name, e))?;

    match value {
      Some(json) => {
        let parsed = serde_json::from_str(&json)
          .map_err(|e| eyre!("Failed to deserialize option {}: {}", name, e))?;
        Ok(Some(parsed))
      }
      None => Ok(None),
    }
  }

  fn set_option<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
    let json =
      serde_json::to_string(value).map_err(|e| eyre!("Failed to serialize option {}: {}", name, e))?;
    let conn = self.lock()?;

    conn
      .execute(
        "INSERT OR REPLACE INTO options (name, value, updated_at) VALUES (?, ?, datetime('now'))",
        params![name, json],
      )
      .map_err(|e| eyre!("Failed to write option {}: {}", name, e))?;

    Ok(())
  }
}

impl FragmentStore for SqliteStorage {
  fn get_fragment(&self, key: &str) -> Result<Option<String>> {
    let conn = self.lock()?;

    let row: Option<(String, Option<String>)> = conn
      .query_row(
        "SELECT body, expires_at FROM fragments WHERE cache_key = ?",
        params![key],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read fragment {}: {}", key, e))?;

    let Some((body, expires_at)) = row else {
      return Ok(None);
    };

    if let Some(expires_at) = expires_at {
      if parse_datetime(&expires_at)? <= Utc::now() {
        conn
          .execute("DELETE FROM fragments WHERE cache_key = ?", params![key])
          .map_err(|e| eyre!("Failed to evict expired fragment {}: {}", key, e))?;
        return Ok(None);
      }
    }

    Ok(Some(body))
  }

  fn set_fragment(&self, key: &str, body: &str, ttl: Duration) -> Result<()> {
    let expires_at = if ttl > Duration::zero() {
      Some(format_datetime(Utc::now() + ttl))
    } else {
      None
    };
    let conn = self.lock()?;

    conn
      .execute(
        "INSERT OR REPLACE INTO fragments (cache_key, body, expires_at, stored_at)
         VALUES (?, ?, ?, datetime('now'))",
        params![key, body, expires_at],
      )
      .map_err(|e| eyre!("Failed to store fragment {}: {}", key, e))?;

    Ok(())
  }

  fn delete_fragment(&self, key: &str) -> Result<bool> {
    let conn = self.lock()?;
    let deleted = conn
      .execute("DELETE FROM fragments WHERE cache_key = ?", params![key])
      .map_err(|e| eyre!("Failed to delete fragment {}: {}", key, e))?;
    Ok(deleted > 0)
  }
}

/// The object cache: flushing drops every fragment of every site.
impl SiteCache for SqliteStorage {
  fn flush_all(&self) -> Result<()> {
    let conn = self.lock()?;
    let deleted = conn
      .execute("DELETE FROM fragments", [])
      .map_err(|e| eyre!("Failed to flush fragments: {}", e))?;
    tracing::info!(deleted, "object cache flushed");
    Ok(())
  }
}

/// Format a datetime the way SQLite's datetime() does.
fn format_datetime(dt: DateTime<Utc>) -> String {
  dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::BTreeMap;

  fn storage() -> SqliteStorage {
    SqliteStorage::new(Database::open_in_memory().unwrap())
  }

  #[test]
  fn test_option_roundtrip() {
    let storage = storage();
    assert!(storage.get_option::<Vec<String>>("missing").unwrap().is_none());

    let mut value = BTreeMap::new();
    value.insert("home".to_string(), vec!["a".to_string()]);
    storage.set_option("cache_keys", &value).unwrap();

    let read: BTreeMap<String, Vec<String>> = storage.get_option("cache_keys").unwrap().unwrap();
    assert_eq!(read, value);
  }

  #[test]
  fn test_fragment_without_ttl_never_expires() {
    let storage = storage();
    storage
      .set_fragment("k", "<p>hi</p>", Duration::zero())
      .unwrap();
    assert_eq!(storage.get_fragment("k").unwrap().as_deref(), Some("<p>hi</p>"));
  }

  #[test]
  fn test_expired_fragment_is_a_miss() {
    let storage = storage();
    {
      let conn = storage.lock().unwrap();
      conn
        .execute(
          "INSERT INTO fragments (cache_key, body, expires_at) VALUES ('old', 'x', '2000-01-01 00:00:00')",
          [],
        )
        .unwrap();
    }

    assert!(storage.get_fragment("old").unwrap().is_none());
    assert_eq!(storage.fragment_count().unwrap(), 0);
  }

  #[test]
  fn test_delete_fragment() {
    let storage = storage();
    storage
      .set_fragment("k", "body", Duration::minutes(5))
      .unwrap();
    assert!(storage.delete_fragment("k").unwrap());
    assert!(!storage.delete_fragment("k").unwrap());
    assert!(storage.get_fragment("k").unwrap().is_none());
  }

  #[test]
  fn test_flush_all_drops_every_fragment() {
    let storage = storage();
    storage.set_fragment("a", "1", Duration::zero()).unwrap();
    storage.set_fragment("b", "2", Duration::zero()).unwrap();
    storage.flush_all().unwrap();
    assert_eq!(storage.fragment_count().unwrap(), 0);
  }

  #[test]
  fn test_noop_storage_always_misses() {
    let storage = NoopStorage;
    storage.set_fragment("k", "body", Duration::zero()).unwrap();
    assert!(storage.get_fragment("k").unwrap().is_none());
    storage.set_option("o", &1).unwrap();
    assert!(storage.get_option::<i32>("o").unwrap().is_none());
  }
}
