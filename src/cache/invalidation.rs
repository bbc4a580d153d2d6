//! Invalidation strategies, one per configured cache backend.

use std::path::PathBuf;

use color_eyre::{eyre::eyre, Result};
use tracing::{debug, info, warn};

use super::registry::KeyRegistry;
use super::traits::{FragmentStore, OptionStore, SiteCache};
use crate::config::{BackendKind, CacheConfig};

/// Flushes whatever a backend cached for a group/section.
pub trait Invalidator {
  fn invalidate(&self, group: &str, section: &str) -> Result<()>;
}

/// Per-section fragments tracked in the key registry.
pub struct FragmentInvalidator<'a, S: OptionStore + FragmentStore> {
  storage: &'a S,
}

impl<S: OptionStore + FragmentStore> Invalidator for FragmentInvalidator<'_, S> {
  fn invalidate(&self, group: &str, section: &str) -> Result<()> {
    KeyRegistry::new(self.storage).invalidate(group, section, self.storage);
    Ok(())
  }
}

/// Whole-site backends: any change flushes everything, related or not.
pub struct SiteFlushInvalidator<C: SiteCache> {
  cache: C,
}

impl<C: SiteCache> Invalidator for SiteFlushInvalidator<C> {
  fn invalidate(&self, group: &str, section: &str) -> Result<()> {
    info!(group, section, "flushing whole-site cache");
    self.cache.flush_all()
  }
}

/// Unknown backend or caching disabled.
pub struct NoopInvalidator;

impl Invalidator for NoopInvalidator {
  fn invalidate(&self, group: &str, section: &str) -> Result<()> {
    debug!(group, section, "no cache backend to invalidate");
    Ok(())
  }
}

/// Directory of fully rendered pages.
pub struct PageCacheDir {
  root: PathBuf,
}

impl PageCacheDir {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }
}

impl SiteCache for PageCacheDir {
  fn flush_all(&self) -> Result<()> {
    if !self.root.exists() {
      return Ok(());
    }

    let entries = std::fs::read_dir(&self.root)
      .map_err(|e| eyre!("Failed to read page cache {}: {}", self.root.display(), e))?;

    for entry in entries {
      let path = entry
        .map_err(|e| eyre!("Failed to read page cache entry: {}", e))?
        .path();
      let removed = if path.is_dir() {
        std::fs::remove_dir_all(&path)
      } else {
        std::fs::remove_file(&path)
      };
      removed.map_err(|e| eyre!("Failed to remove {}: {}", path.display(), e))?;
    }

    Ok(())
  }
}

impl<S: SiteCache> SiteCache for &S {
  fn flush_all(&self) -> Result<()> {
    (**self).flush_all()
  }
}

/// Pick the invalidation strategy for the configured backend.
pub fn for_config<'a, S>(cache: Option<&CacheConfig>, storage: &'a S) -> Box<dyn Invalidator + 'a>
where
  S: OptionStore + FragmentStore + SiteCache,
{
  let Some(cache) = cache else {
    return Box::new(NoopInvalidator);
  };

  match &cache.backend {
    BackendKind::FragmentCaching => Box::new(FragmentInvalidator { storage }),
    BackendKind::ObjectCache => Box::new(SiteFlushInvalidator { cache: storage }),
    BackendKind::PageCache => match &cache.page_cache_dir {
      Some(dir) => Box::new(SiteFlushInvalidator {
        cache: PageCacheDir::new(dir.clone()),
      }),
      None => {
        warn!("page-cache backend configured without page_cache_dir");
        Box::new(NoopInvalidator)
      }
    },
    BackendKind::Unknown => Box::new(NoopInvalidator),
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use chrono::Duration;

  use super::*;
  use crate::cache::registry::fragment_name;
  use crate::cache::storage::SqliteStorage;
  use crate::db::Database;

  fn storage() -> SqliteStorage {
    SqliteStorage::new(Database::open_in_memory().unwrap())
  }

  fn cache_config(backend: BackendKind, page_cache_dir: Option<PathBuf>) -> CacheConfig {
    CacheConfig {
      backend,
      expiration: 0,
      sections: BTreeMap::new(),
      page_cache_dir,
    }
  }

  fn seed(storage: &SqliteStorage) {
    let registry = KeyRegistry::new(storage);
    registry.add_key("home", "featured", "k1");
    registry.add_key("home", "latest", "k2");
    for key in ["k1", "k2"] {
      storage
        .set_fragment(&fragment_name(key), "html", Duration::zero())
        .unwrap();
    }
  }

  #[test]
  fn test_fragment_backend_only_flushes_section() {
    let storage = storage();
    seed(&storage);

    let config = cache_config(BackendKind::FragmentCaching, None);
    for_config(Some(&config), &storage)
      .invalidate("home", "featured")
      .unwrap();

    assert!(storage.get_fragment(&fragment_name("k1")).unwrap().is_none());
    assert!(storage.get_fragment(&fragment_name("k2")).unwrap().is_some());
  }

  #[test]
  fn test_object_cache_flushes_everything() {
    let storage = storage();
    seed(&storage);

    let config = cache_config(BackendKind::ObjectCache, None);
    for_config(Some(&config), &storage)
      .invalidate("home", "featured")
      .unwrap();

    assert_eq!(storage.fragment_count().unwrap(), 0);
  }

  #[test]
  fn test_page_cache_empties_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "page").unwrap();
    std::fs::create_dir(dir.path().join("news")).unwrap();
    std::fs::write(dir.path().join("news").join("index.html"), "page").unwrap();

    let storage = storage();
    let config = cache_config(BackendKind::PageCache, Some(dir.path().to_path_buf()));
    for_config(Some(&config), &storage)
      .invalidate("home", "featured")
      .unwrap();

    assert!(dir.path().exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
  }

  #[test]
  fn test_unknown_backend_and_disabled_are_noops() {
    let storage = storage();
    seed(&storage);

    let config = cache_config(BackendKind::Unknown, None);
    for_config(Some(&config), &storage)
      .invalidate("home", "featured")
      .unwrap();
    for_config(None, &storage)
      .invalidate("home", "featured")
      .unwrap();

    assert_eq!(storage.fragment_count().unwrap(), 2);
  }
}
