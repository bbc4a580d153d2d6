use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// Root URL of the network (e.g. "http://www.example.com/")
  pub network_url: String,
  /// YAML file describing sites, posts and curated sections
  pub network_file: PathBuf,
  /// Template search path, first match wins (child theme before parent)
  #[serde(default)]
  pub templates: Vec<PathBuf>,
  /// SQLite database for options and fragments (defaults to the data dir)
  pub database: Option<PathBuf>,
  /// Write logs to a daily rolling file in this directory instead of stderr
  pub log_dir: Option<PathBuf>,
  /// `false` or absent disables caching entirely
  #[serde(default, deserialize_with = "deserialize_cache")]
  pub cache: Option<CacheConfig>,
}

/// Which cache backend invalidation is dispatched to.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
  /// Per-section fragments tracked by the key registry
  FragmentCaching,
  /// Whole-site directory of rendered pages
  PageCache,
  /// Whole-site flush of every stored fragment
  ObjectCache,
  /// Anything else; invalidation is a no-op
  #[default]
  #[serde(other)]
  Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  #[serde(rename = "type", default)]
  pub backend: BackendKind,
  /// Fragment time-to-live in seconds (0 = never expires)
  #[serde(default)]
  pub expiration: u64,
  /// Group name -> sections that are fragment cached
  #[serde(rename = "cache", default)]
  pub sections: BTreeMap<String, BTreeSet<String>>,
  /// Directory flushed by the page-cache backend
  pub page_cache_dir: Option<PathBuf>,
}

impl CacheConfig {
  /// Checks whether the given group/section is configured for fragment caching.
  pub fn should_fragment_cache(&self, group: &str, section: &str) -> bool {
    self
      .sections
      .get(group)
      .is_some_and(|sections| sections.contains(section))
  }

  /// Fragment time-to-live, capped at `u32::MAX` seconds.
  pub fn expiration(&self) -> chrono::Duration {
    let seconds = u32::try_from(self.expiration).unwrap_or(u32::MAX);
    chrono::Duration::seconds(i64::from(seconds))
  }
}

/// Accepts either `false` (caching disabled) or a cache mapping.
fn deserialize_cache<'de, D>(deserializer: D) -> Result<Option<CacheConfig>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Raw {
    Flag(bool),
    Config(CacheConfig),
  }

  match Option::<Raw>::deserialize(deserializer)? {
    None | Some(Raw::Flag(false)) => Ok(None),
    Some(Raw::Flag(true)) => Err(serde::de::Error::custom(
      "cache: true is not a configuration, provide type/expiration/cache",
    )),
    Some(Raw::Config(config)) => Ok(Some(config)),
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./cpn.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/cpn/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/cpn/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("cpn.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("cpn").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))?;
    Ok(config)
  }

  /// Whether any caching is configured.
  pub fn is_cache_active(&self) -> bool {
    self.cache.is_some()
  }

  /// Whether the given group/section should go through the fragment cache.
  pub fn should_fragment_cache(&self, group: &str, section: &str) -> bool {
    self
      .cache
      .as_ref()
      .is_some_and(|cache| cache.should_fragment_cache(group, section))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const BASE: &str = "network_url: http://www.example.com/\nnetwork_file: network.yaml\n";

  #[test]
  fn test_cache_false_disables_caching() {
    let config = Config::from_yaml(&format!("{}cache: false\n", BASE)).unwrap();
    assert!(!config.is_cache_active());
    assert!(!config.should_fragment_cache("home", "featured"));
  }

  #[test]
  fn test_missing_cache_disables_caching() {
    let config = Config::from_yaml(BASE).unwrap();
    assert!(config.cache.is_none());
  }

  #[test]
  fn test_cache_true_is_rejected() {
    assert!(Config::from_yaml(&format!("{}cache: true\n", BASE)).is_err());
  }

  #[test]
  fn test_fragment_cache_config() {
    let yaml = format!(
      "{}cache:\n  type: fragment-caching\n  expiration: 3600\n  cache:\n    home: [featured, latest]\n",
      BASE
    );
    let config = Config::from_yaml(&yaml).unwrap();
    let cache = config.cache.as_ref().unwrap();

    assert!(config.is_cache_active());
    assert_eq!(cache.backend, BackendKind::FragmentCaching);
    assert_eq!(cache.expiration(), chrono::Duration::hours(1));
    assert!(config.should_fragment_cache("home", "featured"));
    assert!(config.should_fragment_cache("home", "latest"));
    assert!(!config.should_fragment_cache("home", "sidebar"));
    assert!(!config.should_fragment_cache("news", "featured"));
  }

  #[test]
  fn test_unknown_backend_parses() {
    let yaml = format!("{}cache:\n  type: memcached\n  expiration: 60\n", BASE);
    let config = Config::from_yaml(&yaml).unwrap();
    assert_eq!(config.cache.unwrap().backend, BackendKind::Unknown);
  }
}
