//! The network: sites, their posts and the curated section lists.

use std::collections::BTreeMap;
use std::path::Path;

use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use tracing::warn;
use url::Url;

use super::types::{Post, PostsList, Site};

/// Where curated lists come from.
pub trait PostSource {
  /// The list stored for group/section, `None` if there is none.
  fn get_posts_list(&self, group: &str, section: &str) -> Option<PostsList>;
}

/// Network description loaded from YAML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Network {
  #[serde(default)]
  pub sites: Vec<Site>,
  /// group -> section -> curated list, parsed on lookup
  #[serde(default)]
  pub sections: BTreeMap<String, BTreeMap<String, serde_yaml::Value>>,
}

impl Network {
  pub fn load(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read network file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse network file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))
  }

  pub fn site(&self, site_id: u64) -> Option<&Site> {
    self.sites.iter().find(|s| s.id == site_id)
  }

  pub fn post(&self, site_id: u64, post_id: u64) -> Option<&Post> {
    self
      .site(site_id)
      .and_then(|site| site.posts.iter().find(|p| p.id == post_id))
  }

  /// URL of the site living at `{subdomain}.{network host}`, or `#` if there is none.
  pub fn site_url(&self, subdomain: &str, network_url: &str) -> String {
    let Some(host) = network_host(network_url) else {
      return "#".to_string();
    };

    let domain = format!("{}.{}", subdomain, host);
    match self.sites.iter().find(|s| s.domain == domain) {
      Some(site) => format!("http://{}", site.domain),
      None => "#".to_string(),
    }
  }
}

impl PostSource for Network {
  fn get_posts_list(&self, group: &str, section: &str) -> Option<PostsList> {
    let raw = self.sections.get(group)?.get(section)?;
    match PostsList::from_value(raw) {
      Ok(list) => Some(list),
      Err(e) => {
        warn!(group, section, error = %e, "malformed curated list");
        Some(PostsList::default())
      }
    }
  }
}

/// Host of the network URL without a leading `www.`.
fn network_host(network_url: &str) -> Option<String> {
  let url = Url::parse(network_url)
    .or_else(|_| Url::parse(&format!("http://{}", network_url)))
    .ok()?;
  let host = url.host_str()?;
  Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}
