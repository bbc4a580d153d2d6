//! Displaying a curated section, through the fragment cache when configured.

use std::io::Write;

use chrono::Local;
use color_eyre::{eyre::eyre, Result};
use tracing::{debug, info};

use crate::cache::{compute_key, FragmentCache, FragmentStore, KeyRegistry, OptionStore};
use crate::config::CacheConfig;
use crate::posts::{get_posts_section, PostSource, QueryParams};
use crate::render::{Renderer, TemplateSpec};

/// How a section request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
  /// No curated list for the group/section, nothing written
  NoSection,
  /// Rendered without the fragment cache
  Direct,
  /// Rendered, registered and stored under `key`
  Stored { key: String },
  /// Emitted from the fragment cache
  ServedFromCache { key: String },
}

/// Everything a section display needs, passed in explicitly.
pub struct SectionDisplay<'a, P: PostSource + ?Sized, S: OptionStore + FragmentStore> {
  pub cache: Option<&'a CacheConfig>,
  pub source: &'a P,
  pub renderer: &'a Renderer<'a>,
  pub storage: &'a S,
}

impl<P: PostSource + ?Sized, S: OptionStore + FragmentStore> SectionDisplay<'_, P, S> {
  /// Write the posts of group/section rendered with `template` to `out`.
  pub fn show_posts_section<W: Write>(
    &self,
    group: &str,
    section: &str,
    template: &TemplateSpec,
    params: &QueryParams,
    out: &mut W,
  ) -> Result<RenderOutcome> {
    let Some(posts) = get_posts_section(self.source, group, section, params) else {
      debug!(group, section, "no curated list, nothing to show");
      return Ok(RenderOutcome::NoSection);
    };

    let cache = match self.cache {
      Some(cache) if cache.should_fragment_cache(group, section) => cache,
      _ => {
        let html = self.renderer.show_posts(&posts, template)?;
        write_html(out, &html)?;
        return Ok(RenderOutcome::Direct);
      }
    };

    let fragments = FragmentCache::new(self.storage, cache.expiration());
    let key = compute_key(group, section, template, params)?;

    if fragments.try_output(&key, out)? {
      debug!(group, section, key = %key, "served from fragment cache");
      return Ok(RenderOutcome::ServedFromCache { key });
    }

    let body = self.renderer.show_posts(&posts, template)?;
    let html = format!(
      "<!-- Started CPN Fragment Cache block {} -->\n{}\n<!-- End CPN Fragment Cache block -->",
      Local::now().format("%Y-%m-%d %H:%M:%S"),
      body
    );
    write_html(out, &html)?;

    KeyRegistry::new(self.storage).add_key(group, section, &key);
    fragments.store(&key, &html);
    info!(group, section, key = %key, "fragment stored");

    Ok(RenderOutcome::Stored { key })
  }
}

fn write_html<W: Write>(out: &mut W, html: &str) -> Result<()> {
  out
    .write_all(html.as_bytes())
    .map_err(|e| eyre!("Failed to write section output: {}", e))
}
