//! Rendering curated posts through site templates.

use color_eyre::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::posts::{Network, SectionPost};
use crate::site::SiteSwitcher;
use crate::template::{Templates, TEMPLATE_EXT};

/// Which template renders each post: `slug[-name].hbs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSpec {
  pub slug: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
}

impl TemplateSpec {
  pub fn new(slug: impl Into<String>, name: Option<String>) -> Self {
    Self {
      slug: slug.into(),
      name: name.filter(|n| !n.is_empty()),
    }
  }

  pub fn file_name(&self) -> String {
    match self.name.as_deref() {
      Some(name) if !name.is_empty() => format!("{}-{}.{}", self.slug, name, TEMPLATE_EXT),
      _ => format!("{}.{}", self.slug, TEMPLATE_EXT),
    }
  }
}

/// Renders posts, switching to each post's site for the duration of its template.
pub struct Renderer<'a> {
  network: &'a Network,
  templates: &'a Templates,
  sites: SiteSwitcher<'a>,
}

impl<'a> Renderer<'a> {
  pub fn new(network: &'a Network, templates: &'a Templates) -> Self {
    Self {
      network,
      templates,
      sites: SiteSwitcher::new(network),
    }
  }

  #[cfg(test)]
  pub fn sites(&self) -> &SiteSwitcher<'a> {
    &self.sites
  }

  /// Render every post with `template` into one string.
  ///
  /// Posts or templates that don't exist render nothing; unknown sites and
  /// template errors abort the whole render.
  pub fn show_posts(&self, posts: &[SectionPost], template: &TemplateSpec) -> Result<String> {
    let file_name = template.file_name();
    let mut html = String::new();

    for entry in posts {
      let scope = self.sites.enter(entry.post.site_id)?;
      let site = scope.site();

      let Some(post) = self.network.post(site.id, entry.post.post_id) else {
        warn!(site_id = site.id, post_id = entry.post.post_id, "post not found, skipping");
        continue;
      };

      let Some(path) = self.templates.locate(&file_name) else {
        warn!(template = %file_name, "template not found, skipping");
        continue;
      };

      let context = json!({
        "post": post,
        "site": {
          "id": site.id,
          "name": site.name,
          "domain": site.domain,
          "url": format!("http://{}", site.domain),
        },
        "meta": entry.post.meta,
        "position": entry.position,
      });

      html.push_str(&self.templates.execute(&path, &context)?);
    }

    Ok(html)
  }
}
