//! Template lookup and execution.

use std::path::{Path, PathBuf};

use color_eyre::{eyre::eyre, Result};
use handlebars::Handlebars;
use serde::Serialize;

/// File extension of section templates.
pub const TEMPLATE_EXT: &str = "hbs";

/// Handlebars templates found on a search path (child theme first).
pub struct Templates {
  dirs: Vec<PathBuf>,
  handlebars: Handlebars<'static>,
}

impl Templates {
  pub fn new(dirs: Vec<PathBuf>) -> Self {
    Self {
      dirs,
      handlebars: Handlebars::new(),
    }
  }

  /// First file called `name` on the search path.
  pub fn locate(&self, name: &str) -> Option<PathBuf> {
    self
      .dirs
      .iter()
      .map(|dir| dir.join(name))
      .find(|path| path.is_file())
  }

  /// Render the template at `path` with `data` as its context.
  pub fn execute<T: Serialize>(&self, path: &Path, data: &T) -> Result<String> {
    let source = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read template {}: {}", path.display(), e))?;

    self
      .handlebars
      .render_template(&source, data)
      .map_err(|e| eyre!("Failed to render template {}: {}", path.display(), e))
  }
}
