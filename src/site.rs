//! Multisite context switching.

use std::cell::RefCell;

use color_eyre::{eyre::eyre, Result};

use crate::posts::{Network, Site};

/// Tracks which site is active while rendering.
///
/// `enter` pushes a site and returns a scope that pops it again when dropped,
/// so the previous site is restored on every exit path.
pub struct SiteSwitcher<'a> {
  network: &'a Network,
  stack: RefCell<Vec<u64>>,
}

impl<'a> SiteSwitcher<'a> {
  pub fn new(network: &'a Network) -> Self {
    Self {
      network,
      stack: RefCell::new(Vec::new()),
    }
  }

  /// Currently active site, if any.
  #[cfg(test)]
  pub fn current(&self) -> Option<&'a Site> {
    let id = *self.stack.borrow().last()?;
    self.network.site(id)
  }

  #[cfg(test)]
  pub fn depth(&self) -> usize {
    self.stack.borrow().len()
  }

  pub fn enter(&self, site_id: u64) -> Result<SiteScope<'_, 'a>> {
    let site = self
      .network
      .site(site_id)
      .ok_or_else(|| eyre!("Failed to switch to site {}: no such site", site_id))?;

    self.stack.borrow_mut().push(site_id);
    tracing::trace!(site_id, "entered site");
    Ok(SiteScope {
      switcher: self,
      site,
    })
  }
}

/// An entered site; leaving happens on drop.
pub struct SiteScope<'s, 'a> {
  switcher: &'s SiteSwitcher<'a>,
  site: &'a Site,
}

impl<'a> SiteScope<'_, 'a> {
  pub fn site(&self) -> &'a Site {
    self.site
  }
}

impl Drop for SiteScope<'_, '_> {
  fn drop(&mut self) {
    self.switcher.stack.borrow_mut().pop();
    tracing::trace!(site_id = self.site.id, "left site");
  }
}
