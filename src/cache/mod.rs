//! Fragment caching for curated sections.
//!
//! This module provides:
//! - Deterministic fragment keys per group/section/template/params
//! - A durable registry of the keys generated for each group/section
//! - Invalidation strategies for the configured cache backend
//! - SQLite and no-op storage for options and fragments

mod fragment;
pub mod invalidation;
mod registry;
mod storage;
mod traits;

pub use fragment::{compute_key, FragmentCache};
pub use registry::KeyRegistry;
pub use storage::{NoopStorage, SqliteStorage};
pub use traits::{FragmentStore, OptionStore, SiteCache};
