//! Posts of the network and the curated section lists.

mod query;
mod source;
mod types;

pub use query::{get_posts_section, QueryParams, SectionPost};
pub use source::{Network, PostSource};
pub use types::Site;

#[cfg(test)]
pub use types::PostRef;
