//! Data Models
//!
//! This module contains the core data structures used throughout SpaceNotes:
//!
//! - `Space` - Hierarchical container owned by a single user
//! - `Item` - Text entry stored under a space, optionally dated
//! - `TreeNode` - Derived, non-persistent hierarchy node
//! - `SearchResult` - Tagged search hit (space or item)
//!
//! Persisted models are decoded from store documents; derived models are
//! rebuilt from live snapshots and never written back.

mod item;
mod search;
mod space;
mod tree;
mod validation;

pub use item::{DateGroup, Item, NewItem};
pub(crate) use item::ITEM_DATE_FORMAT;
pub use search::SearchResult;
pub use space::{NewSpace, Space, SpaceTemplate};
pub use tree::{forest_size, TreeNode};
pub use validation::ValidationError;

/// Persisted field names shared by the repositories and the search aggregator.
pub(crate) mod fields {
    pub const OWNER_ID: &str = "ownerId";
    pub const PARENT_ID: &str = "parentId";
    pub const TITLE: &str = "title";
    pub const TEMPLATE: &str = "template";
    pub const TEXT: &str = "text";
    pub const DATE: &str = "date";
}

/// Collection names of the persisted record layout.
pub(crate) mod collections {
    pub const SPACES: &str = "spaces";
    pub const ITEMS: &str = "items";
}
