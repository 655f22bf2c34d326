//! Business Services
//!
//! This module contains the core synchronization logic:
//!
//! - `SpaceRepository` - Owner-scoped space subscriptions, creation and deletion
//! - `ItemRepository` - Per-space item subscriptions and template-gated writes
//! - `build_forest` - Pure tree composition over the flat space list
//! - `SearchAggregator` - Merges two live result streams into one result list
//! - `SpaceLayout` - What a space page shows for its latest snapshots
//!
//! Services receive the document store and identity provider explicitly;
//! there are no process-wide singletons.

pub mod error;
pub mod item_repository;
pub mod live_query;
pub mod search_aggregator;
pub mod space_repository;
pub mod space_view;
pub mod tree_builder;

pub use error::RepositoryError;
pub use item_repository::{group_by_date, ItemRepository};
pub use live_query::LiveQuery;
pub use search_aggregator::{SearchAggregator, SearchState};
pub use space_repository::{SpaceFilter, SpaceRepository};
pub use space_view::SpaceLayout;
pub use tree_builder::build_forest;
