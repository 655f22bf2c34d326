//! SpaceNotes Core Synchronization Layer
//!
//! This crate turns a flat, owner-scoped document collection into a
//! navigable space hierarchy, keeps it current from live store
//! subscriptions, and composes search results from two independent live
//! queries.
//!
//! # Architecture
//!
//! - **Injected collaborators**: the document store and identity provider are
//!   traits passed to every service; nothing is global
//! - **Full snapshots**: every live push replaces the previous result set
//! - **Explicit teardown**: every subscription can be unsubscribed and is
//!   unsubscribed on drop
//!
//! # Modules
//!
//! - [`models`] - Data structures (Space, Item, TreeNode, SearchResult)
//! - [`auth`] - Identity provider abstraction
//! - [`db`] - Document store abstraction and in-memory store
//! - [`services`] - Repositories, tree builder and search aggregator
//! - [`config`] - Runtime configuration
//! - [`logging`] - Tracing subscriber setup for host binaries

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::CoreConfig;
pub use models::*;
pub use services::*;
