//! Space Data Structures
//!
//! A space is a hierarchical container. Spaces form a forest through the
//! optional `parent_id` reference; the store does not enforce that the parent
//! exists, so readers must tolerate dangling references (see
//! [`crate::services::tree_builder`]).
//!
//! # Examples
//!
//! ```rust
//! use spacenotes_core::models::{NewSpace, SpaceTemplate};
//!
//! let journal = NewSpace::root("Journal", SpaceTemplate::Dated);
//! let groceries = NewSpace::child("Groceries", "space-123", SpaceTemplate::Plain);
//!
//! assert!(journal.parent_id.is_none());
//! assert_eq!(groceries.parent_id.as_deref(), Some("space-123"));
//! ```

use crate::db::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-space display and storage mode for items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceTemplate {
    /// Items carry a date and are grouped by it
    #[default]
    Dated,
    /// Items form a flat list and are stored with an empty date
    Plain,
}

impl SpaceTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceTemplate::Dated => "dated",
            SpaceTemplate::Plain => "plain",
        }
    }
}

impl fmt::Display for SpaceTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpaceTemplate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dated" => Ok(SpaceTemplate::Dated),
            "plain" => Ok(SpaceTemplate::Plain),
            other => Err(format!("unknown space template '{}'", other)),
        }
    }
}

/// A space as seen by consumers of the repositories.
///
/// # Fields
///
/// - `id`: Store-generated document id
/// - `title`: Display title (non-empty for spaces created through the repository)
/// - `parent_id`: Optional parent space; `None` means the space is a root
/// - `owner_id`: Opaque id of the owning user
/// - `template`: Item mode, see [`SpaceTemplate`]
/// - `created_at` / `updated_at`: Assigned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: String,
    pub title: String,
    pub parent_id: Option<String>,
    pub owner_id: String,
    pub template: SpaceTemplate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored body of a space document
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpaceRecord {
    title: String,
    #[serde(default)]
    parent_id: Option<String>,
    owner_id: String,
    #[serde(default)]
    template: Option<SpaceTemplate>,
}

impl Space {
    /// Decode a space from a store document.
    ///
    /// Documents written before templates existed have no `template` field;
    /// they are read with `default_template`.
    pub fn from_document(
        document: &Document,
        default_template: SpaceTemplate,
    ) -> Result<Self, serde_json::Error> {
        let record: SpaceRecord = document.decode()?;
        Ok(Space {
            id: document.id.clone(),
            title: record.title,
            parent_id: record.parent_id,
            owner_id: record.owner_id,
            template: record.template.unwrap_or(default_template),
            created_at: document.created_at,
            updated_at: document.updated_at,
        })
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Parameters for creating a space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSpace {
    pub title: String,
    pub parent_id: Option<String>,
    pub template: SpaceTemplate,
}

impl NewSpace {
    pub fn root(title: impl Into<String>, template: SpaceTemplate) -> Self {
        Self {
            title: title.into(),
            parent_id: None,
            template,
        }
    }

    pub fn child(
        title: impl Into<String>,
        parent_id: impl Into<String>,
        template: SpaceTemplate,
    ) -> Self {
        Self {
            title: title.into(),
            parent_id: Some(parent_id.into()),
            template,
        }
    }
}
