//! Space page composition
//!
//! A space page shows its child spaces when it has any. A leaf space shows
//! its items instead: a flat list for plain spaces, date groups for dated
//! ones.

use crate::models::{DateGroup, Item, Space, SpaceTemplate};
use crate::services::item_repository::group_by_date;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "entries", rename_all = "camelCase")]
pub enum SpaceLayout {
    /// Navigation list of child spaces
    Children(Vec<Space>),
    /// Flat item list in subscription order
    Plain(Vec<Item>),
    /// Items grouped by date, most recent first
    Dated(Vec<DateGroup>),
}

impl SpaceLayout {
    /// Derive the layout from the latest snapshots of a space page
    pub fn derive(template: SpaceTemplate, children: &[Space], items: &[Item]) -> Self {
        if !children.is_empty() {
            return SpaceLayout::Children(children.to_vec());
        }
        match template {
            SpaceTemplate::Plain => SpaceLayout::Plain(items.to_vec()),
            SpaceTemplate::Dated => SpaceLayout::Dated(group_by_date(items)),
        }
    }

    /// Whether the page accepts new items
    pub fn accepts_items(&self) -> bool {
        !matches!(self, SpaceLayout::Children(_))
    }
}
