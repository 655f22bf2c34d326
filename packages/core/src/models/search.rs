use serde::{Deserialize, Serialize};

/// A single search hit.
///
/// Serialized internally tagged so the view layer can switch on `type`:
/// `{"type":"space","spaceId":"...","title":"..."}` or
/// `{"type":"item","spaceId":"...","text":"...","date":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SearchResult {
    #[serde(rename = "space", rename_all = "camelCase")]
    Space { space_id: String, title: String },

    #[serde(rename = "item", rename_all = "camelCase")]
    Item {
        space_id: String,
        text: String,
        date: String,
    },
}

impl SearchResult {
    /// Space to navigate to when the result is selected
    pub fn space_id(&self) -> &str {
        match self {
            SearchResult::Space { space_id, .. } | SearchResult::Item { space_id, .. } => space_id,
        }
    }

    pub fn is_space(&self) -> bool {
        matches!(self, SearchResult::Space { .. })
    }
}
