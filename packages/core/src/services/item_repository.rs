//! Item Repository
//!
//! Owner-scoped access to the `spaces/{id}/items` sub-collections. The
//! repository owns template consistency: an item added to a plain space is
//! always stored with an empty date, whatever the caller passed, and an item
//! added to a dated space must carry a valid `YYYY-MM-DD` date.

use crate::auth::{IdentityProvider, UserId};
use crate::config::CoreConfig;
use crate::db::{CollectionPath, DocumentStore, Query, StoreError};
use crate::models::{
    collections, fields, DateGroup, Item, NewItem, SpaceTemplate, ValidationError,
    ITEM_DATE_FORMAT,
};
use crate::services::error::RepositoryError;
use crate::services::live_query::LiveQuery;
use crate::services::space_repository::SpaceRepository;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct ItemRepository {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    spaces: SpaceRepository,
}

impl ItemRepository {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self::with_config(store, identity, &CoreConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        config: &CoreConfig,
    ) -> Self {
        let spaces = SpaceRepository::with_config(store.clone(), identity.clone(), config);
        Self {
            store,
            identity,
            spaces,
        }
    }

    /// `spaces/{space_id}/items`
    pub fn collection(space_id: &str) -> Result<CollectionPath, StoreError> {
        SpaceRepository::collection().child(space_id, collections::ITEMS)
    }

    fn owner(&self) -> Result<UserId, RepositoryError> {
        self.identity
            .current_user()
            .map(|user| user.id)
            .ok_or(RepositoryError::Unauthenticated)
    }

    /// Subscribe to the owner's items of one space.
    ///
    /// With `date`, only items stored with exactly that date are included.
    pub async fn subscribe(
        &self,
        space_id: &str,
        date: Option<&str>,
    ) -> Result<LiveQuery<Item>, RepositoryError> {
        let owner = self.owner()?;
        let mut query =
            Query::collection(Self::collection(space_id)?).where_eq(fields::OWNER_ID, owner.as_str());
        if let Some(date) = date {
            query = query.where_eq(fields::DATE, date);
        }

        debug!(owner = %owner, space = space_id, date, "Subscribing to items");
        let subscription = self.store.subscribe(query).await?;
        Ok(LiveQuery::new(subscription, Item::from_document))
    }

    /// Add an item to an owned space.
    ///
    /// - plain space: stored with `date = ""`
    /// - dated space: stored with the supplied date verbatim; a missing or
    ///   malformed date is rejected
    pub async fn add_item(&self, space_id: &str, new_item: NewItem) -> Result<Item, RepositoryError> {
        let owner = self.owner()?;
        let text = new_item.text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyText.into());
        }

        let space = self
            .spaces
            .get_space(space_id)
            .await?
            .ok_or_else(|| RepositoryError::space_not_found(space_id))?;

        let date = match space.template {
            SpaceTemplate::Plain => String::new(),
            SpaceTemplate::Dated => {
                let date = new_item.date.ok_or_else(|| ValidationError::MissingDate {
                    space_id: space_id.to_string(),
                })?;
                if !is_canonical_date(&date) {
                    return Err(ValidationError::InvalidDate(date).into());
                }
                date
            }
        };

        let mut data = Map::new();
        data.insert(fields::TEXT.to_string(), Value::from(text));
        data.insert(fields::DATE.to_string(), Value::from(date));
        data.insert(fields::OWNER_ID.to_string(), Value::from(owner.as_str()));

        let document = self.store.create(&Self::collection(space_id)?, data).await?;
        info!(id = %document.id, space = space_id, template = %space.template, "Item added");
        Item::from_document(&document).map_err(|e| StoreError::from(e).into())
    }

    /// Delete one item; deleting a missing item succeeds. Another owner's
    /// item counts as missing and is left untouched.
    pub async fn delete_item(&self, space_id: &str, item_id: &str) -> Result<(), RepositoryError> {
        let owner = self.owner()?;
        let collection = Self::collection(space_id)?;
        if let Some(document) = self.store.get(&collection, item_id).await? {
            if document.field(fields::OWNER_ID).as_str() != Some(owner.as_str()) {
                warn!(id = item_id, owner = %owner, "Refusing to delete another owner's item");
                return Ok(());
            }
        }
        let removed = self.store.delete(&collection, item_id).await?;
        info!(id = item_id, space = space_id, removed, "Item deleted");
        Ok(())
    }
}

/// Zero-padded `YYYY-MM-DD` only. Dates are stored verbatim and grouped by
/// string order, so `2024-1-5` must not slip through chrono's lenient parse.
fn is_canonical_date(date: &str) -> bool {
    NaiveDate::parse_from_str(date, ITEM_DATE_FORMAT)
        .map(|parsed| parsed.format(ITEM_DATE_FORMAT).to_string() == date)
        .unwrap_or(false)
}

/// Partition items by date.
///
/// Groups are ordered by date descending (most recent first); items inside a
/// group keep their input order. Items with an empty date form the last group.
pub fn group_by_date(items: &[Item]) -> Vec<DateGroup> {
    let mut groups: BTreeMap<&str, Vec<Item>> = BTreeMap::new();
    for item in items {
        groups.entry(item.date.as_str()).or_default().push(item.clone());
    }

    groups
        .into_iter()
        .rev()
        .map(|(date, items)| DateGroup {
            date: date.to_string(),
            items,
        })
        .collect()
}
