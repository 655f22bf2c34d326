//! Space Repository
//!
//! Owner-scoped access to the `spaces` collection:
//!
//! - live subscriptions over all spaces, root spaces, or children of a space
//! - a live view of a single space's metadata
//! - creation and non-cascading deletion
//!
//! The owner is resolved from the injected identity provider on every call;
//! without a signed-in user every operation fails with `Unauthenticated`.

use crate::auth::{IdentityProvider, UserId};
use crate::config::CoreConfig;
use crate::db::{CollectionPath, DocumentStore, Query};
use crate::models::{collections, fields, NewSpace, Space, SpaceTemplate, ValidationError};
use crate::services::error::RepositoryError;
use crate::services::live_query::LiveQuery;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which spaces a subscription covers (always within the owner's spaces)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpaceFilter {
    /// Every space of the owner; feeds the tree builder
    All,
    /// Spaces whose `parentId` is null
    Roots,
    /// Spaces whose `parentId` equals the given id
    ChildrenOf(String),
}

#[derive(Clone)]
pub struct SpaceRepository {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    default_template: SpaceTemplate,
}

impl SpaceRepository {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self::with_config(store, identity, &CoreConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        config: &CoreConfig,
    ) -> Self {
        Self {
            store,
            identity,
            default_template: config.default_template,
        }
    }

    pub fn collection() -> CollectionPath {
        CollectionPath::root(collections::SPACES)
    }

    fn owner(&self) -> Result<UserId, RepositoryError> {
        self.identity
            .current_user()
            .map(|user| user.id)
            .ok_or(RepositoryError::Unauthenticated)
    }

    fn owned_query(owner: &UserId) -> Query {
        Query::collection(Self::collection()).where_eq(fields::OWNER_ID, owner.as_str())
    }

    fn live(&self, subscription: crate::db::Subscription) -> LiveQuery<Space> {
        let default_template = self.default_template;
        LiveQuery::new(subscription, move |document| {
            Space::from_document(document, default_template)
        })
    }

    /// Subscribe to the owner's spaces matching `filter`
    pub async fn subscribe(&self, filter: SpaceFilter) -> Result<LiveQuery<Space>, RepositoryError> {
        let owner = self.owner()?;
        let query = match &filter {
            SpaceFilter::All => Self::owned_query(&owner),
            SpaceFilter::Roots => Self::owned_query(&owner).where_eq(fields::PARENT_ID, Value::Null),
            SpaceFilter::ChildrenOf(parent_id) => {
                Self::owned_query(&owner).where_eq(fields::PARENT_ID, parent_id.as_str())
            }
        };

        debug!(owner = %owner, ?filter, "Subscribing to spaces");
        let subscription = self.store.subscribe(query).await?;
        Ok(self.live(subscription))
    }

    /// Live metadata of one space; each snapshot holds zero or one space
    pub async fn watch_space(&self, space_id: &str) -> Result<LiveQuery<Space>, RepositoryError> {
        let owner = self.owner()?;
        let query = Self::owned_query(&owner).with_document_id(space_id);
        let subscription = self.store.subscribe(query).await?;
        Ok(self.live(subscription))
    }

    /// One-shot lookup of an owned space
    pub async fn get_space(&self, space_id: &str) -> Result<Option<Space>, RepositoryError> {
        let owner = self.owner()?;
        let Some(document) = self.store.get(&Self::collection(), space_id).await? else {
            return Ok(None);
        };
        let space = Space::from_document(&document, self.default_template)
            .map_err(crate::db::StoreError::from)?;
        Ok((space.owner_id == owner.as_str()).then_some(space))
    }

    /// Create a space owned by the signed-in user
    ///
    /// The title is trimmed and must not be empty. The parent is not checked
    /// for existence; a dangling parent simply renders as a root.
    pub async fn create_space(&self, new_space: NewSpace) -> Result<Space, RepositoryError> {
        let owner = self.owner()?;
        let title = new_space.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }

        let mut data = Map::new();
        data.insert(fields::TITLE.to_string(), Value::from(title));
        data.insert(
            fields::PARENT_ID.to_string(),
            new_space.parent_id.clone().map_or(Value::Null, Value::from),
        );
        data.insert(fields::OWNER_ID.to_string(), Value::from(owner.as_str()));
        data.insert(
            fields::TEMPLATE.to_string(),
            Value::from(new_space.template.as_str()),
        );

        let document = self.store.create(&Self::collection(), data).await?;
        info!(
            id = %document.id,
            owner = %owner,
            template = %new_space.template,
            "Space created"
        );
        Space::from_document(&document, self.default_template)
            .map_err(|e| crate::db::StoreError::from(e).into())
    }

    /// Delete one space. Children and items are left in place; deleting a
    /// missing space succeeds. Another owner's space counts as missing and
    /// is left untouched.
    pub async fn delete_space(&self, space_id: &str) -> Result<(), RepositoryError> {
        let owner = self.owner()?;
        let collection = Self::collection();
        if let Some(document) = self.store.get(&collection, space_id).await? {
            if document.field(fields::OWNER_ID).as_str() != Some(owner.as_str()) {
                warn!(id = space_id, owner = %owner, "Refusing to delete another owner's space");
                return Ok(());
            }
        }
        let removed = self.store.delete(&collection, space_id).await?;
        info!(id = space_id, owner = %owner, removed, "Space deleted");
        Ok(())
    }
}
