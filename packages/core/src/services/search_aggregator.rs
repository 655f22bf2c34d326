//! Search Aggregator
//!
//! Composes search results from two independent live queries over the
//! owner's data: all spaces, and the `items` collection group across every
//! space. Matching is a case-insensitive substring test against space titles
//! and item texts, evaluated client-side on every push.
//!
//! # Merge Rules
//!
//! - A push from one stream re-filters that stream's full snapshot only
//! - The other stream's last matches are kept as they are
//! - Published results are space matches followed by item matches
//!
//! # Lifecycle
//!
//! An empty (or whitespace-only) term holds no subscriptions at all. Changing
//! the term tears both subscriptions down before new ones are opened, and a
//! torn-down driver can never publish again.

use crate::auth::IdentityProvider;
use crate::config::CoreConfig;
use crate::db::{DocumentStore, Query, SubscriptionHandle};
use crate::models::{collections, fields, Item, SearchResult, Space, SpaceTemplate};
use crate::services::error::RepositoryError;
use crate::services::live_query::LiveQuery;
use crate::services::space_repository::SpaceRepository;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Pure merge state of one search term
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    needle: String,
    space_matches: Vec<SearchResult>,
    item_matches: Vec<SearchResult>,
}

impl SearchState {
    pub fn new(term: &str) -> Self {
        Self {
            needle: term.to_lowercase(),
            space_matches: Vec::new(),
            item_matches: Vec::new(),
        }
    }

    fn is_match(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.needle)
    }

    /// Replace the space matches from a full spaces snapshot
    pub fn apply_spaces(&mut self, spaces: &[Space]) {
        self.space_matches = spaces
            .iter()
            .filter(|space| self.is_match(&space.title))
            .map(|space| SearchResult::Space {
                space_id: space.id.clone(),
                title: space.title.clone(),
            })
            .collect();
    }

    /// Replace the item matches from a full items snapshot
    pub fn apply_items(&mut self, items: &[Item]) {
        self.item_matches = items
            .iter()
            .filter(|item| self.is_match(&item.text))
            .map(|item| SearchResult::Item {
                space_id: item.space_id.clone(),
                text: item.text.clone(),
                date: item.date.clone(),
            })
            .collect();
    }

    /// Space matches followed by item matches
    pub fn results(&self) -> Vec<SearchResult> {
        self.space_matches
            .iter()
            .chain(self.item_matches.iter())
            .cloned()
            .collect()
    }
}

/// Subscriptions and driver task of the current non-empty term
struct ActiveSearch {
    handles: Vec<SubscriptionHandle>,
    driver: JoinHandle<()>,
}

impl ActiveSearch {
    fn shutdown(self) {
        for handle in &self.handles {
            handle.unsubscribe();
        }
        self.driver.abort();
    }
}

pub struct SearchAggregator {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    default_template: SpaceTemplate,
    term: String,
    results: watch::Sender<Vec<SearchResult>>,
    generation: Arc<AtomicU64>,
    active: Option<ActiveSearch>,
}

impl SearchAggregator {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self::with_config(store, identity, &CoreConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        config: &CoreConfig,
    ) -> Self {
        let (results, _) = watch::channel(Vec::new());
        Self {
            store,
            identity,
            default_template: config.default_template,
            term: String::new(),
            results,
            generation: Arc::new(AtomicU64::new(0)),
            active: None,
        }
    }

    /// Receiver notified on every published result list
    pub fn results(&self) -> watch::Receiver<Vec<SearchResult>> {
        self.results.subscribe()
    }

    pub fn current_results(&self) -> Vec<SearchResult> {
        self.results.borrow().clone()
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Whether live subscriptions are currently held
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Switch to a new search term.
    ///
    /// Always tears down the previous subscriptions and resets the results.
    /// A blank term stops there; otherwise two fresh owner-scoped
    /// subscriptions are opened and filtered with the new term.
    pub async fn set_term(&mut self, term: &str) -> Result<(), RepositoryError> {
        self.teardown();
        self.term = term.to_string();
        self.results.send_replace(Vec::new());

        if term.trim().is_empty() {
            debug!("Search term cleared");
            return Ok(());
        }

        let owner = self
            .identity
            .current_user()
            .map(|user| user.id)
            .ok_or(RepositoryError::Unauthenticated)?;

        let spaces_query = Query::collection(SpaceRepository::collection())
            .where_eq(fields::OWNER_ID, owner.as_str());
        let items_query = Query::group(collections::ITEMS).where_eq(fields::OWNER_ID, owner.as_str());

        let default_template = self.default_template;
        let spaces = LiveQuery::new(self.store.subscribe(spaces_query).await?, move |document| {
            Space::from_document(document, default_template)
        });
        let items = LiveQuery::new(self.store.subscribe(items_query).await?, Item::from_document);

        let handles = vec![spaces.handle(), items.handle()];
        let generation = self.generation.load(Ordering::SeqCst);
        let driver = tokio::spawn(drive(
            spaces,
            items,
            SearchState::new(term),
            self.results.clone(),
            self.generation.clone(),
            generation,
        ));

        info!(owner = %owner, term, "Search started");
        self.active = Some(ActiveSearch { handles, driver });
        Ok(())
    }

    /// Equivalent to `set_term("")`
    pub fn clear(&mut self) {
        self.teardown();
        self.term.clear();
        self.results.send_replace(Vec::new());
    }

    fn teardown(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(active) = self.active.take() {
            debug!("Tearing down search subscriptions");
            active.shutdown();
        }
    }
}

impl Drop for SearchAggregator {
    fn drop(&mut self) {
        self.teardown();
    }
}

enum Push {
    Spaces(Option<Result<Vec<Space>, RepositoryError>>),
    Items(Option<Result<Vec<Item>, RepositoryError>>),
}

/// Merge pushes from both streams until both have ended or the search is
/// superseded.
async fn drive(
    mut spaces: LiveQuery<Space>,
    mut items: LiveQuery<Item>,
    mut state: SearchState,
    results: watch::Sender<Vec<SearchResult>>,
    generation: Arc<AtomicU64>,
    mine: u64,
) {
    let mut spaces_open = true;
    let mut items_open = true;

    while spaces_open || items_open {
        let push = tokio::select! {
            push = spaces.next(), if spaces_open => Push::Spaces(push),
            push = items.next(), if items_open => Push::Items(push),
        };

        match push {
            Push::Spaces(Some(Ok(snapshot))) => state.apply_spaces(&snapshot),
            Push::Items(Some(Ok(snapshot))) => state.apply_items(&snapshot),
            Push::Spaces(Some(Err(e))) => {
                warn!("Search spaces listener error: {}", e);
                spaces_open = false;
                continue;
            }
            Push::Items(Some(Err(e))) => {
                warn!("Search items listener error: {}", e);
                items_open = false;
                continue;
            }
            Push::Spaces(None) => {
                spaces_open = false;
                continue;
            }
            Push::Items(None) => {
                items_open = false;
                continue;
            }
        }

        // Checked under the watch lock: a teardown either happens before this
        // check or its reset overwrites this publish.
        let published = results.send_if_modified(|current| {
            if generation.load(Ordering::SeqCst) != mine {
                return false;
            }
            *current = state.results();
            true
        });
        if !published {
            break;
        }
    }
    debug!("Search driver finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn space(id: &str, title: &str) -> Space {
        let now = Utc::now();
        Space {
            id: id.to_string(),
            title: title.to_string(),
            parent_id: None,
            owner_id: "user-1".to_string(),
            template: SpaceTemplate::Plain,
            created_at: now,
            updated_at: now,
        }
    }

    fn item(space_id: &str, text: &str) -> Item {
        let now = Utc::now();
        Item {
            id: format!("{}-{}", space_id, text),
            space_id: space_id.to_string(),
            text: text.to_string(),
            date: String::new(),
            owner_id: "user-1".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_matching_is_case_insensitive_substring() {
        let mut state = SearchState::new("MiLk");
        state.apply_spaces(&[space("s1", "Milk run"), space("s2", "Bread")]);
        state.apply_items(&[item("s2", "buy milk"), item("s2", "buy eggs")]);

        assert_eq!(
            state.results(),
            vec![
                SearchResult::Space {
                    space_id: "s1".to_string(),
                    title: "Milk run".to_string()
                },
                SearchResult::Item {
                    space_id: "s2".to_string(),
                    text: "buy milk".to_string(),
                    date: String::new()
                },
            ]
        );
    }

    #[test]
    fn test_item_push_leaves_space_matches_untouched() {
        let mut state = SearchState::new("a");
        state.apply_spaces(&[space("s1", "Alpha")]);
        state.apply_items(&[item("s1", "apple")]);

        state.apply_items(&[item("s1", "banana"), item("s1", "cherry")]);

        let results = state.results();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_space());
        assert_eq!(
            results[1],
            SearchResult::Item {
                space_id: "s1".to_string(),
                text: "banana".to_string(),
                date: String::new()
            }
        );
    }

    #[test]
    fn test_spaces_always_precede_items() {
        let mut state = SearchState::new("x");
        state.apply_items(&[item("s1", "x1")]);
        state.apply_spaces(&[space("s2", "x2")]);

        let results = state.results();
        assert!(results[0].is_space());
        assert!(!results[1].is_space());
    }

    #[test]
    fn test_empty_snapshot_clears_only_that_stream() {
        let mut state = SearchState::new("x");
        state.apply_spaces(&[space("s1", "x")]);
        state.apply_items(&[item("s1", "x")]);

        state.apply_spaces(&[]);

        assert_eq!(state.results().len(), 1);
        assert!(!state.results()[0].is_space());
    }
}
