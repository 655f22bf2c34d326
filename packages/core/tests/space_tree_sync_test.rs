//! Space Tree Synchronization Tests
//!
//! Feeds live all-spaces snapshots through the tree builder and verifies the
//! navigable forest follows creations and non-cascading deletions.

#[cfg(test)]
mod space_tree_sync_tests {
    use anyhow::{anyhow, Result};
    use spacenotes_core::auth::{LocalIdentityProvider, User};
    use spacenotes_core::db::InMemoryDocumentStore;
    use spacenotes_core::{
        build_forest, forest_size, LiveQuery, NewSpace, Space, SpaceFilter, SpaceRepository,
        SpaceTemplate, TreeNode,
    };
    use std::sync::Arc;
    use tokio::time::{timeout, Duration};

    fn setup() -> (Arc<InMemoryDocumentStore>, SpaceRepository) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let identity = Arc::new(LocalIdentityProvider::signed_in(User::new("user-1")));
        let spaces = SpaceRepository::new(store.clone(), identity);
        (store, spaces)
    }

    async fn next_forest(live: &mut LiveQuery<Space>) -> Result<Vec<TreeNode>> {
        let snapshot = timeout(Duration::from_secs(1), live.next())
            .await
            .map_err(|_| anyhow!("Expected snapshot within 1 second"))?
            .ok_or_else(|| anyhow!("Subscription ended"))??;
        Ok(build_forest(&snapshot))
    }

    fn shape(nodes: &[TreeNode]) -> Vec<(String, Vec<String>)> {
        nodes
            .iter()
            .map(|node| {
                (
                    node.title.clone(),
                    node.children.iter().map(|c| c.title.clone()).collect(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_forest_follows_live_snapshots() -> Result<()> {
        let (_store, spaces) = setup();
        let mut live = spaces.subscribe(SpaceFilter::All).await?;
        assert!(next_forest(&mut live).await?.is_empty());

        let work = spaces
            .create_space(NewSpace::root("Work", SpaceTemplate::Plain))
            .await?;
        next_forest(&mut live).await?;

        spaces
            .create_space(NewSpace::child("Meetings", work.id.as_str(), SpaceTemplate::Dated))
            .await?;
        let forest = next_forest(&mut live).await?;

        assert_eq!(
            shape(&forest),
            vec![("Work".to_string(), vec!["Meetings".to_string()])]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_parent_promotes_child_to_root() -> Result<()> {
        let (_store, spaces) = setup();
        let parent = spaces
            .create_space(NewSpace::root("Parent", SpaceTemplate::Plain))
            .await?;
        let child = spaces
            .create_space(NewSpace::child("Child", parent.id.as_str(), SpaceTemplate::Plain))
            .await?;
        spaces
            .create_space(NewSpace::child("Grandchild", child.id.as_str(), SpaceTemplate::Plain))
            .await?;

        let mut live = spaces.subscribe(SpaceFilter::All).await?;
        let forest = next_forest(&mut live).await?;
        assert_eq!(forest.len(), 1);
        assert_eq!(forest_size(&forest), 3);

        spaces.delete_space(&parent.id).await?;
        let forest = next_forest(&mut live).await?;

        // Child keeps its parentId; it renders as a root now that the parent is gone
        assert_eq!(
            shape(&forest),
            vec![("Child".to_string(), vec!["Grandchild".to_string()])]
        );
        let child_space = spaces.get_space(&child.id).await?.expect("Child should survive");
        assert_eq!(child_space.parent_id.as_deref(), Some(parent.id.as_str()));
        Ok(())
    }

    #[tokio::test]
    async fn test_parent_owned_by_someone_else_renders_as_root() -> Result<()> {
        let (store, mine) = setup();
        let theirs = SpaceRepository::new(
            store.clone(),
            Arc::new(LocalIdentityProvider::signed_in(User::new("user-2"))),
        );
        let foreign = theirs
            .create_space(NewSpace::root("Foreign", SpaceTemplate::Plain))
            .await?;
        mine.create_space(NewSpace::child("Mine", foreign.id.as_str(), SpaceTemplate::Plain))
            .await?;

        let mut live = mine.subscribe(SpaceFilter::All).await?;
        let forest = next_forest(&mut live).await?;

        assert_eq!(shape(&forest), vec![("Mine".to_string(), vec![])]);
        Ok(())
    }

    #[tokio::test]
    async fn test_roots_and_children_filters() -> Result<()> {
        let (_store, spaces) = setup();
        let root = spaces
            .create_space(NewSpace::root("Root", SpaceTemplate::Plain))
            .await?;
        spaces
            .create_space(NewSpace::child("Leaf", root.id.as_str(), SpaceTemplate::Plain))
            .await?;

        let mut roots = spaces.subscribe(SpaceFilter::Roots).await?;
        let mut children = spaces
            .subscribe(SpaceFilter::ChildrenOf(root.id.clone()))
            .await?;

        let roots_snapshot = timeout(Duration::from_secs(1), roots.next())
            .await?
            .ok_or_else(|| anyhow!("Subscription ended"))??;
        let children_snapshot = timeout(Duration::from_secs(1), children.next())
            .await?
            .ok_or_else(|| anyhow!("Subscription ended"))??;

        assert_eq!(roots_snapshot.len(), 1);
        assert_eq!(roots_snapshot[0].title, "Root");
        assert_eq!(children_snapshot.len(), 1);
        assert_eq!(children_snapshot[0].title, "Leaf");
        Ok(())
    }

    #[tokio::test]
    async fn test_dropping_live_query_releases_subscription() -> Result<()> {
        let (store, spaces) = setup();
        let live = spaces.subscribe(SpaceFilter::All).await?;
        let watch = spaces.watch_space("missing").await?;
        assert_eq!(store.active_subscriptions(), 2);

        live.unsubscribe();
        assert_eq!(store.active_subscriptions(), 1);

        drop(watch);
        assert_eq!(store.active_subscriptions(), 0);
        drop(live);
        Ok(())
    }
}
