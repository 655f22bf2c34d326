use serde::Serialize;

/// Derived hierarchy node, rebuilt from the flat space list on every change.
///
/// Children keep the order in which they appeared in the source list.
/// Construction, `len`, `find` and drop work at any depth; the derived
/// `Clone`, `PartialEq` and `Serialize` recurse once per level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub id: String,
    pub title: String,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including `self`
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// A subtree always contains its own root.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth-first lookup of a node by id
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }
}

// Unlinks descendants one level at a time so dropping a deep chain does not
// recurse once per level.
impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Total number of nodes in a forest
pub fn forest_size(forest: &[TreeNode]) -> usize {
    forest.iter().map(TreeNode::len).sum()
}
