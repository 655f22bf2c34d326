//! Tree Builder
//!
//! Turns the flat, owner-scoped space list into a forest. Every input space
//! appears exactly once:
//!
//! - under its parent when the parent is part of the same input,
//! - at the root level when the parent is missing (deleted, never existed,
//!   or owned by someone else).
//!
//! Parent cycles, including self-parenting, are broken by promoting the
//! cycle member that appears first in the input to a root. Children and roots
//! keep input order; nothing is sorted.

use crate::models::{Space, TreeNode};
use std::collections::HashMap;
use tracing::warn;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnPath,
    Done,
}

/// Build the space forest. O(n) in the number of spaces.
pub fn build_forest(spaces: &[Space]) -> Vec<TreeNode> {
    let index: HashMap<&str, usize> = spaces
        .iter()
        .enumerate()
        .map(|(position, space)| (space.id.as_str(), position))
        .collect();

    let mut parent: Vec<Option<usize>> = spaces
        .iter()
        .map(|space| {
            space
                .parent_id
                .as_deref()
                .and_then(|id| index.get(id).copied())
        })
        .collect();

    break_cycles(spaces, &mut parent);

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); spaces.len()];
    let mut roots = Vec::new();
    for (position, parent) in parent.iter().enumerate() {
        match parent {
            Some(p) => children[*p].push(position),
            None => roots.push(position),
        }
    }

    assemble(&roots, spaces, &children)
}

/// Cut one parent link in every cycle so that every chain ends at a root
fn break_cycles(spaces: &[Space], parent: &mut [Option<usize>]) {
    let mut state = vec![Visit::New; spaces.len()];
    let mut path: Vec<usize> = Vec::new();

    for start in 0..spaces.len() {
        let mut current = Some(start);
        while let Some(node) = current {
            match state[node] {
                Visit::Done => break,
                Visit::OnPath => {
                    let cycle_start = path.iter().position(|&n| n == node).unwrap_or(0);
                    if let Some(&promoted) = path[cycle_start..].iter().min() {
                        warn!(
                            space = %spaces[promoted].id,
                            cycle_len = path.len() - cycle_start,
                            "Parent cycle detected, promoting space to root"
                        );
                        parent[promoted] = None;
                    }
                    break;
                }
                Visit::New => {
                    state[node] = Visit::OnPath;
                    path.push(node);
                    current = parent[node];
                }
            }
        }
        for node in path.drain(..) {
            state[node] = Visit::Done;
        }
    }
}

/// Build the nodes bottom-up with an explicit stack; chains of any depth are
/// fine.
fn assemble(roots: &[usize], spaces: &[Space], children: &[Vec<usize>]) -> Vec<TreeNode> {
    // Pre-order: every node is listed before all of its descendants.
    let mut order = Vec::with_capacity(spaces.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(position) = stack.pop() {
        order.push(position);
        stack.extend(children[position].iter().rev());
    }

    let mut built: Vec<Option<TreeNode>> = vec![None; spaces.len()];
    for &position in order.iter().rev() {
        let space = &spaces[position];
        let mut node = TreeNode::new(space.id.as_str(), space.title.as_str());
        node.children = children[position]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[position] = Some(node);
    }

    roots
        .iter()
        .filter_map(|&root| built[root].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{forest_size, SpaceTemplate};
    use chrono::Utc;
    use std::collections::HashSet;

    fn space(id: &str, parent: Option<&str>) -> Space {
        let now = Utc::now();
        Space {
            id: id.to_string(),
            title: id.to_uppercase(),
            parent_id: parent.map(str::to_string),
            owner_id: "user-1".to_string(),
            template: SpaceTemplate::Dated,
            created_at: now,
            updated_at: now,
        }
    }

    fn ids(forest: &[TreeNode]) -> Vec<&str> {
        forest.iter().map(|n| n.id.as_str()).collect()
    }

    fn collect_ids<'a>(forest: &'a [TreeNode], out: &mut Vec<&'a str>) {
        for node in forest {
            out.push(&node.id);
            collect_ids(&node.children, out);
        }
    }

    #[test]
    fn test_missing_parent_is_promoted_to_root() {
        let spaces = vec![
            space("a", None),
            space("b", Some("a")),
            space("c", Some("zzz")),
        ];

        let forest = build_forest(&spaces);

        assert_eq!(ids(&forest), vec!["a", "c"]);
        assert_eq!(ids(&forest[0].children), vec!["b"]);
        assert!(forest[1].children.is_empty());
    }

    #[test]
    fn test_children_keep_input_order() {
        let spaces = vec![
            space("c2", Some("p")),
            space("p", None),
            space("c1", Some("p")),
            space("c3", Some("p")),
        ];

        let forest = build_forest(&spaces);

        assert_eq!(ids(&forest), vec!["p"]);
        assert_eq!(ids(&forest[0].children), vec!["c2", "c1", "c3"]);
    }

    #[test]
    fn test_deep_nesting() {
        let spaces = vec![
            space("d", Some("c")),
            space("c", Some("b")),
            space("b", Some("a")),
            space("a", None),
        ];

        let forest = build_forest(&spaces);

        assert_eq!(forest.len(), 1);
        let d = forest[0].find("d").unwrap();
        assert!(d.is_leaf());
        assert_eq!(forest[0].len(), 4);
    }

    #[test]
    fn test_removing_parent_orphans_children_to_root() {
        let mut spaces = vec![space("a", None), space("b", Some("a")), space("c", Some("b"))];
        spaces.retain(|s| s.id != "a");

        let forest = build_forest(&spaces);

        assert_eq!(ids(&forest), vec!["b"]);
        assert_eq!(ids(&forest[0].children), vec!["c"]);
    }

    #[test]
    fn test_self_parent_becomes_root() {
        let spaces = vec![space("a", Some("a")), space("b", Some("a"))];

        let forest = build_forest(&spaces);

        assert_eq!(ids(&forest), vec!["a"]);
        assert_eq!(ids(&forest[0].children), vec!["b"]);
    }

    #[test]
    fn test_cycle_promotes_first_member_in_input_order() {
        // x -> y -> z -> x, plus w hanging off z
        let spaces = vec![
            space("w", Some("z")),
            space("y", Some("x")),
            space("z", Some("y")),
            space("x", Some("z")),
        ];

        let forest = build_forest(&spaces);

        assert_eq!(ids(&forest), vec!["y"]);
        assert_eq!(forest_size(&forest), 4);
        let z = forest[0].find("z").unwrap();
        assert_eq!(ids(&z.children), vec!["w", "x"]);
    }

    #[test]
    fn test_every_space_appears_exactly_once() {
        let spaces = vec![
            space("a", None),
            space("b", Some("a")),
            space("c", Some("b")),
            space("d", Some("missing")),
            space("e", Some("e")),
            space("f", Some("g")),
            space("g", Some("f")),
            space("h", Some("d")),
        ];

        let forest = build_forest(&spaces);

        let mut seen = Vec::new();
        collect_ids(&forest, &mut seen);
        assert_eq!(seen.len(), spaces.len());
        let unique: HashSet<&str> = seen.iter().copied().collect();
        assert_eq!(unique.len(), spaces.len());
    }

    #[test]
    fn test_structure_is_independent_of_input_order() {
        let forward = vec![space("a", None), space("b", Some("a")), space("c", Some("a"))];
        let mut reversed = forward.clone();
        reversed.reverse();

        let one = build_forest(&forward);
        let two = build_forest(&reversed);

        assert_eq!(ids(&one), ids(&two));
        let mut left = ids(&one[0].children);
        let mut right = ids(&two[0].children);
        left.sort();
        right.sort();
        assert_eq!(left, right);
    }

    #[test]
    fn test_very_deep_chain_does_not_overflow() {
        let depth = 100_000;
        let spaces: Vec<Space> = (0..depth)
            .map(|i| {
                let parent = (i > 0).then(|| format!("s{}", i - 1));
                space(&format!("s{}", i), parent.as_deref())
            })
            .collect();

        let forest = build_forest(&spaces);

        assert_eq!(ids(&forest), vec!["s0"]);
        assert_eq!(forest_size(&forest), depth);
        assert!(forest[0].find("s99999").unwrap().is_leaf());
        drop(forest);
    }

    #[test]
    fn test_empty_input() {
        assert!(build_forest(&[]).is_empty());
    }
}
