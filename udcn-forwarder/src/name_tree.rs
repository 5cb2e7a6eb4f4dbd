//! A trie over `Name` components that FIB, PIT and the strategy table all
//! index into, so a prefix that both a route and a pending Interest share
//! is stored once.

use std::collections::HashMap;

use udcn_common::ndn::{Name, NameComponent};

/// A stable handle to a node in the tree. Indices into `NameTree::nodes`,
/// never reused while the node is reachable — FIB/PIT store these instead
/// of the `Name` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[cfg(test)]
impl NodeId {
    /// Fabricates an opaque id for tests that exercise a component (like the
    /// scheduler) needing a `NodeId` without a real `NameTree` at hand.
    pub fn from_test(id: usize) -> Self {
        Self(id)
    }
}

struct Node {
    parent: Option<NodeId>,
    component: Option<NameComponent>,
    children: HashMap<NameComponent, NodeId>,
    depth: usize,
}

pub struct NameTree {
    nodes: Vec<Node>,
}

impl NameTree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                component: None,
                children: HashMap::new(),
                depth: 0,
            }],
        }
    }

    /// Finds or creates the node anchoring `name`. O(k) in component count.
    pub fn lookup(&mut self, name: &Name) -> NodeId {
        let mut current = Self::ROOT;
        for component in name.components() {
            current = match self.nodes[current.0].children.get(component) {
                Some(&child) => child,
                None => {
                    let depth = self.nodes[current.0].depth + 1;
                    let new_id = NodeId(self.nodes.len());
                    self.nodes.push(Node {
                        parent: Some(current),
                        component: Some(component.clone()),
                        children: HashMap::new(),
                        depth,
                    });
                    self.nodes[current.0].children.insert(component.clone(), new_id);
                    new_id
                }
            };
        }
        current
    }

    /// Finds the node anchoring `name` without creating anything.
    pub fn find_exact_match(&self, name: &Name) -> Option<NodeId> {
        let mut current = Self::ROOT;
        for component in name.components() {
            current = *self.nodes[current.0].children.get(component)?;
        }
        Some(current)
    }

    /// Returns the single child of `node` reached by `component`, if any.
    /// Used by `Pit::find_all_data_matches` to walk only the ancestors of a
    /// Data's name instead of scanning every PIT entry.
    pub fn child(&self, node: NodeId, component: &NameComponent) -> Option<NodeId> {
        self.nodes[node.0].children.get(component).copied()
    }

    /// Descends as far as `name`'s components exist, then ascends from the
    /// deepest matching node toward the root until `predicate` returns true.
    pub fn find_longest_prefix_match(
        &self,
        name: &Name,
        mut predicate: impl FnMut(NodeId) -> bool,
    ) -> Option<NodeId> {
        let mut path = vec![Self::ROOT];
        let mut current = Self::ROOT;
        for component in name.components() {
            match self.nodes[current.0].children.get(component) {
                Some(&child) => {
                    current = child;
                    path.push(current);
                }
                None => break,
            }
        }
        path.into_iter().rev().find(|&node| predicate(node))
    }

    /// Reconstructs the `Name` anchored at `node` by walking up to the root.
    pub fn name_of(&self, node: NodeId) -> Name {
        let mut components = Vec::new();
        let mut current = node;
        while let Some(component) = self.nodes[current.0].component.clone() {
            components.push(component);
            current = self.nodes[current.0].parent.expect("non-root node has a parent");
        }
        components.reverse();
        let mut name = Name::new();
        for component in components {
            name.push(component);
        }
        name
    }

    pub fn depth(&self, node: NodeId) -> usize {
        self.nodes[node.0].depth
    }
}

impl Default for NameTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_creates_and_reuses_nodes() {
        let mut tree = NameTree::new();
        let a = tree.lookup(&Name::from_uri("/a/b").unwrap());
        let b = tree.lookup(&Name::from_uri("/a/b").unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn find_exact_match_does_not_create() {
        let mut tree = NameTree::new();
        tree.lookup(&Name::from_uri("/a/b").unwrap());
        assert!(tree.find_exact_match(&Name::from_uri("/a/b/c").unwrap()).is_none());
        assert!(tree.find_exact_match(&Name::from_uri("/a/b").unwrap()).is_some());
    }

    #[test]
    fn longest_prefix_match_ascends_to_predicate() {
        let mut tree = NameTree::new();
        let a = tree.lookup(&Name::from_uri("/a").unwrap());
        tree.lookup(&Name::from_uri("/a/b/c").unwrap());
        let found = tree
            .find_longest_prefix_match(&Name::from_uri("/a/b/c/d").unwrap(), |n| n == a);
        assert_eq!(found, Some(a));
    }

    #[test]
    fn name_of_reconstructs_the_name() {
        let mut tree = NameTree::new();
        let name = Name::from_uri("/a/b/c").unwrap();
        let node = tree.lookup(&name);
        assert_eq!(tree.name_of(node), name);
    }
}
