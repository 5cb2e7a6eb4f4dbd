//! Forwarding Information Base: the set of registered prefixes and, for
//! each, the faces willing to carry an Interest toward the publisher.

use std::collections::HashMap;

use udcn_common::ndn::{FaceId, Name};

use crate::name_tree::{NameTree, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextHop {
    pub face: FaceId,
    pub cost: u32,
}

#[derive(Debug, Clone, Default)]
pub struct FibEntry {
    pub next_hops: Vec<NextHop>,
}

#[derive(Default)]
pub struct Fib {
    entries: HashMap<NodeId, FibEntry>,
}

impl Fib {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or updates a next hop for `prefix`. Registering the same face
    /// twice updates its cost rather than duplicating the next hop.
    pub fn register(&mut self, tree: &mut NameTree, prefix: &Name, face: FaceId, cost: u32) {
        let node = tree.lookup(prefix);
        let entry = self.entries.entry(node).or_default();
        match entry.next_hops.iter_mut().find(|nh| nh.face == face) {
            Some(nh) => nh.cost = cost,
            None => entry.next_hops.push(NextHop { face, cost }),
        }
    }

    /// Removes `face` as a next hop of `prefix`. Returns `true` if it was
    /// registered. An entry with no remaining next hops is dropped.
    pub fn unregister(&mut self, tree: &NameTree, prefix: &Name, face: FaceId) -> bool {
        let Some(node) = tree.find_exact_match(prefix) else {
            return false;
        };
        let Some(entry) = self.entries.get_mut(&node) else {
            return false;
        };
        let before = entry.next_hops.len();
        entry.next_hops.retain(|nh| nh.face != face);
        let removed = entry.next_hops.len() != before;
        if entry.next_hops.is_empty() {
            self.entries.remove(&node);
        }
        removed
    }

    /// Drops `face` from every FIB entry, e.g. when the face goes down.
    pub fn remove_face(&mut self, face: FaceId) {
        self.entries.retain(|_, entry| {
            entry.next_hops.retain(|nh| nh.face != face);
            !entry.next_hops.is_empty()
        });
    }

    pub fn longest_prefix_match(&self, tree: &NameTree, name: &Name) -> Option<&FibEntry> {
        let node = tree.find_longest_prefix_match(name, |n| self.entries.contains_key(&n))?;
        self.entries.get(&node)
    }

    /// Every registered prefix's node and next-hop list, for table display.
    pub fn entries(&self) -> impl Iterator<Item = (NodeId, &FibEntry)> {
        self.entries.iter().map(|(&node, entry)| (node, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_prefix_match_prefers_the_deepest_registration() {
        let mut tree = NameTree::new();
        let mut fib = Fib::new();
        fib.register(&mut tree, &Name::from_uri("/a").unwrap(), FaceId(1), 1);
        fib.register(&mut tree, &Name::from_uri("/a/b").unwrap(), FaceId(2), 1);

        let hit = fib
            .longest_prefix_match(&tree, &Name::from_uri("/a/b/c").unwrap())
            .unwrap();
        assert_eq!(hit.next_hops, vec![NextHop { face: FaceId(2), cost: 1 }]);
    }

    #[test]
    fn unregister_drops_empty_entries() {
        let mut tree = NameTree::new();
        let mut fib = Fib::new();
        let prefix = Name::from_uri("/a").unwrap();
        fib.register(&mut tree, &prefix, FaceId(1), 1);
        assert!(fib.unregister(&tree, &prefix, FaceId(1)));
        assert!(fib.longest_prefix_match(&tree, &prefix).is_none());
    }

    #[test]
    fn entries_reflects_every_registered_prefix() {
        let mut tree = NameTree::new();
        let mut fib = Fib::new();
        fib.register(&mut tree, &Name::from_uri("/a").unwrap(), FaceId(1), 1);
        fib.register(&mut tree, &Name::from_uri("/b").unwrap(), FaceId(2), 1);
        assert_eq!(fib.entries().count(), 2);
    }

    #[test]
    fn registering_the_same_face_twice_updates_cost() {
        let mut tree = NameTree::new();
        let mut fib = Fib::new();
        let prefix = Name::from_uri("/a").unwrap();
        fib.register(&mut tree, &prefix, FaceId(1), 10);
        fib.register(&mut tree, &prefix, FaceId(1), 5);
        let entry = fib.longest_prefix_match(&tree, &prefix).unwrap();
        assert_eq!(entry.next_hops.len(), 1);
        assert_eq!(entry.next_hops[0].cost, 5);
    }
}
