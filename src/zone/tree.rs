// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implementation of the [`ZoneTree`] ordered index.

use std::collections::BTreeMap;
use std::ops::Bound;

use super::NodeId;
use crate::name::Name;

/// An ordered index from owner names to [`NodeId`]s.
///
/// Keys are kept in DNSSEC canonical order (see [`Name`]'s [`Ord`]
/// implementation), so the index answers exact lookups as well as
/// predecessor and successor queries for names that are not present.
/// The index does not own nodes; it only refers to them.
#[derive(Clone, Debug, Default)]
pub struct ZoneTree {
    index: BTreeMap<Name, NodeId>,
}

impl ZoneTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Inserts `id` under `name`. Returns `false` and leaves the tree
    /// unchanged if `name` is already present.
    pub fn insert(&mut self, name: &Name, id: NodeId) -> bool {
        if self.index.contains_key(name) {
            false
        } else {
            self.index.insert(name.clone(), id);
            true
        }
    }

    pub fn get(&self, name: &Name) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// Returns the greatest entry strictly less than `name`.
    pub fn predecessor(&self, name: &Name) -> Option<NodeId> {
        self.index
            .range::<Name, _>((Bound::Unbounded, Bound::Excluded(name)))
            .next_back()
            .map(|(_, id)| *id)
    }

    /// Returns the least entry strictly greater than `name`.
    pub fn successor(&self, name: &Name) -> Option<NodeId> {
        self.index
            .range::<Name, _>((Bound::Excluded(name), Bound::Unbounded))
            .next()
            .map(|(_, id)| *id)
    }

    pub fn first(&self) -> Option<NodeId> {
        self.index.values().next().copied()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.index.values().next_back().copied()
    }

    /// Returns an iterator over the entries in canonical order. Reverse
    /// it for reverse canonical order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&Name, NodeId)> + '_ {
        self.index.iter().map(|(name, id)| (name, *id))
    }

    /// Returns an iterator over the entries strictly greater than
    /// `name`, in canonical order. Since subdomains follow their
    /// ancestors directly, the subdomains of `name` come first.
    pub fn iter_after<'a>(&'a self, name: &Name) -> impl Iterator<Item = (&'a Name, NodeId)> + 'a {
        self.index
            .range::<Name, _>((Bound::Excluded(name), Bound::Unbounded))
            .map(|(name, id)| (name, *id))
    }

    /// Calls `visitor` on each entry in canonical order.
    pub fn apply_inorder<C>(&self, mut visitor: impl FnMut(NodeId, &mut C), context: &mut C) {
        for id in self.index.values() {
            visitor(*id, context);
        }
    }

    /// Calls `visitor` on each entry in reverse canonical order.
    pub fn apply_inorder_reverse<C>(
        &self,
        mut visitor: impl FnMut(NodeId, &mut C),
        context: &mut C,
    ) {
        for id in self.index.values().rev() {
            visitor(*id, context);
        }
    }

    /// Calls `visitor` on each entry in post-order over the DNS
    /// namespace: every name is visited after all of its subdomains
    /// in the tree, and sibling subtrees are visited in canonical
    /// order.
    ///
    /// Canonical order is a pre-order walk of the namespace, so a stack
    /// of the current name's ancestors is all the state needed.
    pub fn apply_postorder<C>(&self, mut visitor: impl FnMut(NodeId, &mut C), context: &mut C) {
        let mut ancestors: Vec<(&Name, NodeId)> = Vec::new();
        for (name, id) in self.iter() {
            while let Some((top, top_id)) = ancestors.last().copied() {
                if name.eq_or_subdomain_of(top) {
                    break;
                }
                visitor(top_id, context);
                ancestors.pop();
            }
            ancestors.push((name, id));
        }
        while let Some((_, id)) = ancestors.pop() {
            visitor(id, context);
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(names: &[&str]) -> ZoneTree {
        let mut tree = ZoneTree::new();
        for (i, name) in names.iter().enumerate() {
            assert!(tree.insert(&name.parse().unwrap(), NodeId(i)));
        }
        tree
    }

    fn visit(tree: &ZoneTree, order: &str) -> Vec<usize> {
        let mut visited = Vec::new();
        let record = |id: NodeId, visited: &mut Vec<usize>| visited.push(id.0);
        match order {
            "inorder" => tree.apply_inorder(record, &mut visited),
            "reverse" => tree.apply_inorder_reverse(record, &mut visited),
            _ => tree.apply_postorder(record, &mut visited),
        }
        visited
    }

    const NAMES: [&str; 6] = [
        "example.",
        "b.example.",
        "a.b.example.",
        "z.b.example.",
        "c.example.",
        "x.c.example.",
    ];

    #[test]
    fn insert_does_not_overwrite() {
        let mut tree = tree(&NAMES);
        assert!(!tree.insert(&"B.EXAMPLE.".parse().unwrap(), NodeId(99)));
        assert_eq!(tree.get(&"b.example.".parse().unwrap()), Some(NodeId(1)));
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn predecessor_and_successor_work() {
        let tree = tree(&NAMES);
        let missing: Name = "m.b.example.".parse().unwrap();
        assert_eq!(tree.get(&missing), None);
        assert_eq!(tree.predecessor(&missing), Some(NodeId(2)));
        assert_eq!(tree.successor(&missing), Some(NodeId(3)));
        let apex: Name = "example.".parse().unwrap();
        assert_eq!(tree.predecessor(&apex), None);
        assert_eq!(tree.successor(&apex), Some(NodeId(1)));
        assert_eq!(tree.successor(&"x.c.example.".parse().unwrap()), None);
        assert_eq!(tree.first(), Some(NodeId(0)));
        assert_eq!(tree.last(), Some(NodeId(5)));
    }

    #[test]
    fn inorder_traversals_follow_canonical_order() {
        let tree = tree(&NAMES);
        assert_eq!(visit(&tree, "inorder"), [0, 1, 2, 3, 4, 5]);
        assert_eq!(visit(&tree, "reverse"), [5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn postorder_visits_subdomains_first() {
        let tree = tree(&NAMES);
        assert_eq!(visit(&tree, "postorder"), [2, 3, 1, 5, 4, 0]);
    }

    #[test]
    fn postorder_handles_missing_intermediate_names() {
        // c.b.example. is absent, so d.c.b.example. hangs off example.
        // directly as far as the tree knows.
        let tree = tree(&["example.", "d.c.b.example.", "e.example."]);
        assert_eq!(visit(&tree, "postorder"), [1, 2, 0]);
    }

    #[test]
    fn iter_after_starts_with_subdomains() {
        let tree = tree(&NAMES);
        let after: Vec<NodeId> = tree
            .iter_after(&"b.example.".parse().unwrap())
            .map(|(_, id)| id)
            .collect();
        assert_eq!(after, [NodeId(2), NodeId(3), NodeId(4), NodeId(5)]);
        let order: Vec<NodeId> = tree.iter().rev().map(|(_, id)| id).collect();
        assert_eq!(order, [NodeId(5), NodeId(4), NodeId(3), NodeId(2), NodeId(1), NodeId(0)]);
    }
}
