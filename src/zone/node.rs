// Copyright 2021 Matthew Ingwersen.
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

//! Implementation of the [`Node`] structure.

use std::ops::Deref;
use std::slice;
use std::sync::Arc;

use super::Error;
use crate::name::Name;
use crate::rr::{Rrset, Type};

////////////////////////////////////////////////////////////////////////
// NODE IDS AND OWNER NAMES                                           //
////////////////////////////////////////////////////////////////////////

/// Identifies a [`Node`] within its [`ZoneContents`](super::ZoneContents).
///
/// Nodes refer to each other (parent, predecessor, wildcard child, NSEC3
/// partner) through `NodeId`s rather than references. A shallow copy of
/// a zone's contents keeps every `NodeId` valid.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(pub(super) usize);

/// The owner name of a [`Node`]: either a name owned by the node alone,
/// or a handle shared with other users, such as one obtained from a
/// [`NameTable`](crate::name::NameTable).
#[derive(Clone, Debug)]
pub enum OwnerName {
    Owned(Name),
    Shared(Arc<Name>),
}

impl OwnerName {
    /// Returns whether the name is shared.
    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared(_))
    }
}

impl Deref for OwnerName {
    type Target = Name;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Owned(name) => name,
            Self::Shared(name) => name.as_ref(),
        }
    }
}

impl From<Name> for OwnerName {
    fn from(name: Name) -> Self {
        Self::Owned(name)
    }
}

impl From<&Name> for OwnerName {
    fn from(name: &Name) -> Self {
        Self::Owned(name.clone())
    }
}

impl From<Arc<Name>> for OwnerName {
    fn from(name: Arc<Name>) -> Self {
        Self::Shared(name)
    }
}

////////////////////////////////////////////////////////////////////////
// NODES                                                              //
////////////////////////////////////////////////////////////////////////

const DELEGATION: u8 = 0x1;
const NON_AUTHORITATIVE: u8 = 0x2;

/// A node of a zone: an owner name, the [`Rrset`]s owned by it (at most
/// one per [`Type`]), and its links into the zone's topology.
///
/// The links are plain [`NodeId`]s. The zone contents set them when the
/// node is inserted and recompute them in
/// [`ZoneContents::adjust`](super::ZoneContents::adjust).
#[derive(Clone, Debug)]
pub struct Node {
    owner: OwnerName,
    rrsets: Vec<Rrset>,
    parent: Option<NodeId>,
    previous: Option<NodeId>,
    wildcard_child: Option<NodeId>,
    nsec3_node: Option<NodeId>,
    flags: u8,
}

impl Node {
    /// Creates a new node with no [`Rrset`]s.
    pub fn new(owner: impl Into<OwnerName>, parent: Option<NodeId>) -> Self {
        Self {
            owner: owner.into(),
            rrsets: Vec::new(),
            parent,
            previous: None,
            wildcard_child: None,
            nsec3_node: None,
            flags: 0,
        }
    }

    /// Returns the node's owner.
    pub fn owner(&self) -> &Name {
        &self.owner
    }

    /// Returns the node's owner together with its ownership.
    pub fn owner_name(&self) -> &OwnerName {
        &self.owner
    }

    /// Adds an [`Rrset`] to the node. Fails with [`Error::DuplicateType`]
    /// if the node already has an [`Rrset`] of the same type, in which
    /// case the existing one is left untouched.
    pub fn add_rrset(&mut self, rrset: Rrset) -> Result<(), Error> {
        match self.search(rrset.rr_type) {
            Ok(_) => Err(Error::DuplicateType(rrset.rr_type)),
            Err(index) => {
                self.rrsets.insert(index, rrset);
                Ok(())
            }
        }
    }

    /// Adds an [`Rrset`] to the node, returning the one of the same type
    /// that it replaced, if any.
    pub fn replace_rrset(&mut self, rrset: Rrset) -> Option<Rrset> {
        match self.search(rrset.rr_type) {
            Ok(index) => Some(std::mem::replace(&mut self.rrsets[index], rrset)),
            Err(index) => {
                self.rrsets.insert(index, rrset);
                None
            }
        }
    }

    pub fn rrset(&self, rr_type: Type) -> Option<&Rrset> {
        self.search(rr_type).ok().map(|index| &self.rrsets[index])
    }

    pub fn rrset_mut(&mut self, rr_type: Type) -> Option<&mut Rrset> {
        self.search(rr_type).ok().map(|index| &mut self.rrsets[index])
    }

    pub fn has_rrset(&self, rr_type: Type) -> bool {
        self.search(rr_type).is_ok()
    }

    /// Detaches and returns the [`Rrset`] of the given type.
    pub fn remove_rrset(&mut self, rr_type: Type) -> Option<Rrset> {
        self.search(rr_type)
            .ok()
            .map(|index| self.rrsets.remove(index))
    }

    /// Returns an iterator over the node's [`Rrset`]s, ordered by type.
    pub fn rrsets(&self) -> slice::Iter<Rrset> {
        self.rrsets.iter()
    }

    pub fn rrset_count(&self) -> usize {
        self.rrsets.len()
    }

    /// Returns whether the node owns no [`Rrset`]s (as is the case for
    /// empty non-terminals).
    pub fn is_empty(&self) -> bool {
        self.rrsets.is_empty()
    }

    fn search(&self, rr_type: Type) -> Result<usize, usize> {
        self.rrsets.binary_search_by_key(&rr_type, |r| r.rr_type)
    }
}

/// Topology links and flags.
impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    /// Returns the node that precedes this one in canonical order. The
    /// chain is circular: the first node's predecessor is the last.
    pub fn previous(&self) -> Option<NodeId> {
        self.previous
    }

    pub fn set_previous(&mut self, previous: Option<NodeId>) {
        self.previous = previous;
    }

    /// Returns the node owned by `*.<owner>`, if there is one.
    pub fn wildcard_child(&self) -> Option<NodeId> {
        self.wildcard_child
    }

    pub fn set_wildcard_child(&mut self, wildcard_child: Option<NodeId>) {
        self.wildcard_child = wildcard_child;
    }

    /// Returns the NSEC3 node whose hashed owner corresponds to this
    /// node's owner.
    pub fn nsec3_node(&self) -> Option<NodeId> {
        self.nsec3_node
    }

    pub fn set_nsec3_node(&mut self, nsec3_node: Option<NodeId>) {
        self.nsec3_node = nsec3_node;
    }

    /// Returns whether the node is a delegation point, i.e., the top of
    /// a zone cut.
    pub fn is_delegation(&self) -> bool {
        self.flags & DELEGATION != 0
    }

    pub fn set_delegation(&mut self, delegation: bool) {
        self.set_flag(DELEGATION, delegation);
    }

    /// Returns whether the node is below a delegation point, so that its
    /// data is not authoritative.
    pub fn is_non_authoritative(&self) -> bool {
        self.flags & NON_AUTHORITATIVE != 0
    }

    pub fn set_non_authoritative(&mut self, non_authoritative: bool) {
        self.set_flag(NON_AUTHORITATIVE, non_authoritative);
    }

    fn set_flag(&mut self, flag: u8, value: bool) {
        if value {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rr::Ttl;

    fn node() -> Node {
        Node::new("www.quandary.test.".parse::<Name>().unwrap(), None)
    }

    fn rrset(rr_type: Type, rdata: &[u8]) -> Rrset {
        let mut rrset = Rrset::new(rr_type, Ttl::from(3600));
        rrset.push_rdata(rdata).unwrap();
        rrset
    }

    #[test]
    fn add_rrset_rejects_duplicate_type() {
        let mut node = node();
        node.add_rrset(rrset(Type::A, b"\x7f\x00\x00\x01")).unwrap();
        assert_eq!(
            node.add_rrset(rrset(Type::A, b"\x7f\x00\x00\x02")),
            Err(Error::DuplicateType(Type::A))
        );
        assert_eq!(node.rrset_count(), 1);
        let original: Vec<&[u8]> = node.rrset(Type::A).unwrap().rdatas().collect();
        assert_eq!(original, [b"\x7f\x00\x00\x01"]);
    }

    #[test]
    fn rrsets_are_ordered_by_type() {
        let mut node = node();
        node.add_rrset(rrset(Type::TXT, b"\x01z")).unwrap();
        node.add_rrset(rrset(Type::A, b"\x7f\x00\x00\x01")).unwrap();
        node.add_rrset(rrset(Type::MX, b"\x00\x0a\x00")).unwrap();
        let types: Vec<Type> = node.rrsets().map(|r| r.rr_type).collect();
        assert_eq!(types, [Type::A, Type::MX, Type::TXT]);
    }

    #[test]
    fn absent_rrset_is_not_an_error() {
        let mut node = node();
        assert!(node.is_empty());
        assert!(node.rrset(Type::AAAA).is_none());
        assert!(node.rrset_mut(Type::AAAA).is_none());
        assert!(node.remove_rrset(Type::AAAA).is_none());
    }

    #[test]
    fn remove_and_replace_rrset_work() {
        let mut node = node();
        assert!(node.replace_rrset(rrset(Type::A, b"\x01\x01\x01\x01")).is_none());
        let old = node.replace_rrset(rrset(Type::A, b"\x02\x02\x02\x02")).unwrap();
        assert_eq!(old.rdatas().next(), Some(&b"\x01\x01\x01\x01"[..]));
        assert!(node.has_rrset(Type::A));
        assert!(node.remove_rrset(Type::A).is_some());
        assert!(!node.has_rrset(Type::A));
    }

    #[test]
    fn flags_are_independent() {
        let mut node = node();
        node.set_delegation(true);
        assert!(node.is_delegation());
        assert!(!node.is_non_authoritative());
        node.set_non_authoritative(true);
        node.set_delegation(false);
        assert!(!node.is_delegation());
        assert!(node.is_non_authoritative());
    }

    #[test]
    fn links_are_stored() {
        let mut node = Node::new(
            Arc::new("quandary.test.".parse::<Name>().unwrap()),
            Some(NodeId(3)),
        );
        assert!(node.owner_name().is_shared());
        assert_eq!(node.parent(), Some(NodeId(3)));
        node.set_previous(Some(NodeId(1)));
        node.set_wildcard_child(Some(NodeId(2)));
        node.set_nsec3_node(Some(NodeId(4)));
        assert_eq!(node.previous(), Some(NodeId(1)));
        assert_eq!(node.wildcard_child(), Some(NodeId(2)));
        assert_eq!(node.nsec3_node(), Some(NodeId(4)));
    }
}
