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

//! Implementation of the [`ZoneContents`] structure.

use std::sync::Arc;

use log::{debug, trace, warn};
use slab::Slab;

use super::nsec3::{self, Nsec3Hasher, Nsec3Params};
use super::{Error, Node, NodeId, OwnerName, ZoneTree};
use crate::name::{self, Label, Name};
use crate::rr::{Rrset, Type};

////////////////////////////////////////////////////////////////////////
// POLICIES AND LOOKUP RESULTS                                        //
////////////////////////////////////////////////////////////////////////

/// What to do when an [`Rrset`] is added to a node that already has one
/// of the same type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DuplicatePolicy {
    /// Fail with [`Error::DuplicateType`].
    Reject,

    /// Merge the new records into the existing set.
    Merge,

    /// Replace the existing set.
    Replace,

    /// Keep the existing set and drop the new one.
    Skip,
}

/// Whether a lookup found a node owned by the name it was given.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FindStatus {
    Found,
    NotFound,
}

/// The result of [`ZoneContents::find_name`].
#[derive(Clone, Copy, Debug)]
pub struct FoundName<'a> {
    pub status: FindStatus,

    /// The node owned by the name, if there is one.
    pub node: Option<&'a Node>,

    /// The deepest node whose owner is the name or one of its
    /// ancestors. This is the node itself when it was found.
    pub closest_encloser: &'a Node,

    /// The node preceding the name in canonical order. For an existing
    /// node this is its stored predecessor, which for the apex wraps
    /// around to the last node of the zone.
    pub previous: &'a Node,
}

/// The result of [`ZoneContents::find_nsec3_for_name`].
#[derive(Clone, Debug)]
pub struct FoundNsec3<'a> {
    pub status: FindStatus,

    /// The hashed owner that was looked up.
    pub hashed_owner: Name,

    /// The NSEC3 node owned by the hashed owner, if there is one.
    pub node: Option<&'a Node>,

    /// The NSEC3 node preceding the hashed owner in canonical order,
    /// wrapping around to the last one. This is `None` only when the
    /// zone has no NSEC3 nodes.
    pub previous: Option<&'a Node>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TreeKind {
    Regular,
    Nsec3,
}

////////////////////////////////////////////////////////////////////////
// ZONE CONTENTS                                                      //
////////////////////////////////////////////////////////////////////////

/// The data of a DNS zone: every node, indexed by owner name.
///
/// Nodes live in an arena and are referred to by [`NodeId`]. Two
/// [`ZoneTree`]s index them: one for ordinary owners, rooted at the
/// apex, and one for the hashed owners of NSEC3 records. A node is in
/// exactly one of the two.
///
/// Nodes are added with [`ZoneContents::add_node`] and friends, which
/// keep the predecessor chain, parent links, and wildcard links up to
/// date as they go. Flags that depend on record data (delegation
/// points, authoritativeness) and the pairing of nodes with their NSEC3
/// nodes are computed by [`ZoneContents::adjust`], which should run
/// once loading is done.
///
/// Once built, the contents are meant to be read-only and shared
/// between threads, normally through a [`Zone`](super::Zone). Updates
/// work on a [`ZoneContents::shallow_copy`], which shares node objects
/// with the original. A node is cloned the first time it is modified
/// through the copy, so the original never sees the copy's changes.
#[derive(Debug)]
pub struct ZoneContents {
    nodes: Slab<Arc<Node>>,
    apex: NodeId,
    tree: ZoneTree,
    nsec3_tree: ZoneTree,
    nsec3_params: Option<Nsec3Params>,
    generation: u8,
}

/// Node access helpers. Every `NodeId` stored in the trees or in a
/// node's links refers to a live node of this arena.
impl ZoneContents {
    fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut Node {
        Arc::make_mut(&mut self.nodes[id.0])
    }

    fn tree(&self, kind: TreeKind) -> &ZoneTree {
        match kind {
            TreeKind::Regular => &self.tree,
            TreeKind::Nsec3 => &self.nsec3_tree,
        }
    }

    fn check_in_zone(&self, name: &Name) -> Result<(), Error> {
        if name.eq_or_subdomain_of(self.name()) {
            Ok(())
        } else {
            Err(Error::NotInZone)
        }
    }
}

impl ZoneContents {
    /// Creates zone contents holding just `apex`. The zone's name is the
    /// apex's owner, which must be fully qualified. Any links or flags
    /// set on `apex` are reset.
    pub fn new(mut apex: Node) -> Result<Self, Error> {
        if !apex.owner().is_fully_qualified() {
            return Err(name::Error::NotFullyQualified.into());
        }
        let mut nodes = Slab::new();
        let id = NodeId(nodes.vacant_key());
        apex.set_parent(None);
        apex.set_previous(Some(id));
        apex.set_wildcard_child(None);
        apex.set_nsec3_node(None);
        apex.set_delegation(false);
        apex.set_non_authoritative(false);

        let mut tree = ZoneTree::new();
        tree.insert(apex.owner(), id);
        nodes.insert(Arc::new(apex));
        Ok(Self {
            nodes,
            apex: id,
            tree,
            nsec3_tree: ZoneTree::new(),
            nsec3_params: None,
            generation: 0,
        })
    }

    /// Returns the name of the zone, which is the owner of its apex.
    pub fn name(&self) -> &Name {
        self.apex().owner()
    }

    pub fn apex(&self) -> &Node {
        self.get(self.apex)
    }

    pub fn apex_id(&self) -> NodeId {
        self.apex
    }

    /// Returns the node with the given ID.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).map(|node| &**node)
    }

    /// Returns the node with the given ID for modification. If the node
    /// is shared with a shallow copy, it is cloned first.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).map(Arc::make_mut)
    }

    /// Returns the number of nodes in the regular tree, including the
    /// apex.
    pub fn node_count(&self) -> usize {
        self.tree.len()
    }

    pub fn nsec3_node_count(&self) -> usize {
        self.nsec3_tree.len()
    }

    /// Returns the generation marker of the contents (0 or 1).
    pub fn generation(&self) -> u8 {
        self.generation
    }

    /// Flips the generation marker. An updater does this on a shallow
    /// copy to tell its data apart from the published contents.
    pub fn switch_generation(&mut self) {
        self.generation ^= 1;
    }

    /// Returns the NSEC3 parameters loaded by
    /// [`ZoneContents::load_nsec3param`].
    pub fn nsec3_params(&self) -> Option<&Nsec3Params> {
        self.nsec3_params.as_ref()
    }

    /// Returns whether the zone uses NSEC3. This is only true once
    /// [`ZoneContents::load_nsec3param`] has found an NSEC3PARAM record.
    pub fn nsec3_enabled(&self) -> bool {
        self.nsec3_params.is_some()
    }
}

////////////////////////////////////////////////////////////////////////
// INSERTION                                                          //
////////////////////////////////////////////////////////////////////////

impl ZoneContents {
    /// Adds a node to the regular tree and returns its ID.
    ///
    /// The owner must be within the zone and not already have a node.
    /// If `create_parents` is set, empty nodes are created for any
    /// missing names between the owner and the nearest existing
    /// ancestor; otherwise the new node's parent is that ancestor. The
    /// node's parent, predecessor, and wildcard links are set, and so
    /// are those of its neighbours. Nothing is changed on failure.
    pub fn add_node(&mut self, mut node: Node, create_parents: bool) -> Result<NodeId, Error> {
        self.check_in_zone(node.owner())?;
        if self.tree.get(node.owner()).is_some() {
            return Err(Error::DuplicateNode);
        }

        // Since the apex is in the tree, this always finds a parent.
        let mut missing = Vec::new();
        let mut parent = None;
        let mut ancestor = node.owner().left_chop();
        while let Some(name) = ancestor {
            if let Some(id) = self.tree.get(&name) {
                parent = Some(id);
                break;
            }
            ancestor = name.left_chop();
            missing.push(name);
        }

        if create_parents {
            for name in missing.into_iter().rev() {
                let id = self.insert_node(TreeKind::Regular, Node::new(name, parent));
                self.link_regular(id);
                parent = Some(id);
            }
        }
        node.set_parent(parent);
        let id = self.insert_node(TreeKind::Regular, node);
        self.link_regular(id);
        Ok(id)
    }

    /// Adds a node to the NSEC3 tree and returns its ID. The owner must
    /// be within the zone and must not already have an NSEC3 node. The
    /// node's parent is the apex.
    pub fn add_nsec3_node(&mut self, mut node: Node) -> Result<NodeId, Error> {
        self.check_in_zone(node.owner())?;
        if self.nsec3_tree.get(node.owner()).is_some() {
            return Err(Error::DuplicateNode);
        }
        node.set_parent(Some(self.apex));
        Ok(self.insert_node(TreeKind::Nsec3, node))
    }

    /// Adds `rrset` to the node owned by `owner`, creating the node (and
    /// any missing parents) if needed. An existing set of the same type
    /// is handled according to `policy`. Returns the node's ID.
    pub fn add_rrset(
        &mut self,
        owner: impl Into<OwnerName>,
        rrset: Rrset,
        policy: DuplicatePolicy,
    ) -> Result<NodeId, Error> {
        self.add_rrset_to(TreeKind::Regular, owner.into(), rrset, policy)
    }

    /// Like [`ZoneContents::add_rrset`], but for the NSEC3 tree.
    pub fn add_nsec3_rrset(
        &mut self,
        owner: impl Into<OwnerName>,
        rrset: Rrset,
        policy: DuplicatePolicy,
    ) -> Result<NodeId, Error> {
        self.add_rrset_to(TreeKind::Nsec3, owner.into(), rrset, policy)
    }

    /// Attaches RRSIG records to the sets they cover at `owner`.
    ///
    /// The records in `rrsigs` are grouped by the type they cover, and
    /// each group is attached to the owner's set of that type. RRSIGs
    /// covering NSEC3 go to the owner's node in the NSEC3 tree. Every
    /// covered set must exist. When a set already has RRSIGs, `policy`
    /// decides what happens. Nothing is changed on failure.
    pub fn add_rrsigs(
        &mut self,
        owner: &Name,
        rrsigs: Rrset,
        policy: DuplicatePolicy,
    ) -> Result<(), Error> {
        if rrsigs.rr_type != Type::RRSIG {
            return Err(Error::TypeMismatch);
        }
        self.check_in_zone(owner)?;

        let mut groups: Vec<(Type, Rrset)> = Vec::new();
        for rdata in rrsigs.rdatas() {
            let covered = Rrset::type_covered(rdata).ok_or(Error::InvalidRdata)?;
            let index = match groups.iter().position(|(t, _)| *t == covered) {
                Some(index) => index,
                None => {
                    groups.push((covered, Rrset::new(Type::RRSIG, rrsigs.ttl)));
                    groups.len() - 1
                }
            };
            groups[index].1.push_rdata(rdata)?;
        }

        let mut targets = Vec::with_capacity(groups.len());
        for (covered, group) in &groups {
            let kind = if covered.is_nsec3() {
                TreeKind::Nsec3
            } else {
                TreeKind::Regular
            };
            let missing = Error::MissingCoveredRrset(*covered);
            let id = self.tree(kind).get(owner).ok_or(missing)?;
            let rrset = self.get(id).rrset(*covered).ok_or(missing)?;
            if let Some(existing) = rrset.rrsigs() {
                match policy {
                    DuplicatePolicy::Reject => return Err(Error::DuplicateType(Type::RRSIG)),
                    DuplicatePolicy::Merge if existing.ttl != group.ttl => {
                        return Err(Error::TtlMismatch)
                    }
                    _ => (),
                }
            }
            targets.push(id);
        }

        for (id, (covered, group)) in targets.into_iter().zip(groups) {
            let rrset = match self.get_mut(id).rrset_mut(covered) {
                Some(rrset) => rrset,
                None => continue,
            };
            let signed = rrset.rrsigs().is_some();
            match policy {
                _ if !signed => {
                    rrset.set_rrsigs(group)?;
                }
                DuplicatePolicy::Merge => {
                    if let Some(existing) = rrset.rrsigs_mut() {
                        existing.merge(group)?;
                    }
                }
                DuplicatePolicy::Replace => {
                    rrset.set_rrsigs(group)?;
                }
                DuplicatePolicy::Reject | DuplicatePolicy::Skip => (),
            }
            trace!("attached RRSIGs for {} {}", owner, covered);
        }
        Ok(())
    }

    fn add_rrset_to(
        &mut self,
        kind: TreeKind,
        owner: OwnerName,
        rrset: Rrset,
        policy: DuplicatePolicy,
    ) -> Result<NodeId, Error> {
        self.check_in_zone(&owner)?;
        let id = match self.tree(kind).get(&owner) {
            Some(id) => id,
            None => {
                let mut node = Node::new(owner, None);
                node.add_rrset(rrset)?;
                return match kind {
                    TreeKind::Regular => self.add_node(node, true),
                    TreeKind::Nsec3 => self.add_nsec3_node(node),
                };
            }
        };

        let rr_type = rrset.rr_type;
        if !self.get(id).has_rrset(rr_type) {
            self.get_mut(id).add_rrset(rrset)?;
            return Ok(id);
        }
        match policy {
            DuplicatePolicy::Reject => return Err(Error::DuplicateType(rr_type)),
            DuplicatePolicy::Merge => {
                if let Some(existing) = self.get_mut(id).rrset_mut(rr_type) {
                    existing.merge(rrset)?;
                }
            }
            DuplicatePolicy::Replace => {
                self.get_mut(id).replace_rrset(rrset);
            }
            DuplicatePolicy::Skip => {
                trace!("skipped duplicate {} RRset at {}", rr_type, self.get(id).owner());
            }
        }
        Ok(id)
    }

    /// Puts a validated node into the arena and the tree of the given
    /// kind, and splices it into that tree's circular predecessor chain.
    fn insert_node(&mut self, kind: TreeKind, node: Node) -> NodeId {
        let id = NodeId(self.nodes.insert(Arc::new(node)));
        let owner = self.nodes[id.0].owner();
        let tree = match kind {
            TreeKind::Regular => &mut self.tree,
            TreeKind::Nsec3 => &mut self.nsec3_tree,
        };
        tree.insert(owner, id);
        trace!("inserted node {} into the {:?} tree", owner, kind);

        let previous = tree.predecessor(owner).or_else(|| tree.last());
        let next = tree.successor(owner).or_else(|| tree.first());
        self.get_mut(id).set_previous(previous);
        if let Some(next) = next {
            self.get_mut(next).set_previous(Some(id));
        }
        id
    }

    /// Sets the wildcard links involving a newly inserted regular node,
    /// and makes it the parent of any existing nodes below it that
    /// were attached to one of its ancestors.
    fn link_regular(&mut self, id: NodeId) {
        let owner = self.get(id).owner().clone();

        if owner.is_wildcard() {
            if let Some(parent) = owner.left_chop().and_then(|name| self.tree.get(&name)) {
                self.get_mut(parent).set_wildcard_child(Some(id));
            }
        }
        if let Ok(wildcard) = owner.prepend_label(Label::asterisk()) {
            if let Some(wildcard_child) = self.tree.get(&wildcard) {
                self.get_mut(id).set_wildcard_child(Some(wildcard_child));
            }
        }

        let adopted: Vec<NodeId> = self
            .tree
            .iter_after(&owner)
            .take_while(|(name, _)| name.eq_or_subdomain_of(&owner))
            .map(|(_, descendant)| descendant)
            .filter(|descendant| {
                self.get(*descendant)
                    .parent()
                    .map_or(true, |parent| !self.get(parent).owner().eq_or_subdomain_of(&owner))
            })
            .collect();
        for descendant in adopted {
            self.get_mut(descendant).set_parent(Some(id));
        }
    }
}

////////////////////////////////////////////////////////////////////////
// LOOKUPS                                                            //
////////////////////////////////////////////////////////////////////////

impl ZoneContents {
    /// Returns the regular node owned by `name`.
    pub fn find_node(&self, name: &Name) -> Option<&Node> {
        self.find_node_id(name).map(|id| self.get(id))
    }

    pub fn find_node_id(&self, name: &Name) -> Option<NodeId> {
        self.tree.get(name)
    }

    /// Looks up `name` in the regular tree, returning the node owned by
    /// it (if any), its closest encloser, and its canonical predecessor.
    ///
    /// The closest encloser of a missing name is found by stripping
    /// labels from the name until an existing node is found. This ends
    /// at the apex at the latest. Fails with [`Error::NotInZone`] if
    /// `name` is outside the zone.
    pub fn find_name(&self, name: &Name) -> Result<FoundName, Error> {
        self.check_in_zone(name)?;
        if let Some(id) = self.tree.get(name) {
            let node = self.get(id);
            let previous = node
                .previous()
                .or_else(|| self.tree.predecessor(name))
                .unwrap_or(self.apex);
            return Ok(FoundName {
                status: FindStatus::Found,
                node: Some(node),
                closest_encloser: node,
                previous: self.get(previous),
            });
        }

        let previous = self.tree.predecessor(name).unwrap_or(self.apex);
        let mut closest_encloser = self.apex;
        let mut ancestor = name.left_chop();
        while let Some(candidate) = ancestor {
            if let Some(id) = self.tree.get(&candidate) {
                closest_encloser = id;
                break;
            }
            ancestor = candidate.left_chop();
        }
        Ok(FoundName {
            status: FindStatus::NotFound,
            node: None,
            closest_encloser: self.get(closest_encloser),
            previous: self.get(previous),
        })
    }

    /// Returns the regular node that precedes `name` in canonical order,
    /// whether or not `name` exists. The apex is preceded by the last
    /// node of the zone.
    pub fn find_previous(&self, name: &Name) -> Result<&Node, Error> {
        self.check_in_zone(name)?;
        let id = self
            .tree
            .predecessor(name)
            .or_else(|| self.tree.last())
            .unwrap_or(self.apex);
        Ok(self.get(id))
    }

    /// Returns the NSEC3 node owned by `name`, which should be a hashed
    /// owner.
    pub fn find_nsec3_node(&self, name: &Name) -> Option<&Node> {
        self.nsec3_tree.get(name).map(|id| self.get(id))
    }

    /// Returns the NSEC3 node that precedes `name` in canonical order,
    /// wrapping around to the last one.
    pub fn find_nsec3_previous(&self, name: &Name) -> Option<&Node> {
        self.nsec3_tree
            .predecessor(name)
            .or_else(|| self.nsec3_tree.last())
            .map(|id| self.get(id))
    }

    /// Hashes `name` with the zone's NSEC3 parameters and looks up the
    /// NSEC3 node that matches it, along with the one that precedes the
    /// hash.
    pub fn find_nsec3_for_name(
        &self,
        name: &Name,
        hasher: &dyn Nsec3Hasher,
    ) -> Result<FoundNsec3, Error> {
        self.check_in_zone(name)?;
        let params = self.nsec3_params.as_ref().ok_or(Error::NoNsec3Params)?;
        let hash = hasher.hash(params, name)?;
        let hashed_owner = nsec3::hashed_owner(&hash, self.name())?;

        let node = self.find_nsec3_node(&hashed_owner);
        let previous = match node.and_then(Node::previous) {
            Some(id) => Some(self.get(id)),
            None => self.find_nsec3_previous(&hashed_owner),
        };
        Ok(FoundNsec3 {
            status: if node.is_some() {
                FindStatus::Found
            } else {
                FindStatus::NotFound
            },
            hashed_owner,
            node,
            previous,
        })
    }
}

////////////////////////////////////////////////////////////////////////
// ADJUSTMENT                                                         //
////////////////////////////////////////////////////////////////////////

/// The links and flags of a regular node as computed by
/// [`ZoneContents::adjust`].
struct Adjusted {
    id: NodeId,
    parent: Option<NodeId>,
    previous: NodeId,
    wildcard_child: Option<NodeId>,
    nsec3_node: Option<Option<NodeId>>,
    delegation: bool,
    non_authoritative: bool,
}

impl ZoneContents {
    /// Parses the apex NSEC3PARAM record into the zone's NSEC3
    /// parameters. Without an NSEC3PARAM record the parameters are
    /// cleared.
    pub fn load_nsec3param(&mut self) -> Result<(), Error> {
        let rdata = self
            .apex()
            .rrset(Type::NSEC3PARAM)
            .and_then(|rrset| rrset.rdatas().next());
        self.nsec3_params = match rdata {
            Some(rdata) => {
                let params = Nsec3Params::from_rdata(rdata)?;
                if params.flags != 0 {
                    warn!(
                        "NSEC3PARAM of {} has nonzero flags {:#04x}",
                        self.name(),
                        params.flags
                    );
                }
                Some(params)
            }
            None => None,
        };
        Ok(())
    }

    /// Recomputes the topology of the zone after loading.
    ///
    /// For every regular node this sets the parent (the nearest
    /// existing ancestor), the circular predecessor chain, and the
    /// wildcard child. Delegation points (non-apex nodes with NS
    /// records, not themselves below a delegation) and the
    /// non-authoritative nodes below them are flagged. When the zone
    /// has NSEC3 parameters and a `hasher` is supplied, each node is
    /// paired with the NSEC3 node of its hashed owner; without
    /// parameters, the pairings are cleared. The NSEC3 tree gets its own
    /// predecessor chain.
    ///
    /// Everything is computed before anything is changed, so a hashing
    /// failure leaves the zone as it was. Nodes whose links are already
    /// right are not touched, which keeps them shared with any
    /// shallow copy.
    pub fn adjust(&mut self, hasher: Option<&dyn Nsec3Hasher>) -> Result<(), Error> {
        let adjusted = self.compute_adjustments(hasher)?;
        let nsec3_chain: Vec<(NodeId, NodeId)> = {
            let ids: Vec<NodeId> = self.nsec3_tree.iter().map(|(_, id)| id).collect();
            ids.iter()
                .enumerate()
                .map(|(i, id)| (*id, ids[(i + ids.len() - 1) % ids.len()]))
                .collect()
        };

        let mut changed = 0;
        for entry in &adjusted {
            let node = self.get(entry.id);
            let nsec3_node = entry.nsec3_node.unwrap_or_else(|| node.nsec3_node());
            if node.parent() == entry.parent
                && node.previous() == Some(entry.previous)
                && node.wildcard_child() == entry.wildcard_child
                && node.nsec3_node() == nsec3_node
                && node.is_delegation() == entry.delegation
                && node.is_non_authoritative() == entry.non_authoritative
            {
                continue;
            }
            let node = self.get_mut(entry.id);
            node.set_parent(entry.parent);
            node.set_previous(Some(entry.previous));
            node.set_wildcard_child(entry.wildcard_child);
            node.set_nsec3_node(nsec3_node);
            node.set_delegation(entry.delegation);
            node.set_non_authoritative(entry.non_authoritative);
            changed += 1;
        }

        let apex = Some(self.apex);
        for (id, previous) in nsec3_chain {
            let node = self.get(id);
            if node.parent() == apex && node.previous() == Some(previous) {
                continue;
            }
            let node = self.get_mut(id);
            node.set_parent(apex);
            node.set_previous(Some(previous));
            changed += 1;
        }

        debug!(
            "Adjusted zone {}: {} nodes, {} NSEC3 nodes, {} updated.",
            self.name(),
            self.node_count(),
            self.nsec3_node_count(),
            changed,
        );
        Ok(())
    }

    fn compute_adjustments(
        &self,
        hasher: Option<&dyn Nsec3Hasher>,
    ) -> Result<Vec<Adjusted>, Error> {
        let entries: Vec<(&Name, NodeId)> = self.tree.iter().collect();
        let mut adjusted: Vec<Adjusted> = Vec::with_capacity(entries.len());
        // Indices (into adjusted) of the ancestors of the current node.
        let mut ancestors: Vec<usize> = Vec::new();

        for (index, (name, id)) in entries.iter().copied().enumerate() {
            while let Some(&top) = ancestors.last() {
                if name.eq_or_subdomain_of(entries[top].0) {
                    break;
                }
                ancestors.pop();
            }
            let parent = ancestors.last().copied();

            let non_authoritative = parent.map_or(false, |p| {
                adjusted[p].delegation || adjusted[p].non_authoritative
            });
            let delegation =
                !non_authoritative && id != self.apex && self.get(id).has_rrset(Type::NS);

            if name.is_wildcard() {
                if let Some(p) = parent {
                    if name.left_chop().as_ref() == Some(entries[p].0) {
                        adjusted[p].wildcard_child = Some(id);
                    }
                }
            }

            let nsec3_node = match (&self.nsec3_params, hasher) {
                (None, _) => Some(None),
                (Some(_), None) => None,
                (Some(params), Some(hasher)) => {
                    let hash = hasher.hash(params, name)?;
                    let hashed_owner = nsec3::hashed_owner(&hash, self.name())?;
                    let found = self.nsec3_tree.get(&hashed_owner);
                    if found.is_none() && !non_authoritative && !delegation {
                        warn!("{} has no NSEC3 node (expected {})", name, hashed_owner);
                    }
                    Some(found)
                }
            };

            adjusted.push(Adjusted {
                id,
                parent: parent.map(|p| entries[p].1),
                previous: entries[(index + entries.len() - 1) % entries.len()].1,
                wildcard_child: None,
                nsec3_node,
                delegation,
                non_authoritative,
            });
            ancestors.push(index);
        }
        Ok(adjusted)
    }
}

////////////////////////////////////////////////////////////////////////
// TRAVERSAL AND COPYING                                              //
////////////////////////////////////////////////////////////////////////

impl ZoneContents {
    /// Calls `visitor` on each regular node, subdomains before their
    /// ancestors.
    pub fn apply_postorder<C>(&self, mut visitor: impl FnMut(&Node, &mut C), context: &mut C) {
        self.tree
            .apply_postorder(|id, context| visitor(self.get(id), context), context);
    }

    /// Calls `visitor` on each regular node in canonical order.
    pub fn apply_inorder<C>(&self, mut visitor: impl FnMut(&Node, &mut C), context: &mut C) {
        self.tree
            .apply_inorder(|id, context| visitor(self.get(id), context), context);
    }

    /// Calls `visitor` on each regular node in reverse canonical order.
    pub fn apply_inorder_reverse<C>(
        &self,
        mut visitor: impl FnMut(&Node, &mut C),
        context: &mut C,
    ) {
        self.tree
            .apply_inorder_reverse(|id, context| visitor(self.get(id), context), context);
    }

    pub fn nsec3_apply_postorder<C>(
        &self,
        mut visitor: impl FnMut(&Node, &mut C),
        context: &mut C,
    ) {
        self.nsec3_tree
            .apply_postorder(|id, context| visitor(self.get(id), context), context);
    }

    pub fn nsec3_apply_inorder<C>(&self, mut visitor: impl FnMut(&Node, &mut C), context: &mut C) {
        self.nsec3_tree
            .apply_inorder(|id, context| visitor(self.get(id), context), context);
    }

    pub fn nsec3_apply_inorder_reverse<C>(
        &self,
        mut visitor: impl FnMut(&Node, &mut C),
        context: &mut C,
    ) {
        self.nsec3_tree
            .apply_inorder_reverse(|id, context| visitor(self.get(id), context), context);
    }

    /// Returns an iterator over the regular nodes in canonical order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Node> + '_ {
        self.tree.iter().map(move |(_, id)| self.get(id))
    }

    /// Returns an iterator over the NSEC3 nodes in canonical order.
    pub fn nsec3_iter(&self) -> impl DoubleEndedIterator<Item = &Node> + '_ {
        self.nsec3_tree.iter().map(move |(_, id)| self.get(id))
    }

    /// Builds new contents that share every node with these, but have
    /// their own trees. Nodes and trees of either copy can then be
    /// changed without affecting the other.
    pub fn shallow_copy(&self) -> ZoneContents {
        let mut tree = ZoneTree::new();
        for (name, id) in self.tree.iter() {
            tree.insert(name, id);
        }
        let mut nsec3_tree = ZoneTree::new();
        for (name, id) in self.nsec3_tree.iter() {
            nsec3_tree.insert(name, id);
        }
        debug!(
            "Built shallow copy of zone {} ({} nodes).",
            self.name(),
            self.nodes.len()
        );
        ZoneContents {
            nodes: self.nodes.clone(),
            apex: self.apex,
            tree,
            nsec3_tree,
            nsec3_params: self.nsec3_params.clone(),
            generation: self.generation,
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
