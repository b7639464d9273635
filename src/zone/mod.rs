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

//! The in-memory zone database.
//!
//! A zone's data is a [`ZoneContents`]: [`Node`]s holding the zone's
//! RRsets, indexed in DNSSEC canonical order by two [`ZoneTree`]s (one
//! for ordinary owners and one for the hashed owners of NSEC3 records).
//! Lookups answer the questions that authoritative answers and
//! authenticated denial of existence depend on: whether a name exists,
//! which existing node most closely encloses it, and which node
//! precedes it in canonical order. A [`Zone`] publishes immutable
//! snapshots of the contents so that updates can proceed while queries
//! are answered.

mod contents;
mod error;
mod handle;
mod node;
mod nsec3;
mod tree;
pub use contents::{DuplicatePolicy, FindStatus, FoundName, FoundNsec3, ZoneContents};
pub use error::Error;
pub use handle::Zone;
pub use node::{Node, NodeId, OwnerName};
pub use nsec3::{hashed_owner, Nsec3Hasher, Nsec3Params, Sha1Nsec3Hasher, SHA1_ALGORITHM};
pub use tree::ZoneTree;
