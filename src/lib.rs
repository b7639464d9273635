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

//! An in-memory database for the contents of authoritative DNS zones.
//!
//! The crate is organized in three layers:
//!
//! * [`name`] provides domain names in their on-the-wire form, with
//!   text parsing and display, case-insensitive comparison, and the
//!   DNSSEC canonical ordering.
//! * [`rr`] provides the small amount of record handling the database
//!   needs: RR types, TTLs, and [`Rrset`](rr::Rrset)s whose record data
//!   is kept opaque.
//! * [`zone`] provides the zone database itself: nodes, the ordered
//!   indexes over them, lookups for closest enclosers and canonical
//!   predecessors, NSEC3 support, and a handle for publishing new
//!   versions of a zone.

pub mod name;
pub mod rr;
pub mod zone;
