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

//! Record-set types consumed by the zone database.
//!
//! The zone database treats record data as opaque octets keyed by a
//! 16-bit [`Type`]. These types carry just enough structure for it to
//! do its job: grouping records into [`Rrset`]s, enforcing a common
//! [`Ttl`], and attaching covering RRSIG records.

mod rr_type;
mod rrset;
mod ttl;
pub use rr_type::Type;
pub use rrset::{Error, Rdatas, Rrset};
pub use ttl::Ttl;
