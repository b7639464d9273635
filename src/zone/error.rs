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

//! Implementation of the [`Error`] type for zone-related errors.

use std::fmt;

use crate::name;
use crate::rr::{self, Type};

/// Errors that arise during operations on
/// [`ZoneContents`](super::ZoneContents) and [`Zone`](super::Zone).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// A name could not be constructed.
    InvalidName(name::Error),

    /// A node or record's owner is not within the zone.
    NotInZone,

    /// A node with the same owner is already in the tree.
    DuplicateNode,

    /// The node already has an RRset of this type.
    DuplicateType(Type),

    /// Records could not be merged into an RRset of a different type.
    TypeMismatch,

    /// Records could not be merged into an RRset with a different TTL.
    TtlMismatch,

    /// RDATA was malformed or too long.
    InvalidRdata,

    /// The operation needs NSEC3 parameters, but none are loaded.
    NoNsec3Params,

    /// The NSEC3 hash algorithm is not supported.
    UnsupportedNsec3Algorithm(u8),

    /// RRSIGs were added for an RRset that is not in the zone.
    MissingCoveredRrset(Type),

    /// New contents were published for a zone with a different apex.
    ApexMismatch,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::InvalidName(error) => write!(f, "invalid name: {error}"),
            Self::NotInZone => f.write_str("the owner is not within the zone"),
            Self::DuplicateNode => f.write_str("a node with the same owner already exists"),
            Self::DuplicateType(rr_type) => {
                write!(f, "the node already has an RRset of type {rr_type}")
            }
            Self::TypeMismatch => f.write_str("the records' type does not match the RRset"),
            Self::TtlMismatch => f.write_str(
                "the records' TTL does not match the TTL of existing records in the same RRset",
            ),
            Self::InvalidRdata => f.write_str("invalid or oversized RDATA was found"),
            Self::NoNsec3Params => f.write_str("the zone has no NSEC3 parameters"),
            Self::UnsupportedNsec3Algorithm(algorithm) => {
                write!(f, "NSEC3 hash algorithm {algorithm} is not supported")
            }
            Self::MissingCoveredRrset(rr_type) => {
                write!(f, "RRSIGs cover type {}, which the owner does not have", rr_type)
            }
            Self::ApexMismatch => f.write_str("the new contents belong to a different zone"),
        }
    }
}

impl From<name::Error> for Error {
    fn from(error: name::Error) -> Self {
        Self::InvalidName(error)
    }
}

impl From<rr::Error> for Error {
    fn from(error: rr::Error) -> Self {
        match error {
            rr::Error::RdataTooLong => Self::InvalidRdata,
            rr::Error::TypeMismatch => Self::TypeMismatch,
            rr::Error::TtlMismatch => Self::TtlMismatch,
        }
    }
}

impl std::error::Error for Error {}
