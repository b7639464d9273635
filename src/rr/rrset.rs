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

//! Implementation of the [`Rrset`] structure.

use std::fmt;
use std::iter::FusedIterator;

use super::{Ttl, Type};

////////////////////////////////////////////////////////////////////////
// RRSETS                                                             //
////////////////////////////////////////////////////////////////////////

/// A resource record set.
///
/// [RFC 2181 § 5] defined an RRset as a group of records with the same
/// owner, class, and type, all of which share a TTL. An `Rrset` stores
/// the common [`Type`] and [`Ttl`] once and then one RDATA per record.
/// The RDATA is opaque to the zone database. The owner is not stored in
/// the structure itself; the zone node that holds the `Rrset` keeps it.
///
/// The RRSIG records that sign the set, if any, are attached to it
/// with [`Rrset::set_rrsigs`], as DNSSEC processing always needs them
/// together.
///
/// [RFC 2181 § 5]: https://datatracker.ietf.org/doc/html/rfc2181#section-5
#[derive(Clone, Debug)]
pub struct Rrset {
    pub rr_type: Type,
    pub ttl: Ttl,
    rdatas: Vec<u8>,
    rrsigs: Option<Box<Rrset>>,
}

impl Rrset {
    /// Creates a new [`Rrset`] with the given RR type and TTL. It will
    /// initially contain no record data.
    pub fn new(rr_type: Type, ttl: Ttl) -> Self {
        Self {
            rr_type,
            ttl,
            rdatas: Vec::new(),
            rrsigs: None,
        }
    }

    /// Adds an RDATA to this [`Rrset`]. Following the behavior of other
    /// nameservers, RDATA already present in the [`Rrset`] is silently
    /// discarded.
    pub fn push_rdata(&mut self, rdata: &[u8]) -> Result<(), Error> {
        if rdata.len() > u16::MAX as usize {
            return Err(Error::RdataTooLong);
        } else if self.rdatas().any(|existing| existing == rdata) {
            return Ok(());
        }
        self.rdatas.reserve(2 + rdata.len());
        self.rdatas
            .extend_from_slice(&(rdata.len() as u16).to_ne_bytes());
        self.rdatas.extend_from_slice(rdata);
        Ok(())
    }

    /// Returns an iterator over the RDATA of this `Rrset`.
    pub fn rdatas(&self) -> Rdatas {
        Rdatas {
            cursor: &self.rdatas,
        }
    }

    /// Returns the number of records in the set.
    pub fn len(&self) -> usize {
        self.rdatas().count()
    }

    pub fn is_empty(&self) -> bool {
        self.rdatas.is_empty()
    }

    /// Moves the records of `other` into this set, dropping duplicates.
    /// Both sets must have the same type and TTL. Any RRSIGs attached
    /// to `other` are merged into this set's RRSIGs the same way.
    ///
    /// On failure, `self` is left unchanged.
    pub fn merge(&mut self, other: Rrset) -> Result<(), Error> {
        self.check_mergeable(&other)?;
        if let (Some(mine), Some(theirs)) = (&self.rrsigs, &other.rrsigs) {
            mine.check_mergeable(theirs)?;
        }

        for rdata in other.rdatas() {
            self.push_rdata(rdata)?;
        }
        if let Some(theirs) = other.rrsigs {
            match self.rrsigs {
                Some(ref mut mine) => mine.merge(*theirs)?,
                None => self.rrsigs = Some(theirs),
            }
        }
        Ok(())
    }

    fn check_mergeable(&self, other: &Rrset) -> Result<(), Error> {
        if self.rr_type != other.rr_type {
            Err(Error::TypeMismatch)
        } else if self.ttl != other.ttl {
            Err(Error::TtlMismatch)
        } else {
            Ok(())
        }
    }

    /// Returns the RRSIG records attached to this set.
    pub fn rrsigs(&self) -> Option<&Rrset> {
        self.rrsigs.as_deref()
    }

    pub fn rrsigs_mut(&mut self) -> Option<&mut Rrset> {
        self.rrsigs.as_deref_mut()
    }

    /// Attaches `rrsigs` to this set, replacing (and returning) any that
    /// were attached before. The RRSIGs must have type RRSIG.
    pub fn set_rrsigs(&mut self, rrsigs: Rrset) -> Result<Option<Rrset>, Error> {
        if rrsigs.rr_type != Type::RRSIG {
            return Err(Error::TypeMismatch);
        }
        Ok(self.rrsigs.replace(Box::new(rrsigs)).map(|old| *old))
    }

    /// Detaches and returns the RRSIG records of this set.
    pub fn take_rrsigs(&mut self) -> Option<Rrset> {
        self.rrsigs.take().map(|rrsigs| *rrsigs)
    }

    /// Reads the type covered by an RRSIG record from the first two
    /// octets of its RDATA ([RFC 4034 § 3.1]).
    ///
    /// [RFC 4034 § 3.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-3.1
    pub fn type_covered(rrsig_rdata: &[u8]) -> Option<Type> {
        let octets: [u8; 2] = rrsig_rdata.get(0..2)?.try_into().ok()?;
        Some(Type::from(u16::from_be_bytes(octets)))
    }
}

/// An iterator over the RDATA of an [`Rrset`].
pub struct Rdatas<'a> {
    cursor: &'a [u8],
}

impl<'a> Iterator for Rdatas<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let len_octets: [u8; 2] = self.cursor.get(0..2)?.try_into().ok()?;
        let len = u16::from_ne_bytes(len_octets) as usize;
        let rdata = self.cursor.get(2..len + 2)?;
        self.cursor = &self.cursor[len + 2..];
        Some(rdata)
    }
}

impl FusedIterator for Rdatas<'_> {}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that records cannot be added to an [`Rrset`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// The RDATA is longer than 65,535 octets.
    RdataTooLong,

    /// The records have a different [`Type`] than the [`Rrset`].
    TypeMismatch,

    /// The records have a different [`Ttl`] than the [`Rrset`].
    TtlMismatch,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::RdataTooLong => f.write_str("RDATA is too long"),
            Self::TypeMismatch => f.write_str("TYPE mismatch"),
            Self::TtlMismatch => f.write_str("TTL mismatch"),
        }
    }
}

impl std::error::Error for Error {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn rrset(rr_type: Type, ttl: u32, rdatas: &[&[u8]]) -> Rrset {
        let mut rrset = Rrset::new(rr_type, Ttl::from(ttl));
        for rdata in rdatas {
            rrset.push_rdata(rdata).unwrap();
        }
        rrset
    }

    #[test]
    fn push_rdata_drops_duplicates() {
        let set = rrset(Type::A, 3600, &[b"\x7f\x00\x00\x01", b"\x7f\x00\x00\x01"]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.rdatas().next(), Some(&b"\x7f\x00\x00\x01"[..]));
    }

    #[test]
    fn push_rdata_rejects_long_rdata() {
        let mut set = Rrset::new(Type::TXT, Ttl::from(0));
        assert_eq!(set.push_rdata(&[0; 65536]), Err(Error::RdataTooLong));
        assert!(set.is_empty());
        assert!(set.push_rdata(&[0; 65535]).is_ok());
    }

    #[test]
    fn rdatas_preserve_insertion_order() {
        let set = rrset(Type::TXT, 60, &[b"b", b"", b"a"]);
        let rdatas: Vec<&[u8]> = set.rdatas().collect();
        assert_eq!(rdatas, [&b"b"[..], b"", b"a"]);
    }

    #[test]
    fn merge_combines_records_and_rrsigs() {
        let mut set = rrset(Type::A, 60, &[b"\x01\x02\x03\x04"]);
        let mut other = rrset(Type::A, 60, &[b"\x01\x02\x03\x04", b"\x05\x06\x07\x08"]);
        other
            .set_rrsigs(rrset(Type::RRSIG, 60, &[b"\x00\x01sig"]))
            .unwrap();
        set.merge(other).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.rrsigs().map(Rrset::len), Some(1));
    }

    #[test]
    fn merge_checks_type_and_ttl() {
        let mut set = rrset(Type::A, 60, &[b"\x01\x02\x03\x04"]);
        assert_eq!(
            set.merge(rrset(Type::AAAA, 60, &[])),
            Err(Error::TypeMismatch)
        );
        assert_eq!(
            set.merge(rrset(Type::A, 120, &[b"\x05\x06\x07\x08"])),
            Err(Error::TtlMismatch)
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn set_rrsigs_requires_rrsig_type() {
        let mut set = rrset(Type::A, 60, &[]);
        assert_eq!(
            set.set_rrsigs(rrset(Type::A, 60, &[])).err(),
            Some(Error::TypeMismatch)
        );
        assert!(set.set_rrsigs(rrset(Type::RRSIG, 60, &[])).unwrap().is_none());
        assert!(set.take_rrsigs().is_some());
        assert!(set.rrsigs().is_none());
    }

    #[test]
    fn type_covered_reads_first_two_octets() {
        assert_eq!(Rrset::type_covered(b"\x00\x01rest"), Some(Type::A));
        assert_eq!(Rrset::type_covered(b"\x00\x32"), Some(Type::NSEC3));
        assert_eq!(Rrset::type_covered(b"\x00"), None);
    }
}
