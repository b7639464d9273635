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

//! NSEC3 parameters and owner-name hashing ([RFC 5155]).
//!
//! The zone database does not care how NSEC3 hashes are computed; it
//! only needs to turn a name into the hashed owner of its NSEC3 node.
//! [`Nsec3Hasher`] is the seam for that, and [`Sha1Nsec3Hasher`]
//! implements the only algorithm defined so far.
//!
//! [RFC 5155]: https://datatracker.ietf.org/doc/html/rfc5155

use data_encoding::BASE32_DNSSEC;
use sha1::{Digest, Sha1};

use super::Error;
use crate::name::{Label, Name};

/// The NSEC3 hash algorithm number of SHA-1.
pub const SHA1_ALGORITHM: u8 = 1;

/// The parameters of a zone's NSEC3 chain, as found in its NSEC3PARAM
/// record ([RFC 5155 § 4]).
///
/// [RFC 5155 § 4]: https://datatracker.ietf.org/doc/html/rfc5155#section-4
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Nsec3Params {
    pub algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
}

impl Nsec3Params {
    /// Parses the RDATA of an NSEC3PARAM record.
    pub fn from_rdata(rdata: &[u8]) -> Result<Self, Error> {
        match rdata {
            [algorithm, flags, i0, i1, salt_len, salt @ ..] if salt.len() == *salt_len as usize => {
                Ok(Self {
                    algorithm: *algorithm,
                    flags: *flags,
                    iterations: u16::from_be_bytes([*i0, *i1]),
                    salt: salt.to_vec(),
                })
            }
            _ => Err(Error::InvalidRdata),
        }
    }
}

/// Computes NSEC3 hashes of owner names.
pub trait Nsec3Hasher {
    /// Returns the raw NSEC3 hash of `name` under `params`.
    fn hash(&self, params: &Nsec3Params, name: &Name) -> Result<Vec<u8>, Error>;
}

/// The SHA-1 NSEC3 hash: the lowercase wire form of the name, salted
/// and hashed, then rehashed with the salt `iterations` more times
/// ([RFC 5155 § 5]).
///
/// [RFC 5155 § 5]: https://datatracker.ietf.org/doc/html/rfc5155#section-5
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha1Nsec3Hasher;

impl Nsec3Hasher for Sha1Nsec3Hasher {
    fn hash(&self, params: &Nsec3Params, name: &Name) -> Result<Vec<u8>, Error> {
        if params.algorithm != SHA1_ALGORITHM {
            return Err(Error::UnsupportedNsec3Algorithm(params.algorithm));
        }
        let name = name.to_ascii_lowercase();
        let mut digest = Sha1::new()
            .chain_update(name.wire_repr())
            .chain_update(&params.salt)
            .finalize();
        for _ in 0..params.iterations {
            digest = Sha1::new()
                .chain_update(digest)
                .chain_update(&params.salt)
                .finalize();
        }
        Ok(digest.to_vec())
    }
}

/// Builds the owner name of an NSEC3 record from a raw hash: the
/// hash in lowercase base32hex without padding, prepended to the zone
/// apex.
pub fn hashed_owner(hash: &[u8], apex: &Name) -> Result<Name, Error> {
    let encoded = BASE32_DNSSEC.encode(hash);
    let label = Label::new(encoded.as_bytes())?;
    Ok(apex.prepend_label(label)?)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    // The parameters of RFC 5155 Appendix A.
    const NSEC3PARAM: &[u8] = b"\x01\x00\x00\x0c\x04\xaa\xbb\xcc\xdd";

    fn hash_owner(name: &str) -> String {
        let params = Nsec3Params::from_rdata(NSEC3PARAM).unwrap();
        let apex: Name = "example.".parse().unwrap();
        let hash = Sha1Nsec3Hasher.hash(&params, &name.parse().unwrap()).unwrap();
        hashed_owner(&hash, &apex).unwrap().to_string()
    }

    #[test]
    fn from_rdata_parses_nsec3param() {
        let params = Nsec3Params::from_rdata(NSEC3PARAM).unwrap();
        assert_eq!(params.algorithm, 1);
        assert_eq!(params.flags, 0);
        assert_eq!(params.iterations, 12);
        assert_eq!(params.salt, [0xaa, 0xbb, 0xcc, 0xdd]);
    }

    #[test]
    fn from_rdata_rejects_bad_salt_length() {
        assert_eq!(
            Nsec3Params::from_rdata(b"\x01\x00\x00\x0c\x05\xaa"),
            Err(Error::InvalidRdata)
        );
        assert_eq!(Nsec3Params::from_rdata(b"\x01\x00"), Err(Error::InvalidRdata));
        let empty_salt = Nsec3Params::from_rdata(b"\x01\x00\x00\x00\x00").unwrap();
        assert!(empty_salt.salt.is_empty());
    }

    #[test]
    fn sha1_hasher_matches_rfc5155_vectors() {
        assert_eq!(
            hash_owner("example."),
            "0p9mhaveqvm6t7vbl5lop2u3t2rp3tom.example."
        );
        assert_eq!(
            hash_owner("a.example."),
            "35mthgpgcu1qg68fab165klnsnk3dpvl.example."
        );
        // Hashing works on the lowercase name.
        assert_eq!(
            hash_owner("A.EXAMPLE."),
            "35mthgpgcu1qg68fab165klnsnk3dpvl.example."
        );
    }

    #[test]
    fn sha1_hasher_rejects_other_algorithms() {
        let params = Nsec3Params {
            algorithm: 2,
            flags: 0,
            iterations: 0,
            salt: Vec::new(),
        };
        assert_eq!(
            Sha1Nsec3Hasher.hash(&params, Name::root()),
            Err(Error::UnsupportedNsec3Algorithm(2))
        );
    }
}
