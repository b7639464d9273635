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

//! Implementation of the [`Label`] type.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::{Error, MAX_LABEL_LEN};

/// A single label of a domain name, borrowed from the name's
/// on-the-wire representation.
///
/// `Label` wraps `[u8]` and can only be constructed for slices of at
/// most 63 octets. Following [RFC 4343], equality, hashing, and
/// ordering ignore ASCII case, while the stored octets keep whatever
/// case they were created with.
///
/// ```
/// use zonedb::name::Label;
///
/// let www = Label::new(b"WWW").unwrap();
/// assert_eq!(www, Label::new(b"www").unwrap());
/// assert!(Label::new(&[b'x'; 64]).is_err());
/// ```
///
/// [RFC 4343]: https://datatracker.ietf.org/doc/html/rfc4343
#[repr(transparent)]
pub struct Label {
    octets: [u8],
}

#[allow(clippy::len_without_is_empty)] // Following DNS terminology, we have is_null().
impl Label {
    /// Wraps `octets` as a `Label`, failing if there are more than 63
    /// of them.
    pub fn new(octets: &[u8]) -> Result<&Self, Error> {
        if octets.len() > MAX_LABEL_LEN {
            Err(Error::LabelTooLong)
        } else {
            Ok(Self::from_unchecked(octets))
        }
    }

    /// Wraps `octets` as a `Label` without a length check. Only for use
    /// within the `name` module on slices already known to be valid.
    pub(super) fn from_unchecked(octets: &[u8]) -> &Self {
        // SAFETY: Label is repr(transparent) over [u8].
        unsafe { &*(octets as *const [u8] as *const Label) }
    }

    /// The mutable counterpart of [`Label::from_unchecked`].
    pub(super) fn from_unchecked_mut(octets: &mut [u8]) -> &mut Self {
        // SAFETY: as above.
        unsafe { &mut *(octets as *mut [u8] as *mut Label) }
    }

    /// Returns the asterisk label `*`, which marks wildcard owners.
    pub fn asterisk() -> &'static Self {
        Self::from_unchecked(b"*")
    }

    /// Returns the null (zero-length) label that terminates every fully
    /// qualified name.
    pub fn null() -> &'static Self {
        Self::from_unchecked(&[])
    }

    pub fn is_asterisk(&self) -> bool {
        self.octets == *b"*"
    }

    pub fn is_null(&self) -> bool {
        self.octets.is_empty()
    }

    /// Returns the number of octets in the label, not counting the
    /// length octet that precedes it on the wire.
    pub fn len(&self) -> usize {
        self.octets.len()
    }

    pub fn octets(&self) -> &[u8] {
        &self.octets
    }

    pub(super) fn octets_mut(&mut self) -> &mut [u8] {
        &mut self.octets
    }
}

/// Labels are displayed in the RFC 1035 § 5.1 master-file syntax:
/// periods, backslashes, and the characters with special meaning in
/// master files (`;`, `(`, `)`, and `"`) are backslash-escaped, other
/// printable ASCII is written as-is, and everything else becomes
/// `\DDD`.
impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &octet in self.octets() {
            match octet {
                b'.' | b'\\' | b';' | b'(' | b')' | b'"' => write!(f, "\\{}", octet as char)?,
                _ if octet.is_ascii_graphic() => write!(f, "{}", octet as char)?,
                _ => write!(f, "\\{:03}", octet)?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.octets.eq_ignore_ascii_case(&other.octets)
    }
}

impl Eq for Label {}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Labels are ordered as in [RFC 4034 § 6.1]: as unsigned,
/// left-justified octet strings with uppercase ASCII treated as
/// lowercase. When one label is a prefix of the other, the shorter one
/// sorts first.
///
/// [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        let lower = |octet: &u8| octet.to_ascii_lowercase();
        self.octets.iter().map(lower).cmp(other.octets.iter().map(lower))
    }
}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Must agree with the case-insensitive Eq above.
        state.write_u8(self.octets.len() as u8);
        for octet in &self.octets {
            state.write_u8(octet.to_ascii_lowercase());
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
