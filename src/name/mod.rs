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

//! Domain names: the wire-format value type, its text codec, and the
//! DNSSEC canonical ordering.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::ptr;
use std::str::FromStr;

use arrayvec::ArrayVec;
use lazy_static::lazy_static;

mod builder;
mod error;
mod label;
mod table;
pub use builder::NameBuilder;
pub use error::Error;
pub use label::Label;
pub use table::NameTable;

/// The maximum number of labels in a domain name, counting the null
/// label.
const MAX_N_LABELS: usize = 128;

/// The maximum length of the uncompressed on-the-wire representation of
/// a domain name.
const MAX_WIRE_LEN: usize = 255;

/// The maximum length of a label in a domain name (not including the
/// octet that provides the length).
const MAX_LABEL_LEN: usize = 63;

type LabelOffsets = ArrayVec<u8, MAX_N_LABELS>;

////////////////////////////////////////////////////////////////////////
// NAME STRUCTURE                                                     //
////////////////////////////////////////////////////////////////////////

/// A domain name, stored in its uncompressed on-the-wire form as
/// defined in [RFC 1035 § 3.1]: a sequence of labels, each preceded by
/// a length octet.
///
/// A name is *fully qualified* when its last label is the null label
/// (a single zero octet). Names inside a zone are always fully
/// qualified; relative names exist so that suffixes can be attached
/// with [`Name::cat`]. Every `Name` has at least one label, holds no
/// label longer than 63 octets, and is at most 255 octets long.
///
/// Names are built from text with [`FromStr`], from wire octets with
/// [`Name::from_wire`], or label by label with a [`NameBuilder`]. The
/// [`Display`](fmt::Display) implementation produces text that parses
/// back to the same name.
///
/// Equality and hashing ignore ASCII case. [`Ord`] is the DNSSEC
/// canonical ordering, under which every name sorts before all of its
/// subdomains:
///
/// ```
/// use zonedb::name::Name;
///
/// let apex: Name = "example.com.".parse().unwrap();
/// let www: Name = "WWW.example.com.".parse().unwrap();
/// assert!(apex < www);
/// assert_eq!(www.to_string(), "WWW.example.com.");
/// assert_eq!(www.left_chop(), Some(apex));
/// ```
///
/// [RFC 1035 § 3.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.1
#[derive(Clone)]
pub struct Name {
    octets: Box<[u8]>,
}

lazy_static! {
    static ref ROOT: Name = Name::from_wire_unchecked(&[0]);
}

/// Private helpers.
impl Name {
    /// Wraps wire octets that the caller has already validated.
    fn from_wire_unchecked(octets: &[u8]) -> Self {
        Self {
            octets: octets.into(),
        }
    }

    /// Collects the offset of every label in the wire representation.
    fn label_offsets(&self) -> LabelOffsets {
        let mut offsets = LabelOffsets::new();
        let mut offset = 0;
        while offset < self.octets.len() {
            offsets.push(offset as u8);
            offset += self.octets[offset] as usize + 1;
        }
        offsets
    }

    /// Returns the label starting at `offset` in the wire
    /// representation.
    fn label_at(&self, offset: usize) -> &Label {
        let len = self.octets[offset] as usize;
        Label::from_unchecked(&self.octets[offset + 1..offset + 1 + len])
    }
}

////////////////////////////////////////////////////////////////////////
// NAME PUBLIC API                                                    //
////////////////////////////////////////////////////////////////////////

impl Name {
    /// Returns the DNS root `.`.
    pub fn root() -> &'static Name {
        &ROOT
    }

    /// Validates `octets` as a complete on-the-wire name and copies it
    /// into a new `Name`.
    ///
    /// The buffer must hold exactly one name. If it ends with the null
    /// label, the name is fully qualified; if it ends right after a
    /// non-null label, the name is relative. Octets after a null label
    /// are rejected.
    pub fn from_wire(octets: &[u8]) -> Result<Self, Error> {
        if octets.is_empty() {
            return Err(Error::UnexpectedEnd);
        } else if octets.len() > MAX_WIRE_LEN {
            return Err(Error::NameTooLong);
        }

        let mut offset = 0;
        while offset < octets.len() {
            let label_len = octets[offset] as usize;
            if label_len > MAX_LABEL_LEN {
                return Err(Error::LabelTooLong);
            } else if label_len == 0 && offset + 1 != octets.len() {
                return Err(Error::ExtraData);
            }
            offset += label_len + 1;
        }

        if offset > octets.len() {
            Err(Error::UnexpectedEnd)
        } else {
            Ok(Self::from_wire_unchecked(octets))
        }
    }

    /// Returns the on-the-wire representation of the name.
    pub fn wire_repr(&self) -> &[u8] {
        &self.octets
    }

    /// Returns the length of the on-the-wire representation in octets.
    pub fn wire_len(&self) -> usize {
        self.octets.len()
    }

    /// Returns whether the name ends with the null label.
    pub fn is_fully_qualified(&self) -> bool {
        self.octets.last() == Some(&0)
    }

    /// Returns whether the name is the DNS root `.`.
    pub fn is_root(&self) -> bool {
        *self.octets == [0]
    }

    /// Returns whether the first label of the name is `*`.
    pub fn is_wildcard(&self) -> bool {
        self.first_label().is_asterisk()
    }

    /// Returns the number of labels, counting the null label of a fully
    /// qualified name.
    pub fn label_count(&self) -> usize {
        self.label_offsets().len()
    }

    /// Returns the leftmost label.
    pub fn first_label(&self) -> &Label {
        self.label_at(0)
    }

    /// Returns an iterator over the labels of the name, from left to
    /// right.
    pub fn labels(&self) -> Labels {
        Labels::new(self)
    }

    /// Returns whether this name is equal to or a subdomain of `other`.
    /// A fully qualified name is never a subdomain of a relative one,
    /// and vice versa.
    pub fn eq_or_subdomain_of(&self, other: &Name) -> bool {
        let mine = self.labels();
        let theirs = other.labels();
        mine.len() >= theirs.len() && mine.rev().zip(theirs.rev()).all(|(a, b)| a == b)
    }

    /// Returns the parent name, that is, this name with its leftmost
    /// label removed. Returns `None` for the root, and for relative
    /// names of a single label, which have no parent.
    pub fn left_chop(&self) -> Option<Name> {
        let skip = self.octets[0] as usize + 1;
        if self.is_root() || skip >= self.octets.len() {
            None
        } else {
            Some(Self::from_wire_unchecked(&self.octets[skip..]))
        }
    }

    /// Appends the labels of `suffix` to this name in place.
    ///
    /// Only relative names can be extended, so this fails with
    /// [`Error::AlreadyFullyQualified`] when `self` already ends with the
    /// null label. It fails with [`Error::NameTooLong`] when the result
    /// would exceed 255 octets. On failure `self` is left unchanged.
    pub fn cat(&mut self, suffix: &Name) -> Result<(), Error> {
        if self.is_fully_qualified() {
            return Err(Error::AlreadyFullyQualified);
        }
        let new_len = self.octets.len() + suffix.octets.len();
        if new_len > MAX_WIRE_LEN {
            return Err(Error::NameTooLong);
        }
        let mut octets = Vec::with_capacity(new_len);
        octets.extend_from_slice(&self.octets);
        octets.extend_from_slice(&suffix.octets);
        self.octets = octets.into_boxed_slice();
        Ok(())
    }

    /// Returns a new name with `label` prepended to this one.
    pub fn prepend_label(&self, label: &Label) -> Result<Name, Error> {
        let mut builder = NameBuilder::new();
        builder.try_push_slice(label.octets())?;
        builder.finish_with_suffix(self)
    }

    /// Makes all ASCII letters in the name lowercase, as DNSSEC
    /// canonical form and NSEC3 hashing require.
    pub fn make_ascii_lowercase(&mut self) {
        for offset in self.label_offsets() {
            let offset = offset as usize;
            let len = self.octets[offset] as usize;
            Label::from_unchecked_mut(&mut self.octets[offset + 1..offset + 1 + len])
                .octets_mut()
                .make_ascii_lowercase();
        }
    }

    /// Returns a lowercase copy of the name.
    pub fn to_ascii_lowercase(&self) -> Name {
        let mut lowercase = self.clone();
        lowercase.make_ascii_lowercase();
        lowercase
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for (i, label) in self.labels().filter(|l| !l.is_null()).enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            label.fmt(f)?;
        }
        if self.is_fully_qualified() {
            f.write_str(".")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.octets.eq_ignore_ascii_case(&other.octets)
    }
}

impl Eq for Name {}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The [`Ord`] implementation for `Name` is DNSSEC's canonical ordering
/// ([RFC 4034 § 6.1]): names are compared as sequences of labels read
/// from the root toward the leftmost label. When one name's labels run
/// out first, that name is the ancestor and sorts first.
///
/// [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        if ptr::eq(self, other) {
            return Ordering::Equal;
        }
        let mine = self.labels();
        let theirs = other.labels();
        let (my_len, their_len) = (mine.len(), theirs.len());
        mine.rev()
            .zip(theirs.rev())
            .map(|(a, b)| a.cmp(b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| my_len.cmp(&their_len))
    }
}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Length octets are below 64, so lowercasing them is harmless,
        // and this agrees with the case-insensitive Eq above.
        for octet in self.octets.iter() {
            state.write_u8(octet.to_ascii_lowercase());
        }
    }
}

////////////////////////////////////////////////////////////////////////
// ITERATION OVER A NAME'S LABELS                                     //
////////////////////////////////////////////////////////////////////////

/// An iterator over the [`Label`]s in a [`Name`], created by
/// [`Name::labels`]. It can be run from either end, which is how the
/// canonical ordering walks names from the root.
#[derive(Clone, Debug)]
pub struct Labels<'a> {
    name: &'a Name,
    offsets: LabelOffsets,
    front: usize,
    back: usize,
}

impl<'a> Labels<'a> {
    fn new(name: &'a Name) -> Self {
        let offsets = name.label_offsets();
        let back = offsets.len();
        Self {
            name,
            offsets,
            front: 0,
            back,
        }
    }
}

impl<'a> Iterator for Labels<'a> {
    type Item = &'a Label;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            let offset = self.offsets[self.front] as usize;
            self.front += 1;
            Some(self.name.label_at(offset))
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl DoubleEndedIterator for Labels<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.back > self.front {
            self.back -= 1;
            Some(self.name.label_at(self.offsets[self.back] as usize))
        } else {
            None
        }
    }
}

impl ExactSizeIterator for Labels<'_> {}

impl FusedIterator for Labels<'_> {}

////////////////////////////////////////////////////////////////////////
// PARSING OF NAMES FROM RUST STRINGS                                 //
////////////////////////////////////////////////////////////////////////

/// Parses the master-file text form of a name. A trailing period makes
/// the name fully qualified; without one, the name is relative. The
/// string must be ASCII. The `\X` and `\DDD` escapes of
/// [RFC 1035 § 5.1] are supported, so labels may contain periods or
/// arbitrary octets.
///
/// [RFC 1035 § 5.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-5.1
impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::StrEmpty);
        } else if s == "." {
            return Ok(Name::root().clone());
        }

        let mut builder = NameBuilder::new();
        let mut remaining = s.as_bytes();
        while let Some((&octet, rest)) = remaining.split_first() {
            remaining = rest;
            match octet {
                b'\\' => {
                    let (value, consumed) = parse_escape(remaining)?;
                    builder.try_push(value)?;
                    remaining = &remaining[consumed..];
                }
                b'.' => builder.next_label()?,
                _ if !octet.is_ascii() => return Err(Error::StrNotAscii),
                _ => builder.try_push(octet)?,
            }
        }
        Ok(builder.finish())
    }
}

/// Parses the escape sequence that follows a backslash, returning the
/// octet it stands for and the number of characters consumed.
fn parse_escape(remaining: &[u8]) -> Result<(u8, usize), Error> {
    match remaining {
        [] => Err(Error::InvalidEscape),
        [a, b, c, ..] if a.is_ascii_digit() && b.is_ascii_digit() && c.is_ascii_digit() => {
            let value = [a, b, c]
                .iter()
                .fold(0u16, |acc, digit| acc * 10 + (**digit - b'0') as u16);
            u8::try_from(value)
                .map(|value| (value, 3))
                .map_err(|_| Error::InvalidEscape)
        }
        [first, ..] if first.is_ascii_digit() => Err(Error::InvalidEscape),
        [other, ..] if other.is_ascii() => Ok((*other, 1)),
        _ => Err(Error::StrNotAscii),
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn name(text: &str) -> Name {
        text.parse().unwrap()
    }

    #[test]
    fn root_has_expected_characteristics() {
        let root = Name::root();
        assert!(root.is_root());
        assert!(root.is_fully_qualified());
        assert_eq!(root.label_count(), 1);
        assert_eq!(root.wire_repr(), &[0]);
        assert_eq!(root.to_string(), ".");
    }

    #[test]
    fn fromstr_encodes_fully_qualified_names() {
        let n = name("example.test.");
        assert_eq!(n.wire_repr(), b"\x07example\x04test\x00");
        assert!(n.is_fully_qualified());
        assert_eq!(n.label_count(), 3);
    }

    #[test]
    fn fromstr_encodes_relative_names() {
        let n = name("www.example");
        assert_eq!(n.wire_repr(), b"\x03www\x07example");
        assert!(!n.is_fully_qualified());
        assert_eq!(n.label_count(), 2);
    }

    #[test]
    fn fromstr_rejects_bad_input() {
        assert_eq!("".parse::<Name>(), Err(Error::StrEmpty));
        assert_eq!("✈.aero.".parse::<Name>(), Err(Error::StrNotAscii));
        assert_eq!("a..b.".parse::<Name>(), Err(Error::NullNonTerminal));
        assert_eq!(".a.".parse::<Name>(), Err(Error::NullNonTerminal));
        assert_eq!(
            format!("{}.", "x".repeat(64)).parse::<Name>(),
            Err(Error::LabelTooLong)
        );
        assert_eq!("x.".repeat(128).parse::<Name>(), Err(Error::NameTooLong));
    }

    #[test]
    fn fromstr_accepts_maximum_lengths() {
        let label = "x".repeat(63);
        let n = name(&format!("{label}.{label}.{label}.{}.", "y".repeat(61)));
        assert_eq!(n.wire_len(), 255);
    }

    #[test]
    fn fromstr_handles_escapes() {
        let n = name("\\000.\\\\\\..a\\.b.");
        assert_eq!(n.wire_repr(), b"\x01\x00\x02\\.\x03a.b\x00");
        assert_eq!("\\00".parse::<Name>(), Err(Error::InvalidEscape));
        assert_eq!("\\00x.".parse::<Name>(), Err(Error::InvalidEscape));
        assert_eq!("\\256.".parse::<Name>(), Err(Error::InvalidEscape));
        assert_eq!("a\\".parse::<Name>(), Err(Error::InvalidEscape));
    }

    #[test]
    fn text_round_trips() {
        for text in [
            ".",
            "example.",
            "www.Example.COM.",
            "relative.name",
            "*.wild.test.",
            "\\000.\\\\\\..a\\.b.",
            "\\200.z.example.",
            "a\\;b.\\(x\\).\\\".example.",
        ] {
            assert_eq!(name(text).to_string(), text);
            assert_eq!(name(&name(text).to_string()), name(text));
        }
    }

    #[test]
    fn from_wire_accepts_valid_names() {
        let fqdn = Name::from_wire(b"\x03www\x07example\x00").unwrap();
        assert_eq!(fqdn, name("www.example."));
        let relative = Name::from_wire(b"\x03www").unwrap();
        assert_eq!(relative, name("www"));
    }

    #[test]
    fn from_wire_rejects_invalid_names() {
        assert_eq!(Name::from_wire(b""), Err(Error::UnexpectedEnd));
        assert_eq!(Name::from_wire(b"\x05ab"), Err(Error::UnexpectedEnd));
        assert_eq!(Name::from_wire(b"\x00\x01a"), Err(Error::ExtraData));
        assert_eq!(Name::from_wire(&[64; 65]), Err(Error::LabelTooLong));
        let mut long = Vec::new();
        for _ in 0..128 {
            long.extend_from_slice(b"\x01x");
        }
        long.push(0);
        assert_eq!(Name::from_wire(&long), Err(Error::NameTooLong));
    }

    #[test]
    fn is_wildcard_works() {
        assert!(name("*.example.").is_wildcard());
        assert!(name("*.*.example.").is_wildcard());
        assert!(!name("x.*.example.").is_wildcard());
        assert!(!name("example.").is_wildcard());
        assert!(!Name::root().is_wildcard());
    }

    #[test]
    fn labels_iterator_works_from_both_ends() {
        let n = name("a.b.c.");
        let forward: Vec<_> = n.labels().map(|l| l.octets().to_vec()).collect();
        assert_eq!(forward, [b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), vec![]]);
        let mut labels = n.labels();
        assert!(labels.next_back().unwrap().is_null());
        assert_eq!(labels.next().unwrap().octets(), b"a");
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn eq_or_subdomain_of_works() {
        let sub = name("sub.example.test.");
        let domain = name("EXAMPLE.test.");
        let root = Name::root();
        assert!(sub.eq_or_subdomain_of(&domain));
        assert!(sub.eq_or_subdomain_of(&sub));
        assert!(sub.eq_or_subdomain_of(root));
        assert!(!domain.eq_or_subdomain_of(&sub));
        assert!(!root.eq_or_subdomain_of(&domain));
        assert!(!name("example.com.").eq_or_subdomain_of(&domain));
        assert!(!name("xexample.test.").eq_or_subdomain_of(&domain));
    }

    #[test]
    fn left_chop_strips_first_label() {
        let n = name("www.example.com.");
        assert_eq!(n.left_chop(), Some(name("example.com.")));
        assert_eq!(name("com.").left_chop().as_ref(), Some(Name::root()));
        assert_eq!(Name::root().left_chop(), None);
        assert_eq!(name("a.b").left_chop(), Some(name("b")));
        assert_eq!(name("a").left_chop(), None);
    }

    #[test]
    fn cat_appends_suffix() {
        let mut n = name("www");
        n.cat(&name("example.com.")).unwrap();
        assert_eq!(n.wire_repr(), b"\x03www\x07example\x03com\x00");
        assert!(n.is_fully_qualified());

        let mut relative = name("a");
        relative.cat(&name("b")).unwrap();
        assert_eq!(relative, name("a.b"));
    }

    #[test]
    fn cat_rejects_fully_qualified_prefix() {
        let mut n = name("www.example.");
        assert_eq!(n.cat(&name("com.")), Err(Error::AlreadyFullyQualified));
        assert_eq!(n, name("www.example."));
    }

    #[test]
    fn cat_rejects_long_result() {
        let label = "x".repeat(63);
        let mut n = name(&format!("{label}.{label}"));
        let suffix = name(&format!("{label}.{label}."));
        assert_eq!(n.cat(&suffix), Err(Error::NameTooLong));
        assert_eq!(n.wire_len(), 128);
    }

    #[test]
    fn cat_inverts_left_chop() {
        for text in ["www.example.com.", "a.b.", "x.y.z"] {
            let original = name(text);
            let first_len = original.wire_repr()[0] as usize + 1;
            let mut first = Name::from_wire(&original.wire_repr()[..first_len]).unwrap();
            first.cat(&original.left_chop().unwrap()).unwrap();
            assert_eq!(first.wire_repr(), original.wire_repr());
        }
    }

    #[test]
    fn prepend_label_works() {
        let n = name("example.").prepend_label(Label::asterisk()).unwrap();
        assert_eq!(n, name("*.example."));
    }

    #[test]
    fn eq_and_hash_ignore_case() {
        use std::collections::hash_map::DefaultHasher;
        let upper = name("WWW.EXAMPLE.");
        let lower = name("www.example.");
        assert_eq!(upper, lower);
        let mut hasher = DefaultHasher::new();
        upper.hash(&mut hasher);
        let upper_hash = hasher.finish();
        let mut hasher = DefaultHasher::new();
        lower.hash(&mut hasher);
        assert_eq!(upper_hash, hasher.finish());
    }

    #[test]
    fn make_ascii_lowercase_works() {
        let mut n = name("UPPERCASE.Domain.Test.");
        n.make_ascii_lowercase();
        assert_eq!(n.wire_repr(), b"\x09uppercase\x06domain\x04test\x00");
    }

    #[test]
    fn ord_matches_rfc4034_example() {
        // The ordered list from RFC 4034 § 6.1.
        let names: Vec<Name> = [
            "example.",
            "a.example.",
            "yljkjljk.a.example.",
            "Z.a.example.",
            "zABC.a.EXAMPLE.",
            "z.example.",
            "\\001.z.example.",
            "*.z.example.",
            "\\200.z.example.",
        ]
        .into_iter()
        .map(name)
        .collect();

        for (i, ni) in names.iter().enumerate() {
            for (j, nj) in names.iter().enumerate() {
                assert_eq!(ni.cmp(nj), i.cmp(&j), "{} vs {}", ni, nj);
                assert_eq!(ni.cmp(nj), nj.cmp(ni).reverse());
            }
        }
    }

    #[test]
    fn ord_puts_ancestors_first() {
        assert!(name("example.com.") < name("www.example.com."));
        assert!(Name::root() < &name("com."));
        assert!(name("com.") < name("a.example.com."));
        // Shorter label with a common prefix sorts first at the same
        // depth, regardless of what is to the left.
        assert!(name("z.ab.") < name("a.abc."));
        assert!(name("b.a.") > name("a.a."));
        assert_eq!(name("A.b.").cmp(&name("a.B.")), Ordering::Equal);
    }
}
