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

//! Implementation of the [`NameBuilder`] structure.

use arrayvec::ArrayVec;

use super::{Error, Label, Name, MAX_LABEL_LEN, MAX_WIRE_LEN};

/// An encoder that assembles the on-the-wire form of a [`Name`] label
/// by label.
///
/// The builder keeps the name in a fixed-size buffer large enough for
/// any valid name, so it can live on the stack; the only heap
/// allocation happens in [`NameBuilder::finish`]. Every method checks
/// the 63-octet label limit and the 255-octet name limit as it goes and
/// leaves the builder unchanged when it fails.
///
/// The label currently being built decides what kind of name
/// [`NameBuilder::finish`] produces. If it is empty, it becomes the
/// null label and the result is fully qualified; otherwise the result
/// is a relative name ending with that label.
///
/// ```
/// use zonedb::name::{Name, NameBuilder};
///
/// let mut builder = NameBuilder::new();
/// builder.try_push_slice(b"www").unwrap();
/// builder.next_label().unwrap();
/// builder.try_push_slice(b"example").unwrap();
/// builder.next_label().unwrap();
/// let name = builder.finish();
/// assert_eq!(name, "www.example.".parse().unwrap());
/// assert!(name.is_fully_qualified());
///
/// let mut builder = NameBuilder::new();
/// builder.try_push_slice(b"www").unwrap();
/// assert!(!builder.finish().is_fully_qualified());
/// ```
pub struct NameBuilder {
    wire_repr: ArrayVec<u8, MAX_WIRE_LEN>,
    label_start: usize,
    label_len: u8,
}

impl NameBuilder {
    /// Creates a builder holding a single empty label. Finishing it
    /// right away yields the root name.
    pub fn new() -> Self {
        let mut wire_repr = ArrayVec::new();
        wire_repr.push(0);
        Self {
            wire_repr,
            label_start: 0,
            label_len: 0,
        }
    }

    /// Returns whether [`NameBuilder::finish`] would currently produce
    /// a fully qualified name.
    pub fn is_fully_qualified(&self) -> bool {
        self.label_len == 0
    }

    /// Appends one octet to the current label.
    pub fn try_push(&mut self, octet: u8) -> Result<(), Error> {
        if self.label_len as usize >= MAX_LABEL_LEN {
            Err(Error::LabelTooLong)
        } else if self.wire_repr.try_push(octet).is_err() {
            Err(Error::NameTooLong)
        } else {
            self.label_len += 1;
            Ok(())
        }
    }

    /// Appends several octets to the current label.
    pub fn try_push_slice(&mut self, octets: &[u8]) -> Result<(), Error> {
        if self.label_len as usize + octets.len() > MAX_LABEL_LEN {
            Err(Error::LabelTooLong)
        } else if self.wire_repr.try_extend_from_slice(octets).is_err() {
            Err(Error::NameTooLong)
        } else {
            self.label_len += octets.len() as u8;
            Ok(())
        }
    }

    /// Closes the current label and opens a new, empty one. Fails if
    /// the current label is empty, since only the last label of a name
    /// may be null.
    pub fn next_label(&mut self) -> Result<(), Error> {
        if self.label_len == 0 {
            Err(Error::NullNonTerminal)
        } else if self.wire_repr.is_full() {
            Err(Error::NameTooLong)
        } else {
            self.wire_repr[self.label_start] = self.label_len;
            self.label_start = self.wire_repr.len();
            self.label_len = 0;
            self.wire_repr.push(0);
            Ok(())
        }
    }

    /// Appends a complete label and opens a new one after it.
    pub fn push_label(&mut self, label: &Label) -> Result<(), Error> {
        let checkpoint = (self.wire_repr.len(), self.label_len);
        let result = self
            .try_push_slice(label.octets())
            .and_then(|_| self.next_label());
        if result.is_err() {
            self.wire_repr.truncate(checkpoint.0);
            self.label_len = checkpoint.1;
        }
        result
    }

    /// Finishes the name. An empty current label becomes the terminating
    /// null label; a non-empty one ends a relative name.
    pub fn finish(mut self) -> Name {
        self.wire_repr[self.label_start] = self.label_len;
        Name::from_wire_unchecked(&self.wire_repr)
    }

    /// Finishes the current label and appends all labels of `suffix`
    /// after it, creating a subdomain of `suffix`. The current label
    /// must not be empty.
    pub fn finish_with_suffix(mut self, suffix: &Name) -> Result<Name, Error> {
        if self.label_len == 0 {
            return Err(Error::NullNonTerminal);
        }
        self.wire_repr[self.label_start] = self.label_len;
        self.wire_repr
            .try_extend_from_slice(suffix.wire_repr())
            .map_err(|_| Error::NameTooLong)?;
        Ok(Name::from_wire_unchecked(&self.wire_repr))
    }
}

impl Default for NameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_makes_root() {
        assert!(NameBuilder::new().finish().is_root());
    }

    #[test]
    fn try_push_rejects_long_label() {
        let mut builder = NameBuilder::new();
        builder.try_push_slice(&[b'x'; MAX_LABEL_LEN]).unwrap();
        assert_eq!(builder.try_push(b'x'), Err(Error::LabelTooLong));
        assert_eq!(builder.try_push_slice(b"x"), Err(Error::LabelTooLong));
    }

    #[test]
    fn next_label_rejects_null_label() {
        let mut builder = NameBuilder::new();
        assert_eq!(builder.next_label(), Err(Error::NullNonTerminal));
    }

    #[test]
    fn builder_rejects_long_name() {
        let mut builder = NameBuilder::new();
        let label = Label::new(&[b'x'; MAX_LABEL_LEN]).unwrap();
        for _ in 0..3 {
            builder.push_label(label).unwrap();
        }
        // 3 * 64 = 192 octets used; a fourth full label would need 256.
        assert_eq!(builder.push_label(label), Err(Error::NameTooLong));
        // The failed push left the builder as it was.
        let name = builder.finish();
        assert_eq!(name.wire_repr().len(), 193);
        assert_eq!(name.label_count(), 4);
    }

    #[test]
    fn finish_with_suffix_works() {
        let suffix: Name = "example.test.".parse().unwrap();
        let mut builder = NameBuilder::new();
        builder.try_push_slice(b"www").unwrap();
        let name = builder.finish_with_suffix(&suffix).unwrap();
        assert_eq!(name.wire_repr(), b"\x03www\x07example\x04test\x00");
    }

    #[test]
    fn finish_with_suffix_rejects_null_label() {
        let suffix: Name = "test.".parse().unwrap();
        assert_eq!(
            NameBuilder::new().finish_with_suffix(&suffix),
            Err(Error::NullNonTerminal)
        );
    }
}
