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

//! Implementation of the [`NameTable`] interning dictionary.

use std::collections::HashSet;
use std::sync::Arc;

use super::Name;

/// A dictionary that deduplicates [`Name`]s.
///
/// Zone loading tends to see the same owner many times (once per
/// record), and many records carry the same names in their data. A
/// `NameTable` hands out shared [`Arc<Name>`] handles so that every
/// user of a name points at a single allocation. Since [`Name`]
/// equality ignores case, the first spelling interned wins.
#[derive(Debug, Default)]
pub struct NameTable {
    names: HashSet<Arc<Name>>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared handle for `name`, copying it into the table
    /// if it is not there yet.
    pub fn intern(&mut self, name: &Name) -> Arc<Name> {
        if let Some(existing) = self.names.get(name) {
            existing.clone()
        } else {
            let shared = Arc::new(name.clone());
            self.names.insert(shared.clone());
            shared
        }
    }

    /// Like [`NameTable::intern`], but takes ownership of `name` so that
    /// no copy is needed when it is new.
    pub fn insert(&mut self, name: Name) -> Arc<Name> {
        if let Some(existing) = self.names.get(&name) {
            existing.clone()
        } else {
            let shared = Arc::new(name);
            self.names.insert(shared.clone());
            shared
        }
    }

    /// Looks up `name` without inserting it.
    pub fn get(&self, name: &Name) -> Option<Arc<Name>> {
        self.names.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Drops every name that is referenced only by the table itself,
    /// returning how many were removed.
    pub fn purge(&mut self) -> usize {
        let before = self.names.len();
        self.names.retain(|name| Arc::strong_count(name) > 1);
        before - self.names.len()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_shares_equal_names() {
        let mut table = NameTable::new();
        let a = table.intern(&"www.example.".parse().unwrap());
        let b = table.insert("WWW.EXAMPLE.".parse().unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(table.len(), 1);
        // The first spelling is kept.
        assert_eq!(b.to_string(), "www.example.");
    }

    #[test]
    fn get_does_not_insert() {
        let mut table = NameTable::new();
        let name: Name = "example.".parse().unwrap();
        assert!(table.get(&name).is_none());
        assert!(table.is_empty());
        let shared = table.intern(&name);
        assert!(Arc::ptr_eq(&table.get(&name).unwrap(), &shared));
    }

    #[test]
    fn purge_drops_unused_names() {
        let mut table = NameTable::new();
        let kept = table.intern(&"kept.example.".parse().unwrap());
        table.intern(&"dropped.example.".parse().unwrap());
        assert_eq!(table.purge(), 1);
        assert_eq!(table.len(), 1);
        assert!(table.get(&kept).is_some());
    }
}
