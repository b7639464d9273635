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

//! Implementation of the [`Zone`] publication handle.

use std::sync::{Arc, RwLock};

use log::debug;

use super::{Error, ZoneContents};
use crate::name::Name;

/// A zone whose [`ZoneContents`] can be replaced while it is being
/// read.
///
/// Readers call [`Zone::contents`] to get a snapshot and use it for as
/// long as they need; the snapshot is never modified. An updater takes
/// a [`ZoneContents::shallow_copy`] of the current contents, changes
/// the copy, and publishes it with [`Zone::switch_contents`]. Readers
/// that started before the switch keep the old snapshot, which is
/// freed (along with any nodes the new contents no longer share) when
/// the last of them drops it.
#[derive(Debug)]
pub struct Zone {
    name: Name,
    contents: RwLock<Arc<ZoneContents>>,
}

impl Zone {
    /// Creates a new `Zone` publishing `contents`. The zone's name is
    /// that of the contents.
    pub fn new(contents: ZoneContents) -> Self {
        Self {
            name: contents.name().clone(),
            contents: RwLock::new(Arc::new(contents)),
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Returns the current contents of the zone.
    pub fn contents(&self) -> Arc<ZoneContents> {
        self.contents.read().unwrap().clone()
    }

    /// Publishes `contents` as the zone's new contents and returns the
    /// previous ones. Fails with [`Error::ApexMismatch`] if `contents`
    /// belongs to a zone with a different name.
    pub fn switch_contents(&self, contents: ZoneContents) -> Result<Arc<ZoneContents>, Error> {
        if contents.name() != &self.name {
            return Err(Error::ApexMismatch);
        }
        let old = std::mem::replace(&mut *self.contents.write().unwrap(), Arc::new(contents));
        debug!(
            "Switched contents of zone {} (generation {} -> {}).",
            self.name,
            old.generation(),
            self.contents().generation(),
        );
        Ok(old)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::Node;

    fn contents(apex: &str) -> ZoneContents {
        ZoneContents::new(Node::new(apex.parse::<Name>().unwrap(), None)).unwrap()
    }

    #[test]
    fn switch_contents_publishes_new_snapshot() {
        let zone = Zone::new(contents("quandary.test."));
        let reader = zone.contents();

        let mut update = reader.shallow_copy();
        update.switch_generation();
        update
            .add_node(Node::new("www.quandary.test.".parse::<Name>().unwrap(), None), true)
            .unwrap();
        let old = zone.switch_contents(update).unwrap();

        assert!(Arc::ptr_eq(&old, &reader));
        assert_eq!(reader.node_count(), 1);
        assert_eq!(zone.contents().node_count(), 2);
        assert_eq!(zone.contents().generation(), 1);
    }

    #[test]
    fn switch_contents_rejects_other_zone() {
        let zone = Zone::new(contents("quandary.test."));
        assert_eq!(
            zone.switch_contents(contents("other.test.")).err(),
            Some(Error::ApexMismatch)
        );
        assert_eq!(zone.contents().name(), zone.name());
    }
}
