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

//! Implements the `dump` and `find` commands.

use std::io::{self, Write};

use anyhow::Result;
use data_encoding::HEXLOWER;

use zonedb::name::Name;
use zonedb::rr::Rrset;
use zonedb::zone::{FindStatus, Node, Sha1Nsec3Hasher, Zone, ZoneContents};

use crate::args::{DumpArgs, FindArgs, Order};

////////////////////////////////////////////////////////////////////////
// DUMP                                                               //
////////////////////////////////////////////////////////////////////////

/// Writes the nodes of each zone to `out` in the requested order, as
/// records that the loader can read back.
pub fn dump(zones: &[Zone], args: &DumpArgs, out: &mut impl Write) -> io::Result<()> {
    for zone in zones {
        let contents = zone.contents();
        writeln!(
            out,
            "; zone {} ({} nodes, {} NSEC3 nodes, generation {})",
            contents.name(),
            contents.node_count(),
            contents.nsec3_node_count(),
            contents.generation(),
        )?;
        let mut state = DumpState {
            contents: &contents,
            out: &mut *out,
            result: Ok(()),
        };
        match (args.nsec3, args.order) {
            (false, Order::Canonical) => contents.apply_inorder(visit, &mut state),
            (false, Order::Reverse) => contents.apply_inorder_reverse(visit, &mut state),
            (false, Order::Postorder) => contents.apply_postorder(visit, &mut state),
            (true, Order::Canonical) => contents.nsec3_apply_inorder(visit, &mut state),
            (true, Order::Reverse) => contents.nsec3_apply_inorder_reverse(visit, &mut state),
            (true, Order::Postorder) => contents.nsec3_apply_postorder(visit, &mut state),
        }
        state.result?;
    }
    Ok(())
}

/// The context threaded through the traversal by [`dump`].
struct DumpState<'a, W: Write> {
    contents: &'a ZoneContents,
    out: &'a mut W,
    result: io::Result<()>,
}

/// The traversal visitor for [`dump`]. Stops writing after the first
/// error.
fn visit<W: Write>(node: &Node, state: &mut DumpState<'_, W>) {
    if state.result.is_ok() {
        state.result = write_node(&mut *state.out, state.contents, node);
    }
}

/// Writes a comment line describing `node`, followed by its records.
fn write_node(out: &mut impl Write, contents: &ZoneContents, node: &Node) -> io::Result<()> {
    write!(out, "; {}", node.owner())?;
    if node.is_empty() {
        write!(out, " (empty)")?;
    }
    if node.is_delegation() {
        write!(out, " (delegation)")?;
    }
    if node.is_non_authoritative() {
        write!(out, " (non-authoritative)")?;
    }
    if let Some(nsec3) = node.nsec3_node().and_then(|id| contents.node(id)) {
        write!(out, " (NSEC3 {})", nsec3.owner())?;
    }
    writeln!(out)?;

    for rrset in node.rrsets() {
        write_rrset(out, node.owner(), rrset)?;
        if let Some(rrsigs) = rrset.rrsigs() {
            write_rrset(out, node.owner(), rrsigs)?;
        }
    }
    Ok(())
}

fn write_rrset(out: &mut impl Write, owner: &Name, rrset: &Rrset) -> io::Result<()> {
    for rdata in rrset.rdatas() {
        write!(out, "{}\t{}\t{}", owner, rrset.ttl, rrset.rr_type)?;
        if !rdata.is_empty() {
            write!(out, "\t{}", HEXLOWER.encode(rdata))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////
// FIND                                                               //
////////////////////////////////////////////////////////////////////////

/// Looks up each name in the zone that most closely encloses it and
/// writes what was found to `out`.
pub fn find(zones: &[Zone], args: &FindArgs, out: &mut impl Write) -> Result<()> {
    for name in &args.names {
        let zone = zones
            .iter()
            .filter(|zone| name.eq_or_subdomain_of(zone.name()))
            .max_by_key(|zone| zone.name().label_count());
        match zone {
            Some(zone) => find_in_zone(&zone.contents(), name, out)?,
            None => writeln!(out, "{}: not in any loaded zone", name)?,
        }
    }
    Ok(())
}

fn find_in_zone(contents: &ZoneContents, name: &Name, out: &mut impl Write) -> Result<()> {
    let found = contents.find_name(name)?;
    let status = match found.status {
        FindStatus::Found => "found",
        FindStatus::NotFound => "not found",
    };
    writeln!(out, "{}: {} in {}", name, status, contents.name())?;
    writeln!(out, "  closest encloser: {}", found.closest_encloser.owner())?;
    writeln!(out, "  previous: {}", found.previous.owner())?;
    if let Some(wildcard) = found
        .closest_encloser
        .wildcard_child()
        .and_then(|id| contents.node(id))
    {
        writeln!(out, "  wildcard: {}", wildcard.owner())?;
    }

    if contents.nsec3_enabled() {
        let nsec3 = contents.find_nsec3_for_name(name, &Sha1Nsec3Hasher)?;
        let status = match nsec3.status {
            FindStatus::Found => "found",
            FindStatus::NotFound => "not found",
        };
        writeln!(out, "  NSEC3 {}: {}", nsec3.hashed_owner, status)?;
        if let Some(previous) = nsec3.previous {
            writeln!(out, "  NSEC3 previous: {}", previous.owner())?;
        }
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
