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

//! Implements zone loading.
//!
//! Zones are read from a simple line-oriented records file. Each line
//! holds one record:
//!
//! ```text
//! owner [TTL] TYPE [RDATA...]
//! ```
//!
//! The owner `@` stands for the zone apex, and relative owners are
//! made absolute by appending the apex. The TTL defaults to the zone's
//! configured default. The record data is given in hexadecimal and may
//! be split into several whitespace-separated chunks. Everything after
//! an unescaped `;` is a comment. This is the same format the `dump` command
//! prints, so dumps can be loaded again.

use std::fmt::Write;
use std::fs::File;
use std::io::{BufRead, BufReader};

use anyhow::{anyhow, Context, Result};
use data_encoding::HEXLOWER_PERMISSIVE;
use log::{debug, error, warn};

use zonedb::name::{Name, NameTable};
use zonedb::rr::{Rrset, Ttl, Type};
use zonedb::zone::{DuplicatePolicy, Node, OwnerName, Sha1Nsec3Hasher, Zone, ZoneContents};

use crate::config::ZoneConfig;

/// Loads the zones configured in `zones`. Zones that fail to load are
/// reported in the log and left out.
pub fn load(zones: &[ZoneConfig]) -> Vec<Zone> {
    let mut loaded = Vec::with_capacity(zones.len());
    let mut zones_failed = 0;

    for zone_config in zones {
        debug!(
            "Loading {} from {}.",
            zone_config.name.0,
            zone_config.path.display(),
        );
        match load_zone(zone_config) {
            Ok(zone) => loaded.push(zone),
            Err(e) => {
                let mut message = format!("Failed to load {}:", zone_config.name.0);
                for (i, cause) in e.chain().enumerate() {
                    write!(message, "\n[{}] {}", i + 1, cause).unwrap();
                }
                error!("{}", message);
                zones_failed += 1;
            }
        }
    }

    if zones_failed > 0 {
        if zones_failed == 1 {
            error!("1 zone failed to load.");
        } else {
            error!("{} zones failed to load.", zones_failed);
        }
    }

    loaded
}

/// Loads a single zone from its records file.
fn load_zone(zone_config: &ZoneConfig) -> Result<Zone> {
    let file = File::open(&zone_config.path)
        .with_context(|| format!("failed to open {}", zone_config.path.display()))?;
    let contents = read_contents(zone_config, BufReader::new(file))
        .with_context(|| format!("failed to read {}", zone_config.path.display()))?;
    Ok(Zone::new(contents))
}

/// Builds the contents of a zone from the records file read by
/// `reader`. Malformed records and records the zone refuses are
/// reported and skipped; only read errors and a failed final
/// adjustment abort the load.
fn read_contents(zone_config: &ZoneConfig, reader: impl BufRead) -> Result<ZoneContents> {
    let apex = &zone_config.name.0;
    let policy = DuplicatePolicy::from(zone_config.duplicates);
    let default_ttl = Ttl::from(zone_config.default_ttl);
    let mut contents = ZoneContents::new(Node::new(apex, None))?;
    let mut owners = NameTable::new();
    let mut rrsigs = Vec::new();
    let mut skipped = 0;

    for (i, line) in reader.lines().enumerate() {
        let number = i + 1;
        let line = line?;
        let record = match parse_record(&line, apex, default_ttl) {
            Ok(Some(record)) => record,
            Ok(None) => continue,
            Err(e) => {
                warn!("Skipping line {} of {}: {:#}", number, apex, e);
                skipped += 1;
                continue;
            }
        };

        if record.rrset.rr_type == Type::RRSIG {
            // Signatures can only be attached once the sets they cover
            // exist, so they are added last.
            rrsigs.push((number, record));
            continue;
        }
        let owner = OwnerName::Shared(owners.insert(record.owner));
        let added = if record.rrset.rr_type.is_nsec3() {
            contents.add_nsec3_rrset(owner, record.rrset, policy)
        } else {
            contents.add_rrset(owner, record.rrset, policy)
        };
        if let Err(e) = added {
            warn!("Skipping line {} of {}: {}", number, apex, e);
            skipped += 1;
        }
    }

    for (number, record) in rrsigs {
        if let Err(e) = contents.add_rrsigs(&record.owner, record.rrset, policy) {
            warn!("Skipping line {} of {}: {}", number, apex, e);
            skipped += 1;
        }
    }

    contents
        .load_nsec3param()
        .context("failed to load the NSEC3 parameters")?;
    contents
        .adjust(Some(&Sha1Nsec3Hasher))
        .context("failed to adjust the zone")?;

    debug!(
        "Loaded {}: {} nodes, {} NSEC3 nodes, {} distinct owners, {} lines skipped.",
        apex,
        contents.node_count(),
        contents.nsec3_node_count(),
        owners.len(),
        skipped,
    );
    Ok(contents)
}

/// A record read from a line of a records file, as a single-record
/// [`Rrset`].
#[derive(Debug)]
struct Record {
    owner: Name,
    rrset: Rrset,
}

/// Parses one line of a records file. Returns `Ok(None)` for lines
/// holding no record.
fn parse_record(line: &str, apex: &Name, default_ttl: Ttl) -> Result<Option<Record>> {
    let line = strip_comment(line);
    let mut fields = line.split_whitespace().peekable();
    let owner_text = match fields.next() {
        Some(field) => field,
        None => return Ok(None),
    };
    let owner = parse_owner(owner_text, apex)?;

    let ttl = match fields.peek() {
        Some(field) if field.bytes().all(|b| b.is_ascii_digit()) => {
            let raw: u32 = field
                .parse()
                .map_err(|e| anyhow!("invalid TTL {}: {}", field, e))?;
            fields.next();
            Ttl::from(raw)
        }
        _ => default_ttl,
    };

    let rr_type: Type = fields
        .next()
        .ok_or_else(|| anyhow!("missing type"))?
        .parse()
        .map_err(|e| anyhow!("invalid type: {}", e))?;

    let hex: String = fields.collect();
    let rdata = HEXLOWER_PERMISSIVE
        .decode(hex.as_bytes())
        .context("invalid record data")?;
    let mut rrset = Rrset::new(rr_type, ttl);
    rrset.push_rdata(&rdata)?;

    Ok(Some(Record { owner, rrset }))
}

/// Returns `line` up to its first unescaped `;`.
fn strip_comment(line: &str) -> &str {
    let mut escaped = false;
    for (i, octet) in line.bytes().enumerate() {
        match octet {
            _ if escaped => escaped = false,
            b'\\' => escaped = true,
            b';' => return &line[..i],
            _ => (),
        }
    }
    line
}

/// Parses an owner field, resolving `@` and relative names against the
/// apex.
fn parse_owner(text: &str, apex: &Name) -> Result<Name> {
    if text == "@" {
        return Ok(apex.clone());
    }
    let mut owner: Name = text
        .parse()
        .map_err(|e| anyhow!("invalid owner {}: {}", text, e))?;
    if !owner.is_fully_qualified() {
        owner
            .cat(apex)
            .map_err(|e| anyhow!("invalid owner {}: {}", text, e))?;
    }
    Ok(owner)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{DumpArgs, Order};
    use crate::config::{ConfigDuplicatePolicy, ConfigName};
    use crate::inspect;
    use std::path::PathBuf;

    fn zone_config() -> ZoneConfig {
        ZoneConfig {
            name: ConfigName("example.".parse().unwrap()),
            path: PathBuf::from("example.zone"),
            duplicates: ConfigDuplicatePolicy::Merge,
            default_ttl: 300,
        }
    }

    fn name(text: &str) -> Name {
        text.parse().unwrap()
    }

    #[test]
    fn parse_record_reads_all_fields() {
        let apex = name("example.");
        let record = parse_record("www 60 A c0 00 02 01 ; comment", &apex, Ttl::from(300))
            .unwrap()
            .unwrap();
        assert_eq!(record.owner, name("www.example."));
        assert_eq!(record.rrset.rr_type, Type::A);
        assert_eq!(u32::from(record.rrset.ttl), 60);
        assert_eq!(record.rrset.rdatas().next(), Some(&[192, 0, 2, 1][..]));
    }

    #[test]
    fn parse_record_applies_defaults() {
        let apex = name("example.");
        let record = parse_record("@ NS", &apex, Ttl::from(300)).unwrap().unwrap();
        assert_eq!(record.owner, apex);
        assert_eq!(u32::from(record.rrset.ttl), 300);
        assert_eq!(record.rrset.rdatas().next(), Some(&[][..]));
    }

    #[test]
    fn parse_record_skips_blank_lines() {
        let apex = name("example.");
        assert!(parse_record("", &apex, Ttl::default()).unwrap().is_none());
        assert!(parse_record("  ; only a comment", &apex, Ttl::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn parse_record_keeps_escaped_semicolons() {
        let apex = name("example.");
        let record = parse_record("a\\;b A c0000201 ; comment", &apex, Ttl::default())
            .unwrap()
            .unwrap();
        assert_eq!(record.owner, name("a\\;b.example."));
        assert_eq!(record.owner.first_label().octets(), b"a;b");
        assert_eq!(record.rrset.rdatas().next(), Some(&[192, 0, 2, 1][..]));
    }

    #[test]
    fn parse_record_rejects_bad_lines() {
        let apex = name("example.");
        for line in [
            "www",
            "www 60",
            "www NOTATYPE",
            "www A xyz",
            "www A abc",
            "a..b A",
            "www 99999999999 A",
        ] {
            assert!(
                parse_record(line, &apex, Ttl::default()).is_err(),
                "{:?} was accepted",
                line
            );
        }
    }

    #[test]
    fn read_contents_builds_zone() {
        let records = "\
            @ SOA 00\n\
            @ NS 01\n\
            www A c0000201\n\
            www A c0000202\n\
            sub NS 02\n\
            a.sub A c0000203\n\
            *.wild TXT 00\n";
        let contents = read_contents(&zone_config(), records.as_bytes()).unwrap();
        // Apex, www, sub, a.sub, wild (created as a parent), *.wild.
        assert_eq!(contents.node_count(), 6);
        let www = contents.find_node(&name("www.example.")).unwrap();
        assert_eq!(www.rrset(Type::A).unwrap().len(), 2);
        assert!(www.owner_name().is_shared());
        assert!(contents
            .find_node(&name("sub.example."))
            .unwrap()
            .is_delegation());
        assert!(contents
            .find_node(&name("a.sub.example."))
            .unwrap()
            .is_non_authoritative());
        let wild = contents.find_node(&name("wild.example.")).unwrap();
        assert!(wild.is_empty());
        assert!(wild.wildcard_child().is_some());
    }

    #[test]
    fn read_contents_skips_bad_records() {
        let records = "\
            @ SOA 00\n\
            www A c0000201\n\
            www 60 A c0000202\n\
            www A c0000203\n\
            www.other. A c0000204\n\
            www A zz\n\
            nothing RRSIG 0001\n\
            www RRSIG 0001\n";
        let contents = read_contents(&zone_config(), records.as_bytes()).unwrap();
        assert_eq!(contents.node_count(), 2);
        let www = contents.find_node(&name("www.example.")).unwrap();
        let a = www.rrset(Type::A).unwrap();
        // The record with the mismatched TTL was dropped, and the
        // signature was attached after everything else.
        assert_eq!(a.len(), 2);
        assert_eq!(u32::from(a.ttl), 300);
        assert!(a.rrsigs().is_some());
    }

    #[test]
    fn dump_output_loads_again() {
        let records = "\
            @ SOA 00\n\
            a\\;b 60 A c0000201\n\
            \\(x\\) TXT 00 ; comment\n";
        let zone = Zone::new(read_contents(&zone_config(), records.as_bytes()).unwrap());
        let args = DumpArgs {
            order: Order::Canonical,
            nsec3: false,
        };
        let mut dumped = Vec::new();
        inspect::dump(&[zone], &args, &mut dumped).unwrap();

        let reloaded = read_contents(&zone_config(), &dumped[..]).unwrap();
        assert_eq!(reloaded.node_count(), 3);
        let a = reloaded
            .find_node(&name("a\\;b.example."))
            .unwrap()
            .rrset(Type::A)
            .unwrap();
        assert_eq!(u32::from(a.ttl), 60);
        assert_eq!(a.rdatas().next(), Some(&[192, 0, 2, 1][..]));
        assert!(reloaded
            .find_node(&name("\\(x\\).example."))
            .unwrap()
            .has_rrset(Type::TXT));
    }
}
