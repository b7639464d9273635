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

//! Implements command-line argument parsing.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::anyhow;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};

use zonedb::name::Name;

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// Load DNS zones into memory and inspect them
#[derive(Debug, Parser)]
#[clap(author, version)]
#[clap(group(ArgGroup::new("source").required(true).args(["config", "zones"])))]
pub struct Args {
    /// Set the configuration file to use
    #[clap(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Add zones to load
    #[clap(
        long = "zone",
        value_delimiter = ',',
        value_name = "FILE|NAME:FILE",
        value_parser
    )]
    pub zones: Vec<ZoneDescription>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the nodes of the loaded zones
    Dump(DumpArgs),

    /// Look up names in the loaded zones
    Find(FindArgs),
}

#[derive(Debug, Parser)]
pub struct DumpArgs {
    /// Set the order in which nodes are printed
    #[clap(long, value_enum, default_value_t = Order::Canonical)]
    pub order: Order,

    /// Print the NSEC3 nodes instead of the regular ones
    #[clap(long)]
    pub nsec3: bool,
}

/// A traversal order for the `dump` command.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Order {
    /// Canonical DNSSEC order
    Canonical,

    /// Reverse canonical order
    Reverse,

    /// Subdomains before the names that enclose them
    Postorder,
}

#[derive(Debug, Parser)]
pub struct FindArgs {
    /// The names to look up
    #[clap(required = true, value_name = "NAME", value_parser)]
    pub names: Vec<Name>,
}

/// A description of a zone provided on the command line with the
/// `--zone` option. This is parsed with its [`FromStr`] implementation
/// and accepts two forms, one of which gives the zone apex explicitly,
/// and the other of which infers it by stripping the `.zone` suffix
/// from the basename of the path to the records file:
///
/// * `example.com.:path/to/the-records-file.zone`
/// * `path/to/example.com.zone`
#[derive(Clone, Debug)]
pub struct ZoneDescription {
    pub name: Name,
    pub path: PathBuf,
}

impl FromStr for ZoneDescription {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((name, path)) = s.split_once(':') {
            Ok(Self {
                name: parse_zone_name(name)?,
                path: PathBuf::from(path),
            })
        } else if s.ends_with(".zone") {
            if let Some(zone_name_without_trailing_dot) =
                Path::new(s).file_stem().and_then(OsStr::to_str)
            {
                Ok(Self {
                    name: parse_zone_name(&format!("{}.", zone_name_without_trailing_dot))?,
                    path: PathBuf::from(s),
                })
            } else {
                Err(anyhow!("failed to compute zone name from zone file path"))
            }
        } else {
            Err(anyhow!(
                "if no zone name is provided, the file name must have the form <NAME>.zone",
            ))
        }
    }
}

/// Parses a zone name, which must be fully qualified.
fn parse_zone_name(text: &str) -> anyhow::Result<Name> {
    let name: Name = text
        .parse()
        .map_err(|e| anyhow!("invalid zone name: {}", e))?;
    if name.is_fully_qualified() {
        Ok(name)
    } else {
        Err(anyhow!("the zone name {} is not fully qualified", name))
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
