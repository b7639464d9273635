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

//! Implements the configuration file.

use std::fmt::{self, Write};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::Level::Debug;
use log::{debug, log_enabled};
use paste::paste;
use serde::{de, Deserialize};

use zonedb::name::Name;
use zonedb::zone::DuplicatePolicy;

use crate::args::ZoneDescription;

////////////////////////////////////////////////////////////////////////
// CONFIGURATION LOADING                                              //
////////////////////////////////////////////////////////////////////////

/// Loads the configuration from the file given by `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let dir = match path.as_ref().parent() {
        Some(p) => p,
        None => return Err(anyhow!("the configuration file path has no parent")),
    };
    let raw_config = fs::read(path.as_ref()).context("failed to read the configuration file")?;
    let mut config = parse(&raw_config)?;

    // When loading the configuration from a path, all records file
    // paths are interpreted relative to the configuration file's
    // directory.
    for zone_config in &mut config.zones {
        if zone_config.path.is_relative() {
            zone_config.path = dir.join(&zone_config.path);
        }
    }

    log_config_summary(&config);
    Ok(config)
}

/// Builds the configuration from zones given on the command line.
pub fn load_from_args(zones: Vec<ZoneDescription>) -> Config {
    let config = Config {
        zones: zones
            .into_iter()
            .map(|zd| ZoneConfig {
                name: ConfigName(zd.name),
                path: zd.path,
                duplicates: default_duplicates(),
                default_ttl: default_ttl(),
            })
            .collect(),
    };
    log_config_summary(&config);
    config
}

/// Parses and checks the raw contents of a configuration file.
fn parse(raw_config: &[u8]) -> Result<Config> {
    let config: Config =
        toml::from_slice(raw_config).context("failed to parse the configuration file")?;
    for zone_config in &config.zones {
        if !zone_config.name.0.is_fully_qualified() {
            return Err(anyhow!(
                "the zone name {} is not fully qualified",
                zone_config.name.0
            ));
        }
    }
    Ok(config)
}

/// Summarizes the configuration in the log, if the debug log level is
/// enabled.
fn log_config_summary(config: &Config) {
    if !log_enabled!(Debug) {
        // Don't compute the message if it will never be printed.
        return;
    }

    let mut message = String::from("Configuration loaded:\nZones: ");
    if config.zones.is_empty() {
        message.push_str("none to load");
    } else {
        write!(message, "{} to load", config.zones.len()).unwrap();
        for zone_config in &config.zones {
            write!(
                message,
                "\n  {} from {} (duplicates: {:?}, default TTL: {})",
                zone_config.name.0,
                zone_config.path.display(),
                zone_config.duplicates,
                zone_config.default_ttl,
            )
            .unwrap();
        }
    }
    debug!("{}", message);
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION FILE STRUCTURE                                       //
////////////////////////////////////////////////////////////////////////

/// The complete configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub zones: Vec<ZoneConfig>,
}

/// The configuration of a single zone.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneConfig {
    pub name: ConfigName,
    pub path: PathBuf,
    #[serde(default = "default_duplicates")]
    pub duplicates: ConfigDuplicatePolicy,
    #[serde(default = "default_ttl")]
    pub default_ttl: u32,
}

/// A deserializable wrapper over the [`DuplicatePolicy`] type.
#[derive(Clone, Copy, Debug, Deserialize)]
pub enum ConfigDuplicatePolicy {
    #[serde(rename = "reject")]
    Reject,
    #[serde(rename = "merge")]
    Merge,
    #[serde(rename = "replace")]
    Replace,
    #[serde(rename = "skip")]
    Skip,
}

fn default_duplicates() -> ConfigDuplicatePolicy {
    ConfigDuplicatePolicy::Merge
}

fn default_ttl() -> u32 {
    3600
}

impl From<ConfigDuplicatePolicy> for DuplicatePolicy {
    fn from(config_policy: ConfigDuplicatePolicy) -> Self {
        match config_policy {
            ConfigDuplicatePolicy::Reject => Self::Reject,
            ConfigDuplicatePolicy::Merge => Self::Merge,
            ConfigDuplicatePolicy::Replace => Self::Replace,
            ConfigDuplicatePolicy::Skip => Self::Skip,
        }
    }
}

////////////////////////////////////////////////////////////////////////
// WRAPPERS OVER ZONEDB TYPES FOR SERDE                               //
////////////////////////////////////////////////////////////////////////

/// Generates a deserializable `ConfigX` structure wrapping an `X` type
/// from [`zonedb`], using its [`FromStr`](std::str::FromStr)
/// implementation.
macro_rules! make_serde_wrapper {
    ($wrapper:ident, $over:ty, $description:literal) => {
        /// A macro-generated deserializable wrapper over a [`zonedb`]
        /// type.
        #[derive(Clone, Debug)]
        pub struct $wrapper(pub $over);

        impl<'de> Deserialize<'de> for $wrapper {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: de::Deserializer<'de>,
            {
                deserializer.deserialize_str(paste! { [<$wrapper Visitor>] })
            }
        }

        paste! {
            /// A macro-generated [`Visitor`](de::Visitor).
            #[derive(Debug)]
            struct [<$wrapper Visitor>];
        }

        impl<'de> de::Visitor<'de> for paste! { [<$wrapper Visitor>] } {
            type Value = $wrapper;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str($description)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .parse()
                    .map($wrapper)
                    .map_err(|e| E::custom(format!("invalid {}: {}", $description, e)))
            }
        }
    };
}

make_serde_wrapper!(ConfigName, Name, "domain name");

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_applies_defaults() {
        let config = parse(
            b"[[zones]]\n\
              name = \"example.\"\n\
              path = \"example.zone\"\n",
        )
        .unwrap();
        assert_eq!(config.zones.len(), 1);
        let zone_config = &config.zones[0];
        assert_eq!(zone_config.name.0, "example.".parse().unwrap());
        assert_eq!(zone_config.path, PathBuf::from("example.zone"));
        assert_eq!(
            DuplicatePolicy::from(zone_config.duplicates),
            DuplicatePolicy::Merge
        );
        assert_eq!(zone_config.default_ttl, 3600);
    }

    #[test]
    fn parse_reads_policy() {
        let config = parse(
            b"[[zones]]\n\
              name = \"example.\"\n\
              path = \"example.zone\"\n\
              duplicates = \"reject\"\n\
              default_ttl = 60\n",
        )
        .unwrap();
        let zone_config = &config.zones[0];
        assert_eq!(
            DuplicatePolicy::from(zone_config.duplicates),
            DuplicatePolicy::Reject
        );
        assert_eq!(zone_config.default_ttl, 60);
    }

    #[test]
    fn parse_rejects_bad_zones() {
        // Relative zone name.
        assert!(parse(b"[[zones]]\nname = \"example\"\npath = \"x\"\n").is_err());
        // Unparseable zone name.
        assert!(parse(b"[[zones]]\nname = \"a..b.\"\npath = \"x\"\n").is_err());
        // Unknown field.
        assert!(parse(b"[[zones]]\nname = \"example.\"\npath = \"x\"\nclass = \"IN\"\n").is_err());
    }
}
