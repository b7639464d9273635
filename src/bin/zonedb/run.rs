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

//! Implements the top-level flow shared by all commands: logging
//! setup, configuration, zone loading, and error reporting.

use std::fmt::Write;
use std::io;
use std::process;

use anyhow::{anyhow, Context, Result};
use env_logger::Env;
use log::{error, info};

use crate::args::{Args, Command};
use crate::config;
use crate::inspect;
use crate::zones;

/// Runs the command given by `args`.
pub fn run(args: Args) {
    env_logger::init_from_env(Env::new().default_filter_or("warn"));

    if let Err(e) = try_running(args) {
        let mut message = String::from("Failed to run:");
        for (i, cause) in e.chain().enumerate() {
            write!(message, "\n[{}] {}", i + 1, cause).unwrap();
        }
        message.push_str("\nExiting with failure.");
        error!("{}", message);
        process::exit(1);
    }
}

fn try_running(args: Args) -> Result<()> {
    info!(
        "zonedb v{}.{}.{} starting.",
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR"),
        env!("CARGO_PKG_VERSION_PATCH"),
    );

    let Args {
        config: config_path,
        zones: zone_descriptions,
        command,
    } = args;

    // Get the configuration, either from the file system or from the
    // command line arguments, as appropriate.
    let config = if let Some(ref config_path) = config_path {
        info!("Loading the configuration from {}.", config_path.display());
        config::load_from_path(config_path).context("failed to load the configuration")?
    } else {
        info!("Loading the configuration from the command line.");
        config::load_from_args(zone_descriptions)
    };

    let zones = zones::load(&config.zones);
    if zones.is_empty() {
        return Err(anyhow!("no zones were loaded"));
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match command {
        Command::Dump(dump_args) => {
            inspect::dump(&zones, &dump_args, &mut out).context("failed to write the dump")
        }
        Command::Find(find_args) => inspect::find(&zones, &find_args, &mut out),
    }
}
