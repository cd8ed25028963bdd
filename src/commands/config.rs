// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde_json::{Map, Value};

use crate::config::{self, Settings};
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => {
            let settings = Settings::load(conn)?;
            let entries = settings.entries();
            let obj: Map<String, Value> = entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &obj)? {
                let rows = entries.into_iter().map(|(k, v)| vec![k, v]).collect();
                println!("{}", pretty_table(&["Key", "Value"], rows));
            }
        }
        Some(("get", sub)) => {
            let key = sub.get_one::<String>("key").unwrap();
            let settings = Settings::load(conn)?;
            let v = settings
                .get(key)
                .with_context(|| format!("Unknown setting '{}'", key))?;
            println!("{}", v);
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap();
            let value = sub.get_one::<String>("value").unwrap();
            config::set_setting(conn, key, value)?;
            println!("{} = {}", key, value.trim());
            if std::env::var(config::env_key(key)).is_ok() {
                eprintln!(
                    "Note: {} is set in the environment and overrides the stored value",
                    config::env_key(key)
                );
            }
        }
        _ => {}
    }
    Ok(())
}
