// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::store;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("list", sub)) = m.subcommand() {
        let limit = *sub.get_one::<usize>("limit").unwrap_or(&50);
        let entries = store::list_audit(conn, limit)?;
        if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &entries)? {
            let rows = entries
                .into_iter()
                .map(|e| {
                    vec![
                        e.id.to_string(),
                        e.timestamp,
                        e.action,
                        e.details.unwrap_or_default(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["ID", "Time", "Action", "Details"], rows)
            );
        }
    }
    Ok(())
}
