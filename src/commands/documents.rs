// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::commands::contracts::load;
use crate::config::Settings;
use crate::documents::{self, DocumentKind};
use crate::store;

pub fn handle(conn: &Connection, m: &clap::ArgMatches, settings: &Settings) -> Result<()> {
    let Some((name, sub)) = m.subcommand() else {
        return Ok(());
    };
    let kind: DocumentKind = name.parse()?;
    let text = render(conn, sub, kind, settings)?;
    match sub.get_one::<String>("out") {
        Some(out) => {
            std::fs::write(out, &text).with_context(|| format!("Write {}", out))?;
            println!("Wrote {} document to {}", kind.as_str(), out);
        }
        None => print!("{}", text),
    }
    Ok(())
}

pub fn render(
    conn: &Connection,
    sub: &clap::ArgMatches,
    kind: DocumentKind,
    settings: &Settings,
) -> Result<String> {
    let contract = load(conn, *sub.get_one::<i64>("id").unwrap())?;
    let client = store::get_client(conn, contract.client_id)?;
    Ok(documents::render(
        kind,
        &contract,
        client.as_ref(),
        &settings.currency,
    ))
}
