// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::models::{Client, NewClient};
use crate::store;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let client = add(conn, sub)?;
            println!("Added client #{} '{}'", client.id, client.name);
        }
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<Client> {
    let new = NewClient {
        name: sub.get_one::<String>("name").unwrap().to_string(),
        email: sub.get_one::<String>("email").cloned(),
        credit_score: sub.get_one::<i64>("credit_score").copied(),
    };
    Ok(store::create_client(conn, &new)?)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let clients = store::list_clients(conn)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &clients)? {
        let rows = clients
            .iter()
            .map(|c| {
                vec![
                    c.id.to_string(),
                    c.name.clone(),
                    c.email.clone().unwrap_or_default(),
                    c.credit_score.to_string(),
                    c.created_at.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Name", "Email", "Credit", "Created"], rows)
        );
    }
    Ok(())
}
