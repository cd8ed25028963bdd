// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rusqlite::Connection;

use crate::config::Settings;
use crate::horizon::{HorizonClient, LedgerTx};
use crate::notary::{self, LedgerEntry};
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches, settings: &Settings) -> Result<()> {
    match m.subcommand() {
        Some(("ledger", sub)) => ledger(conn, sub)?,
        Some(("verify", _)) => {
            let n = verify(conn)?;
            println!("Ledger OK: {} entries, hash chain intact", n);
        }
        Some(("tx", sub)) => tx(sub, settings)?,
        Some(("audit", sub)) => audit(sub, settings)?,
        _ => {}
    }
    Ok(())
}

pub fn entries(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<LedgerEntry>> {
    let mut all = notary::load_entries(conn)?;
    all.reverse();
    if let Some(n) = sub.get_one::<usize>("limit") {
        all.truncate(*n);
    }
    Ok(all)
}

fn ledger(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = entries(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|e| {
                vec![
                    e.sequence.to_string(),
                    e.recorded_at.clone(),
                    e.memo.clone(),
                    e.amount.to_string(),
                    e.hash.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Seq", "Recorded", "Memo", "Amount", "Hash"], rows)
        );
    }
    Ok(())
}

/// Returns the number of verified entries.
pub fn verify(conn: &Connection) -> Result<usize> {
    let all = notary::load_entries(conn)?;
    if let Err(e) = notary::verify_chain(&all) {
        tracing::error!(error = %e, "ledger verification failed");
        bail!("Ledger verification failed: {}", e);
    }
    Ok(all.len())
}

fn tx_rows(txs: &[LedgerTx]) -> Vec<Vec<String>> {
    txs.iter()
        .map(|t| {
            vec![
                t.created_at.clone(),
                t.memo.clone().unwrap_or_default(),
                if t.successful { "yes" } else { "no" }.to_string(),
                t.hash.clone(),
            ]
        })
        .collect()
}

fn tx(sub: &clap::ArgMatches, settings: &Settings) -> Result<()> {
    let horizon = HorizonClient::new(&settings.horizon_url)?;
    let found = horizon.transaction(sub.get_one::<String>("hash").unwrap())?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &found)? {
        println!(
            "{}",
            pretty_table(
                &["Created", "Memo", "Successful", "Hash"],
                tx_rows(std::slice::from_ref(&found)),
            )
        );
        println!("{}", found.explorer_link);
    }
    Ok(())
}

fn audit(sub: &clap::ArgMatches, settings: &Settings) -> Result<()> {
    let horizon = HorizonClient::new(&settings.horizon_url)?;
    let account = sub.get_one::<String>("account").unwrap();
    let limit = *sub.get_one::<usize>("limit").unwrap_or(&20);
    let found = horizon.audit_account(account, limit)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &found)? {
        if found.is_empty() {
            println!("No Murabaha memo transactions in the last {} for {}", limit, account);
        } else {
            println!(
                "{}",
                pretty_table(&["Created", "Memo", "Successful", "Hash"], tx_rows(&found))
            );
        }
    }
    Ok(())
}
