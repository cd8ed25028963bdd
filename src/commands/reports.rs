// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::config::Settings;
use crate::store;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches, settings: &Settings) -> Result<()> {
    match m.subcommand() {
        Some(("dashboard", sub)) => dashboard(conn, sub, &settings.currency)?,
        _ => {}
    }
    Ok(())
}

fn dashboard(conn: &Connection, sub: &clap::ArgMatches, ccy: &str) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let d = store::dashboard(conn, today)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &d)? {
        return Ok(());
    }
    let kpis = vec![
        vec!["Clients".into(), d.clients.to_string()],
        vec!["Contracts".into(), d.contracts.to_string()],
        vec!["Active deals".into(), d.active_deals.to_string()],
        vec!["Total assets".into(), fmt_money(&d.total_assets, ccy)],
        vec!["Financing volume".into(), fmt_money(&d.volume, ccy)],
        vec!["Profit YTD".into(), fmt_money(&d.profit_ytd, ccy)],
    ];
    println!("{}", pretty_table(&["KPI", "Value"], kpis));

    let by_status = d
        .by_status
        .iter()
        .map(|s| vec![s.status.to_string(), s.count.to_string()])
        .collect();
    println!("{}", pretty_table(&["Status", "Contracts"], by_status));

    let months = d
        .chart_data
        .iter()
        .map(|m| vec![m.month.clone(), fmt_money(&m.volume, ccy)])
        .collect();
    println!("{}", pretty_table(&["Month", "Volume"], months));
    Ok(())
}
