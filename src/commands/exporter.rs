// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rusqlite::Connection;
use serde_json::json;

use crate::commands::contracts::load;
use crate::store;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("schedule", sub)) => export_schedule(conn, sub),
        Some(("contracts", sub)) => export_contracts(conn, sub),
        _ => Ok(()),
    }
}

fn format_of(sub: &clap::ArgMatches) -> Result<String> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    match fmt.as_str() {
        "csv" | "json" => Ok(fmt),
        _ => bail!("Unknown format: {} (use csv|json)", fmt),
    }
}

fn export_schedule(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = format_of(sub)?;
    let out = sub.get_one::<String>("out").unwrap();
    let contract = load(conn, *sub.get_one::<i64>("id").unwrap())?;

    if fmt == "csv" {
        let mut wtr = csv::Writer::from_path(out)?;
        wtr.write_record([
            "month",
            "due_date",
            "beginning_balance",
            "principal_paid",
            "profit_portion",
            "installment_amount",
            "remaining_balance",
        ])?;
        for r in &contract.schedule {
            wtr.write_record([
                r.month.to_string(),
                r.due_date.to_string(),
                r.beginning_balance.to_string(),
                r.principal_paid.to_string(),
                r.profit_portion.to_string(),
                r.installment_amount.to_string(),
                r.remaining_balance.to_string(),
            ])?;
        }
        wtr.flush()?;
    } else {
        std::fs::write(out, serde_json::to_string_pretty(&contract.schedule)?)?;
    }
    println!(
        "Exported {} installments of contract #{} to {}",
        contract.schedule.len(),
        contract.id,
        out
    );
    Ok(())
}

fn export_contracts(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = format_of(sub)?;
    let out = sub.get_one::<String>("out").unwrap();
    let contracts = store::list_contracts(conn)?;

    if fmt == "csv" {
        let mut wtr = csv::Writer::from_path(out)?;
        wtr.write_record([
            "id",
            "contract_date",
            "client_id",
            "client_name",
            "asset_name",
            "status",
            "asset_price",
            "annual_profit_rate",
            "duration_months",
            "down_payment",
            "financed_amount",
            "total_profit",
            "total_cost",
            "monthly_installment",
            "blockchain_hash",
        ])?;
        for c in &contracts {
            let s = &c.summary;
            wtr.write_record([
                c.id.to_string(),
                c.contract_date.to_string(),
                c.client_id.to_string(),
                c.client_name.clone(),
                c.asset_name.clone(),
                c.status.to_string(),
                s.asset_price.to_string(),
                s.annual_profit_rate.to_string(),
                s.duration_months.to_string(),
                s.down_payment.to_string(),
                s.financed_amount.to_string(),
                s.total_profit.to_string(),
                s.total_cost.to_string(),
                s.monthly_installment.to_string(),
                c.blockchain_hash.clone().unwrap_or_default(),
            ])?;
        }
        wtr.flush()?;
    } else {
        // schedules stay out of the bulk export; `export schedule` has them
        let items: Vec<_> = contracts
            .iter()
            .map(|c| {
                json!({
                    "id": c.id,
                    "contract_date": c.contract_date,
                    "client_id": c.client_id,
                    "client_name": c.client_name,
                    "asset_name": c.asset_name,
                    "status": c.status,
                    "summary": c.summary,
                    "blockchain_hash": c.blockchain_hash,
                })
            })
            .collect();
        std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
    }
    println!("Exported {} contracts to {}", contracts.len(), out);
    Ok(())
}
