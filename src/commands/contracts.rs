// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use serde_json::json;

use crate::commands::calculate::{deal_from_args, schedule_table};
use crate::config::Settings;
use crate::horizon::HorizonClient;
use crate::models::{Contract, NewContract};
use crate::notary::{Memo, Notarizer};
use crate::store::{self, CreatedContract};
use crate::utils::{fmt_money, fmt_percent, maybe_print_json, parse_date, pretty_table};
use crate::workflow::ContractStatus;

pub fn handle(
    conn: &Connection,
    m: &clap::ArgMatches,
    settings: &Settings,
    notary: &dyn Notarizer,
) -> Result<()> {
    match m.subcommand() {
        Some(("create", sub)) => {
            let created = create(conn, sub, notary)?;
            report_created(&created, sub.get_flag("json"), &settings.currency)?;
        }
        Some(("list", sub)) => list(conn, sub, &settings.currency)?,
        Some(("show", sub)) => show(conn, sub, &settings.currency)?,
        Some(("status", sub)) => {
            let c = set_status(conn, sub, settings)?;
            println!("Contract #{} is now {}", c.id, c.status);
        }
        Some(("anchor", sub)) => {
            let c = anchor(conn, sub, settings)?;
            println!(
                "Contract #{} anchored to Stellar transaction {}",
                c.id,
                c.blockchain_hash.unwrap_or_default()
            );
        }
        _ => {}
    }
    Ok(())
}

pub fn create(
    conn: &Connection,
    sub: &clap::ArgMatches,
    notary: &dyn Notarizer,
) -> Result<CreatedContract> {
    let new = NewContract {
        client_id: *sub.get_one::<i64>("client").unwrap(),
        asset_name: sub.get_one::<String>("asset").unwrap().to_string(),
        deal: deal_from_args(sub)?,
    };
    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => chrono::Local::now().date_naive(),
    };
    Ok(store::create_contract(conn, notary, &new, date)?)
}

fn report_created(created: &CreatedContract, as_json: bool, ccy: &str) -> Result<()> {
    let c = &created.contract;
    if as_json {
        let v = json!({
            "contract": c,
            "blockchain_hash": c.blockchain_hash,
            "blockchain_warning": created.warning,
        });
        println!("{}", serde_json::to_string_pretty(&v)?);
        return Ok(());
    }
    println!(
        "Created contract #{} for {} ({}): total {} over {} months, {} per month",
        c.id,
        c.client_name,
        c.asset_name,
        fmt_money(&c.summary.total_cost, ccy),
        c.summary.duration_months,
        fmt_money(&c.summary.monthly_installment, ccy)
    );
    if let Some(r) = &created.receipt {
        println!("Recorded on {} notary: {}", r.notary, r.hash);
    }
    if let Some(w) = &created.warning {
        eprintln!("Warning: {}", w);
    }
    Ok(())
}

pub fn query(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<Contract>> {
    let status = sub
        .get_one::<String>("status")
        .map(|s| s.parse::<ContractStatus>())
        .transpose()?;
    let limit = sub.get_one::<usize>("limit").copied();
    let mut out: Vec<Contract> = store::list_contracts(conn)?
        .into_iter()
        .filter(|c| status.is_none_or(|s| c.status == s))
        .collect();
    if let Some(n) = limit {
        out.truncate(n);
    }
    Ok(out)
}

fn list(conn: &Connection, sub: &clap::ArgMatches, ccy: &str) -> Result<()> {
    let contracts = query(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &contracts)? {
        let rows = contracts
            .iter()
            .map(|c| {
                vec![
                    c.id.to_string(),
                    c.contract_date.to_string(),
                    c.client_name.clone(),
                    c.asset_name.clone(),
                    fmt_money(&c.summary.total_cost, ccy),
                    c.summary.duration_months.to_string(),
                    c.status.to_string(),
                    c.blockchain_hash
                        .as_deref()
                        .map(short_hash)
                        .unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Client", "Asset", "Total", "Months", "Status", "Hash"],
                rows,
            )
        );
    }
    Ok(())
}

fn short_hash(h: &str) -> String {
    if h.len() > 12 {
        format!("{}…", &h[..12])
    } else {
        h.to_string()
    }
}

pub fn load(conn: &Connection, id: i64) -> Result<Contract> {
    store::get_contract(conn, id)?.with_context(|| format!("Contract {} not found", id))
}

fn show(conn: &Connection, sub: &clap::ArgMatches, ccy: &str) -> Result<()> {
    let c = load(conn, *sub.get_one::<i64>("id").unwrap())?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &c)? {
        return Ok(());
    }
    let s = &c.summary;
    let rows = vec![
        vec!["Client".into(), format!("{} (#{})", c.client_name, c.client_id)],
        vec!["Asset".into(), c.asset_name.clone()],
        vec!["Date".into(), c.contract_date.to_string()],
        vec!["Status".into(), c.status.to_string()],
        vec!["Asset price".into(), fmt_money(&s.asset_price, ccy)],
        vec!["Upfront (incl. deposit)".into(), fmt_money(&s.down_payment, ccy)],
        vec!["Financed".into(), fmt_money(&s.financed_amount, ccy)],
        vec!["Rate (p.a.)".into(), fmt_percent(&s.annual_profit_rate)],
        vec!["Total profit".into(), fmt_money(&s.total_profit, ccy)],
        vec!["Total cost".into(), fmt_money(&s.total_cost, ccy)],
        vec!["Monthly".into(), fmt_money(&s.monthly_installment, ccy)],
        vec![
            "Notary".into(),
            match (&c.notary, &c.blockchain_hash) {
                (Some(n), Some(h)) => format!("{} {}", n, h),
                _ => "not recorded".into(),
            },
        ],
    ];
    let title = format!("#{}", c.id);
    println!("{}", pretty_table(&["Contract", title.as_str()], rows));
    println!("{}", schedule_table(&c.schedule, ccy));
    Ok(())
}

pub fn set_status(conn: &Connection, sub: &clap::ArgMatches, settings: &Settings) -> Result<Contract> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let to: ContractStatus = sub.get_one::<String>("to").unwrap().parse()?;
    Ok(store::update_status(conn, id, to, settings.status_policy)?)
}

pub fn anchor(conn: &Connection, sub: &clap::ArgMatches, settings: &Settings) -> Result<Contract> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let hash = sub.get_one::<String>("hash").unwrap();
    if sub.get_flag("verify") {
        let horizon = HorizonClient::new(&settings.horizon_url)?;
        let tx = horizon
            .transaction(hash)
            .with_context(|| format!("Could not verify {} on Horizon", hash))?;
        if !tx.successful {
            bail!("Transaction {} did not succeed on the network", tx.hash);
        }
        if !tx.matches_contract(id) {
            bail!(
                "Transaction memo {:?} does not start with '{}'",
                tx.memo.unwrap_or_default(),
                Memo::contract_prefix(id)
            );
        }
        tracing::info!(contract_id = id, hash = %tx.hash, "memo verified on Horizon");
    }
    Ok(store::anchor_contract(conn, id, hash)?)
}
