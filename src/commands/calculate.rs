// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::config::Settings;
use crate::murabaha::{self, Calculation, DealParameters, RawDeal};
use crate::utils::{fmt_money, fmt_percent, maybe_print_json, parse_date, pretty_table};

/// Reads `--price/--rate/--months/--down-pct/--deposit` through the same
/// checks the HTTP API applies to a JSON body.
pub fn deal_from_args(sub: &clap::ArgMatches) -> Result<DealParameters> {
    let text = |name: &str| sub.get_one::<String>(name).map(|s| Value::String(s.clone()));
    let raw = RawDeal {
        asset_price: text("price"),
        annual_profit_rate: text("rate"),
        duration_months: text("months"),
        down_payment_percentage: text("down_pct"),
        security_deposit: text("deposit"),
    };
    Ok(raw.into_params()?)
}

pub fn run(sub: &clap::ArgMatches) -> Result<Calculation> {
    let deal = deal_from_args(sub)?;
    let start = match sub.get_one::<String>("start") {
        Some(s) => parse_date(s)?,
        None => chrono::Local::now().date_naive(),
    };
    murabaha::calculate(&deal, start).context("Calculation failed")
}

pub fn handle(sub: &clap::ArgMatches, settings: &Settings) -> Result<()> {
    let calc = run(sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &calc)? {
        return Ok(());
    }
    print_summary(&calc, &settings.currency);
    if !sub.get_flag("summary_only") {
        println!("{}", schedule_table(&calc.schedule, &settings.currency));
    }
    Ok(())
}

pub fn print_summary(calc: &Calculation, ccy: &str) {
    let s = &calc.summary;
    let rows = vec![
        vec!["Asset price".into(), fmt_money(&s.asset_price, ccy)],
        vec!["Upfront (incl. deposit)".into(), fmt_money(&s.down_payment, ccy)],
        vec!["Security deposit".into(), fmt_money(&s.security_deposit, ccy)],
        vec!["Financed amount".into(), fmt_money(&s.financed_amount, ccy)],
        vec!["Profit rate (p.a.)".into(), fmt_percent(&s.annual_profit_rate)],
        vec!["Duration".into(), format!("{} months", s.duration_months)],
        vec!["Total profit".into(), fmt_money(&s.total_profit, ccy)],
        vec!["Total cost".into(), fmt_money(&s.total_cost, ccy)],
        vec!["Monthly installment".into(), fmt_money(&s.monthly_installment, ccy)],
    ];
    println!("{}", pretty_table(&["Summary", "Value"], rows));
}

pub fn schedule_table(rows: &[murabaha::ScheduleRow], ccy: &str) -> comfy_table::Table {
    let data = rows
        .iter()
        .map(|r| {
            vec![
                r.month.to_string(),
                r.due_date.to_string(),
                fmt_money(&r.beginning_balance, ccy),
                fmt_money(&r.principal_paid, ccy),
                fmt_money(&r.profit_portion, ccy),
                fmt_money(&r.installment_amount, ccy),
                fmt_money(&r.remaining_balance, ccy),
            ]
        })
        .collect();
    pretty_table(
        &["#", "Due", "Opening", "Principal", "Profit", "Installment", "Remaining"],
        data,
    )
}
