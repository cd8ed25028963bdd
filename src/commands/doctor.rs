// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::murabaha::installment_total;
use crate::notary;
use crate::store;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub issue: &'static str,
    pub detail: String,
}

impl Finding {
    fn new(issue: &'static str, detail: String) -> Self {
        Finding { issue, detail }
    }
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let findings = check(conn)?;
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &findings)? {
        return Ok(());
    }
    if findings.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        let rows = findings
            .into_iter()
            .map(|f| vec![f.issue.to_string(), f.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

pub fn check(conn: &Connection) -> Result<Vec<Finding>> {
    let tolerance = Decimal::new(1, 6);
    let mut out = Vec::new();

    for c in store::list_contracts(conn)? {
        let total = installment_total(&c.schedule);
        if (total - c.summary.total_cost).abs() > tolerance {
            out.push(Finding::new(
                "schedule_sum_mismatch",
                format!(
                    "contract {}: installments sum to {}, total cost is {}",
                    c.id, total, c.summary.total_cost
                ),
            ));
        }
        if c.schedule.len() != c.summary.duration_months as usize {
            out.push(Finding::new(
                "schedule_length_mismatch",
                format!(
                    "contract {}: {} rows for {} months",
                    c.id,
                    c.schedule.len(),
                    c.summary.duration_months
                ),
            ));
        }
        if let Some(last) = c.schedule.last() {
            if !last.remaining_balance.is_zero() {
                out.push(Finding::new(
                    "nonzero_final_balance",
                    format!("contract {}: ends at {}", c.id, last.remaining_balance),
                ));
            }
        }
        let client: Option<i64> = conn
            .query_row(
                "SELECT id FROM clients WHERE id=?1",
                params![c.client_id],
                |r| r.get(0),
            )
            .optional()?;
        if client.is_none() {
            out.push(Finding::new(
                "orphan_contract",
                format!("contract {}: client {} is missing", c.id, c.client_id),
            ));
        }
        if c.blockchain_hash.is_none() {
            out.push(Finding::new(
                "not_notarized",
                format!("contract {} has no blockchain hash", c.id),
            ));
        }
    }

    let entries = notary::load_entries(conn)?;
    if let Err(e) = notary::verify_chain(&entries) {
        out.push(Finding::new("ledger_broken", e.to_string()));
    }
    Ok(out)
}
