// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Plain-text contract documents.

use anyhow::{Result, anyhow};
use std::str::FromStr;

use crate::models::{Client, Contract};
use crate::utils::{fmt_money, fmt_percent};

pub const BANK_NAME: &str = "Mizan Islamic Bank";
const PREVIEW_ROWS: usize = 5;
const RULE: &str = "------------------------------------------------------------";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Undertaking to purchase (Wa'd), signed before the bank buys the asset.
    Promise,
    Sale,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Promise => "promise",
            DocumentKind::Sale => "sale",
        }
    }

    pub fn file_name(&self, contract_id: i64) -> String {
        match self {
            DocumentKind::Promise => format!("Promise_{}.txt", contract_id),
            DocumentKind::Sale => format!("Murabaha_Contract_{}.txt", contract_id),
        }
    }
}

impl FromStr for DocumentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "promise" | "wad" | "wa'd" => Ok(DocumentKind::Promise),
            "sale" | "murabaha" => Ok(DocumentKind::Sale),
            other => Err(anyhow!("Unknown document kind '{}' (use promise|sale)", other)),
        }
    }
}

pub fn render(
    kind: DocumentKind,
    contract: &Contract,
    client: Option<&Client>,
    currency: &str,
) -> String {
    // the client row may have been removed; fall back to the name captured on the contract
    let buyer = client
        .map(|c| c.name.as_str())
        .unwrap_or(contract.client_name.as_str());
    let lines = match kind {
        DocumentKind::Promise => promise(contract, buyer, currency),
        DocumentKind::Sale => sale(contract, buyer, currency),
    };
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn header(title: &str, contract: &Contract) -> Vec<String> {
    vec![
        BANK_NAME.to_uppercase(),
        "Islamic Banking Division".to_string(),
        RULE.to_string(),
        title.to_string(),
        format!("Contract Reference: MZN-{}", contract.id),
        format!("Date: {}", contract.contract_date),
        String::new(),
    ]
}

fn promise(contract: &Contract, buyer: &str, ccy: &str) -> Vec<String> {
    let s = &contract.summary;
    let mut out = header("UNDERTAKING TO PURCHASE (WA'D)", contract);
    out.push(format!(
        "I, the undersigned {}, hereby request {} to purchase the asset described below.",
        buyer, BANK_NAME
    ));
    out.push(String::new());
    out.push(
        "I promise and undertake that upon the Bank acquiring the said asset, I shall \
         purchase it from the Bank through a Murabaha Sale Contract for the total cost \
         plus the agreed profit margin."
            .to_string(),
    );
    out.push(String::new());
    out.push(format!(
        "The Hamish Jiddiyyah (security deposit) of {} provided herewith secures the \
         seriousness of this order. Should I breach this promise, the Bank may deduct \
         its actual damages from this deposit.",
        fmt_money(&s.security_deposit, ccy)
    ));
    out.push(String::new());
    out.push("ASSET DETAILS".to_string());
    out.push(format!("  Asset:                   {}", contract.asset_name));
    out.push(format!(
        "  Asset Cost (Principal):  {}",
        fmt_money(&s.asset_price, ccy)
    ));
    out.push(format!(
        "  Down Payment:            {}",
        fmt_percent(&contract.deal.down_payment_percentage)
    ));
    out.push(format!(
        "  Security Deposit:        {}",
        fmt_money(&s.security_deposit, ccy)
    ));
    out.push(format!("  Tenure:                  {} Months", s.duration_months));
    out.push(format!(
        "  Anticipated Profit Rate: {} p.a.",
        fmt_percent(&s.annual_profit_rate)
    ));
    out.push(String::new());
    out.extend(signatures("Client Signature", "Bank Officer"));
    out
}

fn sale(contract: &Contract, buyer: &str, ccy: &str) -> Vec<String> {
    let s = &contract.summary;
    let mut out = header("MURABAHA SALE AGREEMENT", contract);
    out.push("BETWEEN:".to_string());
    out.push(format!("  1. {} (the \"Seller\")", BANK_NAME));
    out.push(format!("  2. {} (the \"Buyer\")", buyer));
    out.push(String::new());
    out.push("SUBJECT MATTER:".to_string());
    out.push(format!(
        "  The Seller agrees to sell and the Buyer agrees to purchase the following asset: {}",
        contract.asset_name
    ));
    out.push(String::new());
    out.push("FINANCIALS:".to_string());
    out.push(format!(
        "  Cost Price:               {}",
        fmt_money(&s.asset_price, ccy)
    ));
    out.push(format!(
        "  Upfront (incl. deposit):  {}",
        fmt_money(&s.down_payment, ccy)
    ));
    out.push(format!(
        "  Financed Amount:          {}",
        fmt_money(&s.financed_amount, ccy)
    ));
    out.push(format!(
        "  Profit Margin:            {}",
        fmt_money(&s.total_profit, ccy)
    ));
    out.push(format!(
        "  Total Selling Price:      {}",
        fmt_money(&s.total_cost, ccy)
    ));
    out.push(String::new());

    let shown = contract.schedule.len().min(PREVIEW_ROWS);
    out.push(format!("PAYMENT SCHEDULE (First {} Months):", shown));
    out.push(format!(
        "  {:<6} {:<12} {:>16} {:>16}",
        "Month", "Date", "Installment", "Balance"
    ));
    for row in contract.schedule.iter().take(PREVIEW_ROWS) {
        out.push(format!(
            "  {:<6} {:<12} {:>16} {:>16}",
            row.month,
            row.due_date.to_string(),
            fmt_money(&row.installment_amount, ccy),
            fmt_money(&row.remaining_balance, ccy)
        ));
    }
    if contract.schedule.len() > PREVIEW_ROWS {
        out.push(format!(
            "  ... and {} more installments",
            contract.schedule.len() - PREVIEW_ROWS
        ));
    }
    out.push(String::new());
    out.extend(signatures(
        &format!("For and on behalf of {}", BANK_NAME),
        "Buyer Signature",
    ));
    out
}

fn signatures(left: &str, right: &str) -> Vec<String> {
    vec![
        String::new(),
        format!("{:<36}{}", "_______________________", "_______________________"),
        format!("{:<36}{}", left, right),
    ]
}
