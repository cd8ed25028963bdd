// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::murabaha::{DealParameters, DealSummary, RawDeal, ScheduleRow};
use crate::workflow::ContractStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub credit_score: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewClient {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub credit_score: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub asset_name: String,
    pub deal: DealParameters,
    pub summary: DealSummary,
    pub schedule: Vec<ScheduleRow>,
    pub contract_date: NaiveDate,
    pub status: ContractStatus,
    pub blockchain_hash: Option<String>,
    pub notary: Option<String>, // "ledger" | "stellar"
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewContract {
    pub client_id: i64,
    pub asset_name: String,
    pub deal: DealParameters,
}

/// Body of `POST /api/contracts`: the deal fields sit next to the identifiers.
///
/// Any client-side totals or schedule in the body are ignored; the store
/// recomputes them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewContractRequest {
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub asset_name: Option<String>,
    #[serde(flatten)]
    pub deal: RawDeal,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub action: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyVolume {
    pub month: String, // YYYY-MM
    pub volume: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: ContractStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub clients: i64,
    pub contracts: i64,
    pub active_deals: i64,
    pub total_assets: Decimal,
    pub volume: Decimal,
    pub profit_ytd: Decimal,
    pub by_status: Vec<StatusCount>,
    pub chart_data: Vec<MonthlyVolume>,
}
