// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{
    AuditEntry, Client, Contract, Dashboard, MonthlyVolume, NewClient, NewContract, StatusCount,
};
use crate::murabaha::{self, CalcError, DealParameters, DealSummary, ScheduleRow};
use crate::notary::{Memo, Notarizer, Receipt};
use crate::workflow::{self, ContractStatus, StatusPolicy, TransitionError};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));
static TX_HASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-f]{64}$").expect("hash pattern compiles"));

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Calc(#[from] CalcError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("Client {0} not found")]
    ClientNotFound(i64),
    #[error("Contract {0} not found")]
    ContractNotFound(i64),
    #[error("Stored value '{value}' in {column} is unreadable")]
    CorruptValue { column: &'static str, value: String },
    #[error("{0} overflowed")]
    Overflow(&'static str),
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("schedule encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        StoreError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// The request field to blame, when the caller sent something bad.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            StoreError::Calc(e) => e.field(),
            StoreError::InvalidField { field, .. } => Some(*field),
            _ => None,
        }
    }
}

pub fn audit(conn: &Connection, action: &str, details: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO audit_logs(action, details) VALUES (?1, ?2)",
        params![action, details],
    )?;
    Ok(())
}

pub fn list_audit(conn: &Connection, limit: usize) -> Result<Vec<AuditEntry>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, timestamp, action, details FROM audit_logs ORDER BY id DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit as i64], |r| {
        Ok(AuditEntry {
            id: r.get(0)?,
            timestamp: r.get(1)?,
            action: r.get(2)?,
            details: r.get(3)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// ---- clients ----

pub fn create_client(conn: &Connection, new: &NewClient) -> Result<Client, StoreError> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(StoreError::invalid("name", "Client name is required"));
    }
    let email = new
        .email
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if let Some(e) = email {
        if !EMAIL_RE.is_match(e) {
            return Err(StoreError::invalid(
                "email",
                format!("'{}' is not an email address", e),
            ));
        }
    }
    let credit_score = new.credit_score.unwrap_or(0);
    if credit_score < 0 {
        return Err(StoreError::invalid("credit_score", "must not be negative"));
    }

    conn.execute(
        "INSERT INTO clients(name, email, credit_score) VALUES (?1, ?2, ?3)",
        params![name, email, credit_score],
    )?;
    let id = conn.last_insert_rowid();
    audit(conn, "client_created", &format!("client {} '{}'", id, name))?;
    tracing::info!(client_id = id, "client created");
    get_client(conn, id)?.ok_or(StoreError::ClientNotFound(id))
}

pub fn get_client(conn: &Connection, id: i64) -> Result<Option<Client>, StoreError> {
    let client = conn
        .query_row(
            "SELECT id, name, email, credit_score, created_at FROM clients WHERE id=?1",
            params![id],
            client_from_row,
        )
        .optional()?;
    Ok(client)
}

pub fn list_clients(conn: &Connection) -> Result<Vec<Client>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, credit_score, created_at FROM clients ORDER BY id DESC",
    )?;
    let rows = stmt.query_map([], client_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn client_from_row(r: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: r.get(0)?,
        name: r.get(1)?,
        email: r.get(2)?,
        credit_score: r.get(3)?,
        created_at: r.get(4)?,
    })
}

// ---- contracts ----

const CONTRACT_COLUMNS: &str = "id, client_id, client_name, asset_name, asset_price, \
     annual_profit_rate, duration_months, down_payment_percentage, security_deposit, \
     down_payment, financed_amount, total_profit, total_cost, monthly_installment, \
     contract_date, status, blockchain_hash, notary, schedule_json, created_at";

/// Columns as SQLite hands them back, before decimals and dates are parsed.
struct ContractRow {
    id: i64,
    client_id: i64,
    client_name: String,
    asset_name: String,
    asset_price: String,
    annual_profit_rate: String,
    duration_months: u32,
    down_payment_percentage: String,
    security_deposit: String,
    down_payment: String,
    financed_amount: String,
    total_profit: String,
    total_cost: String,
    monthly_installment: String,
    contract_date: String,
    status: String,
    blockchain_hash: Option<String>,
    notary: Option<String>,
    schedule_json: String,
    created_at: String,
}

fn contract_row(r: &Row<'_>) -> rusqlite::Result<ContractRow> {
    Ok(ContractRow {
        id: r.get(0)?,
        client_id: r.get(1)?,
        client_name: r.get(2)?,
        asset_name: r.get(3)?,
        asset_price: r.get(4)?,
        annual_profit_rate: r.get(5)?,
        duration_months: r.get(6)?,
        down_payment_percentage: r.get(7)?,
        security_deposit: r.get(8)?,
        down_payment: r.get(9)?,
        financed_amount: r.get(10)?,
        total_profit: r.get(11)?,
        total_cost: r.get(12)?,
        monthly_installment: r.get(13)?,
        contract_date: r.get(14)?,
        status: r.get(15)?,
        blockchain_hash: r.get(16)?,
        notary: r.get(17)?,
        schedule_json: r.get(18)?,
        created_at: r.get(19)?,
    })
}

fn stored_decimal(column: &'static str, value: &str) -> Result<Decimal, StoreError> {
    value
        .parse::<Decimal>()
        .map_err(|_| StoreError::CorruptValue {
            column,
            value: value.to_string(),
        })
}

impl ContractRow {
    fn into_contract(self) -> Result<Contract, StoreError> {
        let deal = DealParameters {
            asset_price: stored_decimal("asset_price", &self.asset_price)?,
            annual_profit_rate: stored_decimal("annual_profit_rate", &self.annual_profit_rate)?,
            duration_months: self.duration_months,
            down_payment_percentage: stored_decimal(
                "down_payment_percentage",
                &self.down_payment_percentage,
            )?,
            security_deposit: stored_decimal("security_deposit", &self.security_deposit)?,
        };
        let summary = DealSummary {
            asset_price: deal.asset_price,
            down_payment: stored_decimal("down_payment", &self.down_payment)?,
            security_deposit: deal.security_deposit,
            financed_amount: stored_decimal("financed_amount", &self.financed_amount)?,
            annual_profit_rate: murabaha::normalize_rate(deal.annual_profit_rate),
            duration_months: deal.duration_months,
            total_profit: stored_decimal("total_profit", &self.total_profit)?,
            total_cost: stored_decimal("total_cost", &self.total_cost)?,
            monthly_installment: stored_decimal(
                "monthly_installment",
                &self.monthly_installment,
            )?,
        };
        let schedule: Vec<ScheduleRow> = serde_json::from_str(&self.schedule_json)?;
        let contract_date = NaiveDate::parse_from_str(&self.contract_date, "%Y-%m-%d")
            .map_err(|_| StoreError::CorruptValue {
                column: "contract_date",
                value: self.contract_date.clone(),
            })?;
        Ok(Contract {
            id: self.id,
            client_id: self.client_id,
            client_name: self.client_name,
            asset_name: self.asset_name,
            deal,
            summary,
            schedule,
            contract_date,
            status: self.status.parse()?,
            blockchain_hash: self.blockchain_hash,
            notary: self.notary,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreatedContract {
    pub contract: Contract,
    pub receipt: Option<Receipt>,
    pub warning: Option<String>,
}

/// Persists a new contract in `DRAFT`, then asks `notary` to record it.
///
/// Summary and schedule always come from the engine. A notary failure leaves
/// the contract in place and is reported through `warning`.
pub fn create_contract(
    conn: &Connection,
    notary: &dyn Notarizer,
    new: &NewContract,
    today: NaiveDate,
) -> Result<CreatedContract, StoreError> {
    let asset_name = new.asset_name.trim();
    if asset_name.is_empty() {
        return Err(StoreError::invalid("asset_name", "Asset name is required"));
    }
    let client = get_client(conn, new.client_id)?
        .ok_or(StoreError::ClientNotFound(new.client_id))?;
    let calc = murabaha::calculate(&new.deal, today)?;
    let schedule_json = serde_json::to_string(&calc.schedule)?;
    let s = &calc.summary;

    conn.execute(
        "INSERT INTO contracts(
            client_id, client_name, asset_name, asset_price, annual_profit_rate,
            duration_months, down_payment_percentage, security_deposit, down_payment,
            financed_amount, total_profit, total_cost, monthly_installment,
            contract_date, status, schedule_json
         ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
        params![
            client.id,
            client.name,
            asset_name,
            new.deal.asset_price.to_string(),
            new.deal.annual_profit_rate.to_string(),
            new.deal.duration_months,
            new.deal.down_payment_percentage.to_string(),
            new.deal.security_deposit.to_string(),
            s.down_payment.to_string(),
            s.financed_amount.to_string(),
            s.total_profit.to_string(),
            s.total_cost.to_string(),
            s.monthly_installment.to_string(),
            today.to_string(),
            ContractStatus::Draft.as_str(),
            schedule_json
        ],
    )?;
    let id = conn.last_insert_rowid();
    audit(
        conn,
        "contract_created",
        &format!(
            "contract {} for client {} '{}', total cost {}",
            id, client.id, asset_name, s.total_cost
        ),
    )?;
    tracing::info!(
        contract_id = id,
        client_id = client.id,
        total_cost = %s.total_cost,
        "contract created"
    );

    let memo = Memo::for_contract(id, asset_name, s.total_cost);
    let (receipt, warning) = match notary.notarize(&memo) {
        Ok(receipt) => match set_blockchain_hash(conn, id, &receipt.hash, receipt.notary) {
            Ok(()) => {
                audit(
                    conn,
                    "contract_notarized",
                    &format!("contract {} via {}: {}", id, receipt.notary, receipt.hash),
                )?;
                (Some(receipt), None)
            }
            Err(err) => {
                tracing::warn!(contract_id = id, error = %err, "could not store notary receipt");
                (
                    Some(receipt),
                    Some(format!(
                        "Contract saved locally. Storing the blockchain hash failed: {}",
                        err
                    )),
                )
            }
        },
        Err(err) => {
            tracing::warn!(
                contract_id = id,
                notary = notary.name(),
                error = %err,
                "notarization failed; contract kept"
            );
            audit(
                conn,
                "notarization_failed",
                &format!("contract {}: {}", id, err),
            )?;
            (
                None,
                Some(format!(
                    "Contract saved locally. Blockchain logging failed: {}",
                    err
                )),
            )
        }
    };

    let contract = get_contract(conn, id)?.ok_or(StoreError::ContractNotFound(id))?;
    Ok(CreatedContract {
        contract,
        receipt,
        warning,
    })
}

pub fn get_contract(conn: &Connection, id: i64) -> Result<Option<Contract>, StoreError> {
    let sql = format!("SELECT {} FROM contracts WHERE id=?1", CONTRACT_COLUMNS);
    let row = conn.query_row(&sql, params![id], contract_row).optional()?;
    row.map(ContractRow::into_contract).transpose()
}

pub fn list_contracts(conn: &Connection) -> Result<Vec<Contract>, StoreError> {
    let sql = format!("SELECT {} FROM contracts ORDER BY id DESC", CONTRACT_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], contract_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?.into_contract()?);
    }
    Ok(out)
}

fn set_blockchain_hash(
    conn: &Connection,
    id: i64,
    hash: &str,
    notary: &str,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "UPDATE contracts SET blockchain_hash=?1, notary=?2 WHERE id=?3",
        params![hash, notary, id],
    )?;
    Ok(())
}

pub fn update_status(
    conn: &Connection,
    id: i64,
    to: ContractStatus,
    policy: StatusPolicy,
) -> Result<Contract, StoreError> {
    let current = get_contract(conn, id)?.ok_or(StoreError::ContractNotFound(id))?;
    workflow::check_transition(current.status, to, policy)?;
    conn.execute(
        "UPDATE contracts SET status=?1 WHERE id=?2",
        params![to.as_str(), id],
    )?;
    audit(
        conn,
        "status_changed",
        &format!("contract {}: {} -> {}", id, current.status, to),
    )?;
    tracing::info!(contract_id = id, from = %current.status, to = %to, "status updated");
    get_contract(conn, id)?.ok_or(StoreError::ContractNotFound(id))
}

/// Attaches the hash of a Stellar transaction submitted outside this tool.
pub fn anchor_contract(conn: &Connection, id: i64, hash: &str) -> Result<Contract, StoreError> {
    let hash = hash.trim().to_lowercase();
    if !TX_HASH_RE.is_match(&hash) {
        return Err(StoreError::invalid(
            "hash",
            "expected a 64-character hex transaction hash",
        ));
    }
    if get_contract(conn, id)?.is_none() {
        return Err(StoreError::ContractNotFound(id));
    }
    set_blockchain_hash(conn, id, &hash, "stellar")?;
    audit(
        conn,
        "hash_anchored",
        &format!("contract {}: stellar {}", id, hash),
    )?;
    get_contract(conn, id)?.ok_or(StoreError::ContractNotFound(id))
}

// ---- reporting ----

pub fn dashboard(conn: &Connection, today: NaiveDate) -> Result<Dashboard, StoreError> {
    let clients: i64 = conn.query_row("SELECT COUNT(*) FROM clients", [], |r| r.get(0))?;

    let this_month = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).ok_or(
        StoreError::CorruptValue {
            column: "today",
            value: today.to_string(),
        },
    )?;
    let mut chart_data: Vec<MonthlyVolume> = (0..6u32)
        .rev()
        .filter_map(|back| this_month.checked_sub_months(Months::new(back)))
        .map(|d| MonthlyVolume {
            month: d.format("%Y-%m").to_string(),
            volume: Decimal::ZERO,
        })
        .collect();

    let mut by_status: Vec<StatusCount> = ContractStatus::ALL
        .iter()
        .map(|s| StatusCount {
            status: *s,
            count: 0,
        })
        .collect();

    let mut contracts = 0i64;
    let mut active_deals = 0i64;
    let mut total_assets = Decimal::ZERO;
    let mut volume = Decimal::ZERO;
    let mut profit_ytd = Decimal::ZERO;
    let year_prefix = format!("{:04}-", today.year());

    let mut stmt = conn.prepare(
        "SELECT status, asset_price, total_cost, total_profit, contract_date FROM contracts",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(r) = rows.next()? {
        let status: String = r.get(0)?;
        let asset_price: String = r.get(1)?;
        let total_cost: String = r.get(2)?;
        let total_profit: String = r.get(3)?;
        let date: String = r.get(4)?;

        let status: ContractStatus = status.parse()?;
        let total_cost = stored_decimal("total_cost", &total_cost)?;

        contracts += 1;
        if status != ContractStatus::Draft {
            active_deals += 1;
        }
        if let Some(entry) = by_status.iter_mut().find(|e| e.status == status) {
            entry.count += 1;
        }
        total_assets = accumulate(
            total_assets,
            stored_decimal("asset_price", &asset_price)?,
            "total assets",
        )?;
        volume = accumulate(volume, total_cost, "volume")?;
        if date.starts_with(&year_prefix) {
            profit_ytd = accumulate(
                profit_ytd,
                stored_decimal("total_profit", &total_profit)?,
                "profit YTD",
            )?;
        }
        if let Some(bucket) = chart_data.iter_mut().find(|m| date.starts_with(&m.month)) {
            bucket.volume = accumulate(bucket.volume, total_cost, "monthly volume")?;
        }
    }

    Ok(Dashboard {
        clients,
        contracts,
        active_deals,
        total_assets,
        volume,
        profit_ytd,
        by_status,
        chart_data,
    })
}

fn accumulate(total: Decimal, amount: Decimal, what: &'static str) -> Result<Decimal, StoreError> {
    total.checked_add(amount).ok_or(StoreError::Overflow(what))
}
