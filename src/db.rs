// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("org", "Mizan", "mizan"));

pub const DB_ENV: &str = "MIZAN_DB";

pub fn db_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(DB_ENV) {
        if !p.trim().is_empty() {
            return Ok(PathBuf::from(p.trim()));
        }
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("mizan.sqlite"))
}

pub fn open_at(path: &Path) -> Result<Connection> {
    let conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS clients(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT,
        credit_score INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    -- money columns hold Decimal strings
    CREATE TABLE IF NOT EXISTS contracts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        client_id INTEGER NOT NULL,
        client_name TEXT NOT NULL,
        asset_name TEXT NOT NULL,
        asset_price TEXT NOT NULL,
        annual_profit_rate TEXT NOT NULL,
        duration_months INTEGER NOT NULL,
        down_payment_percentage TEXT NOT NULL DEFAULT '0',
        security_deposit TEXT NOT NULL DEFAULT '0',
        down_payment TEXT NOT NULL,
        financed_amount TEXT NOT NULL,
        total_profit TEXT NOT NULL,
        total_cost TEXT NOT NULL,
        monthly_installment TEXT NOT NULL,
        contract_date TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'DRAFT'
            CHECK(status IN ('DRAFT','PROMISE','ASSET_OWNED','SALE_SIGNED')),
        blockchain_hash TEXT,
        notary TEXT,
        schedule_json TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_contracts_client ON contracts(client_id);
    CREATE INDEX IF NOT EXISTS idx_contracts_date ON contracts(contract_date);

    CREATE TABLE IF NOT EXISTS audit_logs(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL DEFAULT (datetime('now')),
        action TEXT NOT NULL,
        details TEXT
    );

    CREATE TABLE IF NOT EXISTS notary_ledger(
        sequence INTEGER PRIMARY KEY,
        prev_hash TEXT NOT NULL,
        memo TEXT NOT NULL,
        amount TEXT NOT NULL,
        recorded_at TEXT NOT NULL,
        hash TEXT NOT NULL UNIQUE
    );
    "#,
    )?;
    Ok(())
}
