// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Contract notarization.
//!
//! Callers hold a `Notarizer` and pass it down explicitly; nothing here is
//! global. The hash-chain notary keeps an append-only, tamper-evident log in
//! SQLite so a contract's existence can be proven without a network.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

pub const GENESIS: &str = "GENESIS";
pub const MEMO_PREFIX: &str = "Murabaha-";
/// Stellar caps text memos at 28 bytes.
pub const MEMO_TEXT_LIMIT: usize = 28;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Memo {
    pub contract_id: i64,
    pub text: String,
    pub amount: Decimal,
}

impl Memo {
    pub fn for_contract(contract_id: i64, asset_name: &str, amount: Decimal) -> Self {
        let full = format!("{}{}-{}", MEMO_PREFIX, contract_id, asset_name.trim());
        let text = truncate_utf8(&full, MEMO_TEXT_LIMIT);
        if text.len() < full.len() {
            tracing::debug!(contract_id, memo = text, "memo truncated to {} bytes", MEMO_TEXT_LIMIT);
        }
        Memo {
            contract_id,
            text: text.to_string(),
            amount,
        }
    }

    /// Prefix every memo for this contract starts with, whatever the asset name.
    pub fn contract_prefix(contract_id: i64) -> String {
        format!("{}{}-", MEMO_PREFIX, contract_id)
    }
}

pub fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub hash: String,
    pub notary: &'static str,
    pub memo: String,
    pub recorded_at: String,
}

#[derive(Debug, Error)]
pub enum NotaryError {
    #[error("notarization is disabled (set `notary` to `ledger` to record contracts)")]
    NotConfigured,
    #[error("ledger storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("ledger entry {sequence} has an unreadable amount '{amount}'")]
    CorruptEntry { sequence: i64, amount: String },
    #[error("ledger lock poisoned")]
    Poisoned,
}

pub trait Notarizer: Send + Sync {
    fn name(&self) -> &'static str;
    fn notarize(&self, memo: &Memo) -> Result<Receipt, NotaryError>;
}

pub struct DisabledNotary;

impl Notarizer for DisabledNotary {
    fn name(&self) -> &'static str {
        "off"
    }

    fn notarize(&self, _memo: &Memo) -> Result<Receipt, NotaryError> {
        Err(NotaryError::NotConfigured)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub sequence: i64,
    pub prev_hash: String,
    pub memo: String,
    pub amount: Decimal,
    pub recorded_at: String,
    pub hash: String,
}

pub fn entry_hash(entry: &LedgerEntry) -> String {
    let mut hasher = Sha256::new();
    hasher.update(entry.sequence.to_le_bytes());
    hasher.update(entry.prev_hash.as_bytes());
    hasher.update(entry.memo.as_bytes());
    hasher.update(entry.amount.to_string().as_bytes());
    hasher.update(entry.recorded_at.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct HashChainNotary {
    conn: Mutex<Connection>,
}

impl HashChainNotary {
    /// `conn` must already carry the `notary_ledger` table.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(crate::db::open_at(path)?))
    }

    pub fn entries(&self) -> Result<Vec<LedgerEntry>, NotaryError> {
        let conn = self.conn.lock().map_err(|_| NotaryError::Poisoned)?;
        load_entries(&conn)
    }
}

impl Notarizer for HashChainNotary {
    fn name(&self) -> &'static str {
        "ledger"
    }

    fn notarize(&self, memo: &Memo) -> Result<Receipt, NotaryError> {
        let mut conn = self.conn.lock().map_err(|_| NotaryError::Poisoned)?;
        let tx = conn.transaction()?;

        let last: Option<(i64, String)> = tx
            .query_row(
                "SELECT sequence, hash FROM notary_ledger ORDER BY sequence DESC LIMIT 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        let (sequence, prev_hash) = match last {
            Some((seq, hash)) => (seq + 1, hash),
            None => (1, GENESIS.to_string()),
        };

        let mut entry = LedgerEntry {
            sequence,
            prev_hash,
            memo: memo.text.clone(),
            amount: memo.amount,
            recorded_at: Utc::now().to_rfc3339(),
            hash: String::new(),
        };
        entry.hash = entry_hash(&entry);

        tx.execute(
            "INSERT INTO notary_ledger(sequence, prev_hash, memo, amount, recorded_at, hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.sequence,
                entry.prev_hash,
                entry.memo,
                entry.amount.to_string(),
                entry.recorded_at,
                entry.hash
            ],
        )?;
        tx.commit()?;

        tracing::info!(
            sequence = entry.sequence,
            memo = %entry.memo,
            hash = %entry.hash,
            "contract recorded on ledger"
        );
        Ok(Receipt {
            hash: entry.hash,
            notary: self.name(),
            memo: entry.memo,
            recorded_at: entry.recorded_at,
        })
    }
}

pub fn load_entries(conn: &Connection) -> Result<Vec<LedgerEntry>, NotaryError> {
    let mut stmt = conn.prepare(
        "SELECT sequence, prev_hash, memo, amount, recorded_at, hash
         FROM notary_ledger ORDER BY sequence",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (sequence, prev_hash, memo, amount_s, recorded_at, hash) = row?;
        let amount = amount_s
            .parse::<Decimal>()
            .map_err(|_| NotaryError::CorruptEntry {
                sequence,
                amount: amount_s.clone(),
            })?;
        out.push(LedgerEntry {
            sequence,
            prev_hash,
            memo,
            amount,
            recorded_at,
            hash,
        });
    }
    Ok(out)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Broken link at seq {sequence}: expected prev_hash '{expected}', got '{actual}'")]
    BrokenLink {
        sequence: i64,
        expected: String,
        actual: String,
    },
    #[error("Invalid hash at seq {sequence}: expected '{expected}', got '{actual}'")]
    InvalidHash {
        sequence: i64,
        expected: String,
        actual: String,
    },
    #[error("Invalid sequence: expected {expected}, got {actual}")]
    InvalidSequence { expected: i64, actual: i64 },
}

pub fn verify_chain(entries: &[LedgerEntry]) -> Result<(), ChainError> {
    let mut prev_hash = GENESIS.to_string();
    for (i, entry) in entries.iter().enumerate() {
        let expected_seq = i as i64 + 1;
        if entry.sequence != expected_seq {
            return Err(ChainError::InvalidSequence {
                expected: expected_seq,
                actual: entry.sequence,
            });
        }
        if entry.prev_hash != prev_hash {
            return Err(ChainError::BrokenLink {
                sequence: entry.sequence,
                expected: prev_hash,
                actual: entry.prev_hash.clone(),
            });
        }
        let calculated = entry_hash(entry);
        if entry.hash != calculated {
            return Err(ChainError::InvalidHash {
                sequence: entry.sequence,
                expected: calculated,
                actual: entry.hash.clone(),
            });
        }
        prev_hash = entry.hash.clone();
    }
    Ok(())
}
