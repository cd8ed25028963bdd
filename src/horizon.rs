// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only access to Stellar Horizon: look up a transaction, list an
//! account's recent transactions. Nothing here signs or submits.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::notary::{MEMO_PREFIX, Memo};

pub const DEFAULT_HORIZON_URL: &str = "https://horizon-testnet.stellar.org";
const EXPLORER_TX: &str = "https://stellar.expert/explorer/testnet/tx/";
const MAX_PAGE: usize = 200;

static ACCOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^G[A-Z2-7]{55}$").expect("account pattern compiles"));
static HASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-f]{64}$").expect("hash pattern compiles"));

#[derive(Debug, Error)]
pub enum HorizonError {
    #[error("invalid Stellar account id '{0}'")]
    InvalidAccount(String),
    #[error("invalid transaction hash '{0}'")]
    InvalidHash(String),
    #[error("{0} not found on Horizon")]
    NotFound(String),
    #[error("Horizon request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected Horizon response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct TxRecord {
    hash: String,
    created_at: String,
    #[serde(default)]
    memo: Option<String>,
    #[serde(default)]
    memo_type: Option<String>,
    #[serde(default)]
    successful: bool,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(rename = "_embedded")]
    embedded: Embedded,
}

#[derive(Debug, Deserialize)]
struct Embedded {
    records: Vec<TxRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerTx {
    pub hash: String,
    pub created_at: String,
    pub memo: Option<String>,
    pub memo_type: Option<String>,
    pub successful: bool,
    pub explorer_link: String,
}

impl From<TxRecord> for LedgerTx {
    fn from(r: TxRecord) -> Self {
        let explorer_link = format!("{}{}", EXPLORER_TX, r.hash);
        LedgerTx {
            hash: r.hash,
            created_at: r.created_at,
            memo: r.memo,
            memo_type: r.memo_type,
            successful: r.successful,
            explorer_link,
        }
    }
}

impl LedgerTx {
    pub fn is_murabaha(&self) -> bool {
        self.memo
            .as_deref()
            .is_some_and(|m| m.starts_with(MEMO_PREFIX))
    }

    /// True when the memo was written for `contract_id`.
    pub fn matches_contract(&self, contract_id: i64) -> bool {
        let prefix = Memo::contract_prefix(contract_id);
        self.memo.as_deref().is_some_and(|m| m.starts_with(&prefix))
    }
}

pub fn parse_transaction(body: &str) -> Result<LedgerTx, serde_json::Error> {
    let rec: TxRecord = serde_json::from_str(body)?;
    Ok(rec.into())
}

pub fn parse_transactions_page(body: &str) -> Result<Vec<LedgerTx>, serde_json::Error> {
    let page: Page = serde_json::from_str(body)?;
    Ok(page.embedded.records.into_iter().map(LedgerTx::from).collect())
}

/// Keeps only transactions whose memo marks them as contract records.
pub fn murabaha_only(txs: Vec<LedgerTx>) -> Vec<LedgerTx> {
    txs.into_iter().filter(LedgerTx::is_murabaha).collect()
}

pub fn normalize_hash(hash: &str) -> Result<String, HorizonError> {
    let h = hash.trim().to_lowercase();
    if HASH_RE.is_match(&h) {
        Ok(h)
    } else {
        Err(HorizonError::InvalidHash(hash.to_string()))
    }
}

pub fn validate_account(account: &str) -> Result<&str, HorizonError> {
    let a = account.trim();
    if ACCOUNT_RE.is_match(a) {
        Ok(a)
    } else {
        Err(HorizonError::InvalidAccount(account.to_string()))
    }
}

pub struct HorizonClient {
    base: String,
    http: reqwest::blocking::Client,
}

impl HorizonClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            base: base_url.trim().trim_end_matches('/').to_string(),
            http: crate::utils::http_client()?,
        })
    }

    pub fn transaction(&self, hash: &str) -> Result<LedgerTx, HorizonError> {
        let hash = normalize_hash(hash)?;
        let url = format!("{}/transactions/{}", self.base, hash);
        let body = self.get(&url, &format!("transaction {}", hash))?;
        Ok(parse_transaction(&body)?)
    }

    pub fn account_transactions(
        &self,
        account: &str,
        limit: usize,
    ) -> Result<Vec<LedgerTx>, HorizonError> {
        let account = validate_account(account)?;
        let limit = limit.clamp(1, MAX_PAGE);
        let url = format!(
            "{}/accounts/{}/transactions?order=desc&limit={}",
            self.base, account, limit
        );
        let body = self.get(&url, &format!("account {}", account))?;
        Ok(parse_transactions_page(&body)?)
    }

    /// Recent contract records written by `account`, newest first.
    pub fn audit_account(&self, account: &str, limit: usize) -> Result<Vec<LedgerTx>, HorizonError> {
        Ok(murabaha_only(self.account_transactions(account, limit)?))
    }

    fn get(&self, url: &str, what: &str) -> Result<String, HorizonError> {
        tracing::debug!(url, "horizon request");
        let resp = self.http.get(url).send()?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(HorizonError::NotFound(what.to_string()));
        }
        Ok(resp.error_for_status()?.text()?)
    }
}
