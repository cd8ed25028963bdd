// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::horizon::DEFAULT_HORIZON_URL;
use crate::notary::{DisabledNotary, HashChainNotary, Notarizer};
use crate::workflow::StatusPolicy;

pub const KEYS: [&str; 5] = ["notary", "status_policy", "horizon_url", "bind", "currency"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotaryMode {
    #[default]
    Ledger,
    Off,
}

impl NotaryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotaryMode::Ledger => "ledger",
            NotaryMode::Off => "off",
        }
    }
}

impl FromStr for NotaryMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ledger" => Ok(NotaryMode::Ledger),
            "off" | "none" | "disabled" => Ok(NotaryMode::Off),
            other => Err(anyhow!("Unknown notary '{}' (use ledger|off)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub notary: NotaryMode,
    pub status_policy: StatusPolicy,
    pub horizon_url: String,
    pub bind: SocketAddr,
    pub currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            notary: NotaryMode::Ledger,
            status_policy: StatusPolicy::Strict,
            horizon_url: DEFAULT_HORIZON_URL.to_string(),
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            currency: "$".to_string(),
        }
    }
}

impl Settings {
    /// Defaults, then the `settings` table, then `MIZAN_*` environment variables.
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut settings = Settings::default();
        for key in KEYS {
            if let Some(v) = get_setting(conn, key)? {
                settings
                    .apply(key, &v)
                    .with_context(|| format!("Stored setting '{}' is invalid", key))?;
            }
            let env = env_key(key);
            if let Ok(v) = std::env::var(&env) {
                settings
                    .apply(key, &v)
                    .with_context(|| format!("Environment variable {} is invalid", env))?;
            }
        }
        Ok(settings)
    }

    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "notary" => self.notary = value.parse()?,
            "status_policy" => {
                self.status_policy = value.parse::<StatusPolicy>().map_err(|e| anyhow!(e))?
            }
            "horizon_url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(anyhow!("horizon_url must be an http(s) URL"));
                }
                self.horizon_url = value.to_string();
            }
            "bind" => {
                self.bind = value
                    .parse()
                    .with_context(|| format!("Invalid bind address '{}'", value))?
            }
            "currency" => {
                if value.is_empty() {
                    return Err(anyhow!("currency symbol must not be empty"));
                }
                self.currency = value.to_string();
            }
            other => {
                return Err(anyhow!(
                    "Unknown setting '{}' (known: {})",
                    other,
                    KEYS.join(", ")
                ));
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "notary" => Some(self.notary.as_str().to_string()),
            "status_policy" => Some(self.status_policy.as_str().to_string()),
            "horizon_url" => Some(self.horizon_url.clone()),
            "bind" => Some(self.bind.to_string()),
            "currency" => Some(self.currency.clone()),
            _ => None,
        }
    }

    pub fn entries(&self) -> Vec<(String, String)> {
        KEYS.iter()
            .filter_map(|k| self.get(k).map(|v| (k.to_string(), v)))
            .collect()
    }

    pub fn notarizer(&self, db_path: &Path) -> Result<Arc<dyn Notarizer>> {
        Ok(match self.notary {
            NotaryMode::Ledger => Arc::new(HashChainNotary::open(db_path)?),
            NotaryMode::Off => Arc::new(DisabledNotary),
        })
    }
}

pub fn env_key(key: &str) -> String {
    format!("MIZAN_{}", key.to_uppercase())
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

/// Validates `value` for `key` before storing it.
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    Settings::default().apply(key, value)?;
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value.trim()],
    )?;
    Ok(())
}
