// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Draft,
    Promise,
    AssetOwned,
    SaleSigned,
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 4] = [
        ContractStatus::Draft,
        ContractStatus::Promise,
        ContractStatus::AssetOwned,
        ContractStatus::SaleSigned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Draft => "DRAFT",
            ContractStatus::Promise => "PROMISE",
            ContractStatus::AssetOwned => "ASSET_OWNED",
            ContractStatus::SaleSigned => "SALE_SIGNED",
        }
    }

    /// The only status a contract may move to under the strict policy.
    pub fn next(&self) -> Option<ContractStatus> {
        match self {
            ContractStatus::Draft => Some(ContractStatus::Promise),
            ContractStatus::Promise => Some(ContractStatus::AssetOwned),
            ContractStatus::AssetOwned => Some(ContractStatus::SaleSigned),
            ContractStatus::SaleSigned => None,
        }
    }

    pub fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| TransitionError::UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPolicy {
    #[default]
    Strict,
    Permissive,
}

impl StatusPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusPolicy::Strict => "strict",
            StatusPolicy::Permissive => "permissive",
        }
    }
}

impl FromStr for StatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(StatusPolicy::Strict),
            "permissive" => Ok(StatusPolicy::Permissive),
            other => Err(format!(
                "Unknown status policy '{}' (use strict|permissive)",
                other
            )),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid status '{0}'. Must be one of: {valid}", valid = ContractStatus::valid_values())]
    UnknownStatus(String),
    #[error("Contract is already {0}")]
    AlreadyInStatus(ContractStatus),
    #[error("Cannot move contract from {from} to {to}; next allowed status is {allowed}")]
    OutOfOrder {
        from: ContractStatus,
        to: ContractStatus,
        allowed: String,
    },
}

pub fn check_transition(
    from: ContractStatus,
    to: ContractStatus,
    policy: StatusPolicy,
) -> Result<(), TransitionError> {
    if policy == StatusPolicy::Permissive {
        return Ok(());
    }
    if from == to {
        return Err(TransitionError::AlreadyInStatus(from));
    }
    match from.next() {
        Some(next) if next == to => Ok(()),
        next => Err(TransitionError::OutOfOrder {
            from,
            to,
            allowed: next.map_or_else(|| "none".to_string(), |s| s.to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whitelisted_strings_only() {
        assert_eq!(
            "ASSET_OWNED".parse::<ContractStatus>().unwrap(),
            ContractStatus::AssetOwned
        );
        assert!(matches!(
            "asset_owned".parse::<ContractStatus>(),
            Err(TransitionError::UnknownStatus(_))
        ));
        assert!("CLOSED".parse::<ContractStatus>().is_err());
    }

    #[test]
    fn strict_policy_walks_forward_one_step() {
        use ContractStatus::*;
        assert!(check_transition(Draft, Promise, StatusPolicy::Strict).is_ok());
        assert!(check_transition(Promise, AssetOwned, StatusPolicy::Strict).is_ok());
        assert!(check_transition(AssetOwned, SaleSigned, StatusPolicy::Strict).is_ok());

        assert!(matches!(
            check_transition(Draft, SaleSigned, StatusPolicy::Strict),
            Err(TransitionError::OutOfOrder { .. })
        ));
        assert!(matches!(
            check_transition(AssetOwned, Promise, StatusPolicy::Strict),
            Err(TransitionError::OutOfOrder { .. })
        ));
        assert_eq!(
            check_transition(Promise, Promise, StatusPolicy::Strict),
            Err(TransitionError::AlreadyInStatus(Promise))
        );
    }

    #[test]
    fn sale_signed_is_terminal() {
        let err = check_transition(
            ContractStatus::SaleSigned,
            ContractStatus::Draft,
            StatusPolicy::Strict,
        )
        .unwrap_err();
        assert!(err.to_string().contains("next allowed status is none"));
    }

    #[test]
    fn permissive_policy_accepts_any_whitelisted_move() {
        assert!(
            check_transition(
                ContractStatus::SaleSigned,
                ContractStatus::Draft,
                StatusPolicy::Permissive
            )
            .is_ok()
        );
    }
}
