// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use mizan::config::{self, NotaryMode, Settings};
use mizan::db;
use mizan::workflow::StatusPolicy;

#[test]
fn defaults_without_stored_values() {
    let s = Settings::default();
    assert_eq!(s.notary, NotaryMode::Ledger);
    assert_eq!(s.status_policy, StatusPolicy::Strict);
    assert_eq!(s.horizon_url, "https://horizon-testnet.stellar.org");
    assert_eq!(s.bind.to_string(), "127.0.0.1:8000");
    assert_eq!(s.currency, "$");
}

#[test]
fn stored_settings_are_applied_on_load() {
    let conn = db::open_in_memory().unwrap();
    config::set_setting(&conn, "status_policy", "permissive").unwrap();
    config::set_setting(&conn, "currency", "SAR ").unwrap();
    config::set_setting(&conn, "notary", "off").unwrap();

    let s = Settings::load(&conn).unwrap();
    assert_eq!(s.status_policy, StatusPolicy::Permissive);
    assert_eq!(s.currency, "SAR");
    assert_eq!(s.notary, NotaryMode::Off);
    assert_eq!(s.get("notary").as_deref(), Some("off"));
}

#[test]
fn invalid_values_are_not_stored() {
    let conn = db::open_in_memory().unwrap();
    assert!(config::set_setting(&conn, "status_policy", "chaotic").is_err());
    assert!(config::set_setting(&conn, "bind", "localhost").is_err());
    assert!(config::set_setting(&conn, "horizon_url", "ftp://x").is_err());
    assert!(config::set_setting(&conn, "colour", "blue").is_err());
    assert_eq!(config::get_setting(&conn, "status_policy").unwrap(), None);
}

#[test]
fn entries_cover_every_key() {
    let keys: Vec<String> = Settings::default()
        .entries()
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(keys, config::KEYS);
}

#[test]
fn disabled_notary_is_built_from_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mizan.sqlite");
    let s = Settings {
        notary: NotaryMode::Off,
        ..Settings::default()
    };
    assert_eq!(s.notarizer(&path).unwrap().name(), "off");
    let ledger = Settings::default().notarizer(&path).unwrap();
    assert_eq!(ledger.name(), "ledger");
}
