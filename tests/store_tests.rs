// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use mizan::db;
use mizan::models::{NewClient, NewContract};
use mizan::murabaha::DealParameters;
use mizan::notary::{DisabledNotary, HashChainNotary, verify_chain};
use mizan::store::{self, StoreError};
use mizan::workflow::{ContractStatus, StatusPolicy, TransitionError};
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn setup() -> (Connection, i64) {
    let conn = db::open_in_memory().unwrap();
    let client = store::create_client(
        &conn,
        &NewClient {
            name: "Aisha Rahman".into(),
            email: Some("aisha@example.com".into()),
            credit_score: Some(720),
        },
    )
    .unwrap();
    (conn, client.id)
}

fn car(client_id: i64) -> NewContract {
    NewContract {
        client_id,
        asset_name: "Toyota Camry".into(),
        deal: DealParameters {
            asset_price: dec!(100000),
            annual_profit_rate: dec!(0.05),
            duration_months: 12,
            down_payment_percentage: dec!(0.2),
            security_deposit: Decimal::ZERO,
        },
    }
}

fn ledger() -> HashChainNotary {
    HashChainNotary::new(db::open_in_memory().unwrap())
}

#[test]
fn client_validation_names_the_field() {
    let conn = db::open_in_memory().unwrap();
    let err = store::create_client(&conn, &NewClient::default()).unwrap_err();
    assert_eq!(err.field(), Some("name"));

    let err = store::create_client(
        &conn,
        &NewClient {
            name: "Omar".into(),
            email: Some("not-an-email".into()),
            credit_score: None,
        },
    )
    .unwrap_err();
    assert_eq!(err.field(), Some("email"));
}

#[test]
fn clients_list_newest_first() {
    let (conn, first) = setup();
    let second = store::create_client(
        &conn,
        &NewClient {
            name: "Yusuf".into(),
            ..Default::default()
        },
    )
    .unwrap();
    let all = store::list_clients(&conn).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, second.id);
    assert_eq!(all[1].id, first);
    assert_eq!(all[0].email, None);
    assert_eq!(all[0].credit_score, 0);
}

#[test]
fn contract_is_drafted_recomputed_and_notarized() {
    let (conn, client_id) = setup();
    let notary = ledger();
    let created =
        store::create_contract(&conn, &notary, &car(client_id), day(2025, 3, 10)).unwrap();
    let c = &created.contract;

    assert_eq!(c.status, ContractStatus::Draft);
    assert_eq!(c.client_name, "Aisha Rahman");
    assert_eq!(c.summary.total_cost, dec!(84000));
    assert_eq!(c.schedule.len(), 12);
    assert_eq!(c.schedule[0].due_date, day(2025, 4, 10));
    assert!(created.warning.is_none());

    let receipt = created.receipt.clone().unwrap();
    assert_eq!(c.blockchain_hash.as_deref(), Some(receipt.hash.as_str()));
    assert_eq!(c.notary.as_deref(), Some("ledger"));
    assert_eq!(receipt.memo, format!("Murabaha-{}-Toyota Camry", c.id));

    let entries = notary.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount, dec!(84000));
    assert!(verify_chain(&entries).is_ok());

    let reloaded = store::get_contract(&conn, c.id).unwrap().unwrap();
    assert_eq!(reloaded.schedule, c.schedule);
    assert_eq!(reloaded.summary, c.summary);
}

#[test]
fn notary_failure_keeps_the_contract() {
    let (conn, client_id) = setup();
    let created =
        store::create_contract(&conn, &DisabledNotary, &car(client_id), day(2025, 3, 10))
            .unwrap();
    assert!(created.receipt.is_none());
    let warning = created.warning.unwrap();
    assert!(warning.starts_with("Contract saved locally. Blockchain logging failed:"));
    assert!(created.contract.blockchain_hash.is_none());
    assert_eq!(store::list_contracts(&conn).unwrap().len(), 1);

    let actions: Vec<String> = store::list_audit(&conn, 10)
        .unwrap()
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert!(actions.contains(&"notarization_failed".to_string()));
    assert!(actions.contains(&"contract_created".to_string()));
}

#[test]
fn unknown_client_is_rejected() {
    let conn = db::open_in_memory().unwrap();
    let err = store::create_contract(&conn, &DisabledNotary, &car(99), day(2025, 1, 1))
        .unwrap_err();
    assert!(matches!(err, StoreError::ClientNotFound(99)));
    assert!(store::list_contracts(&conn).unwrap().is_empty());
}

#[test]
fn bad_deal_is_not_stored() {
    let (conn, client_id) = setup();
    let mut new = car(client_id);
    new.deal.duration_months = 0;
    let err = store::create_contract(&conn, &DisabledNotary, &new, day(2025, 1, 1)).unwrap_err();
    assert_eq!(err.field(), Some("duration_months"));
    assert!(store::list_contracts(&conn).unwrap().is_empty());
}

#[test]
fn strict_policy_walks_forward_one_step_at_a_time() {
    let (conn, client_id) = setup();
    let id = store::create_contract(&conn, &DisabledNotary, &car(client_id), day(2025, 1, 1))
        .unwrap()
        .contract
        .id;

    let err = store::update_status(&conn, id, ContractStatus::SaleSigned, StatusPolicy::Strict)
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Transition(TransitionError::OutOfOrder { .. })
    ));

    for to in [
        ContractStatus::Promise,
        ContractStatus::AssetOwned,
        ContractStatus::SaleSigned,
    ] {
        let c = store::update_status(&conn, id, to, StatusPolicy::Strict).unwrap();
        assert_eq!(c.status, to);
    }

    let err = store::update_status(&conn, id, ContractStatus::Draft, StatusPolicy::Strict)
        .unwrap_err();
    assert!(matches!(err, StoreError::Transition(_)));
}

#[test]
fn permissive_policy_allows_jumps() {
    let (conn, client_id) = setup();
    let id = store::create_contract(&conn, &DisabledNotary, &car(client_id), day(2025, 1, 1))
        .unwrap()
        .contract
        .id;
    let c = store::update_status(&conn, id, ContractStatus::SaleSigned, StatusPolicy::Permissive)
        .unwrap();
    assert_eq!(c.status, ContractStatus::SaleSigned);
    let c = store::update_status(&conn, id, ContractStatus::Draft, StatusPolicy::Permissive)
        .unwrap();
    assert_eq!(c.status, ContractStatus::Draft);
}

#[test]
fn status_of_missing_contract_is_not_found() {
    let conn = db::open_in_memory().unwrap();
    let err = store::update_status(&conn, 5, ContractStatus::Promise, StatusPolicy::Strict)
        .unwrap_err();
    assert!(matches!(err, StoreError::ContractNotFound(5)));
}

#[test]
fn anchor_records_a_stellar_hash() {
    let (conn, client_id) = setup();
    let id = store::create_contract(&conn, &DisabledNotary, &car(client_id), day(2025, 1, 1))
        .unwrap()
        .contract
        .id;
    let hash = "AB".repeat(32);
    let c = store::anchor_contract(&conn, id, &hash).unwrap();
    assert_eq!(c.blockchain_hash, Some("ab".repeat(32)));
    assert_eq!(c.notary.as_deref(), Some("stellar"));

    let err = store::anchor_contract(&conn, id, "xyz").unwrap_err();
    assert_eq!(err.field(), Some("hash"));
}

#[test]
fn dashboard_aggregates_by_status_year_and_month() {
    let (conn, client_id) = setup();
    let today = day(2025, 6, 20);
    let a = store::create_contract(&conn, &DisabledNotary, &car(client_id), day(2025, 6, 1))
        .unwrap()
        .contract;
    store::create_contract(&conn, &DisabledNotary, &car(client_id), day(2025, 2, 14)).unwrap();
    // last year: counted in volume, not in profit YTD or the six-month chart
    store::create_contract(&conn, &DisabledNotary, &car(client_id), day(2024, 5, 1)).unwrap();
    store::update_status(&conn, a.id, ContractStatus::Promise, StatusPolicy::Strict).unwrap();

    let d = store::dashboard(&conn, today).unwrap();
    assert_eq!(d.clients, 1);
    assert_eq!(d.contracts, 3);
    assert_eq!(d.active_deals, 1);
    assert_eq!(d.total_assets, dec!(300000));
    assert_eq!(d.volume, dec!(252000));
    assert_eq!(d.profit_ytd, dec!(8000));

    let promise = d
        .by_status
        .iter()
        .find(|s| s.status == ContractStatus::Promise)
        .unwrap();
    assert_eq!(promise.count, 1);

    let months: Vec<&str> = d.chart_data.iter().map(|m| m.month.as_str()).collect();
    assert_eq!(
        months,
        ["2025-01", "2025-02", "2025-03", "2025-04", "2025-05", "2025-06"]
    );
    assert_eq!(d.chart_data[1].volume, dec!(84000));
    assert_eq!(d.chart_data[5].volume, dec!(84000));
    assert_eq!(d.chart_data[0].volume, Decimal::ZERO);
}

#[test]
fn dashboard_reports_overflow_instead_of_panicking() {
    let (conn, client_id) = setup();
    for _ in 0..2 {
        store::create_contract(&conn, &DisabledNotary, &car(client_id), day(2025, 6, 1)).unwrap();
    }
    // rows written before the price ceiling existed
    conn.execute(
        "UPDATE contracts SET asset_price = ?1, total_cost = ?1",
        ["50000000000000000000000000000"],
    )
    .unwrap();
    let err = store::dashboard(&conn, day(2025, 6, 20)).unwrap_err();
    assert!(matches!(err, StoreError::Overflow(_)));
}
