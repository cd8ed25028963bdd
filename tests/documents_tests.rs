// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use mizan::config::Settings;
use mizan::documents::{self, DocumentKind};
use mizan::models::{NewClient, NewContract};
use mizan::murabaha::DealParameters;
use mizan::notary::DisabledNotary;
use mizan::{cli, commands, db, store};
use rusqlite::Connection;
use rust_decimal_macros::dec;

fn seeded(months: u32) -> (Connection, i64) {
    let conn = db::open_in_memory().unwrap();
    let client = store::create_client(
        &conn,
        &NewClient {
            name: "Fatima Noor".into(),
            ..Default::default()
        },
    )
    .unwrap();
    let new = NewContract {
        client_id: client.id,
        asset_name: "Apartment 4B".into(),
        deal: DealParameters {
            asset_price: dec!(250000),
            annual_profit_rate: dec!(0.045),
            duration_months: months,
            down_payment_percentage: dec!(0.2),
            security_deposit: dec!(5000),
        },
    };
    let id = store::create_contract(
        &conn,
        &DisabledNotary,
        &new,
        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
    )
    .unwrap()
    .contract
    .id;
    (conn, id)
}

#[test]
fn promise_lists_asset_terms_and_deposit_clause() {
    let (conn, id) = seeded(60);
    let contract = store::get_contract(&conn, id).unwrap().unwrap();
    let client = store::get_client(&conn, contract.client_id).unwrap();
    let text = documents::render(DocumentKind::Promise, &contract, client.as_ref(), "$");

    assert!(text.contains("UNDERTAKING TO PURCHASE (WA'D)"));
    assert!(text.contains("I, the undersigned Fatima Noor"));
    assert!(text.contains("Apartment 4B"));
    assert!(text.contains("$250000.00"));
    assert!(text.contains("Down Payment:            20%"));
    assert!(text.contains("Hamish Jiddiyyah (security deposit) of $5000.00"));
    assert!(text.contains("60 Months"));
    assert!(text.contains("4.5% p.a."));
    assert!(text.contains("Client Signature"));
}

#[test]
fn sale_previews_five_installments() {
    let (conn, id) = seeded(60);
    let contract = store::get_contract(&conn, id).unwrap().unwrap();
    let text = documents::render(DocumentKind::Sale, &contract, None, "SAR ");

    assert!(text.contains("MURABAHA SALE AGREEMENT"));
    assert!(text.contains("2. Fatima Noor (the \"Buyer\")"));
    assert!(text.contains("Total Selling Price:      SAR "));
    assert!(text.contains("2025-05-01"));
    assert!(text.contains("2025-09-01"));
    assert!(!text.contains("2025-10-01"));
    assert!(text.contains("... and 55 more installments"));
    assert!(text.contains("Buyer Signature"));
}

#[test]
fn short_sale_has_no_more_line() {
    let (conn, id) = seeded(3);
    let contract = store::get_contract(&conn, id).unwrap().unwrap();
    let text = documents::render(DocumentKind::Sale, &contract, None, "$");
    assert!(text.contains("PAYMENT SCHEDULE (First 3 Months):"));
    assert!(!text.contains("more installments"));
}

#[test]
fn kinds_parse_and_name_files() {
    assert_eq!("promise".parse::<DocumentKind>().unwrap(), DocumentKind::Promise);
    assert_eq!("SALE".parse::<DocumentKind>().unwrap(), DocumentKind::Sale);
    assert!("invoice".parse::<DocumentKind>().is_err());
    assert_eq!(DocumentKind::Sale.file_name(3), "Murabaha_Contract_3.txt");
}

#[test]
fn doc_command_writes_file() {
    let (conn, id) = seeded(12);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("promise.txt");
    let out_str = out.to_string_lossy().to_string();
    let id_str = id.to_string();

    let matches = cli::build_cli().get_matches_from([
        "mizan", "doc", "promise", "--id", &id_str, "--out", &out_str,
    ]);
    if let Some(("doc", doc_m)) = matches.subcommand() {
        commands::documents::handle(&conn, doc_m, &Settings::default()).unwrap();
    } else {
        panic!("no doc subcommand");
    }
    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("MIZAN ISLAMIC BANK"));
}
