// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use mizan::horizon::{
    HorizonError, murabaha_only, normalize_hash, parse_transaction, parse_transactions_page,
    validate_account,
};

const HASH: &str = "3389e9f0f1a65f19736cacf544c2e825313e8447f569233bb8db39aa607c8889";

fn page() -> String {
    format!(
        r#"{{
          "_links": {{"self": {{"href": "..."}}}},
          "_embedded": {{
            "records": [
              {{"hash": "{HASH}", "created_at": "2025-03-01T10:00:00Z", "memo": "Murabaha-7-Toyota Camry",
                "memo_type": "text", "successful": true, "ledger": 123}},
              {{"hash": "aa", "created_at": "2025-02-28T09:00:00Z", "memo_type": "none", "successful": true}},
              {{"hash": "bb", "created_at": "2025-02-27T09:00:00Z", "memo": "rent", "memo_type": "text",
                "successful": false}}
            ]
          }}
        }}"#
    )
}

#[test]
fn page_records_map_to_ledger_txs() {
    let txs = parse_transactions_page(&page()).unwrap();
    assert_eq!(txs.len(), 3);
    assert_eq!(txs[0].memo.as_deref(), Some("Murabaha-7-Toyota Camry"));
    assert!(txs[0].explorer_link.ends_with(HASH));
    assert_eq!(txs[1].memo, None);
    assert!(!txs[2].successful);
}

#[test]
fn audit_keeps_only_contract_memos() {
    let txs = murabaha_only(parse_transactions_page(&page()).unwrap());
    assert_eq!(txs.len(), 1);
    assert!(txs[0].matches_contract(7));
    assert!(!txs[0].matches_contract(70));
}

#[test]
fn single_transaction_parses() {
    let body = format!(
        r#"{{"hash": "{HASH}", "created_at": "2025-03-01T10:00:00Z", "memo": "Murabaha-1-Car", "memo_type": "text", "successful": true}}"#
    );
    let tx = parse_transaction(&body).unwrap();
    assert!(tx.is_murabaha());
    assert!(tx.matches_contract(1));
}

#[test]
fn inputs_are_validated_before_any_request() {
    assert_eq!(normalize_hash(&HASH.to_uppercase()).unwrap(), HASH);
    assert!(matches!(normalize_hash("1234"), Err(HorizonError::InvalidHash(_))));

    let account = format!("G{}", "A".repeat(55));
    assert_eq!(validate_account(&account).unwrap(), account);
    assert!(matches!(
        validate_account("GABC"),
        Err(HorizonError::InvalidAccount(_))
    ));
}
