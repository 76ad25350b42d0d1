#![cfg(feature = "storage-rocksdb")]

mod common;

use bankledger::application::engine::{PaymentAction, PaymentEngine};
use bankledger::domain::account::{AccountType, Amount};
use bankledger::domain::actor::Actor;
use bankledger::domain::ports::{AccountStoreRef, TransactionLedgerRef};
use bankledger::domain::transaction::TransactionStatus;
use bankledger::infrastructure::rocksdb::RocksDbStore;
use common::payment_to_john;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tempfile::tempdir;

fn engine_at(path: &std::path::Path) -> PaymentEngine {
    let store = RocksDbStore::open(path).unwrap();
    let accounts: AccountStoreRef = Arc::new(store.clone());
    let ledger: TransactionLedgerRef = Arc::new(store);
    PaymentEngine::new(accounts, ledger)
}

#[tokio::test]
async fn test_holds_survive_a_restart() {
    let dir = tempdir().unwrap();
    let customer = Actor::customer("u1");
    let staff = Actor::employee("e1");

    let (account_number, transaction_id) = {
        let engine = engine_at(dir.path());
        let account = engine
            .open_account(
                &customer,
                AccountType::Checking,
                "USD",
                Some(Amount::new(dec!(1000.00)).unwrap()),
            )
            .await
            .unwrap();
        let entry = engine
            .submit_payment(&customer, payment_to_john(&account.account_number, dec!(150.75)))
            .await
            .unwrap();
        (account.account_number, entry.transaction_id)
    };

    // Reopen the database: the pending entry and the hold are both present.
    let engine = engine_at(dir.path());
    let account = engine.account(&customer, &account_number).await.unwrap();
    assert_eq!(account.balance, dec!(849.25));

    let entry = engine
        .process_payment(
            &staff,
            &transaction_id,
            PaymentAction::Reject {
                reason: "failed compliance check".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(entry.status, TransactionStatus::Failed);

    let account = engine.account(&customer, &account_number).await.unwrap();
    assert_eq!(account.balance, dec!(1000.00));
}
