mod common;

use bankledger::application::engine::PaymentAction;
use bankledger::domain::actor::Actor;
use bankledger::domain::ports::Page;
use bankledger::domain::transaction::{TransactionStatus, TransactionType};
use bankledger::error::LedgerError;
use common::{engine, open_funded, payment_to_john, query, stores};
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_account_transactions_are_owner_scoped() {
    let (accounts, ledger) = stores();
    let engine = engine(&accounts, &ledger);
    let query = query(&accounts, &ledger);
    let owner = Actor::customer("u1");
    let other = Actor::customer("u2");
    let staff = Actor::admin("a1");

    let account = open_funded(&engine, &owner, dec!(500.00)).await;
    engine
        .submit_payment(&owner, payment_to_john(&account.account_number, dec!(10.00)))
        .await
        .unwrap();

    let own = query
        .account_transactions(&owner, &account.account_number, None, None, Page::default())
        .await
        .unwrap();
    assert_eq!(own.total, 1);

    let denied = query
        .account_transactions(&other, &account.account_number, None, None, Page::default())
        .await;
    assert!(matches!(denied, Err(LedgerError::AccountNotFound(_))));

    // Staff may inspect any account.
    let staff_view = query
        .account_transactions(&staff, &account.account_number, None, None, Page::default())
        .await
        .unwrap();
    assert_eq!(staff_view.total, 1);
}

#[tokio::test]
async fn test_payment_history_filters_and_paginates() {
    let (accounts, ledger) = stores();
    let engine = engine(&accounts, &ledger);
    let query = query(&accounts, &ledger);
    let customer = Actor::customer("u1");
    let staff = Actor::employee("e1");

    let account = open_funded(&engine, &customer, dec!(1000.00)).await;
    let mut ids = Vec::new();
    for _ in 0..5 {
        let entry = engine
            .submit_payment(&customer, payment_to_john(&account.account_number, dec!(10.00)))
            .await
            .unwrap();
        ids.push(entry.transaction_id);
    }
    engine
        .process_payment(&staff, &ids[0], PaymentAction::Approve)
        .await
        .unwrap();

    let all = query
        .payments_for_user(&customer, None, None, Page::new(1, 2))
        .await
        .unwrap();
    assert_eq!(all.total, 5);
    assert_eq!(all.pages, 3);
    assert_eq!(all.items.len(), 2);
    // Newest first.
    assert!(all.items[0].created_at >= all.items[1].created_at);

    let pending = query
        .payments_for_user(&customer, Some(TransactionStatus::Pending), None, Page::default())
        .await
        .unwrap();
    assert_eq!(pending.total, 4);

    let eur = query
        .payments_for_user(&customer, None, Some("EUR".to_string()), Page::default())
        .await
        .unwrap();
    assert_eq!(eur.total, 0);
}

#[tokio::test]
async fn test_details_lookup_scoping() {
    let (accounts, ledger) = stores();
    let engine = engine(&accounts, &ledger);
    let query = query(&accounts, &ledger);
    let owner = Actor::customer("u1");
    let other = Actor::customer("u2");
    let staff = Actor::employee("e1");

    let account = open_funded(&engine, &owner, dec!(100.00)).await;
    let entry = engine
        .submit_payment(&owner, payment_to_john(&account.account_number, dec!(10.00)))
        .await
        .unwrap();

    let found = query
        .payment_details(&owner, &entry.transaction_id)
        .await
        .unwrap();
    assert_eq!(found.transaction_id, entry.transaction_id);

    let denied = query.payment_details(&other, &entry.transaction_id).await;
    assert!(matches!(denied, Err(LedgerError::TransactionNotFound(_))));

    let staff_view = query
        .transaction_details(&staff, &entry.transaction_id)
        .await
        .unwrap();
    assert_eq!(staff_view.user_id, "u1");

    let missing = query.payment_details(&owner, "TXN0000000000000XXXXXX").await;
    assert!(matches!(missing, Err(LedgerError::TransactionNotFound(_))));
}

#[tokio::test]
async fn test_deposits_are_not_payments() {
    let (accounts, ledger) = stores();
    let engine = engine(&accounts, &ledger);
    let query = query(&accounts, &ledger);
    let customer = Actor::customer("u1");

    let account = open_funded(&engine, &customer, dec!(10.00)).await;
    let deposit = engine
        .deposit(
            &customer,
            &account.account_number,
            bankledger::domain::account::Amount::new(dec!(90.00)).unwrap(),
            None,
        )
        .await
        .unwrap();

    let payments = query
        .payments_for_user(&customer, None, None, Page::default())
        .await
        .unwrap();
    assert_eq!(payments.total, 0);

    let denied = query.payment_details(&customer, &deposit.transaction_id).await;
    assert!(matches!(denied, Err(LedgerError::TransactionNotFound(_))));

    let history = query
        .user_transactions(&customer, Some(TransactionType::Deposit), None, Page::default())
        .await
        .unwrap();
    assert_eq!(history.total, 1);
    assert_eq!(history.items[0].status, TransactionStatus::Completed);
}

#[tokio::test]
async fn test_all_transactions_is_staff_only() {
    let (accounts, ledger) = stores();
    let engine = engine(&accounts, &ledger);
    let query = query(&accounts, &ledger);
    let u1 = Actor::customer("u1");
    let u2 = Actor::customer("u2");
    let staff = Actor::admin("a1");

    let a1 = open_funded(&engine, &u1, dec!(100.00)).await;
    let a2 = open_funded(&engine, &u2, dec!(100.00)).await;
    engine
        .submit_payment(&u1, payment_to_john(&a1.account_number, dec!(10.00)))
        .await
        .unwrap();
    engine
        .submit_payment(&u2, payment_to_john(&a2.account_number, dec!(20.00)))
        .await
        .unwrap();

    let denied = query.all_transactions(&u1, None, None, Page::default()).await;
    assert!(matches!(denied, Err(LedgerError::NotPermitted(_))));

    let everything = query
        .all_transactions(&staff, None, None, Page::default())
        .await
        .unwrap();
    assert_eq!(everything.total, 2);
}
