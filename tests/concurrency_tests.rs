mod common;

use bankledger::domain::actor::Actor;
use bankledger::error::LedgerError;
use common::{engine, open_funded, payment_to_john, stores};
use rust_decimal_macros::dec;
use std::sync::Arc;

/// N concurrent submissions of amount A against balance B succeed for exactly
/// floor(B/A) of them; the rest fail with InsufficientFunds and the final
/// balance is B - A * floor(B/A).
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_submissions_admit_floor_b_over_a() {
    let (accounts, ledger) = stores();
    let engine = Arc::new(engine(&accounts, &ledger));
    let customer = Actor::customer("u1");

    // B = 1000.00, A = 150.75 => floor(B/A) = 6, remainder 95.50
    let account = open_funded(&engine, &customer, dec!(1000.00)).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let engine = engine.clone();
        let customer = customer.clone();
        let number = account.account_number.clone();
        handles.push(tokio::spawn(async move {
            engine
                .submit_payment(&customer, payment_to_john(&number, dec!(150.75)))
                .await
        }));
    }

    let mut successes = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(entry) => {
                assert_eq!(entry.amount.value(), dec!(150.75));
                successes += 1;
            }
            Err(LedgerError::InsufficientFunds(_)) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 6);
    assert_eq!(rejected, 4);
    let final_state = accounts.get(&account.account_number).await.unwrap().unwrap();
    assert_eq!(final_state.balance, dec!(95.50));
}

/// Racing cancellations of the same entry refund exactly once.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_cancels_refund_once() {
    let (accounts, ledger) = stores();
    let engine = Arc::new(engine(&accounts, &ledger));
    let customer = Actor::customer("u1");

    let account = open_funded(&engine, &customer, dec!(100.00)).await;
    let entry = engine
        .submit_payment(&customer, payment_to_john(&account.account_number, dec!(20.00)))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        let customer = customer.clone();
        let id = entry.transaction_id.clone();
        handles.push(tokio::spawn(
            async move { engine.cancel_payment(&customer, &id).await },
        ));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(LedgerError::InvalidState { .. }) | Err(LedgerError::InvalidTransition { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1);
    let final_state = accounts.get(&account.account_number).await.unwrap().unwrap();
    assert_eq!(final_state.balance, dec!(100.00));
}

/// Interleaved debits and credits never drive a balance negative.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_balance_never_goes_negative_under_load() {
    use bankledger::domain::account::Amount;

    let (store, ledger) = stores();
    let customer = Actor::customer("u1");
    let engine = engine(&store, &ledger);
    let account = open_funded(&engine, &customer, dec!(50.00)).await;

    let mut handles = Vec::new();
    for i in 0..40 {
        let store = store.clone();
        let number = account.account_number.clone();
        handles.push(tokio::spawn(async move {
            let amount = Amount::new(dec!(7.00)).unwrap();
            if i % 2 == 0 {
                let _ = store.debit(&number, amount).await;
            } else {
                let _ = store.credit(&number, amount).await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let final_state = store.get(&account.account_number).await.unwrap().unwrap();
    assert!(final_state.balance >= dec!(0.00));
    // 20 credits of 7.00 went in; at most 20 debits of 7.00 came out.
    assert!(final_state.balance <= dec!(50.00) + dec!(140.00));
}
