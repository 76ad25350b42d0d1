#![allow(dead_code)]

use bankledger::application::engine::{PaymentEngine, PaymentRequest};
use bankledger::application::query::LedgerQuery;
use bankledger::domain::account::{Account, AccountType, Amount};
use bankledger::domain::actor::Actor;
use bankledger::domain::ports::{AccountStoreRef, TransactionLedgerRef};
use bankledger::domain::transaction::RecipientDetails;
use bankledger::infrastructure::in_memory::{InMemoryAccountStore, InMemoryTransactionLedger};
use rust_decimal::Decimal;
use std::sync::Arc;

pub fn stores() -> (AccountStoreRef, TransactionLedgerRef) {
    (
        Arc::new(InMemoryAccountStore::new()),
        Arc::new(InMemoryTransactionLedger::new()),
    )
}

pub fn engine(accounts: &AccountStoreRef, ledger: &TransactionLedgerRef) -> PaymentEngine {
    PaymentEngine::new(accounts.clone(), ledger.clone())
}

pub fn query(accounts: &AccountStoreRef, ledger: &TransactionLedgerRef) -> LedgerQuery {
    LedgerQuery::new(accounts.clone(), ledger.clone())
}

pub async fn open_funded(engine: &PaymentEngine, actor: &Actor, balance: Decimal) -> Account {
    engine
        .open_account(
            actor,
            AccountType::Checking,
            "USD",
            Some(Amount::new(balance).unwrap()),
        )
        .await
        .unwrap()
}

pub fn payment_to_john(from_account: &str, amount: Decimal) -> PaymentRequest {
    PaymentRequest {
        from_account: from_account.to_string(),
        amount: Amount::new(amount).unwrap(),
        currency: "USD".to_string(),
        recipient: RecipientDetails {
            account: "9876543210".to_string(),
            name: "John International".to_string(),
            bank: Some("First Bank".to_string()),
            swift_code: Some("FIRBUS33".to_string()),
        },
        description: Some("invoice 42".to_string()),
        reference: None,
    }
}
