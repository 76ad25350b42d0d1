use crate::domain::account::{Account, Amount, NewAccount, generate_account_number};
use crate::domain::ports::{AccountStore, Page, PageOf, TransactionFilter, TransactionLedger};
use crate::domain::transaction::{
    NewTransaction, TransactionRecord, TransactionStatus, generate_transaction_id,
};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

// Bound on regenerate-on-collision when assigning identifiers.
const MAX_ID_ATTEMPTS: usize = 16;

/// A thread-safe in-memory account store.
///
/// All balance mutations run under the single write lock, which makes the
/// check-and-debit indivisible with respect to any concurrent credit or debit
/// on the same account.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn create(&self, new: NewAccount) -> Result<Account> {
        let mut accounts = self.accounts.write().await;
        for _ in 0..MAX_ID_ATTEMPTS {
            let number = generate_account_number();
            if !accounts.contains_key(&number) {
                let account = Account::open(number.clone(), &new);
                accounts.insert(number, account.clone());
                return Ok(account);
            }
        }
        Err(LedgerError::Internal(
            "could not assign a unique account number".into(),
        ))
    }

    async fn get(&self, account_number: &str) -> Result<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(account_number).cloned())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Account>> {
        let accounts = self.accounts.read().await;
        let mut owned: Vec<Account> = accounts
            .values()
            .filter(|a| a.user_id == user_id && a.is_active)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.account_number.cmp(&b.account_number));
        Ok(owned)
    }

    async fn all(&self) -> Result<Vec<Account>> {
        let accounts = self.accounts.read().await;
        let mut all: Vec<Account> = accounts.values().cloned().collect();
        all.sort_by(|a, b| a.account_number.cmp(&b.account_number));
        Ok(all)
    }

    async fn credit(&self, account_number: &str, amount: Amount) -> Result<Account> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(account_number)
            .ok_or_else(|| LedgerError::AccountNotFound(account_number.to_string()))?;
        account.credit(amount);
        Ok(account.clone())
    }

    async fn debit(&self, account_number: &str, amount: Amount) -> Result<Account> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(account_number)
            .ok_or_else(|| LedgerError::AccountNotFound(account_number.to_string()))?;
        account.debit(amount)?;
        Ok(account.clone())
    }

    async fn deactivate(&self, account_number: &str) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(account_number)
            .ok_or_else(|| LedgerError::AccountNotFound(account_number.to_string()))?;
        account.deactivate()
    }
}

/// A thread-safe in-memory transaction ledger.
///
/// Status transitions are a check-and-set under the write lock, so the first
/// of two racing transitions wins and the second observes the new status.
#[derive(Default, Clone)]
pub struct InMemoryTransactionLedger {
    transactions: Arc<RwLock<HashMap<String, TransactionRecord>>>,
}

impl InMemoryTransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionLedger for InMemoryTransactionLedger {
    async fn create(&self, new: NewTransaction) -> Result<TransactionRecord> {
        new.validate()?;
        let mut transactions = self.transactions.write().await;
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = generate_transaction_id();
            if !transactions.contains_key(&id) {
                let record = TransactionRecord::from_new(id.clone(), new);
                transactions.insert(id, record.clone());
                return Ok(record);
            }
        }
        Err(LedgerError::Internal(
            "could not assign a unique transaction id".into(),
        ))
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<TransactionRecord>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.get(transaction_id).cloned())
    }

    async fn transition(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
        processed_by: Option<&str>,
        failure_reason: Option<&str>,
    ) -> Result<TransactionRecord> {
        let mut transactions = self.transactions.write().await;
        let record = transactions
            .get_mut(transaction_id)
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))?;
        if !record.status.can_transition_to(status) {
            return Err(LedgerError::InvalidTransition {
                id: record.transaction_id.clone(),
                from: record.status,
                to: status,
            });
        }
        record.status = status;
        record.processed_at = Some(chrono::Utc::now());
        if let Some(processed_by) = processed_by {
            record.processed_by = Some(processed_by.to_string());
        }
        if let Some(failure_reason) = failure_reason {
            record.failure_reason = Some(failure_reason.to_string());
        }
        Ok(record.clone())
    }

    async fn find(
        &self,
        filter: &TransactionFilter,
        page: Page,
    ) -> Result<PageOf<TransactionRecord>> {
        let transactions = self.transactions.read().await;
        let mut matching: Vec<TransactionRecord> = transactions
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        // Newest first; the ID breaks creation-time ties deterministically.
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.transaction_id.cmp(&a.transaction_id))
        });
        let total = matching.len();
        let items: Vec<TransactionRecord> = matching
            .into_iter()
            .skip(page.offset())
            .take(page.limit)
            .collect();
        Ok(PageOf::new(items, page, total))
    }
}
