use crate::domain::account::{Account, Amount, NewAccount};
use crate::domain::transaction::{
    NewTransaction, TransactionRecord, TransactionStatus, TransactionType,
};
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Filter for ledger queries. `account` matches an entry where the account is
/// either the source or the destination.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub account: Option<String>,
    pub user_id: Option<String>,
    pub r#type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    pub currency: Option<String>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &TransactionRecord) -> bool {
        if let Some(account) = &self.account
            && tx.from_account.as_deref() != Some(account)
            && tx.to_account.as_deref() != Some(account)
        {
            return false;
        }
        if let Some(user_id) = &self.user_id
            && &tx.user_id != user_id
        {
            return false;
        }
        if let Some(r#type) = self.r#type
            && tx.r#type != r#type
        {
            return false;
        }
        if let Some(status) = self.status
            && tx.status != status
        {
            return false;
        }
        if let Some(currency) = &self.currency
            && &tx.currency != currency
        {
            return false;
        }
        true
    }
}

/// 1-based page request.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl Page {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: page.max(1),
            limit,
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// One page of results plus the pagination metadata consumers expect.
#[derive(Debug, Clone, Serialize)]
pub struct PageOf<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

impl<T> PageOf<T> {
    pub fn new(items: Vec<T>, page: Page, total: usize) -> Self {
        let pages = if page.limit == 0 {
            0
        } else {
            total.div_ceil(page.limit)
        };
        Self {
            items,
            page: page.page,
            limit: page.limit,
            total,
            pages,
        }
    }
}

/// Single source of truth for balances. Implementations must make
/// `debit` an indivisible check-and-mutate with respect to any concurrent
/// credit or debit on the same account.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Creates an account with a freshly assigned unique account number.
    async fn create(&self, new: NewAccount) -> Result<Account>;

    async fn get(&self, account_number: &str) -> Result<Option<Account>>;

    /// Active accounts owned by a user.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Account>>;

    /// Every account, including inactive ones.
    async fn all(&self) -> Result<Vec<Account>>;

    /// Adds funds. Succeeds for any existing account.
    async fn credit(&self, account_number: &str, amount: Amount) -> Result<Account>;

    /// Atomically checks the balance and removes funds. Fails with
    /// `InsufficientFunds` against the balance at the moment of mutation.
    async fn debit(&self, account_number: &str, amount: Amount) -> Result<Account>;

    /// Soft delete; fails with `NonZeroBalance` if funds remain.
    async fn deactivate(&self, account_number: &str) -> Result<()>;
}

/// Durable record of what was attempted and what happened.
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Validates the fields, assigns a unique transaction ID and persists the
    /// entry. Returns the stored record.
    async fn create(&self, new: NewTransaction) -> Result<TransactionRecord>;

    async fn get(&self, transaction_id: &str) -> Result<Option<TransactionRecord>>;

    /// Atomic check-and-set against the allowed transition table. Records the
    /// processing timestamp and the audit fields.
    async fn transition(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
        processed_by: Option<&str>,
        failure_reason: Option<&str>,
    ) -> Result<TransactionRecord>;

    /// Read-only filtered view, newest first.
    async fn find(&self, filter: &TransactionFilter, page: Page) -> Result<PageOf<TransactionRecord>>;
}

pub type AccountStoreRef = Arc<dyn AccountStore>;
pub type TransactionLedgerRef = Arc<dyn TransactionLedger>;
