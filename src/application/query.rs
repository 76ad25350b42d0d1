use crate::domain::actor::Actor;
use crate::domain::ports::{
    AccountStoreRef, Page, PageOf, TransactionFilter, TransactionLedgerRef,
};
use crate::domain::transaction::{TransactionRecord, TransactionStatus, TransactionType};
use crate::error::{LedgerError, Result};

/// Read-only paginated projections over the ledger. No business rules beyond
/// never returning another user's data to a non-privileged caller.
pub struct LedgerQuery {
    accounts: AccountStoreRef,
    ledger: TransactionLedgerRef,
}

impl LedgerQuery {
    pub fn new(accounts: AccountStoreRef, ledger: TransactionLedgerRef) -> Self {
        Self { accounts, ledger }
    }

    /// Entries where the account is source or destination. Ownership is
    /// verified unless the caller is privileged.
    pub async fn account_transactions(
        &self,
        actor: &Actor,
        account_number: &str,
        r#type: Option<TransactionType>,
        status: Option<TransactionStatus>,
        page: Page,
    ) -> Result<PageOf<TransactionRecord>> {
        let account = self
            .accounts
            .get(account_number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_number.to_string()))?;
        if !actor.role.is_privileged() && account.user_id != actor.user_id {
            return Err(LedgerError::AccountNotFound(account_number.to_string()));
        }

        let filter = TransactionFilter {
            account: Some(account.account_number),
            r#type,
            status,
            ..TransactionFilter::default()
        };
        self.ledger.find(&filter, page).await
    }

    /// The caller's own transaction history.
    pub async fn user_transactions(
        &self,
        actor: &Actor,
        r#type: Option<TransactionType>,
        status: Option<TransactionStatus>,
        page: Page,
    ) -> Result<PageOf<TransactionRecord>> {
        let filter = TransactionFilter {
            user_id: Some(actor.user_id.clone()),
            r#type,
            status,
            ..TransactionFilter::default()
        };
        self.ledger.find(&filter, page).await
    }

    /// The caller's payment history, optionally narrowed by status or
    /// currency.
    pub async fn payments_for_user(
        &self,
        actor: &Actor,
        status: Option<TransactionStatus>,
        currency: Option<String>,
        page: Page,
    ) -> Result<PageOf<TransactionRecord>> {
        let filter = TransactionFilter {
            user_id: Some(actor.user_id.clone()),
            r#type: Some(TransactionType::Payment),
            status,
            currency,
            ..TransactionFilter::default()
        };
        self.ledger.find(&filter, page).await
    }

    /// Single entry by ID, owner-scoped for customers, unscoped for staff.
    pub async fn transaction_details(
        &self,
        actor: &Actor,
        transaction_id: &str,
    ) -> Result<TransactionRecord> {
        self.ledger
            .get(transaction_id)
            .await?
            .filter(|t| actor.role.is_privileged() || t.user_id == actor.user_id)
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))
    }

    /// Like `transaction_details` but restricted to payment entries.
    pub async fn payment_details(
        &self,
        actor: &Actor,
        transaction_id: &str,
    ) -> Result<TransactionRecord> {
        let entry = self.transaction_details(actor, transaction_id).await?;
        if entry.r#type != TransactionType::Payment {
            return Err(LedgerError::TransactionNotFound(transaction_id.to_string()));
        }
        Ok(entry)
    }

    /// Unscoped view over every entry; staff only.
    pub async fn all_transactions(
        &self,
        actor: &Actor,
        r#type: Option<TransactionType>,
        status: Option<TransactionStatus>,
        page: Page,
    ) -> Result<PageOf<TransactionRecord>> {
        if !actor.role.is_privileged() {
            return Err(LedgerError::NotPermitted(actor.user_id.clone()));
        }
        let filter = TransactionFilter {
            r#type,
            status,
            ..TransactionFilter::default()
        };
        self.ledger.find(&filter, page).await
    }
}
