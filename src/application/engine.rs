use crate::domain::account::{Account, AccountType, Amount, NewAccount};
use crate::domain::actor::Actor;
use crate::domain::ports::{AccountStoreRef, TransactionLedgerRef};
use crate::domain::transaction::{
    NewTransaction, RecipientDetails, TransactionRecord, TransactionStatus, TransactionType,
    validate_currency,
};
use crate::error::{LedgerError, Result};
use tracing::{error, info};

/// An international payment submission.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub from_account: String,
    pub amount: Amount,
    pub currency: String,
    pub recipient: RecipientDetails,
    pub description: Option<String>,
    pub reference: Option<String>,
}

/// Staff decision on a pending payment.
#[derive(Debug, Clone)]
pub enum PaymentAction {
    Approve,
    Reject { reason: String },
}

/// The payment state machine: the only component that moves a ledger entry
/// and an account balance together.
///
/// A submission holds funds by debiting the source account before the entry
/// is created, so a `pending` entry always has a corresponding hold. Refunds
/// (cancel, reject) claim the entry through the ledger's atomic status
/// transition before crediting, so a racing second refund loses the claim and
/// never credits twice.
pub struct PaymentEngine {
    accounts: AccountStoreRef,
    ledger: TransactionLedgerRef,
}

impl PaymentEngine {
    pub fn new(accounts: AccountStoreRef, ledger: TransactionLedgerRef) -> Self {
        Self { accounts, ledger }
    }

    /// Opens an account for the caller. The opening balance is the caller's
    /// policy decision (staff accounts start at zero, for instance).
    pub async fn open_account(
        &self,
        actor: &Actor,
        account_type: AccountType,
        currency: &str,
        opening_balance: Option<Amount>,
    ) -> Result<Account> {
        validate_currency(currency)?;
        let account = self
            .accounts
            .create(NewAccount {
                user_id: actor.user_id.clone(),
                account_type,
                currency: currency.to_string(),
                opening_balance,
            })
            .await?;
        info!(account = %account.account_number, user = %actor.user_id, "account opened");
        Ok(account)
    }

    /// Soft-deletes one of the caller's accounts. Fails with `NonZeroBalance`
    /// while funds remain.
    pub async fn deactivate_account(&self, actor: &Actor, account_number: &str) -> Result<()> {
        let account = self
            .accounts
            .get(account_number)
            .await?
            .filter(|a| a.user_id == actor.user_id)
            .ok_or_else(|| LedgerError::AccountNotFound(account_number.to_string()))?;
        self.accounts.deactivate(&account.account_number).await
    }

    /// Owner-scoped account lookup; inactive accounts are not visible.
    pub async fn account(&self, actor: &Actor, account_number: &str) -> Result<Account> {
        self.owned_active_account(actor, account_number).await
    }

    pub async fn accounts_for(&self, actor: &Actor) -> Result<Vec<Account>> {
        self.accounts.list_for_user(&actor.user_id).await
    }

    /// Credits one of the caller's accounts and records a completed deposit
    /// entry. Bookkeeping only; deposits need no approval.
    pub async fn deposit(
        &self,
        actor: &Actor,
        account_number: &str,
        amount: Amount,
        description: Option<String>,
    ) -> Result<TransactionRecord> {
        let account = self.owned_active_account(actor, account_number).await?;
        self.accounts.credit(&account.account_number, amount).await?;

        let entry = NewTransaction {
            r#type: TransactionType::Deposit,
            status: TransactionStatus::Completed,
            from_account: None,
            to_account: Some(account.account_number.clone()),
            amount,
            currency: account.currency.clone(),
            description,
            reference: None,
            user_id: actor.user_id.clone(),
            recipient_name: None,
            recipient_bank: None,
            swift_code: None,
        };
        match self.ledger.create(entry).await {
            Ok(record) => Ok(record),
            Err(err) => {
                // The credit has no matching entry; take it back.
                if self
                    .accounts
                    .debit(&account.account_number, amount)
                    .await
                    .is_err()
                {
                    error!(
                        target: "anomaly",
                        account = %account.account_number,
                        %amount,
                        "deposit entry creation failed and the credit could not be reversed"
                    );
                }
                Err(err)
            }
        }
    }

    /// Submits an international payment: holds the funds by debiting the
    /// source account, then records the `pending` entry.
    ///
    /// The conditional debit is the sufficient-funds check; two concurrent
    /// submissions can never both pass it against a stale balance. If the
    /// entry cannot be recorded the hold is released again, so no call leaves
    /// a debit without an entry or an entry without a debit.
    pub async fn submit_payment(
        &self,
        actor: &Actor,
        request: PaymentRequest,
    ) -> Result<TransactionRecord> {
        let account = self
            .owned_active_account(actor, &request.from_account)
            .await?;

        self.accounts.debit(&account.account_number, request.amount).await?;

        let entry = NewTransaction {
            r#type: TransactionType::Payment,
            status: TransactionStatus::Pending,
            from_account: Some(account.account_number.clone()),
            to_account: Some(request.recipient.account.clone()),
            amount: request.amount,
            currency: request.currency.clone(),
            description: request.description.clone(),
            reference: request.reference.clone(),
            user_id: actor.user_id.clone(),
            recipient_name: Some(request.recipient.name.clone()),
            recipient_bank: request.recipient.bank.clone(),
            swift_code: request.recipient.swift_code.clone(),
        };
        match self.ledger.create(entry).await {
            Ok(record) => {
                info!(
                    transaction = %record.transaction_id,
                    account = %account.account_number,
                    amount = %record.amount,
                    "payment submitted, funds held"
                );
                Ok(record)
            }
            Err(err) => {
                // Release the hold; an unrecorded debit must not survive.
                if let Err(credit_err) = self
                    .accounts
                    .credit(&account.account_number, request.amount)
                    .await
                {
                    error!(
                        target: "anomaly",
                        account = %account.account_number,
                        amount = %request.amount,
                        error = %credit_err,
                        "failed to release a hold after entry creation failed"
                    );
                }
                Err(err)
            }
        }
    }

    /// Cancels one of the caller's own pending or processing payments and
    /// returns the held amount.
    pub async fn cancel_payment(
        &self,
        actor: &Actor,
        transaction_id: &str,
    ) -> Result<TransactionRecord> {
        let entry = self
            .ledger
            .get(transaction_id)
            .await?
            .filter(|t| t.user_id == actor.user_id && t.r#type == TransactionType::Payment)
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))?;

        if !entry.status.can_be_cancelled() {
            return Err(LedgerError::InvalidState {
                id: entry.transaction_id,
                action: "cancelled",
                status: entry.status,
            });
        }

        // The transition claims the entry; a racing second cancel fails here
        // and performs no balance change.
        let entry = self
            .ledger
            .transition(
                transaction_id,
                TransactionStatus::Cancelled,
                Some(&actor.user_id),
                None,
            )
            .await?;
        self.refund_hold(&entry).await;
        info!(transaction = %entry.transaction_id, "payment cancelled");
        Ok(entry)
    }

    /// Staff decision on a pending payment. Approval finalizes the hold as
    /// spent; rejection returns the held amount and records the reason.
    pub async fn process_payment(
        &self,
        actor: &Actor,
        transaction_id: &str,
        action: PaymentAction,
    ) -> Result<TransactionRecord> {
        if !actor.role.can_process_payments() {
            return Err(LedgerError::NotPermitted(actor.user_id.clone()));
        }

        let entry = self
            .ledger
            .get(transaction_id)
            .await?
            .filter(|t| t.r#type == TransactionType::Payment)
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))?;

        if entry.status != TransactionStatus::Pending {
            return Err(LedgerError::InvalidState {
                id: entry.transaction_id,
                action: "processed",
                status: entry.status,
            });
        }

        match action {
            PaymentAction::Approve => {
                let entry = self
                    .ledger
                    .transition(
                        transaction_id,
                        TransactionStatus::Completed,
                        Some(&actor.user_id),
                        None,
                    )
                    .await?;
                info!(transaction = %entry.transaction_id, "payment approved");
                Ok(entry)
            }
            PaymentAction::Reject { reason } => {
                let entry = self
                    .ledger
                    .transition(
                        transaction_id,
                        TransactionStatus::Failed,
                        Some(&actor.user_id),
                        Some(&reason),
                    )
                    .await?;
                self.refund_hold(&entry).await;
                info!(transaction = %entry.transaction_id, %reason, "payment rejected");
                Ok(entry)
            }
        }
    }

    async fn owned_active_account(&self, actor: &Actor, account_number: &str) -> Result<Account> {
        self.accounts
            .get(account_number)
            .await?
            .filter(|a| a.user_id == actor.user_id && a.is_active)
            .ok_or_else(|| LedgerError::AccountNotFound(account_number.to_string()))
    }

    /// Returns a held amount to the source account of a refunded entry.
    ///
    /// If the account vanished or was deactivated between hold and refund the
    /// credit is skipped: the ledger transition stands and the mismatch is
    /// surfaced as an operational alert instead of failing the caller.
    async fn refund_hold(&self, entry: &TransactionRecord) {
        let Some(from_account) = &entry.from_account else {
            return;
        };
        let refundable = match self.accounts.get(from_account).await {
            Ok(Some(account)) if account.is_active => {
                self.accounts.credit(from_account, entry.amount).await.is_ok()
            }
            Ok(_) => false,
            Err(_) => false,
        };
        if !refundable {
            let anomaly = LedgerError::InconsistentHold {
                transaction_id: entry.transaction_id.clone(),
                account: from_account.clone(),
            };
            error!(target: "anomaly", error = %anomaly, amount = %entry.amount, "refund skipped");
        }
    }
}
