use crate::domain::account::Amount;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_DESCRIPTION_LEN: usize = 500;
const MAX_REFERENCE_LEN: usize = 50;

/// ISO 4217 shape check: three uppercase ASCII letters.
pub fn validate_currency(currency: &str) -> Result<()> {
    if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(LedgerError::Validation(format!(
            "invalid currency code {currency:?}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
    Payment,
    Fee,
}

impl TransactionType {
    /// Outgoing types must name the account the funds leave.
    pub fn requires_source(&self) -> bool {
        matches!(
            self,
            TransactionType::Withdrawal | TransactionType::Transfer | TransactionType::Payment
        )
    }

    /// Incoming and payment types must name a destination or recipient.
    pub fn requires_destination(&self) -> bool {
        matches!(
            self,
            TransactionType::Deposit | TransactionType::Transfer | TransactionType::Payment
        )
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Transfer => "transfer",
            TransactionType::Payment => "payment",
            TransactionType::Fee => "fee",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    /// Terminal entries are immutable except for audit annotation.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed | TransactionStatus::Failed | TransactionStatus::Cancelled
        )
    }

    /// Cancellation is only allowed before an entry is finalized.
    pub fn can_be_cancelled(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Pending | TransactionStatus::Processing
        )
    }

    /// The allowed forward transitions. `processing` is available for callers
    /// that want a multi-step settlement but nothing requires passing
    /// through it.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        match self {
            TransactionStatus::Pending => matches!(
                next,
                TransactionStatus::Processing
                    | TransactionStatus::Completed
                    | TransactionStatus::Failed
                    | TransactionStatus::Cancelled
            ),
            TransactionStatus::Processing => matches!(
                next,
                TransactionStatus::Completed
                    | TransactionStatus::Failed
                    | TransactionStatus::Cancelled
            ),
            _ => false,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Processing => "processing",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Recipient details for an international payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientDetails {
    pub account: String,
    pub name: String,
    pub bank: Option<String>,
    pub swift_code: Option<String>,
}

/// Fields for a new ledger entry. The ledger assigns the transaction ID and
/// the creation timestamp.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub r#type: TransactionType,
    pub status: TransactionStatus,
    pub from_account: Option<String>,
    pub to_account: Option<String>,
    pub amount: Amount,
    pub currency: String,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub user_id: String,
    pub recipient_name: Option<String>,
    pub recipient_bank: Option<String>,
    pub swift_code: Option<String>,
}

impl NewTransaction {
    /// Checks the type-dependent source/destination requirements and the
    /// free-text length bounds before anything is persisted.
    pub fn validate(&self) -> Result<()> {
        validate_currency(&self.currency)?;
        if self.r#type.requires_source() && self.from_account.is_none() {
            return Err(LedgerError::Validation(format!(
                "{} requires a source account",
                self.r#type
            )));
        }
        if self.r#type.requires_destination() && self.to_account.is_none() {
            return Err(LedgerError::Validation(format!(
                "{} requires a destination account",
                self.r#type
            )));
        }
        if let Some(description) = &self.description
            && description.len() > MAX_DESCRIPTION_LEN
        {
            return Err(LedgerError::Validation("description too long".to_string()));
        }
        if let Some(reference) = &self.reference
            && reference.len() > MAX_REFERENCE_LEN
        {
            return Err(LedgerError::Validation("reference too long".to_string()));
        }
        Ok(())
    }
}

/// A durable record of a money movement attempt and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub r#type: TransactionType,
    pub status: TransactionStatus,
    pub from_account: Option<String>,
    pub to_account: Option<String>,
    pub amount: Amount,
    pub currency: String,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub user_id: String,
    pub recipient_name: Option<String>,
    pub recipient_bank: Option<String>,
    pub swift_code: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn from_new(transaction_id: String, new: NewTransaction) -> Self {
        Self {
            transaction_id,
            r#type: new.r#type,
            status: new.status,
            from_account: new.from_account,
            to_account: new.to_account,
            amount: new.amount,
            currency: new.currency,
            description: new.description,
            reference: new.reference,
            user_id: new.user_id,
            recipient_name: new.recipient_name,
            recipient_bank: new.recipient_bank,
            swift_code: new.swift_code,
            processed_at: None,
            processed_by: None,
            failure_reason: None,
            created_at: Utc::now(),
        }
    }
}

/// Generates a transaction ID: `TXN` + unix millis + a 6-character random
/// suffix. The timestamp keeps IDs chronologically traceable; uniqueness is
/// enforced by the ledger's unique-key constraint, not the generator.
pub fn generate_transaction_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();
    format!("TXN{millis}{suffix}")
}
