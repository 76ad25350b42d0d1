use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated monetary amount: strictly positive, at most two decimal places.
///
/// Syntactic validation of caller input happens upstream; this type is the
/// defensive re-check that no non-positive or sub-cent amount ever reaches a
/// balance mutation.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value <= Decimal::ZERO {
            return Err(LedgerError::Validation("amount must be positive".to_string()));
        }
        if value.round_dp(2) != value {
            return Err(LedgerError::Validation(
                "amount must have at most two decimal places".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
    Business,
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
            AccountType::Business => "business",
        };
        f.write_str(s)
    }
}

/// Request to open an account. The opening balance is caller-supplied policy;
/// `None` means the account starts empty.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user_id: String,
    pub account_type: AccountType,
    pub currency: String,
    pub opening_balance: Option<Amount>,
}

/// A customer account: the single source of truth for a balance.
///
/// The balance is only ever changed through the store's `credit`/`debit`
/// primitives and never goes negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_number: String,
    pub user_id: String,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub currency: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn open(account_number: String, new: &NewAccount) -> Self {
        Self {
            account_number,
            user_id: new.user_id.clone(),
            account_type: new.account_type,
            balance: new.opening_balance.map(|a| a.value()).unwrap_or(Decimal::ZERO),
            currency: new.currency.clone(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn has_sufficient_funds(&self, amount: Amount) -> bool {
        self.balance >= amount.value()
    }

    /// Adds funds. Balances have no upper bound.
    pub fn credit(&mut self, amount: Amount) {
        self.balance += amount.value();
    }

    /// Removes funds if the account is active and the balance covers the
    /// amount. Callers must hold the store's write access so the check and
    /// the mutation are indivisible.
    pub fn debit(&mut self, amount: Amount) -> Result<()> {
        if !self.is_active {
            return Err(LedgerError::AccountNotFound(self.account_number.clone()));
        }
        if !self.has_sufficient_funds(amount) {
            return Err(LedgerError::InsufficientFunds(self.account_number.clone()));
        }
        self.balance -= amount.value();
        Ok(())
    }

    /// Soft delete. Accounts are never removed while they still hold funds.
    pub fn deactivate(&mut self) -> Result<()> {
        if self.balance > Decimal::ZERO {
            return Err(LedgerError::NonZeroBalance(self.account_number.clone()));
        }
        self.is_active = false;
        Ok(())
    }
}

/// Generates a 10-digit account number. Uniqueness is enforced by the store,
/// not the generator.
pub fn generate_account_number() -> String {
    let mut rng = rand::thread_rng();
    (0..10).map(|_| char::from(b'0' + rng.gen_range(0..10u8))).collect()
}
