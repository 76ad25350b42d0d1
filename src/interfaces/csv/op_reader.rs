use crate::domain::account::AccountType;
use crate::domain::actor::Role;
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// Operation kinds the replay driver understands.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Open,
    Deposit,
    Payment,
    Cancel,
    Approve,
    Reject,
}

/// One row of a replay script.
///
/// `account` names an account by the alias the script chose at `open` time;
/// `reference` addresses a payment entry in later `cancel`/`approve`/`reject`
/// rows. The driver maps both onto the generated identifiers.
#[derive(Debug, Deserialize, Clone)]
pub struct OpRow {
    pub op: OpKind,
    pub user: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub account_type: Option<AccountType>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default)]
    pub recipient_account: Option<String>,
    #[serde(default)]
    pub recipient_bank: Option<String>,
    #[serde(default)]
    pub swift_code: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Reads replay operations from a CSV source, trimming whitespace and
/// yielding one `Result<OpRow>` per record.
pub struct OpReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OpReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn operations(self) -> impl Iterator<Item = Result<OpRow>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}
