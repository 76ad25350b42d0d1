use crate::domain::account::Account;
use crate::error::Result;
use std::io::Write;

/// Writes final account states as CSV, one row per account.
pub struct AccountWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AccountWriter<W> {
    pub fn new(dest: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(dest),
        }
    }

    pub fn write_accounts(&mut self, accounts: Vec<Account>) -> Result<()> {
        self.writer
            .write_record(["account", "user", "type", "balance", "currency", "active"])?;
        for account in accounts {
            self.writer.write_record([
                account.account_number.as_str(),
                account.user_id.as_str(),
                &account.account_type.to_string(),
                &account.balance.to_string(),
                account.currency.as_str(),
                &account.is_active.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
