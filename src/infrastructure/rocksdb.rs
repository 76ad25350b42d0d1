use crate::domain::account::{Account, Amount, NewAccount, generate_account_number};
use crate::domain::ports::{AccountStore, Page, PageOf, TransactionFilter, TransactionLedger};
use crate::domain::transaction::{
    NewTransaction, TransactionRecord, TransactionStatus, generate_transaction_id,
};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column family for account states.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column family for ledger entries.
pub const CF_TRANSACTIONS: &str = "transactions";

const MAX_ID_ATTEMPTS: usize = 16;

/// A persistent store backed by RocksDB, implementing both the account store
/// and the transaction ledger over separate column families.
///
/// RocksDB has no conditional update, so every read-modify-write (balance
/// mutations, status transitions, ID assignment) is serialized behind one
/// async mutex. `Clone` shares the underlying handle and the mutex.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    write_gate: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates a database at `path` with the required column
    /// families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_accounts = ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default());
        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_accounts, cf_transactions])?;
        Ok(Self {
            db: Arc::new(db),
            write_gate: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| LedgerError::Internal(format!("column family {name} not found").into()))
    }

    fn read_account(&self, account_number: &str) -> Result<Option<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        match self.db.get_cf(cf, account_number.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_account(&self, account: &Account) -> Result<()> {
        let cf = self.cf(CF_ACCOUNTS)?;
        self.db
            .put_cf(cf, account.account_number.as_bytes(), serde_json::to_vec(account)?)?;
        Ok(())
    }

    fn read_transaction(&self, transaction_id: &str) -> Result<Option<TransactionRecord>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        match self.db.get_cf(cf, transaction_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_transaction(&self, record: &TransactionRecord) -> Result<()> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        self.db.put_cf(
            cf,
            record.transaction_id.as_bytes(),
            serde_json::to_vec(record)?,
        )?;
        Ok(())
    }

    fn scan_accounts(&self) -> Result<Vec<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        let mut accounts = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            accounts.push(serde_json::from_slice(&value)?);
        }
        Ok(accounts)
    }

    fn scan_transactions(&self) -> Result<Vec<TransactionRecord>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        let mut transactions = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            transactions.push(serde_json::from_slice(&value)?);
        }
        Ok(transactions)
    }
}

#[async_trait]
impl AccountStore for RocksDbStore {
    async fn create(&self, new: NewAccount) -> Result<Account> {
        let _gate = self.write_gate.lock().await;
        for _ in 0..MAX_ID_ATTEMPTS {
            let number = generate_account_number();
            if self.read_account(&number)?.is_none() {
                let account = Account::open(number, &new);
                self.write_account(&account)?;
                return Ok(account);
            }
        }
        Err(LedgerError::Internal(
            "could not assign a unique account number".into(),
        ))
    }

    async fn get(&self, account_number: &str) -> Result<Option<Account>> {
        self.read_account(account_number)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Account>> {
        let mut owned: Vec<Account> = self
            .scan_accounts()?
            .into_iter()
            .filter(|a| a.user_id == user_id && a.is_active)
            .collect();
        owned.sort_by(|a, b| a.account_number.cmp(&b.account_number));
        Ok(owned)
    }

    async fn all(&self) -> Result<Vec<Account>> {
        let mut all = self.scan_accounts()?;
        all.sort_by(|a, b| a.account_number.cmp(&b.account_number));
        Ok(all)
    }

    async fn credit(&self, account_number: &str, amount: Amount) -> Result<Account> {
        let _gate = self.write_gate.lock().await;
        let mut account = self
            .read_account(account_number)?
            .ok_or_else(|| LedgerError::AccountNotFound(account_number.to_string()))?;
        account.credit(amount);
        self.write_account(&account)?;
        Ok(account)
    }

    async fn debit(&self, account_number: &str, amount: Amount) -> Result<Account> {
        let _gate = self.write_gate.lock().await;
        let mut account = self
            .read_account(account_number)?
            .ok_or_else(|| LedgerError::AccountNotFound(account_number.to_string()))?;
        account.debit(amount)?;
        self.write_account(&account)?;
        Ok(account)
    }

    async fn deactivate(&self, account_number: &str) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        let mut account = self
            .read_account(account_number)?
            .ok_or_else(|| LedgerError::AccountNotFound(account_number.to_string()))?;
        account.deactivate()?;
        self.write_account(&account)
    }
}

#[async_trait]
impl TransactionLedger for RocksDbStore {
    async fn create(&self, new: NewTransaction) -> Result<TransactionRecord> {
        new.validate()?;
        let _gate = self.write_gate.lock().await;
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = generate_transaction_id();
            if self.read_transaction(&id)?.is_none() {
                let record = TransactionRecord::from_new(id, new);
                self.write_transaction(&record)?;
                return Ok(record);
            }
        }
        Err(LedgerError::Internal(
            "could not assign a unique transaction id".into(),
        ))
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<TransactionRecord>> {
        self.read_transaction(transaction_id)
    }

    async fn transition(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
        processed_by: Option<&str>,
        failure_reason: Option<&str>,
    ) -> Result<TransactionRecord> {
        let _gate = self.write_gate.lock().await;
        let mut record = self
            .read_transaction(transaction_id)?
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))?;
        if !record.status.can_transition_to(status) {
            return Err(LedgerError::InvalidTransition {
                id: record.transaction_id,
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
        self.write_transaction(&record)?;
        Ok(record)
    }

    async fn find(
        &self,
        filter: &TransactionFilter,
        page: Page,
    ) -> Result<PageOf<TransactionRecord>> {
        let mut matching: Vec<TransactionRecord> = self
            .scan_transactions()?
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect();
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
