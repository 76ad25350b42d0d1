use bankledger::application::engine::{PaymentAction, PaymentEngine, PaymentRequest};
use bankledger::domain::account::Amount;
use bankledger::domain::actor::{Actor, Role};
use bankledger::domain::ports::{AccountStoreRef, TransactionLedgerRef};
use bankledger::domain::transaction::RecipientDetails;
use bankledger::error::{LedgerError, Result as LedgerResult};
use bankledger::infrastructure::in_memory::{InMemoryAccountStore, InMemoryTransactionLedger};
#[cfg(feature = "storage-rocksdb")]
use bankledger::infrastructure::rocksdb::RocksDbStore;
use bankledger::interfaces::csv::account_writer::AccountWriter;
use bankledger::interfaces::csv::op_reader::{OpKind, OpReader, OpRow};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Replays a CSV script of ledger operations against a payment engine and
/// prints the final account states as CSV.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Replay script CSV file
    script: PathBuf,

    /// Path to a persistent database. If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[cfg(feature = "storage-rocksdb")]
fn build_stores(cli: &Cli) -> LedgerResult<(AccountStoreRef, TransactionLedgerRef)> {
    if let Some(db_path) = &cli.db_path {
        let store = RocksDbStore::open(db_path)?;
        Ok((Arc::new(store.clone()), Arc::new(store)))
    } else {
        Ok((
            Arc::new(InMemoryAccountStore::new()),
            Arc::new(InMemoryTransactionLedger::new()),
        ))
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn build_stores(_cli: &Cli) -> LedgerResult<(AccountStoreRef, TransactionLedgerRef)> {
    Ok((
        Arc::new(InMemoryAccountStore::new()),
        Arc::new(InMemoryTransactionLedger::new()),
    ))
}

fn required<T>(value: Option<T>, column: &str) -> LedgerResult<T> {
    value.ok_or_else(|| LedgerError::Validation(format!("missing {column} column")))
}

/// Applies one script row. Aliases name accounts and references name payment
/// entries, so later rows can address identifiers the stores generated.
async fn apply_op(
    engine: &PaymentEngine,
    row: OpRow,
    aliases: &mut HashMap<String, String>,
    refs: &mut HashMap<String, String>,
) -> LedgerResult<()> {
    let actor = Actor::new(row.user.clone(), row.role.unwrap_or(Role::Customer));
    match row.op {
        OpKind::Open => {
            let alias = required(row.account, "account")?;
            let account_type = required(row.account_type, "account_type")?;
            let currency = row.currency.unwrap_or_else(|| "USD".to_string());
            let opening_balance = row.amount.map(Amount::new).transpose()?;
            let account = engine
                .open_account(&actor, account_type, &currency, opening_balance)
                .await?;
            aliases.insert(alias, account.account_number);
        }
        OpKind::Deposit => {
            let alias = required(row.account, "account")?;
            let account = aliases.get(&alias).cloned().unwrap_or(alias);
            let amount = Amount::new(required(row.amount, "amount")?)?;
            engine.deposit(&actor, &account, amount, None).await?;
        }
        OpKind::Payment => {
            let alias = required(row.account, "account")?;
            let account = aliases.get(&alias).cloned().unwrap_or(alias);
            let request = PaymentRequest {
                from_account: account,
                amount: Amount::new(required(row.amount, "amount")?)?,
                currency: row.currency.unwrap_or_else(|| "USD".to_string()),
                recipient: RecipientDetails {
                    account: required(row.recipient_account, "recipient_account")?,
                    name: required(row.recipient_name, "recipient_name")?,
                    bank: row.recipient_bank,
                    swift_code: row.swift_code,
                },
                description: None,
                reference: row.reference.clone(),
            };
            let entry = engine.submit_payment(&actor, request).await?;
            if let Some(reference) = row.reference {
                refs.insert(reference, entry.transaction_id);
            }
        }
        OpKind::Cancel => {
            let reference = required(row.reference, "reference")?;
            let id = refs.get(&reference).cloned().unwrap_or(reference);
            engine.cancel_payment(&actor, &id).await?;
        }
        OpKind::Approve => {
            let reference = required(row.reference, "reference")?;
            let id = refs.get(&reference).cloned().unwrap_or(reference);
            engine
                .process_payment(&actor, &id, PaymentAction::Approve)
                .await?;
        }
        OpKind::Reject => {
            let reference = required(row.reference, "reference")?;
            let id = refs.get(&reference).cloned().unwrap_or(reference);
            let reason = row
                .reason
                .unwrap_or_else(|| "rejected by operator".to_string());
            engine
                .process_payment(&actor, &id, PaymentAction::Reject { reason })
                .await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let (accounts, ledger) = build_stores(&cli).into_diagnostic()?;
    let engine = PaymentEngine::new(accounts.clone(), ledger);

    let file = File::open(&cli.script).into_diagnostic()?;
    let reader = OpReader::new(file);

    let mut aliases = HashMap::new();
    let mut refs = HashMap::new();
    for op_result in reader.operations() {
        match op_result {
            Ok(row) => {
                if let Err(e) = apply_op(&engine, row, &mut aliases, &mut refs).await {
                    eprintln!("error applying operation: {e}");
                }
            }
            Err(e) => eprintln!("error reading operation: {e}"),
        }
    }

    let final_accounts = accounts.all().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = AccountWriter::new(stdout.lock());
    writer.write_accounts(final_accounts).into_diagnostic()?;

    Ok(())
}
