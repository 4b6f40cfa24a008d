//! The write-only report view (`§4.6`, `§9`).
//!
//! `filez/DataBase.csv` and per-account `filez/<id>.csv` mirror the primary
//! store but with a header row and human-readable, display-formatted
//! dates. Nothing in this module is ever read back; it exists purely as an
//! on-demand rendering of the canonical primary store for operators to
//! inspect with a spreadsheet.

use std::path::Path;

use crate::error::{Error, PersistenceError, Result};
use crate::store::AccountStore;

use super::{account_file, ensure_dir, report_dir};

pub fn write_report(store: &AccountStore, root: &Path) -> Result<()> {
    let dir = report_dir(root);
    ensure_dir(&dir)?;

    let db_path = dir.join("DataBase.csv");
    let mut db_writer = csv_writer(&db_path)?;
    db_writer
        .write_record([
            "account_id",
            "holder_name",
            "phone",
            "username",
            "rfid",
            "card_state",
            "balance",
            "transaction_count",
        ])
        .map_err(|e| csv_err(&db_path, e))?;

    for handle in store.all_accounts() {
        let account = handle.read();
        db_writer
            .write_record(&[
                account.account_id.to_string(),
                account.holder_name.clone(),
                account.phone.to_string(),
                account.username.clone(),
                account.rfid.clone(),
                match account.card_state {
                    crate::account::CardState::Active => "ACTIVE".to_string(),
                    crate::account::CardState::Blocked => "BLOCKED".to_string(),
                },
                format!("{:.2}", account.balance),
                account.transaction_count().to_string(),
            ])
            .map_err(|e| csv_err(&db_path, e))?;

        let txn_path = account_file(&dir, account.account_id);
        let mut txn_writer = csv_writer(&txn_path)?;
        txn_writer
            .write_record(["id", "type", "timestamp", "amount"])
            .map_err(|e| csv_err(&txn_path, e))?;
        for txn in account.history() {
            txn_writer
                .write_record(&[
                    txn.id.to_string(),
                    format!("{:?}", txn.kind).to_uppercase(),
                    txn.display_timestamp(),
                    format!("{:.2}", txn.amount),
                ])
                .map_err(|e| csv_err(&txn_path, e))?;
        }
        txn_writer.flush().map_err(|e| io_err(&txn_path, e))?;
    }

    db_writer.flush().map_err(|e| io_err(&db_path, e))?;
    Ok(())
}

fn csv_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| csv_err(path, e))
}

fn csv_err(path: &Path, source: csv::Error) -> Error {
    Error::Persistence(PersistenceError::Csv {
        path: path.display().to_string(),
        source,
    })
}

fn io_err(path: &Path, source: std::io::Error) -> Error {
    Error::Persistence(PersistenceError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::NewAccount;
    use chrono::NaiveDate;

    #[test]
    fn writes_header_and_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let store = AccountStore::new();
        store
            .create_account(
                NewAccount {
                    holder_name: "alice smith".into(),
                    phone: 9_000_000_000,
                    username: "alice".into(),
                    password: "hunter22".into(),
                    rfid: "11111111".into(),
                    pin: "1234".into(),
                    opening_balance: 1000.0,
                },
                NaiveDate::from_ymd_opt(2026, 7, 27).unwrap().and_hms_opt(10, 0, 0).unwrap(),
            )
            .unwrap();

        write_report(&store, tmp.path()).unwrap();
        let contents = std::fs::read_to_string(tmp.path().join("filez/DataBase.csv")).unwrap();
        assert!(contents.starts_with("account_id,holder_name"));
        assert!(contents.contains("Alice Smith"));
    }
}
