//! Durable storage of the stock master, ledger and type logs
use super::book::{BookMaster, Posting};
use super::error::StoreError;
use super::ledger::{LedgerEntry, TransactionType, TypeLogEntry};
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub const STOCK_MASTER_TREE: &str = "stock_master";
pub const LEDGER_TREE: &str = "ledger";
pub const PURCHASES_TREE: &str = "purchases";
pub const SALES_TREE: &str = "sales";

/// Row store keyed by logical id: book id for the stock master, transaction
/// id for the ledger and the type logs.
///
/// Ledger and type logs are append-only; there is no way to change or
/// remove an entry once written.
pub trait StockStore {
    fn read_all_books(&self) -> Result<Vec<BookMaster>, StoreError>;

    fn read_book(&self, book_id: &str) -> Result<Option<BookMaster>, StoreError>;

    fn read_all_ledger_entries(&self) -> Result<Vec<LedgerEntry>, StoreError>;

    fn read_type_log(&self, kind: TransactionType) -> Result<Vec<TypeLogEntry>, StoreError>;

    /// Fails with `DuplicateKey` if a book with the same id exists.
    fn insert_book(&self, book: &BookMaster) -> Result<(), StoreError>;

    /// Removes the stock master row only; ledger history stays.
    fn delete_book(&self, book_id: &str) -> Result<Option<BookMaster>, StoreError>;

    /// Append a ledger entry and its type log row without touching the stock
    /// master. Used when seeding history from a sheet export.
    fn append_entry(&self, entry: &LedgerEntry) -> Result<(), StoreError>;

    /// Write the updated book, the ledger entry and the type log row as one
    /// unit. Fails with `VersionConflict` unless the stored book still has
    /// `expected_version`.
    fn commit_posting(&self, posting: &Posting, expected_version: u64) -> Result<(), StoreError>;
}

pub struct SledStore {
    instance: Arc<sled::Db>,
    books: sled::Tree,
    ledger: sled::Tree,
    purchases: sled::Tree,
    sales: sled::Tree,
}

impl SledStore {
    pub fn new(instance: Arc<sled::Db>) -> Result<Self, StoreError> {
        Ok(Self {
            books: instance.open_tree(STOCK_MASTER_TREE)?,
            ledger: instance.open_tree(LEDGER_TREE)?,
            purchases: instance.open_tree(PURCHASES_TREE)?,
            sales: instance.open_tree(SALES_TREE)?,
            instance,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening stock store");
        Self::new(Arc::new(sled::open(path)?))
    }

    fn type_log(&self, kind: TransactionType) -> &sled::Tree {
        match kind {
            TransactionType::Purchase => &self.purchases,
            TransactionType::Sale => &self.sales,
        }
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.instance.flush()?;
        Ok(())
    }
}

fn encode<T: minicbor::Encode<()>>(value: &T) -> Result<Vec<u8>, StoreError> {
    minicbor::to_vec(value).map_err(|e| StoreError::Encode(e.to_string()))
}

fn decode_all<T>(tree: &sled::Tree) -> Result<Vec<T>, StoreError>
where
    T: for<'b> minicbor::Decode<'b, ()>,
{
    let mut rows = Vec::new();
    for item in tree.iter() {
        let (_, value) = item?;
        rows.push(minicbor::decode(&value)?);
    }
    Ok(rows)
}

fn unwrap_transaction<T>(result: Result<T, TransactionError<StoreError>>) -> Result<T, StoreError> {
    match result {
        Ok(value) => Ok(value),
        Err(TransactionError::Abort(err)) => Err(err),
        Err(TransactionError::Storage(err)) => Err(err.into()),
    }
}

impl StockStore for SledStore {
    fn read_all_books(&self) -> Result<Vec<BookMaster>, StoreError> {
        decode_all(&self.books)
    }

    fn read_book(&self, book_id: &str) -> Result<Option<BookMaster>, StoreError> {
        match self.books.get(book_id.as_bytes())? {
            Some(value) => Ok(Some(minicbor::decode(&value)?)),
            None => Ok(None),
        }
    }

    fn read_all_ledger_entries(&self) -> Result<Vec<LedgerEntry>, StoreError> {
        decode_all(&self.ledger)
    }

    fn read_type_log(&self, kind: TransactionType) -> Result<Vec<TypeLogEntry>, StoreError> {
        decode_all(self.type_log(kind))
    }

    fn insert_book(&self, book: &BookMaster) -> Result<(), StoreError> {
        let value = encode(book)?;
        let swapped = self
            .books
            .compare_and_swap(book.id.as_bytes(), None as Option<&[u8]>, Some(value))?;

        if swapped.is_err() {
            return Err(StoreError::DuplicateKey {
                table: STOCK_MASTER_TREE,
                key: book.id.clone(),
            });
        }

        debug!(book_id = %book.id, "inserted book");
        self.flush()
    }

    fn delete_book(&self, book_id: &str) -> Result<Option<BookMaster>, StoreError> {
        let removed = match self.books.remove(book_id.as_bytes())? {
            Some(value) => Some(minicbor::decode(&value)?),
            None => None,
        };
        self.flush()?;
        Ok(removed)
    }

    fn append_entry(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        let entry_cbor = encode(entry)?;
        let log_cbor = encode(&TypeLogEntry::from(entry))?;
        let key = entry.id.as_bytes();

        let trees = (&self.ledger, self.type_log(entry.transaction_type));
        let result: Result<(), TransactionError<StoreError>> = trees.transaction(|(ledger, log)| {
            if ledger.get(key)?.is_some() {
                return Err(ConflictableTransactionError::Abort(StoreError::DuplicateKey {
                    table: LEDGER_TREE,
                    key: entry.id.clone(),
                }));
            }
            ledger.insert(key, entry_cbor.as_slice())?;
            log.insert(key, log_cbor.as_slice())?;
            Ok(())
        });
        unwrap_transaction(result)?;

        debug!(txn_id = %entry.id, book_id = %entry.book_id, "appended ledger entry");
        self.flush()
    }

    fn commit_posting(&self, posting: &Posting, expected_version: u64) -> Result<(), StoreError> {
        let Posting { book, entry } = posting;
        let book_cbor = encode(book)?;
        let entry_cbor = encode(entry)?;
        let log_cbor = encode(&TypeLogEntry::from(entry))?;
        let book_key = book.id.as_bytes();
        let entry_key = entry.id.as_bytes();

        let trees = (
            &self.books,
            &self.ledger,
            self.type_log(entry.transaction_type),
        );
        let result: Result<(), TransactionError<StoreError>> =
            trees.transaction(|(books, ledger, log)| {
                let found = match books.get(book_key)? {
                    Some(value) => {
                        let stored: BookMaster = match minicbor::decode(&value) {
                            Ok(stored) => stored,
                            Err(e) => return Err(ConflictableTransactionError::Abort(e.into())),
                        };
                        Some(stored.version)
                    }
                    None => None,
                };
                if found != Some(expected_version) {
                    return Err(ConflictableTransactionError::Abort(
                        StoreError::VersionConflict {
                            book_id: book.id.clone(),
                            expected: expected_version,
                            found,
                        },
                    ));
                }
                if ledger.get(entry_key)?.is_some() {
                    return Err(ConflictableTransactionError::Abort(StoreError::DuplicateKey {
                        table: LEDGER_TREE,
                        key: entry.id.clone(),
                    }));
                }

                books.insert(book_key, book_cbor.as_slice())?;
                ledger.insert(entry_key, entry_cbor.as_slice())?;
                log.insert(entry_key, log_cbor.as_slice())?;
                Ok(())
            });
        unwrap_transaction(result)?;

        info!(
            txn_id = %entry.id,
            book_id = %book.id,
            kind = %entry.transaction_type,
            version = book.version,
            "committed posting"
        );
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::PaymentMode;
    use crate::timestamp::TimeStamp;
    use tempfile::tempdir;

    fn entry(id: &str, kind: TransactionType, balance: u64) -> LedgerEntry {
        LedgerEntry {
            id: id.into(),
            date: TimeStamp::new_with(2024, 1, 1, 0, 0, 0),
            book_id: "ENG-DUNE".into(),
            book_name: "Dune".into(),
            transaction_type: kind,
            qty: 2,
            amount: 200.0,
            payment_mode: PaymentMode::Offline,
            bill_no: None,
            balance,
            remarks: None,
        }
    }

    #[test]
    fn insert_book_refuses_duplicates() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = SledStore::open(dir.path().join("books.db"))?;
        let book = BookMaster::new("ENG-DUNE".into(), "Dune".into(), "English".into());

        store.insert_book(&book)?;
        let err = store.insert_book(&book).unwrap_err();

        assert!(matches!(err, StoreError::DuplicateKey { .. }));
        assert_eq!(store.read_all_books()?, vec![book]);
        Ok(())
    }

    #[test]
    fn commit_checks_version() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = SledStore::open(dir.path().join("version.db"))?;
        let book = BookMaster::new("ENG-DUNE".into(), "Dune".into(), "English".into());
        store.insert_book(&book)?;

        let mut updated = book.clone();
        updated.version = 1;
        let posting = Posting {
            book: updated,
            entry: entry("txn-a", TransactionType::Purchase, 2),
        };

        let stale = store.commit_posting(&posting, 7).unwrap_err();
        assert!(matches!(
            stale,
            StoreError::VersionConflict {
                expected: 7,
                found: Some(0),
                ..
            }
        ));
        assert!(store.read_all_ledger_entries()?.is_empty());

        store.commit_posting(&posting, 0)?;
        assert_eq!(store.read_book("ENG-DUNE")?.map(|b| b.version), Some(1));
        assert_eq!(store.read_all_ledger_entries()?.len(), 1);
        assert_eq!(store.read_type_log(TransactionType::Purchase)?.len(), 1);
        assert!(store.read_type_log(TransactionType::Sale)?.is_empty());
        Ok(())
    }

    #[test]
    fn ledger_is_append_only() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = SledStore::open(dir.path().join("append.db"))?;

        store.append_entry(&entry("txn-a", TransactionType::Sale, 0))?;
        let again = store.append_entry(&entry("txn-a", TransactionType::Sale, 99));

        assert!(matches!(again, Err(StoreError::DuplicateKey { .. })));
        let entries = store.read_all_ledger_entries()?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].balance, 0);
        Ok(())
    }

    #[test]
    fn deleting_book_keeps_history() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = SledStore::open(dir.path().join("delete.db"))?;
        let book = BookMaster::new("ENG-DUNE".into(), "Dune".into(), "English".into());
        store.insert_book(&book)?;
        store.append_entry(&entry("txn-a", TransactionType::Purchase, 2))?;

        let removed = store.delete_book("ENG-DUNE")?;

        assert_eq!(removed, Some(book));
        assert!(store.read_book("ENG-DUNE")?.is_none());
        assert_eq!(store.read_all_ledger_entries()?.len(), 1);
        assert_eq!(store.delete_book("ENG-DUNE")?, None);
        Ok(())
    }
}
