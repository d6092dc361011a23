//! Service layer API for stock and ledger operations
use super::book::{BookMaster, Posting};
use super::error::{ErrorKind, StockError, StoreError};
use super::ledger::{self, LedgerEntry, TransactionType, TypeLogEntry};
use super::report::{DashboardTotals, LowStockReport};
use super::sheet;
use super::store::StockStore;
use super::transaction::{AddBookForm, TransactionForm};
use super::utils;
use chrono::FixedOffset;
use std::io::{Read, Write};
use tracing::{error, info, instrument, warn};

/// Message shown for any backing store failure; details go to the log.
pub const GENERIC_FAILURE: &str = "An unexpected error occurred. Please try again.";

/// What a form submission reports back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
}

impl ActionOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    fn from_error(action: &str, err: &StockError) -> Self {
        match err.kind() {
            ErrorKind::BackingStore => {
                error!(action, error = %err, "backing store failure");
                Self::failed(GENERIC_FAILURE)
            }
            ErrorKind::Validation | ErrorKind::BusinessRule => {
                warn!(action, error = %err, "rejected");
                Self::failed(err.to_string())
            }
        }
    }
}

/// Counts of rows loaded by an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,  // id already present
    pub rejected: usize, // row could not be read
}

pub struct StockService<S: StockStore> {
    store: S,
    zone: FixedOffset, // civil timezone for all dates
}

impl<S: StockStore> StockService<S> {
    pub fn new(store: S, zone: FixedOffset) -> Self {
        Self { store, zone }
    }

    pub fn zone(&self) -> &FixedOffset {
        &self.zone
    }

    /// Validate and insert a new book with every accumulator at zero
    #[instrument(skip(self, form))]
    pub fn add_book(&self, form: &AddBookForm) -> Result<BookMaster, StockError> {
        let new_book = form.validate_and_finalise()?;

        if self.store.read_book(&new_book.id)?.is_some() {
            return Err(StockError::DuplicateBookId(new_book.id));
        }

        let book = new_book.into_book_master();
        // the store refuses duplicates too, in case another writer got there first
        match self.store.insert_book(&book) {
            Ok(()) => {}
            Err(StoreError::DuplicateKey { key, .. }) => {
                return Err(StockError::DuplicateBookId(key));
            }
            Err(e) => return Err(e.into()),
        }

        info!(book_id = %book.id, language = %book.language, "added book");
        Ok(book)
    }

    /// Remove a book from the stock master. Its ledger history is kept.
    #[instrument(skip(self))]
    pub fn delete_book(&self, book_id: &str) -> Result<BookMaster, StockError> {
        let removed = self
            .store
            .delete_book(book_id)?
            .ok_or_else(|| StockError::BookNotFound(book_id.to_string()))?;

        info!(book_id = %removed.id, "deleted book");
        Ok(removed)
    }

    #[instrument(skip(self, form), fields(book_id = form.book_id()))]
    pub fn record_purchase(&self, form: &TransactionForm) -> Result<Posting, StockError> {
        self.record(form, TransactionType::Purchase)
    }

    #[instrument(skip(self, form), fields(book_id = form.book_id()))]
    pub fn record_sale(&self, form: &TransactionForm) -> Result<Posting, StockError> {
        self.record(form, TransactionType::Sale)
    }

    // validate -> compute -> one atomic commit guarded by the book version
    fn record(&self, form: &TransactionForm, kind: TransactionType) -> Result<Posting, StockError> {
        let txn = form.validate_and_finalise(kind, &self.zone)?;

        let book = self
            .store
            .read_book(&txn.book_id)?
            .ok_or_else(|| StockError::BookNotFound(txn.book_id.clone()))?;

        if kind == TransactionType::Sale {
            let history = self.store.read_all_ledger_entries()?;
            txn.check_sale(&book, &history, &self.zone)?;
        }

        let txn_id = utils::new_transaction_id()
            .map_err(|e| StoreError::Encode(format!("transaction id: {e}")))?;
        let posting = book.apply(&txn, txn_id)?;

        match self.store.commit_posting(&posting, book.version) {
            Ok(()) => {}
            Err(StoreError::VersionConflict { book_id, .. }) => {
                warn!(book_id = %book_id, "book changed between read and commit");
                return Err(StockError::ConcurrentModification(book_id));
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            txn_id = %posting.entry.id,
            kind = %kind,
            qty = txn.qty,
            amount = txn.amount,
            balance = posting.entry.balance,
            "recorded transaction"
        );
        Ok(posting)
    }

    pub fn stock_master(&self) -> Result<Vec<BookMaster>, StockError> {
        Ok(self.store.read_all_books()?)
    }

    /// Every ledger entry, newest first
    pub fn ledger(&self) -> Result<Vec<LedgerEntry>, StockError> {
        let mut entries = self.store.read_all_ledger_entries()?;
        ledger::sort_newest_first(&mut entries);
        Ok(entries)
    }

    /// Purchases or Sales log, newest first
    pub fn type_log(&self, kind: TransactionType) -> Result<Vec<TypeLogEntry>, StockError> {
        let mut entries = self.store.read_type_log(kind)?;
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }

    pub fn dashboard(&self) -> Result<DashboardTotals, StockError> {
        Ok(DashboardTotals::from_books(&self.store.read_all_books()?))
    }

    pub fn low_stock(&self) -> Result<LowStockReport, StockError> {
        Ok(LowStockReport::from_books(&self.store.read_all_books()?))
    }

    pub fn submit_add_book(&self, form: &AddBookForm) -> ActionOutcome {
        match self.add_book(form) {
            Ok(book) => ActionOutcome::ok(format!("Successfully added book: {}", book.book_name)),
            Err(e) => ActionOutcome::from_error("add_book", &e),
        }
    }

    pub fn submit_delete_book(&self, book_id: &str) -> ActionOutcome {
        match self.delete_book(book_id) {
            Ok(book) => ActionOutcome::ok(format!("Successfully deleted book: {}", book.book_name)),
            Err(e) => ActionOutcome::from_error("delete_book", &e),
        }
    }

    pub fn submit_purchase(&self, form: &TransactionForm) -> ActionOutcome {
        match self.record_purchase(form) {
            Ok(posting) => ActionOutcome::ok(format!(
                "Successfully recorded purchase of {} units of {}.",
                posting.entry.qty, posting.book.book_name
            )),
            Err(e) => ActionOutcome::from_error("purchase", &e),
        }
    }

    pub fn submit_sale(&self, form: &TransactionForm) -> ActionOutcome {
        match self.record_sale(form) {
            Ok(posting) => ActionOutcome::ok(format!(
                "Successfully recorded sale of {} units of {}.",
                posting.entry.qty, posting.book.book_name
            )),
            Err(e) => ActionOutcome::from_error("sale", &e),
        }
    }

    /// Seed the stock master from a sheet export. Ids already present are skipped.
    pub fn import_stock_master<R: Read>(&self, reader: R) -> Result<ImportSummary, StockError> {
        let mut summary = ImportSummary::default();
        for book in sheet::read_stock_master(reader)? {
            match self.store.insert_book(&book) {
                Ok(()) => summary.imported += 1,
                Err(StoreError::DuplicateKey { key, .. }) => {
                    warn!(book_id = %key, "book already present, skipping");
                    summary.skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
        info!(imported = summary.imported, skipped = summary.skipped, "imported stock master");
        Ok(summary)
    }

    /// Seed ledger history from a sheet export. Ids already present are
    /// skipped and unreadable rows are counted as rejected.
    pub fn import_ledger<R: Read>(&self, reader: R) -> Result<ImportSummary, StockError> {
        let rows = sheet::read_ledger(reader, &self.zone)?;
        let mut summary = ImportSummary {
            rejected: rows.rejected.len(),
            ..ImportSummary::default()
        };
        for err in &rows.rejected {
            warn!(error = %err, "unreadable ledger row, skipping");
        }

        for entry in &rows.entries {
            match self.store.append_entry(entry) {
                Ok(()) => summary.imported += 1,
                Err(StoreError::DuplicateKey { key, .. }) => {
                    warn!(txn_id = %key, "ledger entry already present, skipping");
                    summary.skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
        info!(
            imported = summary.imported,
            skipped = summary.skipped,
            rejected = summary.rejected,
            "imported ledger"
        );
        Ok(summary)
    }

    pub fn export_stock_master<W: Write>(&self, writer: W) -> Result<(), StockError> {
        let rows = self.stock_master()?.iter().map(sheet::book_to_row).collect::<Vec<_>>();
        Ok(sheet::write_table(writer, &sheet::STOCK_MASTER_HEADERS, rows)?)
    }

    pub fn export_ledger<W: Write>(&self, writer: W) -> Result<(), StockError> {
        let rows = self
            .ledger()?
            .iter()
            .map(|e| sheet::ledger_to_row(e, &self.zone))
            .collect::<Vec<_>>();
        Ok(sheet::write_table(writer, &sheet::LEDGER_HEADERS, rows)?)
    }

    pub fn export_type_log<W: Write>(
        &self,
        writer: W,
        kind: TransactionType,
    ) -> Result<(), StockError> {
        let rows = self
            .type_log(kind)?
            .iter()
            .map(|e| sheet::type_log_to_row(e, &self.zone))
            .collect::<Vec<_>>();
        Ok(sheet::write_table(writer, &sheet::TYPE_LOG_HEADERS, rows)?)
    }
}
