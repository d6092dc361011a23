//! Error taxonomy for the stock ledger
use super::timestamp::TimeStamp;
use chrono::Utc;

/// Field-level input failures. Recovered locally and shown next to the field.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a book.")]
    BookNotSelected,
    #[error("Quantity must be a positive number.")]
    NonPositiveQuantity,
    #[error("Quantity must be a whole number of units.")]
    FractionalQuantity,
    #[error("Quantity is too large.")]
    QuantityTooLarge,
    #[error("Amount must be a positive number.")]
    NonPositiveAmount,
    #[error("Please select a date.")]
    MissingDate,
    #[error("Date must be in YYYY-MM-DD format.")]
    InvalidDate,
    #[error("Please enter a valid time (HH:MM).")]
    InvalidTime,
    #[error("Please select a payment mode.")]
    InvalidPaymentMode,
    #[error("Book name must be at least 3 characters long.")]
    BookNameTooShort,
    #[error("Please select a language from the list.")]
    LanguageNotSelected,
    #[error("Please specify the language (at least 2 characters).")]
    OtherLanguageTooShort,
}

impl ValidationError {
    /// Name of the form field the error belongs to
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::BookNotSelected => "bookId",
            ValidationError::NonPositiveQuantity
            | ValidationError::FractionalQuantity
            | ValidationError::QuantityTooLarge => "qty",
            ValidationError::NonPositiveAmount => "amount",
            ValidationError::MissingDate | ValidationError::InvalidDate => "date",
            ValidationError::InvalidTime => "time",
            ValidationError::InvalidPaymentMode => "paymentMode",
            ValidationError::BookNameTooShort => "bookName",
            ValidationError::LanguageNotSelected => "language",
            ValidationError::OtherLanguageTooShort => "otherLanguage",
        }
    }
}

/// Failures of the backing store or its configuration.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("failed to encode record: {0}")]
    Encode(String),
    #[error("failed to decode record: {0}")]
    Decode(#[from] minicbor::decode::Error),
    #[error("{table} already contains key {key}")]
    DuplicateKey { table: &'static str, key: String },
    #[error("book {book_id} changed since it was read (expected version {expected}, found {found:?})")]
    VersionConflict {
        book_id: String,
        expected: u64,
        found: Option<u64>,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sheet row {row}: {reason}")]
    Sheet { row: usize, reason: String },
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(thiserror::Error, Debug)]
pub enum StockError {
    #[error("{}: {}", .0.field(), .0)]
    Validation(#[from] ValidationError),
    #[error("Selected book not found in stock master.")]
    BookNotFound(String),
    #[error("Book with ID {0} already exists.")]
    DuplicateBookId(String),
    #[error("Cannot sell {requested} units. Only {available} available.")]
    InsufficientStock { requested: u64, available: u64 },
    #[error("Cannot sell a book that has never been purchased.")]
    NoPriorPurchase,
    #[error("Sale date/time cannot be before the first purchase date/time of {first_purchase}.")]
    BackdatedSale { first_purchase: String },
    #[error("Quantity for {0} would exceed what the stock master can hold.")]
    QuantityOverflow(String),
    #[error("Stock for {0} changed while the transaction was being recorded. Please resubmit.")]
    ConcurrentModification(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse classification used when reporting an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    BusinessRule,
    BackingStore,
}

impl StockError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StockError::Validation(_) => ErrorKind::Validation,
            StockError::Store(_) => ErrorKind::BackingStore,
            _ => ErrorKind::BusinessRule,
        }
    }

    pub(crate) fn backdated(first_purchase: &TimeStamp<Utc>, zone: &chrono::FixedOffset) -> Self {
        StockError::BackdatedSale {
            first_purchase: first_purchase.format_civil(zone),
        }
    }
}
