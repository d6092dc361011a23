//! Ledger entries and the per-type purchase/sale logs
use super::timestamp::TimeStamp;
use chrono::Utc;
use std::{fmt, str::FromStr};

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, Ord, PartialEq, PartialOrd)]
pub enum TransactionType {
    #[n(0)]
    Purchase,
    #[n(1)]
    Sale,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, Ord, PartialEq, PartialOrd)]
pub enum PaymentMode {
    #[n(0)]
    Online,
    #[n(1)]
    Offline,
}

/// One row of the chronological ledger. Never updated once written.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    #[n(0)]
    pub id: String, // bech32 encoded uuid7
    #[n(1)]
    pub date: TimeStamp<Utc>,
    #[n(2)]
    pub book_id: String,
    #[n(3)]
    pub book_name: String,
    #[n(4)]
    pub transaction_type: TransactionType,
    #[n(5)]
    pub qty: u64,
    #[n(6)]
    pub amount: f64,
    #[n(7)]
    pub payment_mode: PaymentMode,
    #[n(8)]
    pub bill_no: Option<String>,
    #[n(9)]
    pub balance: u64, // closing qty right after this entry
    #[n(10)]
    pub remarks: Option<String>,
}

/// Row of the Purchases or Sales log: a ledger entry without type and balance.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct TypeLogEntry {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub date: TimeStamp<Utc>,
    #[n(2)]
    pub book_id: String,
    #[n(3)]
    pub book_name: String,
    #[n(4)]
    pub qty: u64,
    #[n(5)]
    pub amount: f64,
    #[n(6)]
    pub payment_mode: PaymentMode,
    #[n(7)]
    pub bill_no: Option<String>,
    #[n(8)]
    pub remarks: Option<String>,
}

impl From<&LedgerEntry> for TypeLogEntry {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id.clone(),
            date: entry.date.clone(),
            book_id: entry.book_id.clone(),
            book_name: entry.book_name.clone(),
            qty: entry.qty,
            amount: entry.amount,
            payment_mode: entry.payment_mode,
            bill_no: entry.bill_no.clone(),
            remarks: entry.remarks.clone(),
        }
    }
}

/// Earliest purchase of `book_id` in `entries`, if it was ever purchased
pub fn first_purchase<'a>(entries: &'a [LedgerEntry], book_id: &str) -> Option<&'a LedgerEntry> {
    entries
        .iter()
        .filter(|e| e.book_id == book_id && e.transaction_type == TransactionType::Purchase)
        .min_by(|a, b| a.date.cmp(&b.date))
}

/// Sort newest first. Entries sharing a date keep their relative order.
pub fn sort_newest_first(entries: &mut [LedgerEntry]) {
    entries.sort_by(|a, b| b.date.cmp(&a.date));
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Purchase => f.write_str("Purchase"),
            TransactionType::Sale => f.write_str("Sale"),
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Purchase" => Ok(TransactionType::Purchase),
            "Sale" => Ok(TransactionType::Sale),
            other => Err(format!("unknown transaction type {other:?}")),
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMode::Online => f.write_str("Online"),
            PaymentMode::Offline => f.write_str("Offline"),
        }
    }
}

// exact match only, "online" is not a payment mode
impl FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Online" => Ok(PaymentMode::Online),
            "Offline" => Ok(PaymentMode::Offline),
            other => Err(format!("unknown payment mode {other:?}")),
        }
    }
}
