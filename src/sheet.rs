//! Spreadsheet row layout of the stock tables
//!
//! Each table is a header row followed by data rows, one logical field per
//! column in a fixed left-to-right order. Numeric cells are coerced to floats
//! and fall back to 0 when blank or unparseable. Tables travel as CSV so an
//! existing sheet export can seed the store, and the store can be exported
//! back into the same layout.
use super::book::BookMaster;
use super::error::StoreError;
use super::ledger::{LedgerEntry, PaymentMode, TypeLogEntry};
use super::timestamp::TimeStamp;
use chrono::FixedOffset;
use std::io::{Read, Write};

pub const STOCK_MASTER_HEADERS: [&str; 10] = [
    "id",
    "book_name",
    "language",
    "purchase_qty",
    "purchase_amt",
    "sales_qty",
    "sales_amt",
    "closing_qty",
    "closing_price",
    "profit",
];

pub const LEDGER_HEADERS: [&str; 11] = [
    "id",
    "date",
    "book_id",
    "book_name",
    "transaction_type",
    "qty",
    "amount",
    "payment_mode",
    "bill_no",
    "balance",
    "remarks",
];

/// Shared by the Purchases and Sales sheets
pub const TYPE_LOG_HEADERS: [&str; 9] = [
    "id",
    "date",
    "book_id",
    "book_name",
    "qty",
    "amount",
    "payment_mode",
    "bill_no",
    "remarks",
];

// sheet row number of the first data row
const FIRST_DATA_ROW: usize = 2;

pub fn coerce_f64(cell: &str) -> f64 {
    match cell.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Quantities are whole units; negatives clamp to zero. Plain integers are
/// read exactly.
pub fn coerce_qty(cell: &str) -> u64 {
    match cell.trim().parse::<u64>() {
        Ok(qty) => qty,
        Err(_) => coerce_f64(cell).max(0.0).round() as u64,
    }
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

fn optional(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

pub fn book_to_row(book: &BookMaster) -> Vec<String> {
    vec![
        book.id.clone(),
        book.book_name.clone(),
        book.language.clone(),
        book.purchase_qty.to_string(),
        book.purchase_amt.to_string(),
        book.sales_qty.to_string(),
        book.sales_amt.to_string(),
        book.closing_qty.to_string(),
        format!("{:.2}", book.closing_price),
        book.profit.to_string(),
    ]
}

/// Rows without an id are empty sheet rows and yield `None`.
///
/// The closing price cell is display-rounded, so the price is recomputed from
/// the purchase totals instead of being read back.
pub fn book_from_row(row: &[String]) -> Option<BookMaster> {
    let id = optional(cell(row, 0))?;
    let mut book = BookMaster {
        id,
        book_name: cell(row, 1).trim().to_string(),
        language: cell(row, 2).trim().to_string(),
        purchase_qty: coerce_qty(cell(row, 3)),
        purchase_amt: coerce_f64(cell(row, 4)),
        sales_qty: coerce_qty(cell(row, 5)),
        sales_amt: coerce_f64(cell(row, 6)),
        closing_qty: coerce_qty(cell(row, 7)),
        closing_price: 0.0,
        profit: coerce_f64(cell(row, 9)),
        version: 0,
    };
    book.closing_price = book.weighted_average_cost();
    Some(book)
}

pub fn ledger_to_row(entry: &LedgerEntry, zone: &FixedOffset) -> Vec<String> {
    vec![
        entry.id.clone(),
        entry.date.format_civil(zone),
        entry.book_id.clone(),
        entry.book_name.clone(),
        entry.transaction_type.to_string(),
        entry.qty.to_string(),
        entry.amount.to_string(),
        entry.payment_mode.to_string(),
        entry.bill_no.clone().unwrap_or_default(),
        entry.balance.to_string(),
        entry.remarks.clone().unwrap_or_default(),
    ]
}

/// Parse one ledger row. `row_no` is the sheet row number used in errors.
///
/// A blank payment mode reads as Offline: older rows were written before the
/// column existed.
pub fn ledger_from_row(
    row: &[String],
    row_no: usize,
    zone: &FixedOffset,
) -> Result<Option<LedgerEntry>, StoreError> {
    let Some(id) = optional(cell(row, 0)) else {
        return Ok(None);
    };
    let invalid = |reason: String| StoreError::Sheet { row: row_no, reason };

    let date = TimeStamp::parse_civil(cell(row, 1), zone)
        .ok_or_else(|| invalid(format!("unrecognised date {:?}", cell(row, 1))))?;
    let transaction_type = cell(row, 4).trim().parse().map_err(invalid)?;
    let payment_mode = match cell(row, 7).trim() {
        "" => PaymentMode::Offline,
        mode => mode.parse().map_err(invalid)?,
    };

    Ok(Some(LedgerEntry {
        id,
        date,
        book_id: cell(row, 2).trim().to_string(),
        book_name: cell(row, 3).trim().to_string(),
        transaction_type,
        qty: coerce_qty(cell(row, 5)),
        amount: coerce_f64(cell(row, 6)),
        payment_mode,
        bill_no: optional(cell(row, 8)),
        balance: coerce_qty(cell(row, 9)),
        remarks: optional(cell(row, 10)),
    }))
}

pub fn type_log_to_row(entry: &TypeLogEntry, zone: &FixedOffset) -> Vec<String> {
    vec![
        entry.id.clone(),
        entry.date.format_civil(zone),
        entry.book_id.clone(),
        entry.book_name.clone(),
        entry.qty.to_string(),
        entry.amount.to_string(),
        entry.payment_mode.to_string(),
        entry.bill_no.clone().unwrap_or_default(),
        entry.remarks.clone().unwrap_or_default(),
    ]
}

/// Write a header row followed by `rows`.
pub fn write_table<W, I>(writer: W, headers: &[&str], rows: I) -> Result<(), StoreError>
where
    W: Write,
    I: IntoIterator<Item = Vec<String>>,
{
    let mut out = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    out.write_record(headers)?;
    for row in rows {
        out.write_record(&row)?;
    }
    out.flush()?;
    Ok(())
}

/// Read every data row, skipping the header row. Short rows are kept short.
pub fn read_table<R: Read>(reader: R) -> Result<Vec<Vec<String>>, StoreError> {
    let mut input = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in input.records() {
        let record = record?;
        rows.push(record.iter().map(String::from).collect());
    }
    Ok(rows)
}

pub fn read_stock_master<R: Read>(reader: R) -> Result<Vec<BookMaster>, StoreError> {
    Ok(read_table(reader)?
        .iter()
        .filter_map(|row| book_from_row(row))
        .collect())
}

/// Ledger rows read from a sheet. Rows that could not be parsed are kept
/// aside with the reason instead of failing the whole table.
#[derive(Debug, Default)]
pub struct LedgerRows {
    pub entries: Vec<LedgerEntry>,
    pub rejected: Vec<StoreError>,
}

pub fn read_ledger<R: Read>(reader: R, zone: &FixedOffset) -> Result<LedgerRows, StoreError> {
    let mut rows = LedgerRows::default();
    for (i, row) in read_table(reader)?.iter().enumerate() {
        match ledger_from_row(row, i + FIRST_DATA_ROW, zone) {
            Ok(Some(entry)) => rows.entries.push(entry),
            Ok(None) => {}
            Err(e) => rows.rejected.push(e),
        }
    }
    Ok(rows)
}
