//! Stock master records and the arithmetic that moves them
use super::error::StockError;
use super::ledger::{LedgerEntry, TransactionType};
use super::transaction::Transaction;
use tracing::debug;

/// Aggregate stock and accounting state of one book.
///
/// `closing_qty == purchase_qty - sales_qty` and
/// `closing_price == purchase_amt / purchase_qty` (0 before the first purchase)
/// hold after every committed transaction.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct BookMaster {
    #[n(0)]
    pub id: String, // language prefix + title, see identifier::derive_id
    #[n(1)]
    pub book_name: String,
    #[n(2)]
    pub language: String,
    #[n(3)]
    pub purchase_qty: u64,
    #[n(4)]
    pub purchase_amt: f64,
    #[n(5)]
    pub sales_qty: u64,
    #[n(6)]
    pub sales_amt: f64,
    #[n(7)]
    pub closing_qty: u64,
    #[n(8)]
    pub closing_price: f64, // weighted average cost
    #[n(9)]
    pub profit: f64,
    #[n(10)]
    pub version: u64, // bumped on every committed mutation
}

/// Result of applying a transaction: the new book row and its ledger entry
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub book: BookMaster,
    pub entry: LedgerEntry,
}

impl BookMaster {
    pub fn new(id: String, book_name: String, language: String) -> Self {
        Self {
            id,
            book_name,
            language,
            purchase_qty: 0,
            purchase_amt: 0.0,
            sales_qty: 0,
            sales_amt: 0.0,
            closing_qty: 0,
            closing_price: 0.0,
            profit: 0.0,
            version: 0,
        }
    }

    /// Total purchase cost over total units purchased
    pub fn weighted_average_cost(&self) -> f64 {
        if self.purchase_qty == 0 {
            return 0.0;
        }
        self.purchase_amt / self.purchase_qty as f64
    }

    pub fn apply(&self, txn: &Transaction, txn_id: String) -> Result<Posting, StockError> {
        match txn.kind {
            TransactionType::Purchase => self.apply_purchase(txn, txn_id),
            TransactionType::Sale => self.apply_sale(txn, txn_id),
        }
    }

    /// Add purchased units and re-average the cost. Profit is untouched.
    pub fn apply_purchase(&self, txn: &Transaction, txn_id: String) -> Result<Posting, StockError> {
        let mut book = self.clone();
        book.purchase_qty = self.add_qty(self.purchase_qty, txn.qty)?;
        book.purchase_amt += txn.amount;
        book.closing_qty = self.add_qty(self.closing_qty, txn.qty)?;
        book.closing_price = book.weighted_average_cost();
        book.version += 1;

        debug!(
            book_id = %book.id,
            closing_qty = book.closing_qty,
            closing_price = book.closing_price,
            "applied purchase"
        );

        let entry = self.entry_for(txn, txn_id, book.closing_qty);
        Ok(Posting { book, entry })
    }

    /// Remove sold units and book profit against the weighted average cost.
    pub fn apply_sale(&self, txn: &Transaction, txn_id: String) -> Result<Posting, StockError> {
        if txn.qty > self.closing_qty {
            return Err(StockError::InsufficientStock {
                requested: txn.qty,
                available: self.closing_qty,
            });
        }

        let cost_of_goods_sold = self.weighted_average_cost() * txn.qty as f64;

        let mut book = self.clone();
        book.sales_qty = self.add_qty(self.sales_qty, txn.qty)?;
        book.sales_amt += txn.amount;
        book.closing_qty -= txn.qty;
        book.profit += txn.amount - cost_of_goods_sold;
        book.version += 1;

        debug!(
            book_id = %book.id,
            closing_qty = book.closing_qty,
            cost_of_goods_sold,
            profit = book.profit,
            "applied sale"
        );

        let entry = self.entry_for(txn, txn_id, book.closing_qty);
        Ok(Posting { book, entry })
    }

    fn add_qty(&self, current: u64, qty: u64) -> Result<u64, StockError> {
        current
            .checked_add(qty)
            .ok_or_else(|| StockError::QuantityOverflow(self.id.clone()))
    }

    fn entry_for(&self, txn: &Transaction, txn_id: String, balance: u64) -> LedgerEntry {
        LedgerEntry {
            id: txn_id,
            date: txn.date.clone(),
            book_id: self.id.clone(),
            book_name: self.book_name.clone(),
            transaction_type: txn.kind,
            qty: txn.qty,
            amount: txn.amount,
            payment_mode: txn.payment_mode,
            bill_no: txn.bill_no.clone(),
            balance,
            remarks: txn.remarks.clone(),
        }
    }
}
