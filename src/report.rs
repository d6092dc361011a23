//! Dashboard totals and low-stock alerts, recomputed on every read
use super::book::BookMaster;

/// Books with fewer units than this (but not zero) raise an alert.
pub const LOW_STOCK_THRESHOLD: u64 = 5;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardTotals {
    pub total_profit: f64,
    pub total_sales_qty: u64,
    pub total_closing_qty: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStockAlert {
    pub book_id: String,
    pub book_name: String,
    pub closing_qty: u64,
    pub message: String,
}

/// Zero alerts is reported as its own state rather than an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LowStockReport {
    AllGood,
    Alerts(Vec<LowStockAlert>),
}

impl DashboardTotals {
    pub fn from_books(books: &[BookMaster]) -> Self {
        books.iter().fold(Self::default(), |acc, book| Self {
            total_profit: acc.total_profit + book.profit,
            total_sales_qty: acc.total_sales_qty + book.sales_qty,
            total_closing_qty: acc.total_closing_qty + book.closing_qty,
        })
    }
}

pub fn is_low_stock(book: &BookMaster) -> bool {
    book.closing_qty > 0 && book.closing_qty < LOW_STOCK_THRESHOLD
}

impl LowStockReport {
    pub fn from_books(books: &[BookMaster]) -> Self {
        let alerts: Vec<_> = books
            .iter()
            .filter(|book| is_low_stock(book))
            .map(|book| LowStockAlert {
                book_id: book.id.clone(),
                book_name: book.book_name.clone(),
                closing_qty: book.closing_qty,
                message: format!("Low stock: Only {} units left!", book.closing_qty),
            })
            .collect();

        if alerts.is_empty() {
            LowStockReport::AllGood
        } else {
            LowStockReport::Alerts(alerts)
        }
    }

    pub fn alerts(&self) -> &[LowStockAlert] {
        match self {
            LowStockReport::AllGood => &[],
            LowStockReport::Alerts(alerts) => alerts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: &str, closing_qty: u64, sales_qty: u64, profit: f64) -> BookMaster {
        let mut book = BookMaster::new(id.into(), id.into(), "English".into());
        book.purchase_qty = closing_qty + sales_qty;
        book.sales_qty = sales_qty;
        book.closing_qty = closing_qty;
        book.profit = profit;
        book
    }

    #[test]
    fn totals_fold_over_books() {
        let books = [book("A", 3, 2, 10.5), book("B", 7, 1, -2.5), book("C", 0, 4, 40.0)];

        let totals = DashboardTotals::from_books(&books);

        assert_eq!(totals.total_sales_qty, 7);
        assert_eq!(totals.total_closing_qty, 10);
        assert!((totals.total_profit - 48.0).abs() < 1e-9);
    }

    #[test]
    fn empty_store_has_zero_totals() {
        assert_eq!(DashboardTotals::from_books(&[]), DashboardTotals::default());
    }

    #[test]
    fn alerts_only_between_zero_and_threshold() {
        let books = [
            book("ZERO", 0, 1, 0.0),
            book("ONE", 1, 0, 0.0),
            book("FOUR", 4, 0, 0.0),
            book("FIVE", 5, 0, 0.0),
        ];

        let report = LowStockReport::from_books(&books);

        let ids: Vec<_> = report.alerts().iter().map(|a| a.book_id.as_str()).collect();
        assert_eq!(ids, ["ONE", "FOUR"]);
        assert_eq!(report.alerts()[0].message, "Low stock: Only 1 units left!");
    }

    #[test]
    fn no_alerts_is_all_good() {
        let books = [book("A", 0, 0, 0.0), book("B", 12, 0, 0.0)];
        assert_eq!(LowStockReport::from_books(&books), LowStockReport::AllGood);
    }
}
