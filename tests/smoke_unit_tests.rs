//! Smoke screen unit tests for the stock ledger components
//!
//! These tests span the public API of each module in isolation from the
//! store-backed scenarios. They mostly cover the happy path plus the one or
//! two rejections a user is most likely to hit.
//!
#![allow(unused_imports)]

use bookstore_ledger::{
    book::BookMaster,
    error::{ErrorKind, StockError, ValidationError},
    identifier::{LANGUAGES, derive_id},
    ledger::{PaymentMode, TransactionType, TypeLogEntry},
    report::{DashboardTotals, LowStockReport},
    sheet,
    timestamp::TimeStamp,
    transaction::{AddBookForm, TransactionForm},
    utils::new_uuid_to_bech32,
};
use chrono::{FixedOffset, Timelike, Utc};

fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
}

fn purchase_form(qty: &str, amount: &str) -> TransactionForm {
    TransactionForm::new()
        .set_book_id("ENG-DUNE")
        .set_qty(qty)
        .set_amount(amount)
        .set_date("2024-03-01")
        .set_time("09:15")
        .set_payment_mode("Online")
}

fn dune() -> BookMaster {
    BookMaster::new("ENG-DUNE".into(), "Dune".into(), "English".into())
}

// UTILS MODULE TESTS
#[cfg(test)]
mod utils_tests {
    use super::*;

    /// Test that ids carry the requested human readable part
    #[test]
    fn generates_valid_bech32_with_hrp() {
        let encoded = new_uuid_to_bech32("txn").unwrap();
        assert!(encoded.starts_with("txn1"));
        assert!(encoded.len() > 10);
    }

    /// Test that repeated calls never collide
    #[test]
    fn generates_unique_ids() {
        let id1 = new_uuid_to_bech32("txn").unwrap();
        let id2 = new_uuid_to_bech32("txn").unwrap();
        assert_ne!(id1, id2);
    }
}

// IDENTIFIER MODULE TESTS
#[cfg(test)]
mod identifier_tests {
    use super::*;

    /// Test the canonical example id
    #[test]
    fn derives_language_prefixed_id() {
        assert_eq!(derive_id("The Alchemist", "English"), "ENG-THE_ALCHEMIST");
    }

    /// Test that whitespace runs collapse to one underscore
    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(derive_id("War  and\tPeace", "Russian"), "RUS-WAR_AND_PEACE");
    }

    /// Test that every offered language yields a non-empty prefix
    #[test]
    fn every_language_has_a_prefix() {
        for language in LANGUAGES {
            let id = derive_id("Title", language);
            assert!(id.ends_with("-TITLE"), "{id}");
            assert!(!id.starts_with('-'), "{id}");
        }
    }
}

// TIMESTAMP MODULE TESTS
#[cfg(test)]
mod timestamp_tests {
    use super::*;

    /// Test that civil dates resolve through the configured offset
    #[test]
    fn civil_time_converts_to_utc() {
        let ts = TimeStamp::parse_civil("2024-03-01 09:15:00", &ist()).unwrap();
        let utc = ts.to_datetime_utc();

        assert_eq!(utc.hour(), 3);
        assert_eq!(utc.minute(), 45);
        assert_eq!(ts.format_civil(&ist()), "2024-03-01 09:15:00");
    }

    /// Test that ordering follows the instant, not the text
    #[test]
    fn timestamps_order_by_instant() {
        let earlier = TimeStamp::new_with(2024, 3, 1, 3, 0, 0);
        let later = TimeStamp::new_with(2024, 3, 1, 3, 0, 1);
        assert!(earlier < later);
    }
}

// TRANSACTION MODULE TESTS
#[cfg(test)]
mod transaction_tests {
    use super::*;

    /// Test that a complete form validates into a typed transaction
    #[test]
    fn valid_form_finalises() {
        let txn = purchase_form("3", "450.50")
            .set_bill_no("  B-9 ")
            .validate_and_finalise(TransactionType::Purchase, &ist())
            .unwrap();

        assert_eq!(txn.book_id, "ENG-DUNE");
        assert_eq!(txn.qty, 3);
        assert_eq!(txn.amount, 450.50);
        assert_eq!(txn.payment_mode, PaymentMode::Online);
        assert_eq!(txn.bill_no.as_deref(), Some("B-9"));
        assert_eq!(txn.remarks, None);
    }

    /// Test that the first failing field is the one reported
    #[test]
    fn reports_first_failing_field() {
        let err = purchase_form("0", "-1")
            .validate_and_finalise(TransactionType::Purchase, &ist())
            .unwrap_err();
        assert_eq!(err, ValidationError::NonPositiveQuantity);
        assert_eq!(err.field(), "qty");
    }

    /// Test that payment modes must match exactly
    #[test]
    fn payment_mode_is_case_sensitive() {
        let err = purchase_form("1", "10")
            .set_payment_mode("online")
            .validate_and_finalise(TransactionType::Sale, &ist())
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidPaymentMode);
    }

    /// Test that the add-book form capitalises and derives the id
    #[test]
    fn add_book_form_derives_id() {
        let book = AddBookForm::new()
            .set_book_name("  Godaan ")
            .set_language("hindi")
            .validate_and_finalise()
            .unwrap();

        assert_eq!(book.book_name, "Godaan");
        assert_eq!(book.language, "Hindi");
        assert_eq!(book.id, "HIN-GODAAN");
    }

    /// Test that short names are rejected after trimming
    #[test]
    fn add_book_form_rejects_short_name() {
        let err = AddBookForm::new()
            .set_book_name(" ab ")
            .set_language("English")
            .validate_and_finalise()
            .unwrap_err();
        assert_eq!(err, ValidationError::BookNameTooShort);
    }
}

// BOOK MODULE TESTS
#[cfg(test)]
mod book_tests {
    use super::*;

    /// Test that a fresh book starts with every accumulator at zero
    #[test]
    fn new_book_is_empty() {
        let book = dune();
        assert_eq!(book.closing_qty, 0);
        assert_eq!(book.closing_price, 0.0);
        assert_eq!(book.weighted_average_cost(), 0.0);
        assert_eq!(book.version, 0);
    }

    /// Test that a purchase then a sale keeps the accounting identities
    #[test]
    fn purchase_then_sale() {
        let purchase = purchase_form("4", "400")
            .validate_and_finalise(TransactionType::Purchase, &ist())
            .unwrap();
        let after_purchase = dune().apply(&purchase, "txn1a".into()).unwrap();
        assert_eq!(after_purchase.book.closing_price, 100.0);

        let sale = purchase_form("1", "180")
            .validate_and_finalise(TransactionType::Sale, &ist())
            .unwrap();
        let after_sale = after_purchase.book.apply(&sale, "txn1b".into()).unwrap();

        assert_eq!(after_sale.book.closing_qty, 3);
        assert_eq!(after_sale.book.closing_price, 100.0);
        assert!((after_sale.book.profit - 80.0).abs() < 1e-9);
        assert_eq!(after_sale.entry.balance, 3);
        assert_eq!(after_sale.book.version, 2);
    }
}

// REPORT MODULE TESTS
#[cfg(test)]
mod report_tests {
    use super::*;

    /// Test that totals sum over every book
    #[test]
    fn dashboard_sums_books() {
        let mut a = dune();
        a.profit = 12.5;
        a.sales_qty = 2;
        a.closing_qty = 8;
        let mut b = BookMaster::new("HIN-GODAAN".into(), "Godaan".into(), "Hindi".into());
        b.profit = -2.5;
        b.sales_qty = 1;
        b.closing_qty = 3;

        let totals = DashboardTotals::from_books(&[a, b]);
        assert_eq!(totals.total_profit, 10.0);
        assert_eq!(totals.total_sales_qty, 3);
        assert_eq!(totals.total_closing_qty, 11);
    }

    /// Test that an empty catalogue is all good
    #[test]
    fn empty_catalogue_is_all_good() {
        assert_eq!(LowStockReport::from_books(&[]), LowStockReport::AllGood);
    }
}

// SHEET MODULE TESTS
#[cfg(test)]
mod sheet_tests {
    use super::*;

    /// Test that a stock master CSV export reads back
    #[test]
    fn stock_master_csv_reads_back() {
        let mut book = dune();
        book.purchase_qty = 3;
        book.purchase_amt = 100.0;
        book.closing_qty = 3;
        book.closing_price = book.weighted_average_cost();

        let mut buf = Vec::new();
        sheet::write_table(&mut buf, &sheet::STOCK_MASTER_HEADERS, vec![sheet::book_to_row(&book)])
            .unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("id,book_name,language"));
        assert!(text.contains("33.33"));

        let books = sheet::read_stock_master(buf.as_slice()).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, "ENG-DUNE");
        assert_eq!(books[0].closing_qty, 3);
        assert_eq!(books[0].purchase_amt, 100.0);
    }

    /// Test that unparseable numbers coerce to zero
    #[test]
    fn numeric_cells_coerce() {
        assert_eq!(sheet::coerce_f64(" 12.5 "), 12.5);
        assert_eq!(sheet::coerce_f64(""), 0.0);
        assert_eq!(sheet::coerce_f64("n/a"), 0.0);
        assert_eq!(sheet::coerce_qty("-4"), 0);
    }
}

// ERROR MODULE TESTS
#[cfg(test)]
mod error_tests {
    use super::*;

    /// Test the category of each failure family
    #[test]
    fn kinds_follow_family() {
        let validation: StockError = ValidationError::MissingDate.into();
        assert_eq!(validation.kind(), ErrorKind::Validation);
        assert_eq!(validation.to_string(), "date: Please select a date.");

        let rule = StockError::InsufficientStock {
            requested: 5,
            available: 2,
        };
        assert_eq!(rule.kind(), ErrorKind::BusinessRule);
        assert_eq!(rule.to_string(), "Cannot sell 5 units. Only 2 available.");
    }
}
