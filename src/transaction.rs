//! Validation of purchase, sale and add-book input
use super::book::BookMaster;
use super::error::{StockError, ValidationError};
use super::identifier::{self, OTHER_LANGUAGE};
use super::ledger::{self, LedgerEntry, PaymentMode, TransactionType};
use super::timestamp::TimeStamp;
use chrono::{FixedOffset, NaiveDate, NaiveTime, Utc};

/// Largest quantity a single transaction may carry (2^53, the last integer
/// an `f64` holds exactly).
pub const MAX_QTY: u64 = 1 << 53;

/// Raw purchase or sale fields as typed by the user.
// Also used for constructing drafts
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransactionForm {
    book_id: Option<String>,
    qty: Option<String>,
    amount: Option<String>,
    date: Option<String>, // YYYY-MM-DD
    time: Option<String>, // HH:MM, 24 hour
    payment_mode: Option<String>,
    bill_no: Option<String>,
    remarks: Option<String>,
}

/// A purchase or sale that passed every schema check.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub book_id: String,
    pub kind: TransactionType,
    pub qty: u64,
    pub amount: f64,
    pub date: TimeStamp<Utc>,
    pub payment_mode: PaymentMode,
    pub bill_no: Option<String>,
    pub remarks: Option<String>,
}

impl TransactionForm {
    /// Construct a new empty form, this becomes the basis for a draft
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_book_id(mut self, book_id: &str) -> Self {
        self.book_id = Some(book_id.into());
        self
    }
    pub fn set_qty(mut self, qty: &str) -> Self {
        self.qty = Some(qty.into());
        self
    }
    pub fn set_amount(mut self, amount: &str) -> Self {
        self.amount = Some(amount.into());
        self
    }
    pub fn set_date(mut self, date: &str) -> Self {
        self.date = Some(date.into());
        self
    }
    pub fn set_time(mut self, time: &str) -> Self {
        self.time = Some(time.into());
        self
    }
    pub fn set_payment_mode(mut self, mode: &str) -> Self {
        self.payment_mode = Some(mode.into());
        self
    }
    pub fn set_bill_no(mut self, bill_no: &str) -> Self {
        self.bill_no = Some(bill_no.into());
        self
    }
    pub fn set_remarks(mut self, remarks: &str) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    /// Book the form refers to, if one was selected
    pub fn book_id(&self) -> Option<&str> {
        self.book_id.as_deref()
    }

    /// Check every field in form order and return the first failure, or the
    /// typed transaction with its date and time resolved in `zone`.
    pub fn validate_and_finalise(
        &self,
        kind: TransactionType,
        zone: &FixedOffset,
    ) -> Result<Transaction, ValidationError> {
        let book_id = non_blank(&self.book_id).ok_or(ValidationError::BookNotSelected)?;

        let qty = parse_qty(&self.qty)?;

        let amount = coerce_number(&self.amount);
        if !(amount > 0.0) || !amount.is_finite() {
            return Err(ValidationError::NonPositiveAmount);
        }

        let date = non_blank(&self.date).ok_or(ValidationError::MissingDate)?;
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate)?;

        let time = self
            .time
            .as_deref()
            .and_then(parse_clock)
            .ok_or(ValidationError::InvalidTime)?;

        let payment_mode = self
            .payment_mode
            .as_deref()
            .ok_or(ValidationError::InvalidPaymentMode)?
            .parse::<PaymentMode>()
            .map_err(|_| ValidationError::InvalidPaymentMode)?;

        Ok(Transaction {
            book_id,
            kind,
            qty,
            amount,
            date: TimeStamp::from_civil(date, time, zone),
            payment_mode,
            bill_no: non_blank(&self.bill_no),
            remarks: non_blank(&self.remarks),
        })
    }
}

impl Transaction {
    /// Sale rules that depend on the current stock and ledger.
    ///
    /// Checked in order: enough stock, at least one purchase on record, and
    /// the sale not dated before that first purchase.
    pub fn check_sale(
        &self,
        book: &BookMaster,
        history: &[LedgerEntry],
        zone: &FixedOffset,
    ) -> Result<(), StockError> {
        if self.qty > book.closing_qty {
            return Err(StockError::InsufficientStock {
                requested: self.qty,
                available: book.closing_qty,
            });
        }

        let first = ledger::first_purchase(history, &book.id).ok_or(StockError::NoPriorPurchase)?;
        if self.date < first.date {
            return Err(StockError::backdated(&first.date, zone));
        }

        Ok(())
    }
}

/// Raw add-book fields.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AddBookForm {
    book_name: Option<String>,
    language: Option<String>,
    other_language: Option<String>, // only read when language is "other"
}

/// A validated book ready to be inserted, all accumulators at zero
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub id: String,
    pub book_name: String,
    pub language: String,
}

impl AddBookForm {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_book_name(mut self, name: &str) -> Self {
        self.book_name = Some(name.into());
        self
    }
    pub fn set_language(mut self, language: &str) -> Self {
        self.language = Some(language.into());
        self
    }
    pub fn set_other_language(mut self, language: &str) -> Self {
        self.other_language = Some(language.into());
        self
    }

    pub fn validate_and_finalise(&self) -> Result<NewBook, ValidationError> {
        let book_name = non_blank(&self.book_name).unwrap_or_default();
        if book_name.chars().count() < 3 {
            return Err(ValidationError::BookNameTooShort);
        }

        let selected = non_blank(&self.language).ok_or(ValidationError::LanguageNotSelected)?;
        let language = if selected == OTHER_LANGUAGE {
            let other = non_blank(&self.other_language).unwrap_or_default();
            if other.chars().count() < 2 {
                return Err(ValidationError::OtherLanguageTooShort);
            }
            other
        } else {
            selected
        };
        let language = identifier::capitalize(&language);

        Ok(NewBook {
            id: identifier::derive_id(&book_name, &language),
            book_name,
            language,
        })
    }
}

impl NewBook {
    pub fn into_book_master(self) -> BookMaster {
        BookMaster::new(self.id, self.book_name, self.language)
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

// blank counts as zero, garbage as NaN; both fail the positivity checks
fn coerce_number(value: &Option<String>) -> f64 {
    match value.as_deref().map(str::trim) {
        None | Some("") => 0.0,
        Some(v) => v.parse().unwrap_or(f64::NAN),
    }
}

// integers parse exactly; anything else goes through f64 only to tell
// fractional input from non-positive input
fn parse_qty(value: &Option<String>) -> Result<u64, ValidationError> {
    let text = value.as_deref().map(str::trim).unwrap_or("");
    let qty = match text.parse::<u64>() {
        Ok(qty) => qty,
        Err(_) => {
            let qty = coerce_number(value);
            if !(qty > 0.0) {
                return Err(ValidationError::NonPositiveQuantity);
            }
            if qty.fract() != 0.0 {
                return Err(ValidationError::FractionalQuantity);
            }
            if qty > MAX_QTY as f64 {
                return Err(ValidationError::QuantityTooLarge);
            }
            qty as u64
        }
    };

    match qty {
        0 => Err(ValidationError::NonPositiveQuantity),
        q if q > MAX_QTY => Err(ValidationError::QuantityTooLarge),
        q => Ok(q),
    }
}

/// `H:MM` or `HH:MM` on a 24 hour clock
fn parse_clock(text: &str) -> Option<NaiveTime> {
    let (hours, minutes) = text.split_once(':')?;
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return None;
    }
    if !digits(hours) || !digits(minutes) {
        return None;
    }

    NaiveTime::from_hms_opt(hours.parse().ok()?, minutes.parse().ok()?, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(19_800).unwrap()
    }

    fn valid_form() -> TransactionForm {
        TransactionForm::new()
            .set_book_id("ENG-DUNE")
            .set_qty("3")
            .set_amount("450.50")
            .set_date("2024-05-01")
            .set_time("9:05")
            .set_payment_mode("Online")
    }

    #[test]
    fn valid_form_finalises() {
        let txn = valid_form()
            .set_bill_no("  ")
            .set_remarks("gift")
            .validate_and_finalise(TransactionType::Sale, &ist())
            .unwrap();

        assert_eq!(txn.book_id, "ENG-DUNE");
        assert_eq!(txn.qty, 3);
        assert_eq!(txn.amount, 450.5);
        assert_eq!(txn.date, TimeStamp::new_with(2024, 5, 1, 3, 35, 0));
        assert_eq!(txn.payment_mode, PaymentMode::Online);
        assert_eq!(txn.bill_no, None);
        assert_eq!(txn.remarks.as_deref(), Some("gift"));
    }

    #[test]
    fn reports_first_failing_field() {
        let cases = [
            (valid_form().set_book_id(""), ValidationError::BookNotSelected),
            (valid_form().set_qty("0"), ValidationError::NonPositiveQuantity),
            (valid_form().set_qty("-2"), ValidationError::NonPositiveQuantity),
            (valid_form().set_qty("two"), ValidationError::NonPositiveQuantity),
            (valid_form().set_qty("1.5"), ValidationError::FractionalQuantity),
            (valid_form().set_qty("1e19"), ValidationError::QuantityTooLarge),
            (valid_form().set_qty("9007199254740993"), ValidationError::QuantityTooLarge),
            (valid_form().set_amount("0"), ValidationError::NonPositiveAmount),
            (valid_form().set_date(""), ValidationError::MissingDate),
            (valid_form().set_date("01/05/2024"), ValidationError::InvalidDate),
            (valid_form().set_time("24:00"), ValidationError::InvalidTime),
            (valid_form().set_time("7:5"), ValidationError::InvalidTime),
            (valid_form().set_time("07:60"), ValidationError::InvalidTime),
            (valid_form().set_payment_mode("Cash"), ValidationError::InvalidPaymentMode),
        ];

        for (form, expected) in cases {
            let err = form
                .validate_and_finalise(TransactionType::Purchase, &ist())
                .unwrap_err();
            assert_eq!(err, expected);
        }
    }

    #[test]
    fn quantities_parse_exactly() {
        let exact = valid_form()
            .set_qty("9007199254740991")
            .validate_and_finalise(TransactionType::Purchase, &ist())
            .unwrap();
        assert_eq!(exact.qty, 9_007_199_254_740_991);

        let at_cap = valid_form()
            .set_qty(&MAX_QTY.to_string())
            .validate_and_finalise(TransactionType::Purchase, &ist())
            .unwrap();
        assert_eq!(at_cap.qty, MAX_QTY);

        let whole_float = valid_form()
            .set_qty(" 4.0 ")
            .validate_and_finalise(TransactionType::Purchase, &ist())
            .unwrap();
        assert_eq!(whole_float.qty, 4);
    }

    #[test]
    fn missing_payment_mode_is_invalid() {
        let form = TransactionForm::new()
            .set_book_id("ENG-DUNE")
            .set_qty("1")
            .set_amount("10")
            .set_date("2024-05-01")
            .set_time("23:59");

        assert_eq!(
            form.validate_and_finalise(TransactionType::Purchase, &ist()),
            Err(ValidationError::InvalidPaymentMode)
        );
    }

    #[test]
    fn clock_accepts_single_digit_hour() {
        assert_eq!(parse_clock("0:00"), NaiveTime::from_hms_opt(0, 0, 0));
        assert_eq!(parse_clock("23:59"), NaiveTime::from_hms_opt(23, 59, 0));
        assert_eq!(parse_clock("9:30 "), None);
        assert_eq!(parse_clock("930"), None);
    }

    #[test]
    fn add_book_derives_id() {
        let book = AddBookForm::new()
            .set_book_name("The Alchemist")
            .set_language("English")
            .validate_and_finalise()
            .unwrap();

        assert_eq!(book.id, "ENG-THE_ALCHEMIST");
        assert_eq!(book.language, "English");
    }

    #[test]
    fn add_book_other_language_is_capitalised() {
        let book = AddBookForm::new()
            .set_book_name("Foo Bar")
            .set_language(OTHER_LANGUAGE)
            .set_other_language("  hi ")
            .validate_and_finalise()
            .unwrap();

        assert_eq!(book.language, "Hi");
        assert_eq!(book.id, "HI-FOO_BAR");
    }

    #[test]
    fn add_book_rules() {
        let short_name = AddBookForm::new().set_book_name("It").set_language("English");
        assert_eq!(
            short_name.validate_and_finalise(),
            Err(ValidationError::BookNameTooShort)
        );

        let no_language = AddBookForm::new().set_book_name("Dune");
        assert_eq!(
            no_language.validate_and_finalise(),
            Err(ValidationError::LanguageNotSelected)
        );

        let short_other = AddBookForm::new()
            .set_book_name("Dune")
            .set_language(OTHER_LANGUAGE)
            .set_other_language(" x ");
        assert_eq!(
            short_other.validate_and_finalise(),
            Err(ValidationError::OtherLanguageTooShort)
        );
    }
}
