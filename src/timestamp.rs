//! Civil-timezone timestamps for ledger entries
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::cmp::Ordering;

/// Canonical textual form used when persisting a date to a sheet.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Layouts accepted when reading dates back from a sheet, tried in order.
const SHEET_FORMATS: [&str; 4] = [
    CANONICAL_FORMAT,
    "%Y-%m-%d %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
];

/// An instant, stored as UTC and rendered in the civil timezone.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }

    /// Interpret a wall-clock date and time in `zone`.
    ///
    /// A fixed offset has exactly one mapping for every local time, so the same
    /// input always lands on the same instant regardless of the host locale.
    pub fn from_civil(date: NaiveDate, time: NaiveTime, zone: &FixedOffset) -> Self {
        let local = NaiveDateTime::new(date, time);
        // utc = local - offset
        let utc = local - chrono::Duration::seconds(zone.local_minus_utc() as i64);
        Self(Utc.from_utc_datetime(&utc))
    }

    /// Parse a date cell written by us or typed into the sheet by hand.
    pub fn parse_civil(text: &str, zone: &FixedOffset) -> Option<Self> {
        let text = text.trim();
        SHEET_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .map(|naive| Self::from_civil(naive.date(), naive.time(), zone))
    }

    pub fn to_civil(&self, zone: &FixedOffset) -> DateTime<FixedOffset> {
        self.0.with_timezone(zone)
    }

    pub fn format_civil(&self, zone: &FixedOffset) -> String {
        self.to_civil(zone).format(CANONICAL_FORMAT).to_string()
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

// chrono::Utc itself is not Ord, so order by the instant
impl PartialOrd for TimeStamp<Utc> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeStamp<Utc> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}
