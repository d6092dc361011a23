//! Runtime configuration (environment variables + defaults).

use super::error::StoreError;
use chrono::{FixedOffset, Offset, Utc};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "BOOKSTORE_DB_PATH";
pub const UTC_OFFSET_VAR: &str = "BOOKSTORE_UTC_OFFSET";
pub const LOG_JSON_VAR: &str = "BOOKSTORE_LOG_JSON";

/// Default sled directory.
pub const DEFAULT_DB_PATH: &str = "bookstore.db";

/// Default civil timezone, India Standard Time. IST has no daylight saving
/// so a fixed offset describes it exactly.
pub const DEFAULT_UTC_OFFSET: &str = "+05:30";
const DEFAULT_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

// largest offset in use anywhere (Line Islands)
const MAX_OFFSET_SECS: i32 = 14 * 3600;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory of the sled database.
    pub db_path: PathBuf,
    /// Civil timezone every date and time is interpreted and shown in.
    pub utc_offset: FixedOffset,
    /// Emit logs as JSON lines.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            utc_offset: FixedOffset::east_opt(DEFAULT_OFFSET_SECS).unwrap_or_else(|| Utc.fix()),
            log_json: false,
        }
    }
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(DB_PATH_VAR).filter(|p| !p.trim().is_empty()) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(offset) = lookup(UTC_OFFSET_VAR) {
            config.utc_offset = parse_utc_offset(&offset)?;
        }
        if let Some(flag) = lookup(LOG_JSON_VAR) {
            config.log_json = parse_flag(&flag);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(StoreError::Config(format!("{DB_PATH_VAR} must not be empty")));
        }
        if self.utc_offset.local_minus_utc().abs() > MAX_OFFSET_SECS {
            return Err(StoreError::Config(format!(
                "{UTC_OFFSET_VAR} must be within ±14:00, got {}",
                self.utc_offset
            )));
        }
        Ok(())
    }
}

/// Parse `+HH:MM` / `-HH:MM` (the sign is required).
pub fn parse_utc_offset(text: &str) -> Result<FixedOffset, StoreError> {
    let invalid = || {
        StoreError::Config(format!(
            "{UTC_OFFSET_VAR} must look like +05:30, got {text:?}"
        ))
    };

    let text = text.trim();
    let (sign, rest) = match text.chars().next() {
        Some('+') => (1, &text[1..]),
        Some('-') => (-1, &text[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(hours) || !digits(minutes) {
        return Err(invalid());
    }
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }

    let secs = sign * (hours * 3600 + minutes * 60);
    if secs.abs() > MAX_OFFSET_SECS {
        return Err(invalid());
    }
    FixedOffset::east_opt(secs).ok_or_else(invalid)
}

fn parse_flag(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
