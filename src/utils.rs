//! Identifier helpers

use bech32::Bech32m;
use uuid7::uuid7;

/// Human readable part of every transaction id.
pub const TRANSACTION_HRP: &str = "txn";

// construct a time-ordered unique id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

/// A fresh transaction id derived from the current instant
pub fn new_transaction_id() -> anyhow::Result<String> {
    new_uuid_to_bech32(TRANSACTION_HRP)
}
