pub mod book;
pub mod config;
pub mod error;
pub mod identifier;
pub mod ledger;
pub mod report;
pub mod service;
pub mod sheet;
pub mod store;
pub mod timestamp;
pub mod transaction;
pub mod utils;
