pub mod account; // identity records, capabilities, key rotation
pub mod error;
pub mod crypto;
pub mod encoding;
pub mod events;
pub mod storage;
pub mod clock;
pub mod config;
pub mod transaction; // prologue / epilogue
pub mod ledger;
pub mod cli;

pub use error::AccountError;
