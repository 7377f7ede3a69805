//! Per-transaction gatekeeping: admission (prologue) before the payload runs,
//! finalization (epilogue) after it succeeds.

pub mod prologue;
pub mod epilogue;

use serde::{Deserialize, Serialize};

use crate::account::types::Address;

pub use epilogue::Finalizer;
pub use prologue::AdmissionController;

/// What the executor extracted from a submitted transaction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionMetadata {
    pub sender: Address,
    /// Authentication key the transaction's signature was checked against.
    pub authentication_key: Vec<u8>,
    pub sequence_number: u64,
    pub gas_price: u64,
    pub max_gas_units: u64,
    pub expiration_time_secs: u64,
    pub chain_id: u8,
    #[serde(default)]
    pub secondary_signers: Vec<Address>,
    #[serde(default)]
    pub secondary_authentication_keys: Vec<Vec<u8>>,
}

impl TransactionMetadata {
    pub fn is_multi_agent(&self) -> bool {
        !self.secondary_signers.is_empty() || !self.secondary_authentication_keys.is_empty()
    }
}
