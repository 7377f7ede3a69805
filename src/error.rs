use thiserror::Error;

use crate::account::types::Address;

/// Every failure the account module can abort with.
///
/// Codes are stable: callers (and resubmission policy outside this crate)
/// match on `code()`, never on the display text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Account already exists at {0}")]
    AlreadyExists(Address),
    #[error("Account not found: {0}")]
    NotFound(Address),
    #[error("Sequence number too big")]
    SequenceTooBig,
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Address {0} is reserved")]
    ReservedAddress(Address),
    #[error("Out of gas")]
    OutOfGas,
    #[error("Public key does not match the current authentication key")]
    WrongCurrentPublicKey,
    #[error("Rotation proof failed to verify")]
    Unverified,
    #[error("No matching capability offer")]
    NoSuchOffer,
    #[error("Write-set transactions are not permitted")]
    PermissionDenied,
    #[error("Originating address entry belongs to another account")]
    OriginatingAddressConflict,

    // Prologue / epilogue signals
    #[error("Invalid account authentication key")]
    InvalidAuthKey,
    #[error("Sequence number too old")]
    SequenceTooOld,
    #[error("Sequence number too new")]
    SequenceTooNew,
    #[error("Sender account does not exist: {0}")]
    AccountNotFound(Address),
    #[error("Cannot pay gas deposit")]
    CannotPayGas,
    #[error("Transaction expired")]
    Expired,
    #[error("Bad chain id")]
    BadChainId,
    #[error("Secondary signer addresses and key hashes differ in count")]
    CountMismatch,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AccountError {
    /// Stable numeric abort code.
    pub fn code(&self) -> u64 {
        match self {
            AccountError::AlreadyExists(_) => 1,
            AccountError::NotFound(_) => 2,
            AccountError::SequenceTooBig => 3,
            AccountError::MalformedInput(_) => 4,
            AccountError::ReservedAddress(_) => 5,
            AccountError::OutOfGas => 6,
            AccountError::WrongCurrentPublicKey => 7,
            AccountError::Unverified => 8,
            AccountError::NoSuchOffer => 9,
            AccountError::PermissionDenied => 10,
            AccountError::OriginatingAddressConflict => 11,
            AccountError::InvalidAuthKey => 1001,
            AccountError::SequenceTooOld => 1002,
            AccountError::SequenceTooNew => 1003,
            AccountError::AccountNotFound(_) => 1004,
            AccountError::CannotPayGas => 1005,
            AccountError::Expired => 1006,
            AccountError::BadChainId => 1007,
            AccountError::CountMismatch => 1009,
            AccountError::Storage(_) => 2000,
        }
    }

    /// A transaction that passed admission must never fail finalization.
    /// When it does, the ledger itself is inconsistent.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            AccountError::OutOfGas
                | AccountError::CannotPayGas
                | AccountError::SequenceTooBig
                | AccountError::Storage(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let addr = Address::CORE_FRAMEWORK;
        let all = vec![
            AccountError::AlreadyExists(addr),
            AccountError::NotFound(addr),
            AccountError::SequenceTooBig,
            AccountError::MalformedInput(String::new()),
            AccountError::ReservedAddress(addr),
            AccountError::OutOfGas,
            AccountError::WrongCurrentPublicKey,
            AccountError::Unverified,
            AccountError::NoSuchOffer,
            AccountError::PermissionDenied,
            AccountError::OriginatingAddressConflict,
            AccountError::InvalidAuthKey,
            AccountError::SequenceTooOld,
            AccountError::SequenceTooNew,
            AccountError::AccountNotFound(addr),
            AccountError::CannotPayGas,
            AccountError::Expired,
            AccountError::BadChainId,
            AccountError::CountMismatch,
            AccountError::Storage(String::new()),
        ];
        let codes: std::collections::HashSet<u64> = all.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn test_invariant_violation_classification() {
        assert!(AccountError::OutOfGas.is_invariant_violation());
        assert!(!AccountError::SequenceTooNew.is_invariant_violation());
    }
}
