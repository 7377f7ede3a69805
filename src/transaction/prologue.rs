//! Transaction admission. Read-only; the first failing check aborts.

use tracing::debug;

use super::TransactionMetadata;
use crate::account::balance::FeeLedger;
use crate::account::store::AccountStore;
use crate::clock::TimeSource;
use crate::config::ChainConfig;
use crate::error::AccountError;

pub struct AdmissionController<'a, F: FeeLedger + ?Sized> {
    accounts: &'a AccountStore,
    fees: &'a F,
    chain: &'a ChainConfig,
    clock: &'a dyn TimeSource,
}

impl<'a, F: FeeLedger + ?Sized> AdmissionController<'a, F> {
    pub fn new(
        accounts: &'a AccountStore,
        fees: &'a F,
        chain: &'a ChainConfig,
        clock: &'a dyn TimeSource,
    ) -> Self {
        Self {
            accounts,
            fees,
            chain,
            clock,
        }
    }

    /// Prologue for single-signer script and module transactions.
    pub fn prologue(&self, txn: &TransactionMetadata) -> Result<(), AccountError> {
        let result = self.check_common(txn);
        if let Err(e) = &result {
            debug!(sender = %txn.sender, code = e.code(), "admission rejected: {}", e);
        }
        result
    }

    /// Prologue for transactions with secondary signers.
    pub fn multi_agent_prologue(&self, txn: &TransactionMetadata) -> Result<(), AccountError> {
        let result = self
            .check_common(txn)
            .and_then(|_| self.check_secondary_signers(txn));
        if let Err(e) = &result {
            debug!(sender = %txn.sender, code = e.code(), "multi-agent admission rejected: {}", e);
        }
        result
    }

    /// Write-set transactions are never admitted.
    pub fn writeset_prologue(&self, _txn: &TransactionMetadata) -> Result<(), AccountError> {
        Err(AccountError::PermissionDenied)
    }

    fn check_common(&self, txn: &TransactionMetadata) -> Result<(), AccountError> {
        if self.clock.now_seconds() >= txn.expiration_time_secs {
            return Err(AccountError::Expired);
        }
        if txn.chain_id != self.chain.chain_id {
            return Err(AccountError::BadChainId);
        }

        let account = self
            .accounts
            .get(&txn.sender)
            .ok_or(AccountError::AccountNotFound(txn.sender))?;
        if txn.authentication_key != account.authentication_key {
            return Err(AccountError::InvalidAuthKey);
        }

        if txn.sequence_number == u64::MAX {
            return Err(AccountError::SequenceTooBig);
        }
        // Both checks stay: callers tell "too old" and "too new" apart by code.
        if txn.sequence_number < account.sequence_number {
            return Err(AccountError::SequenceTooOld);
        }
        if txn.sequence_number != account.sequence_number {
            return Err(AccountError::SequenceTooNew);
        }

        let asset = &self.chain.fee_asset;
        if !self.fees.is_registered(&txn.sender, asset) {
            return Err(AccountError::CannotPayGas);
        }
        let max_fee = txn
            .gas_price
            .checked_mul(txn.max_gas_units)
            .ok_or(AccountError::CannotPayGas)?;
        if self.fees.balance(&txn.sender, asset) < max_fee {
            return Err(AccountError::CannotPayGas);
        }
        Ok(())
    }

    fn check_secondary_signers(&self, txn: &TransactionMetadata) -> Result<(), AccountError> {
        if txn.secondary_signers.len() != txn.secondary_authentication_keys.len() {
            return Err(AccountError::CountMismatch);
        }
        for (signer, key_hash) in txn
            .secondary_signers
            .iter()
            .zip(&txn.secondary_authentication_keys)
        {
            let account = self
                .accounts
                .get(signer)
                .ok_or(AccountError::AccountNotFound(*signer))?;
            if *key_hash != account.authentication_key {
                return Err(AccountError::InvalidAuthKey);
            }
        }
        Ok(())
    }
}
