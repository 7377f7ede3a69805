//! Transaction finalization: charge the fee, advance the sequence number.

use tracing::{debug, error};

use super::TransactionMetadata;
use crate::account::balance::FeeLedger;
use crate::account::store::AccountStore;
use crate::config::ChainConfig;
use crate::error::AccountError;

pub struct Finalizer<'a, F: FeeLedger + ?Sized> {
    accounts: &'a mut AccountStore,
    fees: &'a mut F,
    chain: &'a ChainConfig,
}

impl<'a, F: FeeLedger + ?Sized> Finalizer<'a, F> {
    pub fn new(accounts: &'a mut AccountStore, fees: &'a mut F, chain: &'a ChainConfig) -> Self {
        Self {
            accounts,
            fees,
            chain,
        }
    }

    /// Run after a successful payload. Returns the fee charged.
    ///
    /// Nothing is written unless every check passes. A failure here means a
    /// transaction that passed admission cannot be finalized.
    pub fn epilogue(
        &mut self,
        txn: &TransactionMetadata,
        gas_units_remaining: u64,
    ) -> Result<u64, AccountError> {
        self.finalize(txn, gas_units_remaining).map_err(|e| {
            if e.is_invariant_violation() {
                error!(sender = %txn.sender, code = e.code(), "epilogue failed: {}", e);
            }
            e
        })
    }

    /// Write-set transactions are never finalized.
    pub fn writeset_epilogue(&mut self, _txn: &TransactionMetadata) -> Result<u64, AccountError> {
        Err(AccountError::PermissionDenied)
    }

    fn finalize(&mut self, txn: &TransactionMetadata, gas_units_remaining: u64) -> Result<u64, AccountError> {
        let gas_used = txn
            .max_gas_units
            .checked_sub(gas_units_remaining)
            .ok_or(AccountError::OutOfGas)?;
        let fee = txn
            .gas_price
            .checked_mul(gas_used)
            .ok_or(AccountError::OutOfGas)?;

        let asset = &self.chain.fee_asset;
        if self.fees.balance(&txn.sender, asset) < fee {
            return Err(AccountError::CannotPayGas);
        }
        if self.accounts.get_sequence_number(&txn.sender)? == u64::MAX {
            return Err(AccountError::SequenceTooBig);
        }

        self.fees
            .burn(&txn.sender, asset, fee)
            .map_err(|e| {
                error!(sender = %txn.sender, fee, "fee burn rejected: {}", e);
                AccountError::CannotPayGas
            })?;
        let sequence_number = self.accounts.increment_sequence_number(&txn.sender)?;
        debug!(sender = %txn.sender, fee, gas_used, sequence_number, "transaction finalized");
        Ok(fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::balance::{BalanceError, BalanceStore};
    use crate::account::types::{Address, Asset};

    /// Reports a large balance but refuses every burn.
    struct FrozenLedger;

    impl FeeLedger for FrozenLedger {
        fn is_registered(&self, _account: &Address, _asset: &Asset) -> bool {
            true
        }

        fn balance(&self, _account: &Address, _asset: &Asset) -> u64 {
            u64::MAX
        }

        fn burn(&mut self, _account: &Address, _asset: &Asset, _amount: u64) -> Result<(), BalanceError> {
            Err(BalanceError::InsufficientFunds)
        }
    }

    fn setup(balance: u64) -> (AccountStore, BalanceStore, ChainConfig, TransactionMetadata) {
        let mut accounts = AccountStore::default();
        let mut fees = BalanceStore::new();
        let chain = ChainConfig::default();
        let sender = Address::from_low_byte(0xa1);
        accounts.create_account(sender).unwrap();
        fees.register(&sender, &chain.fee_asset);
        fees.credit(&sender, &chain.fee_asset, balance).unwrap();
        let txn = TransactionMetadata {
            sender,
            authentication_key: sender.as_bytes().to_vec(),
            sequence_number: 0,
            gas_price: 3,
            max_gas_units: 100,
            expiration_time_secs: u64::MAX,
            chain_id: chain.chain_id,
            secondary_signers: vec![],
            secondary_authentication_keys: vec![],
        };
        (accounts, fees, chain, txn)
    }

    #[test]
    fn test_epilogue_charges_and_increments() {
        let (mut accounts, mut fees, chain, txn) = setup(1_000);
        let fee = Finalizer::new(&mut accounts, &mut fees, &chain)
            .epilogue(&txn, 40)
            .unwrap();

        assert_eq!(fee, 3 * 60);
        assert_eq!(fees.get_balance(&txn.sender, &chain.fee_asset), 1_000 - 180);
        assert_eq!(fees.total_burned(&chain.fee_asset), 180);
        assert_eq!(accounts.get_sequence_number(&txn.sender).unwrap(), 1);
    }

    #[test]
    fn test_remaining_exceeds_max() {
        let (mut accounts, mut fees, chain, txn) = setup(1_000);
        assert_eq!(
            Finalizer::new(&mut accounts, &mut fees, &chain).epilogue(&txn, 101),
            Err(AccountError::OutOfGas)
        );
        assert_eq!(accounts.get_sequence_number(&txn.sender).unwrap(), 0);
    }

    #[test]
    fn test_fee_overflow() {
        let (mut accounts, mut fees, chain, mut txn) = setup(1_000);
        txn.gas_price = u64::MAX;
        assert_eq!(
            Finalizer::new(&mut accounts, &mut fees, &chain).epilogue(&txn, 0),
            Err(AccountError::OutOfGas)
        );
    }

    #[test]
    fn test_balance_drained_during_execution() {
        let (mut accounts, mut fees, chain, txn) = setup(100);
        assert_eq!(
            Finalizer::new(&mut accounts, &mut fees, &chain).epilogue(&txn, 0),
            Err(AccountError::CannotPayGas)
        );
        assert_eq!(fees.get_balance(&txn.sender, &chain.fee_asset), 100);
        assert_eq!(accounts.get_sequence_number(&txn.sender).unwrap(), 0);
    }

    #[test]
    fn test_sequence_too_big_charges_nothing() {
        let (mut accounts, mut fees, chain, txn) = setup(1_000);
        accounts.account_mut(&txn.sender).unwrap().sequence_number = u64::MAX;
        assert_eq!(
            Finalizer::new(&mut accounts, &mut fees, &chain).epilogue(&txn, 0),
            Err(AccountError::SequenceTooBig)
        );
        assert_eq!(fees.get_balance(&txn.sender, &chain.fee_asset), 1_000);
    }

    #[test]
    fn test_rejected_burn_leaves_sequence() {
        let (mut accounts, _, chain, txn) = setup(0);
        let mut frozen = FrozenLedger;
        assert_eq!(
            Finalizer::new(&mut accounts, &mut frozen, &chain).epilogue(&txn, 0),
            Err(AccountError::CannotPayGas)
        );
        assert_eq!(accounts.get_sequence_number(&txn.sender).unwrap(), 0);
    }

    #[test]
    fn test_zero_gas_used() {
        let (mut accounts, mut fees, chain, txn) = setup(0);
        let fee = Finalizer::new(&mut accounts, &mut fees, &chain)
            .epilogue(&txn, 100)
            .unwrap();
        assert_eq!(fee, 0);
        assert_eq!(accounts.get_sequence_number(&txn.sender).unwrap(), 1);
    }

    #[test]
    fn test_writeset_epilogue_always_denied() {
        let (mut accounts, mut fees, chain, txn) = setup(1_000);
        assert_eq!(
            Finalizer::new(&mut accounts, &mut fees, &chain).writeset_epilogue(&txn),
            Err(AccountError::PermissionDenied)
        );
        assert_eq!(accounts.get_sequence_number(&txn.sender).unwrap(), 0);
    }
}
