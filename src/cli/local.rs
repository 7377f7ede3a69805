//! Commands that run against a ledger opened from the config file.
//!
//! Accounts and balances live for one invocation; only the originating
//! address index persists, and only when `storage.originating_address_db` is set.

use tracing::info;

use crate::account::types::Address;
use crate::clock::SystemClock;
use crate::config::AccountsConfig;
use crate::crypto::KeyPair;
use crate::encoding::CanonicalSerialize;
use crate::ledger::{Ledger, LedgerError, Payload};

const TRANSACTION_TTL_SECS: u64 = 60;

fn open(config: &AccountsConfig) -> Result<Ledger, LedgerError> {
    Ok(Ledger::new(config, Box::new(SystemClock))?)
}

/// Account that `auth_key` was rotated onto, if any.
pub fn originator(config: &AccountsConfig, auth_key: &Address) -> Result<Option<Address>, LedgerError> {
    let ledger = open(config)?;
    Ok(ledger.accounts().originating_address(auth_key)?)
}

#[derive(Debug)]
pub struct RotationReport {
    pub account: Address,
    pub new_authentication_key: Vec<u8>,
    pub fee: u64,
    pub supply: u64,
    pub burned: u64,
}

/// Fund the account `current` controls, rotate it onto `next` in a single
/// transaction, then flush the index.
pub fn rotate(
    config: &AccountsConfig,
    current: &KeyPair,
    next: &KeyPair,
    fund: u64,
) -> Result<RotationReport, LedgerError> {
    let mut ledger = open(config)?;
    let account = Address::from_bytes(&current.authentication_key())?;
    ledger.fund(account, fund)?;

    let message = ledger
        .accounts()
        .rotation_proof(&account, &next.public_key())?
        .to_bytes();
    let payload = Payload::RotateAuthenticationKey {
        current_signature: current.sign(&message),
        next_signature: next.sign(&message),
        current_public_key: current.public_key(),
        new_public_key: next.public_key(),
    };
    let txn = ledger.build_transaction(&account, payload.gas_units(), TRANSACTION_TTL_SECS)?;
    let output = ledger.submit(&txn, payload)?;
    ledger.flush()?;
    info!(account = %account, fee = output.fee, "local rotation committed");

    let asset = &ledger.chain().fee_asset;
    Ok(RotationReport {
        account,
        new_authentication_key: ledger.accounts().get_authentication_key(&account)?,
        fee: output.fee,
        supply: ledger.balances().total_supply(asset),
        burned: ledger.balances().total_burned(asset),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccountError;

    #[test]
    fn test_rotate_in_memory() {
        let current = KeyPair::generate();
        let next = KeyPair::generate();
        let report = rotate(&AccountsConfig::default(), &current, &next, 1_000).unwrap();

        assert_eq!(report.account, Address::from_bytes(&current.authentication_key()).unwrap());
        assert_eq!(report.new_authentication_key, next.authentication_key());
        assert_eq!(report.fee, 30);
        assert_eq!(report.supply, 970);
        assert_eq!(report.burned, 30);
    }

    #[test]
    fn test_rotate_cannot_pay_gas() {
        let result = rotate(&AccountsConfig::default(), &KeyPair::generate(), &KeyPair::generate(), 29);
        assert_eq!(result.unwrap_err(), LedgerError::Account(AccountError::CannotPayGas));
    }

    #[test]
    fn test_originator_persists_across_runs() {
        let dir = std::env::temp_dir().join(format!("compass-accounts-local-{}", std::process::id()));
        let mut config = AccountsConfig::default();
        config.storage.originating_address_db = Some(dir.to_string_lossy().into_owned());

        let current = KeyPair::generate();
        let next = KeyPair::generate();
        let new_key = Address::from_bytes(&next.authentication_key()).unwrap();
        assert_eq!(originator(&config, &new_key).unwrap(), None);

        let report = rotate(&config, &current, &next, 1_000).unwrap();
        assert_eq!(originator(&config, &new_key).unwrap(), Some(report.account));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
