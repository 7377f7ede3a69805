//! Minimal executor: admission, payload, finalization, strictly in that order.
//!
//! Payloads are the handful of account operations a transaction can invoke
//! directly. Gas is a flat cost per payload kind.

use thiserror::Error;
use tracing::info;

use crate::account::balance::{BalanceError, BalanceStore, FeeLedger};
use crate::account::store::AccountStore;
use crate::account::types::{Address, Signer};
use crate::clock::TimeSource;
use crate::config::{AccountsConfig, ChainConfig};
use crate::error::AccountError;
use crate::storage::{MemoryTable, SledTable, Table};
use crate::transaction::{AdmissionController, Finalizer, TransactionMetadata};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error("Balance error: {0}")]
    Balance(#[from] BalanceError),
}

impl LedgerError {
    /// Abort code of the underlying account error. Balance errors have none.
    pub fn code(&self) -> Option<u64> {
        match self {
            LedgerError::Account(e) => Some(e.code()),
            LedgerError::Balance(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Transfer {
        to: Address,
        amount: u64,
    },
    CreateAccount {
        address: Address,
    },
    RotateAuthenticationKey {
        current_signature: Vec<u8>,
        next_signature: Vec<u8>,
        current_public_key: Vec<u8>,
        new_public_key: Vec<u8>,
    },
    OfferSignerCapability {
        recipient: Address,
    },
    RevokeSignerCapability {
        recipient: Address,
    },
}

impl Payload {
    pub fn gas_units(&self) -> u64 {
        match self {
            Payload::Transfer { .. } => 10,
            Payload::CreateAccount { .. } => 20,
            Payload::RotateAuthenticationKey { .. } => 30,
            Payload::OfferSignerCapability { .. } | Payload::RevokeSignerCapability { .. } => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionOutput {
    pub gas_used: u64,
    pub fee: u64,
}

pub struct Ledger {
    accounts: AccountStore,
    balances: BalanceStore,
    chain: ChainConfig,
    clock: Box<dyn TimeSource>,
}

impl Ledger {
    pub fn new(config: &AccountsConfig, clock: Box<dyn TimeSource>) -> Result<Self, AccountError> {
        let table: Box<dyn Table> = match &config.storage.originating_address_db {
            Some(path) => {
                info!("Persistence: Opening originating address index at '{}'", path);
                Box::new(SledTable::open(path)?)
            }
            None => Box::new(MemoryTable::new()),
        };
        Ok(Self {
            accounts: AccountStore::with_table(config.chain.reserved()?, table),
            balances: BalanceStore::new(),
            chain: config.chain.clone(),
            clock,
        })
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn balances(&self) -> &BalanceStore {
        &self.balances
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    /// Single-signer transaction for `sender` at its current sequence number,
    /// priced at 1 per gas unit and valid for `ttl_secs` from now.
    pub fn build_transaction(
        &self,
        sender: &Address,
        max_gas_units: u64,
        ttl_secs: u64,
    ) -> Result<TransactionMetadata, AccountError> {
        Ok(TransactionMetadata {
            sender: *sender,
            authentication_key: self.accounts.get_authentication_key(sender)?,
            sequence_number: self.accounts.get_sequence_number(sender)?,
            gas_price: 1,
            max_gas_units,
            expiration_time_secs: self.clock.now_seconds().saturating_add(ttl_secs),
            chain_id: self.chain.chain_id,
            secondary_signers: vec![],
            secondary_authentication_keys: vec![],
        })
    }

    pub fn flush(&self) -> Result<(), AccountError> {
        self.accounts.flush()
    }

    pub fn balance(&self, addr: &Address) -> u64 {
        self.balances.get_balance(addr, &self.chain.fee_asset)
    }

    /// Genesis-style mint: create `addr` if needed and credit it directly.
    pub fn fund(&mut self, addr: Address, amount: u64) -> Result<(), LedgerError> {
        if !self.accounts.exists(&addr) {
            self.accounts.create_account(addr)?;
        }
        self.ensure_registered(&addr)?;
        self.balances.credit(&addr, &self.chain.fee_asset, amount)?;
        Ok(())
    }

    fn ensure_registered(&mut self, addr: &Address) -> Result<(), AccountError> {
        if self.balances.register(addr, &self.chain.fee_asset) {
            self.accounts.register_coin(addr, &self.chain.fee_asset)?;
        }
        Ok(())
    }

    /// Run one transaction through prologue, payload and epilogue.
    pub fn submit(
        &mut self,
        txn: &TransactionMetadata,
        payload: Payload,
    ) -> Result<TransactionOutput, LedgerError> {
        {
            let admission =
                AdmissionController::new(&self.accounts, &self.balances, &self.chain, &*self.clock);
            if txn.is_multi_agent() {
                admission.multi_agent_prologue(txn)?;
            } else {
                admission.prologue(txn)?;
            }
        }

        let gas_used = payload.gas_units();
        if gas_used > txn.max_gas_units {
            return Err(AccountError::OutOfGas.into());
        }
        // The prologue bounded gas_price * max_gas_units, so this cannot overflow.
        let fee = txn
            .gas_price
            .checked_mul(gas_used)
            .ok_or(AccountError::CannotPayGas)?;
        let signer = self.accounts.create_signer(&txn.sender)?;
        self.execute(&signer, payload, fee)?;

        let fee = Finalizer::new(&mut self.accounts, &mut self.balances, &self.chain)
            .epilogue(txn, txn.max_gas_units - gas_used)?;
        Ok(TransactionOutput { gas_used, fee })
    }

    /// Apply `payload`. Nothing it does may leave the sender unable to cover
    /// `fee`, since the epilogue must not fail once effects are committed.
    fn execute(&mut self, signer: &Signer, payload: Payload, fee: u64) -> Result<(), LedgerError> {
        match payload {
            Payload::Transfer { to, amount } => {
                let from = signer.address();
                let spendable = self
                    .balances
                    .balance(&from, &self.chain.fee_asset)
                    .saturating_sub(fee);
                if spendable < amount {
                    return Err(BalanceError::InsufficientFunds.into());
                }
                if !self.accounts.exists(&to) {
                    self.accounts.create_account(to)?;
                }
                self.ensure_registered(&to)?;
                self.balances.transfer(&from, &to, &self.chain.fee_asset, amount)?;
            }
            Payload::CreateAccount { address } => {
                self.accounts.create_account(address)?;
            }
            Payload::RotateAuthenticationKey {
                current_signature,
                next_signature,
                current_public_key,
                new_public_key,
            } => {
                self.accounts.rotate_authentication_key(
                    signer,
                    &current_signature,
                    &next_signature,
                    &current_public_key,
                    &new_public_key,
                )?;
            }
            Payload::OfferSignerCapability { recipient } => {
                self.accounts.offer_signer_capability(signer, recipient)?;
            }
            Payload::RevokeSignerCapability { recipient } => {
                self.accounts.revoke_signer_capability(signer, recipient)?;
            }
        }
        Ok(())
    }
}
