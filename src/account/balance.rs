//! Balance tracking: the fee-accounting collaborator the prologue and epilogue consult

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use super::types::{Address, Asset};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BalanceError {
    #[error("Insufficient funds")]
    InsufficientFunds,
    #[error("Account not registered for {0}")]
    NotRegistered(Asset),
    #[error("Balance overflow")]
    Overflow,
}

/// What admission and finalization need from the fee ledger.
pub trait FeeLedger {
    fn is_registered(&self, account: &Address, asset: &Asset) -> bool;
    fn balance(&self, account: &Address, asset: &Asset) -> u64;
    /// Remove `amount` from circulation.
    fn burn(&mut self, account: &Address, asset: &Asset, amount: u64) -> Result<(), BalanceError>;
}

/// Balance store for all accounts and assets
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BalanceStore {
    /// Map of (Address, Asset) -> Balance
    balances: HashMap<(Address, Asset), u64>,
    registered: HashSet<(Address, Asset)>,
    burned: HashMap<Asset, u64>,
}

impl BalanceStore {
    /// Create a new empty balance store
    pub fn new() -> Self {
        Self::default()
    }

    /// Opt `account` into holding `asset`. Returns false if it already was.
    pub fn register(&mut self, account: &Address, asset: &Asset) -> bool {
        self.registered.insert((*account, asset.clone()))
    }

    /// Get balance for an account and asset
    pub fn get_balance(&self, account: &Address, asset: &Asset) -> u64 {
        self.balances
            .get(&(*account, asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Credit (add) balance to a registered account
    pub fn credit(&mut self, account: &Address, asset: &Asset, amount: u64) -> Result<(), BalanceError> {
        if !self.is_registered(account, asset) {
            return Err(BalanceError::NotRegistered(asset.clone()));
        }
        if amount == 0 {
            return Ok(());
        }

        let key = (*account, asset.clone());
        let current = self.balances.get(&key).copied().unwrap_or(0);

        // Check for overflow
        let new_balance = current.checked_add(amount).ok_or(BalanceError::Overflow)?;

        self.balances.insert(key, new_balance);
        Ok(())
    }

    /// Debit (subtract) balance from an account
    pub fn debit(&mut self, account: &Address, asset: &Asset, amount: u64) -> Result<(), BalanceError> {
        if amount == 0 {
            return Ok(());
        }

        let key = (*account, asset.clone());
        let current = self.balances.get(&key).copied().unwrap_or(0);

        if current < amount {
            return Err(BalanceError::InsufficientFunds);
        }

        let new_balance = current - amount;
        if new_balance == 0 {
            self.balances.remove(&key);
        } else {
            self.balances.insert(key, new_balance);
        }

        Ok(())
    }

    /// Transfer balance from one account to another
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        asset: &Asset,
        amount: u64,
    ) -> Result<(), BalanceError> {
        if !self.is_registered(to, asset) {
            return Err(BalanceError::NotRegistered(asset.clone()));
        }
        let to_balance = self.get_balance(to, asset);
        if from != to && to_balance.checked_add(amount).is_none() {
            return Err(BalanceError::Overflow);
        }
        self.debit(from, asset, amount)?;
        self.credit(to, asset, amount)
    }

    /// Get total supply of an asset
    pub fn total_supply(&self, asset: &Asset) -> u64 {
        self.balances
            .iter()
            .filter(|((_, ast), _)| ast == asset)
            .map(|(_, balance)| balance)
            .sum()
    }

    /// Total removed from circulation by fee burns.
    pub fn total_burned(&self, asset: &Asset) -> u64 {
        self.burned.get(asset).copied().unwrap_or(0)
    }
}

impl FeeLedger for BalanceStore {
    fn is_registered(&self, account: &Address, asset: &Asset) -> bool {
        self.registered.contains(&(*account, asset.clone()))
    }

    fn balance(&self, account: &Address, asset: &Asset) -> u64 {
        self.get_balance(account, asset)
    }

    fn burn(&mut self, account: &Address, asset: &Asset, amount: u64) -> Result<(), BalanceError> {
        self.debit(account, asset, amount)?;
        let burned = self.burned.entry(asset.clone()).or_insert(0);
        *burned = burned.saturating_add(amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compass() -> Asset {
        "COMPASS".to_string()
    }

    #[test]
    fn test_balance_operations() {
        let mut store = BalanceStore::new();
        let alice = Address::from_low_byte(0xa1);

        // unregistered accounts cannot receive
        assert_eq!(
            store.credit(&alice, &compass(), 1000),
            Err(BalanceError::NotRegistered(compass()))
        );

        assert!(store.register(&alice, &compass()));
        assert!(!store.register(&alice, &compass()));
        store.credit(&alice, &compass(), 1000).unwrap();
        assert_eq!(store.get_balance(&alice, &compass()), 1000);

        store.debit(&alice, &compass(), 300).unwrap();
        assert_eq!(store.get_balance(&alice, &compass()), 700);

        // Test insufficient funds
        assert_eq!(
            store.debit(&alice, &compass(), 1000),
            Err(BalanceError::InsufficientFunds)
        );
    }

    #[test]
    fn test_transfer() {
        let mut store = BalanceStore::new();
        let alice = Address::from_low_byte(0xa1);
        let bob = Address::from_low_byte(0xb0);
        store.register(&alice, &compass());
        store.credit(&alice, &compass(), 1000).unwrap();

        assert_eq!(
            store.transfer(&alice, &bob, &compass(), 400),
            Err(BalanceError::NotRegistered(compass()))
        );
        store.register(&bob, &compass());
        store.transfer(&alice, &bob, &compass(), 400).unwrap();

        assert_eq!(store.get_balance(&alice, &compass()), 600);
        assert_eq!(store.get_balance(&bob, &compass()), 400);
        assert_eq!(store.total_supply(&compass()), 1000);
    }

    #[test]
    fn test_burn_reduces_supply() {
        let mut store = BalanceStore::new();
        let alice = Address::from_low_byte(0xa1);
        store.register(&alice, &compass());
        store.credit(&alice, &compass(), 100).unwrap();

        store.burn(&alice, &compass(), 30).unwrap();
        assert_eq!(store.balance(&alice, &compass()), 70);
        assert_eq!(store.total_supply(&compass()), 70);
        assert_eq!(store.total_burned(&compass()), 30);
        assert!(store.burn(&alice, &compass(), 71).is_err());
    }
}
