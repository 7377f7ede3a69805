use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::account::types::Address;
use crate::error::AccountError;

/// Address-to-address table backing the originating-address index.
pub trait Table {
    fn get(&self, key: &Address) -> Result<Option<Address>, AccountError>;
    fn insert(&mut self, key: Address, value: Address) -> Result<(), AccountError>;
    fn remove(&mut self, key: &Address) -> Result<Option<Address>, AccountError>;

    fn contains(&self, key: &Address) -> Result<bool, AccountError> {
        Ok(self.get(key)?.is_some())
    }

    /// Make every write so far durable. No-op for in-memory tables.
    fn flush(&self) -> Result<(), AccountError> {
        Ok(())
    }
}

#[derive(Default, Debug)]
pub struct MemoryTable {
    entries: HashMap<Address, Address>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Table for MemoryTable {
    fn get(&self, key: &Address) -> Result<Option<Address>, AccountError> {
        Ok(self.entries.get(key).copied())
    }

    fn insert(&mut self, key: Address, value: Address) -> Result<(), AccountError> {
        self.entries.insert(key, value);
        Ok(())
    }

    fn remove(&mut self, key: &Address) -> Result<Option<Address>, AccountError> {
        Ok(self.entries.remove(key))
    }
}

/// Persistent table on a sled tree.
pub struct SledTable {
    tree: sled::Tree,
}

fn storage_err(e: impl std::fmt::Display) -> AccountError {
    AccountError::Storage(e.to_string())
}

impl SledTable {
    const TREE: &'static str = "originating_address";

    pub fn open(path: impl AsRef<Path>) -> Result<Self, AccountError> {
        let db = sled::open(path).map_err(storage_err)?;
        Self::from_db(&db)
    }

    /// Throwaway database, removed on drop.
    pub fn temporary() -> Result<Self, AccountError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(storage_err)?;
        Self::from_db(&db)
    }

    fn from_db(db: &sled::Db) -> Result<Self, AccountError> {
        let tree = db.open_tree(Self::TREE).map_err(storage_err)?;
        Ok(Self { tree })
    }

    // Generic Helper: Put
    fn put<T: Serialize>(&self, key: &Address, value: &T) -> Result<(), AccountError> {
        let serialized = bincode::serialize(value).map_err(storage_err)?;
        self.tree
            .insert(key.as_bytes(), serialized)
            .map_err(storage_err)?;
        Ok(())
    }

    fn decode<T: for<'a> Deserialize<'a>>(data: &[u8]) -> Result<T, AccountError> {
        bincode::deserialize(data).map_err(storage_err)
    }
}

impl Table for SledTable {
    fn get(&self, key: &Address) -> Result<Option<Address>, AccountError> {
        match self.tree.get(key.as_bytes()).map_err(storage_err)? {
            Some(data) => Ok(Some(Self::decode(&data)?)),
            None => Ok(None),
        }
    }

    fn insert(&mut self, key: Address, value: Address) -> Result<(), AccountError> {
        self.put(&key, &value)
    }

    fn remove(&mut self, key: &Address) -> Result<Option<Address>, AccountError> {
        match self.tree.remove(key.as_bytes()).map_err(storage_err)? {
            Some(data) => Ok(Some(Self::decode(&data)?)),
            None => Ok(None),
        }
    }

    fn flush(&self) -> Result<(), AccountError> {
        self.tree.flush().map_err(storage_err)?;
        Ok(())
    }
}
