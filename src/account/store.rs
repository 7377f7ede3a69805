//! Account registry: creation and accessors for per-address identity records

use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use super::types::{Account, Address, Asset, CapabilityOffer, Signer, SignerCapability};
use crate::crypto::{sha3_256, AUTHENTICATION_KEY_LENGTH};
use crate::encoding::CanonicalSerialize;
use crate::error::AccountError;
use crate::events::{AccountEvent, EventHandle, EventLog, EventStore};
use crate::storage::{MemoryTable, Table};

/// Authentication key installed on resource accounts. No private key hashes to it.
pub const ZERO_AUTH_KEY: [u8; 32] = [0u8; 32];

/// Protocol-reserved identities that can never be created as ordinary accounts.
#[derive(Debug, Clone)]
pub struct ReservedAddresses {
    addrs: HashSet<Address>,
}

impl ReservedAddresses {
    pub fn new(addrs: impl IntoIterator<Item = Address>) -> Self {
        Self {
            addrs: addrs.into_iter().collect(),
        }
    }

    pub fn is_reserved(&self, addr: &Address) -> bool {
        self.addrs.contains(addr)
    }
}

impl Default for ReservedAddresses {
    fn default() -> Self {
        Self::new([Address::VM_RESERVED, Address::CORE_FRAMEWORK, Address::TOKEN])
    }
}

/// `SHA3-256(serialize(creator) || seed)`
pub fn create_resource_address(creator: &Address, seed: &[u8]) -> Address {
    let mut preimage = creator.to_bytes();
    preimage.extend_from_slice(seed);
    Address::new(sha3_256(&preimage))
}

/// Account store for managing all accounts
pub struct AccountStore {
    pub(super) accounts: HashMap<Address, Account>,
    pub(super) originating_address: Box<dyn Table>,
    pub(super) events: EventLog,
    reserved: ReservedAddresses,
}

impl AccountStore {
    /// Create a new empty account store with an in-memory reverse index
    pub fn new(reserved: ReservedAddresses) -> Self {
        Self::with_table(reserved, Box::new(MemoryTable::new()))
    }

    /// Create with a specific originating-address table (e.g. sled-backed)
    pub fn with_table(reserved: ReservedAddresses, table: Box<dyn Table>) -> Self {
        Self {
            accounts: HashMap::new(),
            originating_address: table,
            events: EventLog::new(),
            reserved,
        }
    }

    /// Create a new account at `addr`.
    pub fn create_account(&mut self, addr: Address) -> Result<Signer, AccountError> {
        if self.accounts.contains_key(&addr) {
            return Err(AccountError::AlreadyExists(addr));
        }
        if self.reserved.is_reserved(&addr) {
            return Err(AccountError::ReservedAddress(addr));
        }
        self.create_account_unchecked(addr)
    }

    fn create_account_unchecked(&mut self, addr: Address) -> Result<Signer, AccountError> {
        let authentication_key = addr.to_bytes();
        if authentication_key.len() != AUTHENTICATION_KEY_LENGTH {
            return Err(AccountError::MalformedInput(format!(
                "authentication key must be {} bytes",
                AUTHENTICATION_KEY_LENGTH
            )));
        }

        let account = Account {
            authentication_key,
            sequence_number: 0,
            guid_creation_num: 2,
            coin_register_events: EventHandle::new(addr, 0),
            key_rotation_events: EventHandle::new(addr, 1),
            rotation_capability_offer: CapabilityOffer::none(),
            signer_capability_offer: CapabilityOffer::none(),
        };
        self.accounts.insert(addr, account);
        info!(account = %addr, "account created");
        Ok(Signer::new(addr))
    }

    pub fn exists(&self, addr: &Address) -> bool {
        self.accounts.contains_key(addr)
    }

    /// Get account by address
    pub fn get(&self, addr: &Address) -> Option<&Account> {
        self.accounts.get(addr)
    }

    pub(crate) fn account(&self, addr: &Address) -> Result<&Account, AccountError> {
        self.accounts.get(addr).ok_or(AccountError::NotFound(*addr))
    }

    pub(crate) fn account_mut(&mut self, addr: &Address) -> Result<&mut Account, AccountError> {
        self.accounts
            .get_mut(addr)
            .ok_or(AccountError::NotFound(*addr))
    }

    pub fn get_sequence_number(&self, addr: &Address) -> Result<u64, AccountError> {
        Ok(self.account(addr)?.sequence_number)
    }

    pub fn get_authentication_key(&self, addr: &Address) -> Result<Vec<u8>, AccountError> {
        Ok(self.account(addr)?.authentication_key.clone())
    }

    pub fn get_guid_next_creation_num(&self, addr: &Address) -> Result<u64, AccountError> {
        Ok(self.account(addr)?.guid_creation_num)
    }

    /// Advance the replay counter. Only the epilogue calls this.
    pub(crate) fn increment_sequence_number(&mut self, addr: &Address) -> Result<u64, AccountError> {
        let account = self.account_mut(addr)?;
        if account.sequence_number == u64::MAX {
            return Err(AccountError::SequenceTooBig);
        }
        account.sequence_number += 1;
        Ok(account.sequence_number)
    }

    /// Mint a fresh event handle owned by `signer`'s account.
    pub fn new_event_handle(&mut self, signer: &Signer) -> Result<EventHandle, AccountError> {
        let addr = signer.address();
        let account = self.account_mut(&addr)?;
        let handle = EventHandle::new(addr, account.guid_creation_num);
        account.guid_creation_num += 1;
        Ok(handle)
    }

    /// Record that `addr` opted into holding `asset`.
    pub fn register_coin(&mut self, addr: &Address, asset: &Asset) -> Result<(), AccountError> {
        let account = self
            .accounts
            .get_mut(addr)
            .ok_or(AccountError::NotFound(*addr))?;
        self.events.append(
            &mut account.coin_register_events,
            AccountEvent::CoinRegister {
                asset: asset.clone(),
            },
        );
        debug!(account = %addr, asset = %asset, "coin registered");
        Ok(())
    }

    /// Create an account with no governing private key at the address derived
    /// from `source` and `seed`. The returned capability is the only way to act as it.
    ///
    /// An account already sitting at the derived address is taken over as long
    /// as it has never sent a transaction.
    pub fn create_resource_account(
        &mut self,
        source: &Signer,
        seed: &[u8],
    ) -> Result<SignerCapability, AccountError> {
        let resource = create_resource_address(&source.address(), seed);

        if let Some(existing) = self.accounts.get(&resource) {
            if existing.sequence_number != 0 {
                return Err(AccountError::AlreadyExists(resource));
            }
            let stale_key = Address::from_bytes(&existing.authentication_key)?;
            let stale_entry = self.originating_address.get(&stale_key)?;
            if matches!(stale_entry, Some(owner) if owner != resource) {
                return Err(AccountError::OriginatingAddressConflict);
            }
            if stale_entry.is_some() {
                self.originating_address.remove(&stale_key)?;
            }
            info!(account = %resource, "taking over pre-existing resource address");
        } else {
            if self.reserved.is_reserved(&resource) {
                return Err(AccountError::ReservedAddress(resource));
            }
            self.create_account_unchecked(resource)?;
        }

        let account = self.account_mut(&resource)?;
        account.authentication_key = ZERO_AUTH_KEY.to_vec();
        // Grants made by whoever held the address before are void.
        account.signer_capability_offer = CapabilityOffer::none();
        account.rotation_capability_offer = CapabilityOffer::none();
        info!(source = %source.address(), account = %resource, "resource account created");
        Ok(SignerCapability::new(resource))
    }

    /// Persist the originating-address index.
    pub fn flush(&self) -> Result<(), AccountError> {
        self.originating_address.flush()
    }

    /// Events appended so far (read side of the event log collaborator).
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Executor entry: the identity a validated transaction runs as.
    pub(crate) fn create_signer(&self, addr: &Address) -> Result<Signer, AccountError> {
        self.account(addr)?;
        Ok(Signer::new(*addr))
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new(ReservedAddresses::default())
    }
}
