//! Authentication key rotation and the originating-address reverse index.
//!
//! A rotation needs proof of possession of both the installed key and the
//! proposed key, each a signature over the same [`RotationProof`]. All checks
//! run before the first write.

use std::io::{self, Write};
use tracing::{debug, info, warn};

use super::store::AccountStore;
use super::types::{Address, RotationCapability, Signer};
use crate::crypto::{
    authentication_key_from_public_key, ensure_length, verify_ed25519, PUBLIC_KEY_LENGTH,
    SIGNATURE_LENGTH,
};
use crate::encoding::CanonicalSerialize;
use crate::error::AccountError;
use crate::events::{AccountEvent, EventStore};

const PROOF_MODULE: &str = "account";
const PROOF_STRUCT: &str = "RotationProofChallenge";

/// The message both rotation signatures cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationProof {
    pub sequence_number: u64,
    pub originator: Address,
    pub current_auth_key: Address,
    pub new_public_key: Vec<u8>,
}

impl CanonicalSerialize for RotationProof {
    fn canonical_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        // type tag keeps these signatures from being valid for any other message
        Address::CORE_FRAMEWORK.canonical_serialize(writer)?;
        PROOF_MODULE.to_string().canonical_serialize(writer)?;
        PROOF_STRUCT.to_string().canonical_serialize(writer)?;
        self.sequence_number.canonical_serialize(writer)?;
        self.originator.canonical_serialize(writer)?;
        self.current_auth_key.canonical_serialize(writer)?;
        self.new_public_key.canonical_serialize(writer)
    }
}

impl AccountStore {
    /// Build the proof a rotation of `addr` to `new_public_key` must be signed over.
    pub fn rotation_proof(&self, addr: &Address, new_public_key: &[u8]) -> Result<RotationProof, AccountError> {
        let account = self.account(addr)?;
        Ok(RotationProof {
            sequence_number: account.sequence_number,
            originator: *addr,
            current_auth_key: Address::from_bytes(&account.authentication_key)?,
            new_public_key: new_public_key.to_vec(),
        })
    }

    /// Rotate `signer`'s authentication key to the one derived from `new_public_key`.
    pub fn rotate_authentication_key(
        &mut self,
        signer: &Signer,
        current_signature: &[u8],
        next_signature: &[u8],
        current_public_key: &[u8],
        new_public_key: &[u8],
    ) -> Result<(), AccountError> {
        let addr = signer.address();
        self.account(&addr)?;
        ensure_length("current public key", current_public_key, PUBLIC_KEY_LENGTH)?;
        ensure_length("new public key", new_public_key, PUBLIC_KEY_LENGTH)?;
        ensure_length("current signature", current_signature, SIGNATURE_LENGTH)?;
        ensure_length("next signature", next_signature, SIGNATURE_LENGTH)?;

        let stored = self.get_authentication_key(&addr)?;
        if authentication_key_from_public_key(current_public_key) != stored {
            return Err(AccountError::WrongCurrentPublicKey);
        }

        debug!(account = %addr, "verifying rotation proof");
        let proof = self.rotation_proof(&addr, new_public_key)?;
        let message = proof.to_bytes();
        if !verify_ed25519(current_public_key, &message, current_signature) {
            warn!(account = %addr, "rotation rejected: current key proof");
            return Err(AccountError::Unverified);
        }
        if !verify_ed25519(new_public_key, &message, next_signature) {
            warn!(account = %addr, "rotation rejected: new key proof");
            return Err(AccountError::Unverified);
        }

        self.commit_rotation(&addr, proof.current_auth_key, new_public_key)
    }

    /// Rotate `offerer`'s key on its behalf. `delegate` must hold a live
    /// rotation offer, and the new key must sign the offerer's rotation proof.
    pub fn rotate_authentication_key_with_rotation_capability(
        &mut self,
        delegate: &Signer,
        offerer: Address,
        new_public_key: &[u8],
        cap_update_table: &[u8],
    ) -> Result<(), AccountError> {
        let cap = self.create_rotation_capability(delegate, offerer)?;
        ensure_length("new public key", new_public_key, PUBLIC_KEY_LENGTH)?;
        ensure_length("cap update table", cap_update_table, SIGNATURE_LENGTH)?;
        self.rotate_with_capability(&cap, new_public_key, cap_update_table)
    }

    fn rotate_with_capability(
        &mut self,
        cap: &RotationCapability,
        new_public_key: &[u8],
        signature: &[u8],
    ) -> Result<(), AccountError> {
        let addr = cap.account();
        let proof = self.rotation_proof(&addr, new_public_key)?;
        if !verify_ed25519(new_public_key, &proof.to_bytes(), signature) {
            warn!(account = %addr, "delegated rotation rejected: new key proof");
            return Err(AccountError::Unverified);
        }
        self.commit_rotation(&addr, proof.current_auth_key, new_public_key)
    }

    fn commit_rotation(
        &mut self,
        addr: &Address,
        current_auth_key: Address,
        new_public_key: &[u8],
    ) -> Result<(), AccountError> {
        let new_auth_key = authentication_key_from_public_key(new_public_key);
        let new_address = Address::from_bytes(&new_auth_key)?;

        // Index checks come before any write.
        let current_entry = self.originating_address.get(&current_auth_key)?;
        if matches!(current_entry, Some(owner) if owner != *addr) {
            return Err(AccountError::OriginatingAddressConflict);
        }
        if new_address != current_auth_key {
            if let Some(owner) = self.originating_address.get(&new_address)? {
                if owner != *addr {
                    return Err(AccountError::OriginatingAddressConflict);
                }
            }
        }

        if current_entry.is_some() {
            self.originating_address.remove(&current_auth_key)?;
        }
        self.originating_address.insert(new_address, *addr)?;

        let account = self
            .accounts
            .get_mut(addr)
            .ok_or(AccountError::NotFound(*addr))?;
        let old_authentication_key =
            std::mem::replace(&mut account.authentication_key, new_auth_key.clone());
        self.events.append(
            &mut account.key_rotation_events,
            AccountEvent::KeyRotation {
                old_authentication_key,
                new_authentication_key: new_auth_key,
            },
        );
        info!(account = %addr, new_address = %new_address, "authentication key rotated");
        Ok(())
    }

    /// Recover the stable account identity from an address derived from its current key.
    pub fn originating_address(&self, derived: &Address) -> Result<Option<Address>, AccountError> {
        self.originating_address.get(derived)
    }
}
