//! Capability offers: delegating "act as" and "may rotate" to one other account.
//!
//! Offering again replaces the live grant. Revoking requires naming the
//! current grantee; `revoke_any_*` clears whatever is outstanding.

use tracing::info;

use super::store::AccountStore;
use super::types::{Address, RotationCapability, Signer, SignerCapability};
use crate::error::AccountError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Signer,
    Rotation,
}

impl AccountStore {
    fn offer_slot(&mut self, addr: &Address, kind: Kind) -> Result<&mut Option<Address>, AccountError> {
        let account = self.account_mut(addr)?;
        Ok(match kind {
            Kind::Signer => &mut account.signer_capability_offer.for_address,
            Kind::Rotation => &mut account.rotation_capability_offer.for_address,
        })
    }

    fn offered_to(&self, addr: &Address, kind: Kind) -> Result<Option<Address>, AccountError> {
        let account = self.account(addr)?;
        Ok(match kind {
            Kind::Signer => account.signer_capability_offer.for_address,
            Kind::Rotation => account.rotation_capability_offer.for_address,
        })
    }

    fn offer(&mut self, signer: &Signer, recipient: Address, kind: Kind) -> Result<(), AccountError> {
        if !self.exists(&recipient) {
            return Err(AccountError::NotFound(recipient));
        }
        let slot = self.offer_slot(&signer.address(), kind)?;
        let replaced = slot.replace(recipient);
        info!(
            offerer = %signer.address(),
            recipient = %recipient,
            kind = ?kind,
            replaced = ?replaced,
            "capability offered"
        );
        Ok(())
    }

    fn revoke(&mut self, signer: &Signer, recipient: Option<Address>, kind: Kind) -> Result<(), AccountError> {
        let slot = self.offer_slot(&signer.address(), kind)?;
        match (*slot, recipient) {
            (None, _) => return Err(AccountError::NoSuchOffer),
            (Some(current), Some(named)) if current != named => {
                return Err(AccountError::NoSuchOffer)
            }
            _ => {}
        }
        let revoked = slot.take();
        info!(offerer = %signer.address(), revoked = ?revoked, kind = ?kind, "capability revoked");
        Ok(())
    }

    pub fn offer_signer_capability(&mut self, signer: &Signer, recipient: Address) -> Result<(), AccountError> {
        self.offer(signer, recipient, Kind::Signer)
    }

    pub fn offer_rotation_capability(&mut self, signer: &Signer, recipient: Address) -> Result<(), AccountError> {
        self.offer(signer, recipient, Kind::Rotation)
    }

    pub fn revoke_signer_capability(&mut self, signer: &Signer, recipient: Address) -> Result<(), AccountError> {
        self.revoke(signer, Some(recipient), Kind::Signer)
    }

    pub fn revoke_rotation_capability(&mut self, signer: &Signer, recipient: Address) -> Result<(), AccountError> {
        self.revoke(signer, Some(recipient), Kind::Rotation)
    }

    pub fn revoke_any_signer_capability(&mut self, signer: &Signer) -> Result<(), AccountError> {
        self.revoke(signer, None, Kind::Signer)
    }

    pub fn revoke_any_rotation_capability(&mut self, signer: &Signer) -> Result<(), AccountError> {
        self.revoke(signer, None, Kind::Rotation)
    }

    pub fn is_signer_capability_offered(&self, addr: &Address) -> Result<bool, AccountError> {
        Ok(self.offered_to(addr, Kind::Signer)?.is_some())
    }

    pub fn is_rotation_capability_offered(&self, addr: &Address) -> Result<bool, AccountError> {
        Ok(self.offered_to(addr, Kind::Rotation)?.is_some())
    }

    pub fn get_signer_capability_offer_for(&self, addr: &Address) -> Result<Address, AccountError> {
        self.offered_to(addr, Kind::Signer)?
            .ok_or(AccountError::NoSuchOffer)
    }

    pub fn get_rotation_capability_offer_for(&self, addr: &Address) -> Result<Address, AccountError> {
        self.offered_to(addr, Kind::Rotation)?
            .ok_or(AccountError::NoSuchOffer)
    }

    /// Redeem a live signer offer from `offerer` to `grantee`.
    pub fn create_authorized_signer(
        &self,
        grantee: &Signer,
        offerer: Address,
    ) -> Result<SignerCapability, AccountError> {
        if self.offered_to(&offerer, Kind::Signer)? != Some(grantee.address()) {
            return Err(AccountError::NoSuchOffer);
        }
        Ok(SignerCapability::new(offerer))
    }

    /// Redeem a live rotation offer from `offerer` to `grantee`.
    pub fn create_rotation_capability(
        &self,
        grantee: &Signer,
        offerer: Address,
    ) -> Result<RotationCapability, AccountError> {
        if self.offered_to(&offerer, Kind::Rotation)? != Some(grantee.address()) {
            return Err(AccountError::NoSuchOffer);
        }
        Ok(RotationCapability::new(offerer))
    }
}

/// Act as the account the capability is bound to.
pub fn create_signer_with_capability(cap: &SignerCapability) -> Signer {
    Signer::new(cap.account())
}

pub fn get_signer_capability_address(cap: &SignerCapability) -> Address {
    cap.account()
}
