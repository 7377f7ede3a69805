//! Account type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::error::AccountError;
use crate::events::EventHandle;

/// Asset identifier (COMPASS, cBTC, ...)
pub type Asset = String;

/// 32-byte account address.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    pub const LENGTH: usize = 32;

    pub const VM_RESERVED: Address = Address::from_low_byte(0x0);
    pub const CORE_FRAMEWORK: Address = Address::from_low_byte(0x1);
    pub const TOKEN: Address = Address::from_low_byte(0x3);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    /// `0x<n>` shorthand used for well-known system addresses.
    pub const fn from_low_byte(b: u8) -> Self {
        let mut bytes = [0u8; 32];
        bytes[31] = b;
        Address(bytes)
    }

    /// Interpret arbitrary bytes (e.g. an authentication key) as an address.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AccountError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            AccountError::MalformedInput(format!(
                "address must be {} bytes, got {}",
                Self::LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Address(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = AccountError;

    /// Accepts `0x`-prefixed or bare hex; short forms are left-padded with zeros.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() || digits.len() > 64 {
            return Err(AccountError::MalformedInput(format!("bad address: {}", s)));
        }
        let padded = format!("{:0>64}", digits);
        let bytes = hex::decode(&padded)
            .map_err(|e| AccountError::MalformedInput(format!("bad address {}: {}", s, e)))?;
        Address::from_bytes(&bytes)
    }
}

/// Kind marker for rotation capability offers.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RotationKind;

/// Kind marker for signer capability offers.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SignerKind;

/// At most one outstanding grant of a capability kind.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(bound = "")]
pub struct CapabilityOffer<K> {
    pub for_address: Option<Address>,
    #[serde(skip)]
    kind: PhantomData<K>,
}

impl<K> CapabilityOffer<K> {
    pub fn none() -> Self {
        Self {
            for_address: None,
            kind: PhantomData,
        }
    }

    pub fn is_offered(&self) -> bool {
        self.for_address.is_some()
    }
}

impl<K> Default for CapabilityOffer<K> {
    fn default() -> Self {
        Self::none()
    }
}

/// Per-address identity record.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Account {
    pub authentication_key: Vec<u8>,
    pub sequence_number: u64,
    pub guid_creation_num: u64,
    pub coin_register_events: EventHandle,
    pub key_rotation_events: EventHandle,
    pub rotation_capability_offer: CapabilityOffer<RotationKind>,
    pub signer_capability_offer: CapabilityOffer<SignerKind>,
}

/// The acting identity of a transaction or payload.
///
/// Only the executor (or a redeemed [`SignerCapability`]) can produce one.
#[derive(Debug, PartialEq, Eq)]
pub struct Signer {
    address: Address,
}

impl Signer {
    pub(crate) fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

/// Grants the holder the ability to act as `account`.
#[derive(Debug, PartialEq, Eq)]
pub struct SignerCapability {
    account: Address,
}

impl SignerCapability {
    pub(crate) fn new(account: Address) -> Self {
        Self { account }
    }

    pub fn account(&self) -> Address {
        self.account
    }
}

/// Grants the holder the ability to rotate `account`'s authentication key.
#[derive(Debug, PartialEq, Eq)]
pub struct RotationCapability {
    account: Address,
}

impl RotationCapability {
    pub(crate) fn new(account: Address) -> Self {
        Self { account }
    }

    pub fn account(&self) -> Address {
        self.account
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_address() {
        let addr: Address = "0x1".parse().unwrap();
        assert_eq!(addr, Address::CORE_FRAMEWORK);
        assert_eq!(
            addr.to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("0xzz".parse::<Address>().is_err());
        assert!("".parse::<Address>().is_err());
        assert!(format!("0x{}", "1".repeat(65)).parse::<Address>().is_err());
    }

    #[test]
    fn test_from_bytes_length() {
        assert!(Address::from_bytes(&[0u8; 32]).is_ok());
        assert!(matches!(
            Address::from_bytes(&[0u8; 31]),
            Err(AccountError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_offer_default_is_empty() {
        let offer: CapabilityOffer<SignerKind> = CapabilityOffer::default();
        assert!(!offer.is_offered());
    }
}
