//! Account System Module
//!
//! Per-address identity records and everything that mutates them:
//! - registry (creation, accessors, resource accounts)
//! - capability offers (delegated signing and rotation)
//! - authentication key rotation with the originating-address index
//! - the fee ledger the transaction gate charges against

pub mod types;
pub mod store;
pub mod balance;
pub mod capability;
pub mod rotation;

pub use types::{Account, Address, Asset, RotationCapability, Signer, SignerCapability};
pub use store::{create_resource_address, AccountStore, ReservedAddresses};
pub use balance::{BalanceError, BalanceStore, FeeLedger};
pub use capability::{create_signer_with_capability, get_signer_capability_address};
pub use rotation::RotationProof;
