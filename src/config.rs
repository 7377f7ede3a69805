use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::account::store::ReservedAddresses;
use crate::account::types::{Address, Asset};
use crate::error::AccountError;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AccountsConfig {
    pub chain: ChainConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Static chain identity the prologue and epilogue check against.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChainConfig {
    pub chain_id: u8,
    #[serde(default = "default_fee_asset")]
    pub fee_asset: Asset,
    #[serde(default = "default_reserved_addresses")]
    pub reserved_addresses: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StorageConfig {
    /// Sled path for the originating-address index. In-memory when unset.
    pub originating_address_db: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_fee_asset() -> Asset {
    "COMPASS".to_string()
}

fn default_reserved_addresses() -> Vec<String> {
    vec![
        Address::VM_RESERVED.to_hex(),
        Address::CORE_FRAMEWORK.to_hex(),
        Address::TOKEN.to_hex(),
    ]
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: 4,
            fee_asset: default_fee_asset(),
            reserved_addresses: default_reserved_addresses(),
        }
    }
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            storage: StorageConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl ChainConfig {
    pub fn reserved(&self) -> Result<ReservedAddresses, AccountError> {
        let addrs = self
            .reserved_addresses
            .iter()
            .map(|s| s.parse::<Address>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ReservedAddresses::new(addrs))
    }
}

impl AccountsConfig {
    pub fn load_or_default(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => {
                        info!("Config loaded from {}", path);
                        c
                    }
                    Err(e) => {
                        warn!("Error parsing config: {}. Using defaults.", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!("Error reading config: {}. Using defaults.", e);
                    Self::default()
                }
            }
        } else {
            info!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            match toml::to_string_pretty(&config) {
                Ok(s) => {
                    if let Err(e) = std::fs::write(path, s) {
                        warn!("Could not write default config: {}", e);
                    }
                }
                Err(e) => warn!("Could not serialize default config: {}", e),
            }
            config
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_toml() {
        let cfg: AccountsConfig = toml::from_str("[chain]\nchain_id = 7\n").unwrap();
        assert_eq!(cfg.chain.chain_id, 7);
        assert_eq!(cfg.chain.fee_asset, "COMPASS");
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.storage.originating_address_db.is_none());

        let reserved = cfg.chain.reserved().unwrap();
        assert!(reserved.is_reserved(&Address::CORE_FRAMEWORK));
        assert!(!reserved.is_reserved(&Address::from_low_byte(0x42)));
    }

    #[test]
    fn test_default_roundtrips_through_toml() {
        let s = toml::to_string_pretty(&AccountsConfig::default()).unwrap();
        let back: AccountsConfig = toml::from_str(&s).unwrap();
        assert_eq!(back.chain.reserved_addresses.len(), 3);
    }

    #[test]
    fn test_bad_reserved_address() {
        let cfg = ChainConfig {
            reserved_addresses: vec!["0xnope".to_string()],
            ..ChainConfig::default()
        };
        assert!(cfg.reserved().is_err());
    }
}
