pub mod keys;
pub mod local;

use clap::{Parser, Subcommand};

use crate::account::store::create_resource_address;
use crate::account::types::Address;
use crate::account::RotationProof;
use crate::config::AccountsConfig;
use crate::crypto::{authentication_key_from_public_key, ensure_length, KeyPair, PUBLIC_KEY_LENGTH};
use crate::encoding::CanonicalSerialize;
use crate::error::AccountError;
use crate::ledger::LedgerError;

#[derive(Parser)]
#[command(name = "compass-accounts")]
#[command(about = "Compass account identity tooling", long_about = None)]
pub struct Cli {
    /// Path to the TOML config (created with defaults if missing)
    #[arg(long, default_value = "accounts.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Key management
    Keys {
        #[command(subcommand)]
        cmd: keys::KeysCommands,
    },
    /// Authentication key for an Ed25519 public key
    AuthKey {
        #[arg(long)]
        public_key: String,
    },
    /// Address of the resource account `creator` would get for `seed`
    ResourceAddress {
        #[arg(long)]
        creator: String,
        #[arg(long)]
        seed: String,
    },
    /// Bytes both rotation signatures must cover
    RotationMessage {
        #[arg(long)]
        sequence_number: u64,
        #[arg(long)]
        originator: String,
        #[arg(long)]
        current_auth_key: String,
        #[arg(long)]
        new_public_key: String,
    },
    /// Account an authentication key was rotated onto (reads the configured index)
    Originator {
        #[arg(long)]
        auth_key: String,
    },
    /// Fund a local account and rotate it from one mnemonic's key to another's
    LocalRotate {
        #[arg(long)]
        mnemonic: String,
        #[arg(long)]
        new_mnemonic: String,
        #[arg(long, default_value_t = 1_000)]
        fund: u64,
    },
}

fn decode_hex(what: &str, s: &str) -> Result<Vec<u8>, AccountError> {
    hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| AccountError::MalformedInput(format!("{}: {}", what, e)))
}

pub fn run(command: Commands, config: &AccountsConfig) -> Result<(), LedgerError> {
    match command {
        Commands::Keys { cmd } => keys::handle_keys_command(cmd)?,
        Commands::AuthKey { public_key } => {
            let pk = decode_hex("public key", &public_key)?;
            ensure_length("public key", &pk, PUBLIC_KEY_LENGTH)?;
            println!("{}", hex::encode(authentication_key_from_public_key(&pk)));
        }
        Commands::ResourceAddress { creator, seed } => {
            let creator: Address = creator.parse()?;
            println!("{}", create_resource_address(&creator, seed.as_bytes()));
        }
        Commands::RotationMessage {
            sequence_number,
            originator,
            current_auth_key,
            new_public_key,
        } => {
            let new_public_key = decode_hex("new public key", &new_public_key)?;
            ensure_length("new public key", &new_public_key, PUBLIC_KEY_LENGTH)?;
            let proof = RotationProof {
                sequence_number,
                originator: originator.parse()?,
                current_auth_key: current_auth_key.parse()?,
                new_public_key,
            };
            println!("{}", hex::encode(proof.to_bytes()));
        }
        Commands::Originator { auth_key } => {
            let auth_key: Address = auth_key.parse()?;
            match local::originator(config, &auth_key)? {
                Some(account) => println!("{}", account),
                None => println!("No account has rotated onto {}", auth_key),
            }
        }
        Commands::LocalRotate {
            mnemonic,
            new_mnemonic,
            fund,
        } => {
            let current = KeyPair::from_mnemonic(mnemonic.trim())?;
            let next = KeyPair::from_mnemonic(new_mnemonic.trim())?;
            let report = local::rotate(config, &current, &next, fund)?;
            println!("Account:            {}", report.account);
            println!("Authentication Key: {}", hex::encode(&report.new_authentication_key));
            println!("Fee:                {}", report.fee);
            println!("Supply / Burned:    {} / {}", report.supply, report.burned);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rotation_message_args() {
        let new_public_key = "ab".repeat(32);
        let cli = Cli::try_parse_from([
            "compass-accounts",
            "rotation-message",
            "--sequence-number",
            "3",
            "--originator",
            "0x42",
            "--current-auth-key",
            "0x42",
            "--new-public-key",
            new_public_key.as_str(),
        ])
        .unwrap();
        assert_eq!(cli.config, "accounts.toml");
        assert!(run(cli.command, &AccountsConfig::default()).is_ok());
    }

    #[test]
    fn test_auth_key_rejects_short_key() {
        let result = run(
            Commands::AuthKey {
                public_key: "abcd".to_string(),
            },
            &AccountsConfig::default(),
        );
        assert!(matches!(
            result,
            Err(LedgerError::Account(AccountError::MalformedInput(_)))
        ));
    }

    #[test]
    fn test_local_rotate_from_mnemonics() {
        let mnemonic = KeyPair::generate_mnemonic().unwrap();
        let new_mnemonic = KeyPair::generate_mnemonic().unwrap();
        let cli = Cli::try_parse_from([
            "compass-accounts",
            "local-rotate",
            "--mnemonic",
            mnemonic.as_str(),
            "--new-mnemonic",
            new_mnemonic.as_str(),
        ])
        .unwrap();
        assert!(run(cli.command, &AccountsConfig::default()).is_ok());
    }

    #[test]
    fn test_originator_without_index() {
        let result = run(
            Commands::Originator {
                auth_key: "0x42".to_string(),
            },
            &AccountsConfig::default(),
        );
        assert!(result.is_ok());
    }
}
