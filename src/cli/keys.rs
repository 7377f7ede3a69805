use clap::Subcommand;

use crate::account::types::Address;
use crate::crypto::KeyPair;
use crate::error::AccountError;

#[derive(Subcommand, Debug, Clone)]
pub enum KeysCommands {
    /// Generate a fresh key and print the account it would control
    Generate,
    /// Show the public key, authentication key and address for a mnemonic
    Inspect {
        #[clap(long)]
        mnemonic: String,
    },
    /// Sign a hex message (e.g. a rotation proof) with a mnemonic's key
    Sign {
        #[clap(long)]
        mnemonic: String,
        #[clap(long)]
        message: String,
    },
}

fn print_identity(keypair: &KeyPair) -> Result<(), AccountError> {
    let auth_key = keypair.authentication_key();
    println!("Public Key:         {}", keypair.public_key_hex());
    println!("Authentication Key: {}", hex::encode(&auth_key));
    println!("Address:            {}", Address::from_bytes(&auth_key)?);
    Ok(())
}

pub fn handle_keys_command(cmd: KeysCommands) -> Result<(), AccountError> {
    match cmd {
        KeysCommands::Generate => {
            let mnemonic = KeyPair::generate_mnemonic()?;
            let keypair = KeyPair::from_mnemonic(&mnemonic)?;
            print_identity(&keypair)?;
            println!("\n[SECRET MNEMONIC] - Write this down securely and NEVER share it:");
            println!("---------------------------------------------------------------");
            println!("{}", mnemonic);
            println!("---------------------------------------------------------------");
        }
        KeysCommands::Inspect { mnemonic } => {
            let keypair = KeyPair::from_mnemonic(mnemonic.trim())?;
            print_identity(&keypair)?;
        }
        KeysCommands::Sign { mnemonic, message } => {
            let keypair = KeyPair::from_mnemonic(mnemonic.trim())?;
            let bytes = hex::decode(message.trim_start_matches("0x"))
                .map_err(|e| AccountError::MalformedInput(format!("message: {}", e)))?;
            println!("{}", hex::encode(keypair.sign(&bytes)));
        }
    }
    Ok(())
}
