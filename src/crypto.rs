use bip39::{Language, Mnemonic};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha3::{Digest, Sha3_256};

use crate::error::AccountError;

pub const PUBLIC_KEY_LENGTH: usize = 32;
pub const SIGNATURE_LENGTH: usize = 64;
pub const AUTHENTICATION_KEY_LENGTH: usize = 32;

/// Scheme tag appended to a single Ed25519 public key when deriving its authentication key.
pub const ED25519_SCHEME: u8 = 0;

pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    Sha3_256::digest(data).into()
}

/// `SHA3-256(public_key || scheme)`
pub fn authentication_key_from_public_key(public_key: &[u8]) -> Vec<u8> {
    let mut preimage = Vec::with_capacity(public_key.len() + 1);
    preimage.extend_from_slice(public_key);
    preimage.push(ED25519_SCHEME);
    sha3_256(&preimage).to_vec()
}

/// Explicit runtime length check for wire data that should be fixed width.
pub fn ensure_length(what: &str, bytes: &[u8], expected: usize) -> Result<(), AccountError> {
    if bytes.len() != expected {
        return Err(AccountError::MalformedInput(format!(
            "{} must be {} bytes, got {}",
            what,
            expected,
            bytes.len()
        )));
    }
    Ok(())
}

/// Verify an Ed25519 signature over `message`.
/// Anything that does not parse as a key or signature simply fails to verify.
pub fn verify_ed25519(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(pk_bytes) = <[u8; PUBLIC_KEY_LENGTH]>::try_from(public_key) else {
        return false;
    };
    let Ok(sig_bytes) = <[u8; SIGNATURE_LENGTH]>::try_from(signature) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&pk_bytes) else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_bytes);
    verifying_key.verify(message, &signature).is_ok()
}

pub struct KeyPair {
    pub signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new Ed25519 keypair
    pub fn generate() -> Self {
        let mut csprng = OsRng;
        KeyPair {
            signing_key: SigningKey::generate(&mut csprng),
        }
    }

    /// Generate a new 12-word mnemonic
    pub fn generate_mnemonic() -> Result<String, AccountError> {
        let mut entropy = [0u8; 16]; // 128 bits = 12 words
        OsRng.fill_bytes(&mut entropy);
        let mnemonic = Mnemonic::from_entropy(&entropy)
            .map_err(|e| AccountError::MalformedInput(format!("mnemonic: {}", e)))?;
        Ok(mnemonic.to_string())
    }

    /// Restore keypair from mnemonic
    pub fn from_mnemonic(phrase: &str) -> Result<Self, AccountError> {
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
            .map_err(|e| AccountError::MalformedInput(format!("Invalid mnemonic: {}", e)))?;
        let seed = mnemonic.to_seed("");

        // Use first 32 bytes for Ed25519 SecretKey
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&seed[0..32]);
        Ok(KeyPair {
            signing_key: SigningKey::from_bytes(&secret),
        })
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }

    pub fn public_key(&self) -> Vec<u8> {
        self.signing_key.verifying_key().to_bytes().to_vec()
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key())
    }

    pub fn authentication_key(&self) -> Vec<u8> {
        authentication_key_from_public_key(&self.public_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"hello");
        assert_eq!(sig.len(), SIGNATURE_LENGTH);
        assert!(verify_ed25519(&kp.public_key(), b"hello", &sig));
        assert!(!verify_ed25519(&kp.public_key(), b"hellp", &sig));

        let other = KeyPair::generate();
        assert!(!verify_ed25519(&other.public_key(), b"hello", &sig));
    }

    #[test]
    fn test_verify_rejects_wrong_lengths() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"m");
        assert!(!verify_ed25519(&kp.public_key()[..31], b"m", &sig));
        assert!(!verify_ed25519(&kp.public_key(), b"m", &sig[..63]));
    }

    #[test]
    fn test_authentication_key_appends_scheme() {
        let pk = [9u8; 32];
        let mut preimage = pk.to_vec();
        preimage.push(0);
        assert_eq!(authentication_key_from_public_key(&pk), sha3_256(&preimage).to_vec());
        assert_eq!(authentication_key_from_public_key(&pk).len(), AUTHENTICATION_KEY_LENGTH);
    }

    #[test]
    fn test_sha3_known_vector() {
        // SHA3-256("")
        assert_eq!(
            hex::encode(sha3_256(b"")),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
    }

    #[test]
    fn test_mnemonic_roundtrip_is_deterministic() {
        let phrase = KeyPair::generate_mnemonic().unwrap();
        assert_eq!(phrase.split_whitespace().count(), 12);
        let a = KeyPair::from_mnemonic(&phrase).unwrap();
        let b = KeyPair::from_mnemonic(&phrase).unwrap();
        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_ensure_length() {
        assert!(ensure_length("key", &[0u8; 32], 32).is_ok());
        assert!(matches!(
            ensure_length("key", &[0u8; 33], 32),
            Err(AccountError::MalformedInput(_))
        ));
    }
}
