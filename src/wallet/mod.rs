use std::borrow::Cow;

use rand::rngs::OsRng;
use secp256k1::{Message as Digest32, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};

use crate::error::{ChainError, Result};

/// Generate a new secp256k1 keypair and return (priv_hex, pub_hex).
/// The public key hex (uncompressed, `04...`) doubles as the wallet address.
pub fn generate_keypair_hex() -> (String, String) {
    let secp = Secp256k1::new();
    let (sk, pk) = secp.generate_keypair(&mut OsRng);
    (hex::encode(sk.secret_bytes()), address_of(&pk))
}

/// Wallet address of a public key: hex of the uncompressed SEC1 encoding.
pub fn address_of(pk: &PublicKey) -> String {
    hex::encode(pk.serialize_uncompressed())
}

/// Comparable form of an address. Any SEC1 encoding of a key maps to its
/// uncompressed hex; anything that is not a public key is left as is.
pub fn canonical_address(address: &str) -> Cow<'_, str> {
    match parse_public_key(address) {
        Ok(pk) => Cow::Owned(address_of(&pk)),
        Err(_) => Cow::Borrowed(address),
    }
}

/// Parse a hex public key (compressed or uncompressed).
pub fn parse_public_key(pubkey_hex: &str) -> Result<PublicKey> {
    let bytes =
        hex::decode(pubkey_hex).map_err(|_| ChainError::InvalidKey("invalid pubkey hex".into()))?;
    PublicKey::from_slice(&bytes).map_err(|_| ChainError::InvalidKey("invalid pubkey bytes".into()))
}

pub fn parse_secret_key(secret_hex: &str) -> Result<SecretKey> {
    let bytes = hex::decode(secret_hex.trim())
        .map_err(|_| ChainError::InvalidKey("invalid private key hex".into()))?;
    SecretKey::from_slice(&bytes)
        .map_err(|_| ChainError::InvalidKey("invalid private key bytes".into()))
}

/// Sign a 32-byte digest; returns the hex DER signature.
pub fn sign_digest_hex(sk: &SecretKey, msg32: [u8; 32]) -> String {
    let secp = Secp256k1::signing_only();
    let sig = secp.sign_ecdsa(&Digest32::from_digest(msg32), sk);
    hex::encode(&*sig.serialize_der())
}

/// Verify a signature (hex DER) against the given pubkey (hex) and message hash (32 bytes).
/// High-S signatures are normalized first, libsecp256k1 only accepts low-S.
pub fn verify_signature_hex(pubkey_hex: &str, sig_hex: &str, msg32: [u8; 32]) -> Result<bool> {
    let secp = Secp256k1::verification_only();

    let sig_bytes = hex::decode(sig_hex)
        .map_err(|_| ChainError::InvalidKey("invalid signature hex".into()))?;
    let mut sig = match Signature::from_der(&sig_bytes) {
        Ok(sig) => sig,
        Err(_) => return Ok(false),
    };
    sig.normalize_s();

    let pk = parse_public_key(pubkey_hex)?;
    Ok(secp
        .verify_ecdsa(&Digest32::from_digest(msg32), &sig, &pk)
        .is_ok())
}

/// The node's own signing identity.
#[derive(Clone)]
pub struct NodeKey {
    secret: SecretKey,
    address: String,
}

impl NodeKey {
    pub fn from_secret(secret: SecretKey) -> Self {
        let secp = Secp256k1::signing_only();
        let public = PublicKey::from_secret_key(&secp, &secret);
        Self {
            secret,
            address: address_of(&public),
        }
    }

    pub fn from_hex(secret_hex: &str) -> Result<Self> {
        Ok(Self::from_secret(parse_secret_key(secret_hex)?))
    }

    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret, _) = secp.generate_keypair(&mut OsRng);
        Self::from_secret(secret)
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keypair_round_trips_through_hex() {
        let (sk_hex, pk_hex) = generate_keypair_hex();
        let key = NodeKey::from_hex(&sk_hex).unwrap();
        assert_eq!(key.address(), pk_hex);
        assert_eq!(pk_hex.len(), 130);
        assert!(pk_hex.starts_with("04"));
    }

    #[test]
    fn compressed_and_uncompressed_parse_to_same_key() {
        let key = NodeKey::generate();
        let pk = parse_public_key(key.address()).unwrap();
        let compressed = hex::encode(pk.serialize());
        assert_eq!(parse_public_key(&compressed).unwrap(), pk);
        assert_eq!(address_of(&parse_public_key(&compressed).unwrap()), key.address());
    }

    #[test]
    fn canonical_address_merges_key_encodings() {
        let key = NodeKey::generate();
        let pk = parse_public_key(key.address()).unwrap();
        let compressed = hex::encode(pk.serialize());
        assert_eq!(canonical_address(&compressed), key.address());
        assert_eq!(canonical_address(&key.address().to_uppercase()), key.address());
        assert_eq!(canonical_address("bob"), "bob");
    }

    #[test]
    fn signature_verifies_only_for_signed_digest_and_key() {
        let key = NodeKey::generate();
        let other = NodeKey::generate();
        let digest = [7u8; 32];
        let sig = sign_digest_hex(key.secret_key(), digest);

        assert!(verify_signature_hex(key.address(), &sig, digest).unwrap());
        assert!(!verify_signature_hex(key.address(), &sig, [8u8; 32]).unwrap());
        assert!(!verify_signature_hex(other.address(), &sig, digest).unwrap());
    }

    #[test]
    fn garbage_inputs_are_rejected() {
        assert!(parse_public_key("zz").is_err());
        assert!(parse_secret_key("00").is_err());
        let key = NodeKey::generate();
        assert!(!verify_signature_hex(key.address(), "3000", [0u8; 32]).unwrap());
    }
}
