use chrono::Utc;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ChainError, Result};
use crate::wallet::{canonical_address, parse_public_key, sign_digest_hex, verify_signature_hex};

/// A signed value transfer with optional media references.
///
/// `from_address == None` marks a system-minted reward; those are valid
/// without a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub message: String,
    pub from_address: Option<String>,
    #[serde(default)]
    pub to_address: String,
    /// Integer minor units.
    pub amount: i64,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pictures: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voices: Option<Vec<String>>,
    /// Hex-encoded DER ECDSA signature over `content_digest()`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Message {
    pub fn new(
        message: impl Into<String>,
        from_address: Option<String>,
        to_address: impl Into<String>,
        amount: i64,
    ) -> Self {
        Self {
            message: message.into(),
            from_address,
            to_address: to_address.into(),
            amount,
            timestamp: Utc::now().timestamp_millis(),
            pictures: None,
            movies: None,
            links: None,
            voices: None,
            signature: None,
        }
    }

    /// System-minted reward paid to `to_address`.
    pub fn reward(to_address: impl Into<String>, amount: i64) -> Self {
        Self::new(String::new(), None, to_address, amount)
    }

    /// Sentinel carried by the genesis block; moves no value.
    pub fn genesis() -> Self {
        Self::new("genesis", None, String::new(), 0)
    }

    pub fn is_reward(&self) -> bool {
        self.from_address.is_none()
    }

    /// Sent by `address`, which must already be in canonical form.
    pub fn is_sent_by(&self, address: &str) -> bool {
        self.from_address
            .as_deref()
            .is_some_and(|from| canonical_address(from) == address)
    }

    /// Received by `address`, which must already be in canonical form.
    pub fn is_received_by(&self, address: &str) -> bool {
        canonical_address(&self.to_address) == address
    }

    /// Canonical signing payload (JSON) covering every content field but the signature.
    pub fn signing_payload(&self) -> Vec<u8> {
        let payload = serde_json::json!({
            "message": self.message,
            "fromAddress": self.from_address,
            "toAddress": self.to_address,
            "pictures": self.pictures,
            "movies": self.movies,
            "links": self.links,
            "voices": self.voices,
            "amount": self.amount,
            "timestamp": self.timestamp,
        });
        payload.to_string().into_bytes()
    }

    /// SHA-256 of the signing payload.
    pub fn content_digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.signing_payload());
        hasher.finalize().into()
    }

    /// Sign with the sender's key. Only the owner of `from_address` may sign,
    /// and a message is signed at most once.
    pub fn sign(&mut self, secret: &SecretKey) -> Result<()> {
        if self.signature.is_some() {
            return Err(ChainError::AlreadySigned);
        }
        let sender = self
            .from_address
            .as_deref()
            .ok_or(ChainError::Authorization)?;
        let sender_key = parse_public_key(sender).map_err(|_| ChainError::Authorization)?;

        let secp = Secp256k1::signing_only();
        if PublicKey::from_secret_key(&secp, secret) != sender_key {
            return Err(ChainError::Authorization);
        }

        self.signature = Some(sign_digest_hex(secret, self.content_digest()));
        Ok(())
    }

    /// Check the signature against `from_address`. Rewards always pass.
    pub fn verify(&self) -> Result<bool> {
        if self.is_reward() {
            return Ok(true);
        }
        let sender = self.from_address.as_deref().unwrap_or_default();
        let signature = match self.signature.as_deref() {
            Some(sig) if !sig.is_empty() => sig,
            _ => return Err(ChainError::MissingSignature),
        };
        Ok(verify_signature_hex(sender, signature, self.content_digest()).unwrap_or(false))
    }
}
