use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::HexHash;
use crate::message::Message;

/// A batch of messages sealed by Proof-of-Work and linked to its predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub timestamp: i64, // Unix epoch millis (UTC)
    pub messages: Vec<Message>,
    #[serde(default)]
    pub previous_hash: HexHash,
    pub nonce: u64, // Proof-of-Work nonce
    pub hash: HexHash,
}

impl Block {
    /// Create the genesis block (first block in the chain).
    pub fn genesis() -> Self {
        Self::new(vec![Message::genesis()], HexHash::empty())
    }

    /// Create a new block (not mined yet). Call `mine()` to perform PoW.
    pub fn new(messages: Vec<Message>, previous_hash: HexHash) -> Self {
        Self::new_with_timestamp(messages, previous_hash, Utc::now().timestamp_millis())
    }

    pub fn new_with_timestamp(
        messages: Vec<Message>,
        previous_hash: HexHash,
        timestamp: i64,
    ) -> Self {
        let mut block = Self {
            timestamp,
            messages,
            previous_hash,
            nonce: 0,
            hash: HexHash::empty(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// SHA-256 over `previous_hash ‖ timestamp ‖ messages_json ‖ nonce`.
    /// Message order is part of the preimage.
    pub fn compute_hash(&self) -> HexHash {
        let messages_json = serde_json::to_string(&self.messages).expect("serialize messages");
        let preimage = format!(
            "{}{}{}{}",
            self.previous_hash, self.timestamp, messages_json, self.nonce
        );
        let mut hasher = Sha256::new();
        hasher.update(preimage.as_bytes());
        HexHash::from_digest(hasher.finalize().into())
    }

    /// Perform Proof-of-Work by finding a nonce that yields a hash
    /// starting with `difficulty` zero hex chars. Blocks until found.
    pub fn mine(&mut self, difficulty: u32) {
        loop {
            self.hash = self.compute_hash();
            if self.hash.meets_difficulty(difficulty) {
                break;
            }
            self.nonce = self.nonce.wrapping_add(1);
        }
        debug!("Block mined: {} (nonce={})", self.hash, self.nonce);
    }

    /// Cached `hash` matches the content.
    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Every contained message has a non-negative amount and verifies;
    /// a missing signature counts as invalid.
    pub fn has_valid_messages(&self) -> bool {
        self.messages
            .iter()
            .all(|msg| msg.amount >= 0 && matches!(msg.verify(), Ok(true)))
    }
}
