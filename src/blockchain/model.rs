use log::{debug, info, warn};

use super::Block;
use crate::error::{ChainError, Result};
use crate::message::Message;
use crate::wallet::canonical_address;

/// In-memory ledger: the ordered chain of blocks plus the mining difficulty.
#[derive(Debug, Clone)]
pub struct Blockchain {
    pub chain: Vec<Block>,
    pub difficulty: u32,
}

impl Blockchain {
    /// Initialize a new blockchain with a genesis block.
    pub fn new(difficulty: u32) -> Self {
        Self::from_blocks(vec![Block::genesis()], difficulty)
    }

    /// Wrap already existing blocks (loaded from disk or fetched from a peer).
    pub fn from_blocks(chain: Vec<Block>, difficulty: u32) -> Self {
        Self { chain, difficulty }
    }

    /// Return the last block in the chain, `None` only for an empty chain.
    pub fn last_block(&self) -> Option<&Block> {
        self.chain.last()
    }

    /// Link `candidate` to the current tip, mine it and append it.
    /// If the chain does not validate afterwards the block is taken back out.
    pub fn append_block(&mut self, mut candidate: Block) -> Result<&Block> {
        let tip = self.last_block().ok_or(ChainError::ChainInvalid)?;
        candidate.previous_hash = tip.hash.clone();
        candidate.mine(self.difficulty);

        self.chain.push(candidate);
        if !self.is_valid_chain() {
            warn!("rejecting mined block: chain would not be valid");
            self.chain.pop();
            return Err(ChainError::ChainInvalid);
        }
        let block = &self.chain[self.chain.len() - 1];
        info!(
            "appended block #{} hash={} nonce={} messages={}",
            self.chain.len() - 1,
            block.hash,
            block.nonce,
            block.messages.len()
        );
        Ok(block)
    }

    /// Append a block mined elsewhere, as-is.
    pub fn push_block(&mut self, block: Block) -> Result<()> {
        if let Some(tip) = self.last_block() {
            if tip.hash == block.hash && tip.previous_hash == block.previous_hash {
                return Err(ChainError::DuplicateBlock(block.hash.to_string()));
            }
        }
        let hash = block.hash.clone();
        self.chain.push(block);
        if !self.is_valid_chain() {
            warn!("rejecting received block {hash}: chain would not be valid");
            self.chain.pop();
            return Err(ChainError::ChainInvalid);
        }
        info!("block is added to blockchain: hash={hash}");
        Ok(())
    }

    /// Swap the whole block sequence; returns the previous one.
    pub fn replace_chain(&mut self, chain: Vec<Block>) -> Vec<Block> {
        std::mem::replace(&mut self.chain, chain)
    }

    /// Validate the entire chain: linkage, message signatures and hashes.
    /// The genesis block is trusted as-is.
    pub fn is_valid_chain(&self) -> bool {
        if self.chain.is_empty() {
            return false;
        }

        for (i, pair) in self.chain.windows(2).enumerate() {
            let (prev, current) = (&pair[0], &pair[1]);

            if current.previous_hash != prev.hash {
                debug!("block #{} previous_hash mismatch", i + 1);
                return false;
            }
            if !current.has_valid_messages() {
                debug!("block #{} carries an invalid message", i + 1);
                return false;
            }
            if !current.has_valid_hash() {
                debug!("block #{} hash mismatch", i + 1);
                return false;
            }
        }

        true
    }

    /// Net balance from replaying every message: debits when sending, credits when receiving.
    /// Addresses are compared in canonical form.
    pub fn balance_of(&self, address: &str) -> i128 {
        let address = canonical_address(address);
        let mut balance: i128 = 0;
        for msg in self.chain.iter().flat_map(|b| b.messages.iter()) {
            if msg.is_sent_by(&address) {
                balance -= msg.amount as i128;
            }
            if msg.is_received_by(&address) {
                balance += msg.amount as i128;
            }
        }
        balance
    }

    /// All messages sent from or to `address`, in chain order.
    pub fn messages_for(&self, address: &str) -> Vec<Message> {
        let address = canonical_address(address);
        self.chain
            .iter()
            .flat_map(|b| b.messages.iter())
            .filter(|m| m.is_sent_by(&address) || m.is_received_by(&address))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }
}
