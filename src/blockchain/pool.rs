use log::{debug, info};

use super::{Block, Blockchain, HexHash};
use crate::error::{ChainError, Result};
use crate::message::Message;
use crate::wallet::canonical_address;

/// Admitted messages waiting for the next mined block, in arrival order.
#[derive(Debug, Default, Clone)]
pub struct PendingPool {
    messages: Vec<Message>,
}

impl PendingPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Sum of amounts `address` is already sending from inside the pool.
    pub fn pending_debits(&self, address: &str) -> i128 {
        let address = canonical_address(address);
        self.messages
            .iter()
            .filter(|m| m.is_sent_by(&address))
            .map(|m| m.amount as i128)
            .sum()
    }

    /// Spendable balance for admission: mined balance minus pending debits.
    /// Pending credits are not spendable until mined.
    pub fn provisional_balance(&self, ledger: &Blockchain, address: &str) -> i128 {
        ledger.balance_of(address) - self.pending_debits(address)
    }

    /// Run the admission rules and queue the message. On error the pool is unchanged.
    pub fn admit(&mut self, ledger: &Blockchain, message: Message) -> Result<()> {
        let sender = message
            .from_address
            .as_deref()
            .ok_or(ChainError::MissingSender)?;

        if !message.verify()? {
            return Err(ChainError::InvalidSignature);
        }
        if message.amount < 0 {
            return Err(ChainError::NegativeAmount(message.amount));
        }

        let balance = self.provisional_balance(ledger, sender);
        if balance < message.amount as i128 {
            return Err(ChainError::InsufficientBalance {
                address: sender.to_string(),
                balance,
                amount: message.amount,
            });
        }

        debug!(
            "message admitted: from={} to={} amount={} (pool size: {} -> {})",
            sender,
            message.to_address,
            message.amount,
            self.len(),
            self.len() + 1
        );
        self.messages.push(message);
        Ok(())
    }

    /// Seal the pool plus a reward into a new block appended to `ledger`.
    /// The pool is cleared only when the append succeeds.
    pub fn mine_into(
        &mut self,
        ledger: &mut Blockchain,
        reward_address: &str,
        reward_amount: i64,
    ) -> Result<Block> {
        if self.is_empty() {
            debug!("pool is empty, block will carry the reward only");
        }
        info!("start mining pending messages: count={}", self.len());
        let mut messages = self.messages.clone();
        messages.push(Message::reward(reward_address, reward_amount));

        let block = ledger
            .append_block(Block::new(messages, HexHash::empty()))?
            .clone();
        self.messages.clear();
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::PendingPool;
    use crate::blockchain::Blockchain;
    use crate::error::ChainError;
    use crate::message::Message;
    use crate::wallet::{NodeKey, parse_public_key};

    fn signed(key: &NodeKey, to: &str, amount: i64) -> Message {
        let mut msg = Message::new("pay", Some(key.address().to_string()), to, amount);
        msg.sign(key.secret_key()).unwrap();
        msg
    }

    #[test]
    fn zero_amount_then_reward_scenario() {
        let a = NodeKey::generate();
        let b = NodeKey::generate();
        let mut ledger = Blockchain::new(1);
        let mut pool = PendingPool::new();

        pool.admit(&ledger, signed(&a, b.address(), 0)).unwrap();
        assert_eq!(pool.len(), 1);

        let block = pool.mine_into(&mut ledger, a.address(), 10).unwrap();
        assert!(pool.is_empty());
        assert_eq!(ledger.len(), 2);
        assert_eq!(block.messages.len(), 2);
        assert!(block.messages[1].is_reward());
        assert_eq!(ledger.balance_of(a.address()), 10);
        assert_eq!(ledger.balance_of(b.address()), 0);
    }

    #[test]
    fn insufficient_balance_leaves_pool_unchanged() {
        let a = NodeKey::generate();
        let mut ledger = Blockchain::new(1);
        let mut pool = PendingPool::new();
        pool.mine_into(&mut ledger, a.address(), 10).unwrap();

        let err = pool.admit(&ledger, signed(&a, "b", 100)).unwrap_err();
        assert!(matches!(
            err,
            ChainError::InsufficientBalance { balance: 10, amount: 100, .. }
        ));
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn pending_debits_close_the_double_spend_gap() {
        let a = NodeKey::generate();
        let mut ledger = Blockchain::new(1);
        let mut pool = PendingPool::new();
        pool.mine_into(&mut ledger, a.address(), 10).unwrap();

        pool.admit(&ledger, signed(&a, "b", 7)).unwrap();
        assert!(matches!(
            pool.admit(&ledger, signed(&a, "c", 7)),
            Err(ChainError::InsufficientBalance { balance: 3, .. })
        ));
        pool.admit(&ledger, signed(&a, "c", 3)).unwrap();
        assert_eq!(pool.len(), 2);
        // Mined balance is untouched by the pool.
        assert_eq!(ledger.balance_of(a.address()), 10);
    }

    #[test]
    fn pending_debits_count_every_encoding_of_the_sender() {
        let a = NodeKey::generate();
        let compressed = hex::encode(parse_public_key(a.address()).unwrap().serialize());
        let mut ledger = Blockchain::new(1);
        let mut pool = PendingPool::new();
        pool.mine_into(&mut ledger, a.address(), 10).unwrap();

        let mut first = Message::new("pay", Some(compressed.clone()), "b", 7);
        first.sign(a.secret_key()).unwrap();
        pool.admit(&ledger, first).unwrap();

        assert_eq!(pool.pending_debits(a.address()), 7);
        assert!(matches!(
            pool.admit(&ledger, signed(&a, "c", 7)),
            Err(ChainError::InsufficientBalance { balance: 3, .. })
        ));
    }

    #[test]
    fn rejects_reward_style_and_unsigned_messages() {
        let ledger = Blockchain::new(1);
        let mut pool = PendingPool::new();

        assert!(matches!(
            pool.admit(&ledger, Message::reward("me", 5)),
            Err(ChainError::MissingSender)
        ));

        let a = NodeKey::generate();
        let unsigned = Message::new("x", Some(a.address().to_string()), "b", 0);
        assert!(matches!(
            pool.admit(&ledger, unsigned),
            Err(ChainError::MissingSignature)
        ));

        let mut tampered = signed(&a, "b", 0);
        tampered.to_address = "c".into();
        assert!(matches!(
            pool.admit(&ledger, tampered),
            Err(ChainError::InvalidSignature)
        ));
        assert!(pool.is_empty());
    }

    #[test]
    fn rejects_negative_amounts() {
        let a = NodeKey::generate();
        let ledger = Blockchain::new(1);
        let mut pool = PendingPool::new();
        assert!(matches!(
            pool.admit(&ledger, signed(&a, "b", -5)),
            Err(ChainError::NegativeAmount(-5))
        ));
    }

    #[test]
    fn failed_append_keeps_pool() {
        let a = NodeKey::generate();
        let mut ledger = Blockchain::new(1);
        let mut pool = PendingPool::new();
        pool.admit(&ledger, signed(&a, "b", 0)).unwrap();

        ledger.chain.clear();
        assert!(pool.mine_into(&mut ledger, a.address(), 10).is_err());
        assert_eq!(pool.len(), 1);
        assert!(!pool.messages()[0].is_reward());
    }
}
