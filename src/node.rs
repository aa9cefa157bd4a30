use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::blockchain::{Block, Blockchain, PendingPool};
use crate::config::{Config, SyncPolicy};
use crate::error::{ChainError, Result};
use crate::message::Message;
use crate::store::ChainStore;
use crate::sync::{PeerSet, Transport};
use crate::wallet::NodeKey;

/// Ledger and pending pool; always locked together.
#[derive(Debug)]
pub struct NodeState {
    pub ledger: Blockchain,
    pub pool: PendingPool,
}

/// Result of pulling a peer's chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Fetched chain validated and replaced the local one.
    Adopted { length: usize },
    /// Fetched chain replaced the local one but does not validate; not persisted.
    AdoptedInvalid { length: usize },
    /// Fetched chain failed validation and was dropped (staged policy).
    Rejected { length: usize },
}

/// Everything one node owns: the chain, the pool, its key, its peers and
/// the persistence and transport collaborators.
pub struct Node {
    state: Mutex<NodeState>,
    peers: Mutex<PeerSet>,
    key: NodeKey,
    mining_reward: i64,
    sync_policy: SyncPolicy,
    store: Box<dyn ChainStore>,
    transport: Arc<dyn Transport>,
}

impl Node {
    /// Load the persisted chain, or start a new one from genesis.
    pub fn bootstrap(
        config: &Config,
        key: NodeKey,
        store: Box<dyn ChainStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let ledger = match store.load() {
            Some(blocks) => {
                info!("blockchain loaded from file: {} blocks", blocks.len());
                let ledger = Blockchain::from_blocks(blocks, config.difficulty);
                if !ledger.is_valid_chain() {
                    warn!("loaded blockchain does not validate");
                }
                ledger
            }
            None => {
                info!("new blockchain created");
                Blockchain::new(config.difficulty)
            }
        };

        Self {
            state: Mutex::new(NodeState {
                ledger,
                pool: PendingPool::new(),
            }),
            peers: Mutex::new(PeerSet::new()),
            key,
            mining_reward: config.mining_reward,
            sync_policy: config.sync_policy,
            store,
            transport,
        }
    }

    fn state(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn peer_set(&self) -> MutexGuard<'_, PeerSet> {
        self.peers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Save only a valid chain. Write failures are logged, not returned.
    fn persist_if_valid(&self, ledger: &Blockchain) -> Result<()> {
        if !ledger.is_valid_chain() {
            return Err(ChainError::ChainInvalid);
        }
        if let Err(e) = self.store.save(&ledger.chain) {
            error!("error writing blockchain file: {e}");
        }
        Ok(())
    }

    pub fn address(&self) -> &str {
        self.key.address()
    }

    pub fn difficulty(&self) -> u32 {
        self.state().ledger.difficulty()
    }

    pub fn chain_len(&self) -> usize {
        self.state().ledger.len()
    }

    /// Snapshot of the whole chain.
    pub fn chain(&self) -> Vec<Block> {
        self.state().ledger.chain.clone()
    }

    pub fn is_valid(&self) -> bool {
        self.state().ledger.is_valid_chain()
    }

    pub fn balance_of(&self, address: &str) -> i128 {
        self.state().ledger.balance_of(address)
    }

    pub fn messages_for(&self, address: &str) -> Vec<Message> {
        self.state().ledger.messages_for(address)
    }

    pub fn pending(&self) -> Vec<Message> {
        self.state().pool.messages().to_vec()
    }

    /// Admit a client-signed message. Solvency check and insertion happen
    /// under the same lock.
    pub fn submit_message(&self, message: Message) -> Result<Message> {
        let mut state = self.state();
        let NodeState { ledger, pool } = &mut *state;
        pool.admit(ledger, message.clone())?;
        info!(
            "message added: from={:?} to={} amount={}",
            message.from_address, message.to_address, message.amount
        );
        Ok(message)
    }

    /// Sign `draft` as this node's wallet, then admit it.
    pub fn submit_own_message(&self, mut draft: Message) -> Result<Message> {
        draft.from_address = Some(self.key.address().to_string());
        draft.signature = None;
        draft.sign(self.key.secret_key())?;
        self.submit_message(draft)
    }

    /// Drain the pool into a freshly mined block paying the reward to
    /// `reward_address` (this node when `None`).
    ///
    /// CPU-bound and blocking: the node lock is held for the whole PoW search.
    /// Call it off the async executor (e.g. `web::block`).
    pub fn mine_pending(&self, reward_address: Option<&str>) -> Result<Block> {
        let reward_address = reward_address.unwrap_or(self.key.address());
        let mut state = self.state();
        let NodeState { ledger, pool } = &mut *state;

        let block = pool.mine_into(ledger, reward_address, self.mining_reward)?;
        self.persist_if_valid(ledger)?;
        info!("did mine pending messages: hash={}", block.hash);
        Ok(block)
    }

    /// Accept a block mined by a peer.
    pub fn receive_block(&self, block: Block) -> Result<()> {
        debug!("potential block to add: hash={}", block.hash);
        let mut state = self.state();
        state.ledger.push_block(block)?;
        self.persist_if_valid(&state.ledger)
    }

    pub fn register_peer(&self, endpoint: impl Into<String>) {
        let endpoint = endpoint.into();
        info!("registered peer {endpoint}");
        self.peer_set().register(endpoint);
    }

    pub fn peers(&self) -> Vec<String> {
        self.peer_set().endpoints().to_vec()
    }

    /// Fire-and-forget: one task per peer, failures only logged.
    /// Must be called from within a Tokio runtime.
    pub fn broadcast_block(&self, block: &Block) -> Vec<JoinHandle<()>> {
        let peers = self.peers();
        info!("broadcasting block {} to {} peer(s)", block.hash, peers.len());

        peers
            .into_iter()
            .map(|endpoint| {
                let transport = Arc::clone(&self.transport);
                let block = block.clone();
                tokio::spawn(async move {
                    match transport.post_block(&endpoint, &block).await {
                        Ok(()) => debug!("block {} sent to {endpoint}", block.hash),
                        Err(e) => warn!("failed to send block {} to {endpoint}: {e}", block.hash),
                    }
                })
            })
            .collect()
    }

    /// Fetch `endpoint`'s chain and take it over.
    ///
    /// With `SyncPolicy::Replace` the local chain is replaced before
    /// validation and an invalid result is kept in memory, unpersisted.
    /// With `SyncPolicy::Staged` an invalid chain is dropped.
    pub async fn pull_from(&self, endpoint: &str) -> Result<SyncOutcome> {
        let fetched = self.transport.fetch_chain(endpoint).await.map_err(|e| {
            warn!("could not fetch chain from {endpoint}: {e}");
            e
        })?;
        let length = fetched.len();

        let mut state = self.state();
        match self.sync_policy {
            SyncPolicy::Replace => {
                state.ledger.replace_chain(fetched);
                match self.persist_if_valid(&state.ledger) {
                    Ok(()) => {
                        info!("blockchain is synchronized from {endpoint} ({length} blocks)");
                        Ok(SyncOutcome::Adopted { length })
                    }
                    Err(e) => {
                        error!("chain synchronized from {endpoint} is not valid: {e}");
                        Ok(SyncOutcome::AdoptedInvalid { length })
                    }
                }
            }
            SyncPolicy::Staged => {
                let staged = Blockchain::from_blocks(fetched, state.ledger.difficulty());
                if !staged.is_valid_chain() {
                    warn!("rejecting invalid chain from {endpoint} ({length} blocks)");
                    return Ok(SyncOutcome::Rejected { length });
                }
                state.ledger.replace_chain(staged.chain);
                self.persist_if_valid(&state.ledger)?;
                info!("blockchain is synchronized from {endpoint} ({length} blocks)");
                Ok(SyncOutcome::Adopted { length })
            }
        }
    }
}
