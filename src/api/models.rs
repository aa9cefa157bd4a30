use serde::{Deserialize, Serialize};

use crate::blockchain::{Block, HexHash};
use crate::message::Message;

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse {
    pub length: usize,
    pub difficulty: u32,
    pub chain: Vec<Block>,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
}

#[derive(Deserialize, Default)]
pub struct MineRequest {
    #[serde(default)]
    pub miner_address: Option<String>,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub mined_index: usize,
    pub hash: HexHash,
    pub nonce: u64,
    pub messages: usize,
    pub peers_notified: usize,
}

#[derive(Serialize)]
pub struct BlockAcceptedResponse {
    pub accepted: bool,
    pub hash: HexHash,
}

/* ---------- Message API Models ---------- */

/// Unsigned message the node signs with its own wallet.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    #[serde(default)]
    pub message: String,
    pub to_address: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub pictures: Option<Vec<String>>,
    #[serde(default)]
    pub movies: Option<Vec<String>>,
    #[serde(default)]
    pub links: Option<Vec<String>>,
    #[serde(default)]
    pub voices: Option<Vec<String>>,
}

impl CreateMessageRequest {
    pub fn into_draft(self) -> Message {
        let mut draft = Message::new(self.message, None, self.to_address, self.amount);
        draft.pictures = self.pictures;
        draft.movies = self.movies;
        draft.links = self.links;
        draft.voices = self.voices;
        draft
    }
}

#[derive(Serialize)]
pub struct PendingResponse {
    pub size: usize,
    pub messages: Vec<Message>,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: i128,
}

/* ---------- Peer API Models ---------- */

#[derive(Deserialize)]
pub struct NodeUrlRequest {
    pub url: String,
}

#[derive(Serialize)]
pub struct NodesResponse {
    pub nodes: Vec<String>,
}
