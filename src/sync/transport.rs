use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::blockchain::Block;
use crate::error::Result;

pub const CHAIN_PATH: &str = "/api/v1/chain/";
pub const BLOCK_PATH: &str = "/api/v1/block/";

/// Peer I/O used by the sync protocol.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch_chain(&self, endpoint: &str) -> Result<Vec<Block>>;
    async fn post_block(&self, endpoint: &str, block: &Block) -> Result<()>;
}

/// Body of a peer's chain listing; extra fields are ignored.
#[derive(Debug, Deserialize)]
pub struct RemoteChain {
    pub chain: Vec<Block>,
}

/// HTTP/JSON transport talking to other nodes' `/api/v1` routes.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

fn url(endpoint: &str, path: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), path)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_chain(&self, endpoint: &str) -> Result<Vec<Block>> {
        let remote = self
            .client
            .get(url(endpoint, CHAIN_PATH))
            .send()
            .await?
            .error_for_status()?
            .json::<RemoteChain>()
            .await?;
        Ok(remote.chain)
    }

    async fn post_block(&self, endpoint: &str, block: &Block) -> Result<()> {
        self.client
            .post(url(endpoint, BLOCK_PATH))
            .json(block)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_endpoint_and_path() {
        assert_eq!(url("http://peer:3000/", CHAIN_PATH), "http://peer:3000/api/v1/chain/");
        assert_eq!(url("http://peer:3000", BLOCK_PATH), "http://peer:3000/api/v1/block/");
    }

    #[test]
    fn remote_chain_ignores_extra_fields() {
        let genesis = Block::genesis();
        let body = serde_json::json!({
            "length": 1,
            "difficulty": 2,
            "chain": [genesis],
        });
        let remote: RemoteChain = serde_json::from_value(body).unwrap();
        assert_eq!(remote.chain, vec![genesis]);
    }
}
