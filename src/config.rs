use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use log::warn;

use crate::blockchain::hash::HASH_HEX_LEN;
use crate::error::Result;
use crate::wallet::NodeKey;

pub const DEFAULT_DIFFICULTY: u32 = 2;
pub const DEFAULT_MINING_REWARD: i64 = 10;
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_PEER_TIMEOUT_SECS: u64 = 10;

/// What `pull_from` does when the fetched chain fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPolicy {
    /// Swap the fetched chain in first, then validate. An invalid chain stays
    /// in memory but is never persisted.
    #[default]
    Replace,
    /// Validate the fetched chain before swapping; invalid chains are dropped.
    Staged,
}

impl FromStr for SyncPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(SyncPolicy::Replace),
            "staged" => Ok(SyncPolicy::Staged),
            other => Err(format!("unknown sync policy: {other}")),
        }
    }
}

/// Node settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub difficulty: u32,
    pub mining_reward: i64,
    pub private_key: Option<String>,
    pub chain_file: PathBuf,
    pub peer_timeout_secs: u64,
    pub sync_policy: SyncPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
            private_key: None,
            chain_file: PathBuf::from("./blockchain.json"),
            peer_timeout_secs: DEFAULT_PEER_TIMEOUT_SECS,
            sync_policy: SyncPolicy::Replace,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; unparsable values keep their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port),
            difficulty: parse_checked(&lookup, "DIFFICULTY", defaults.difficulty, |d: u32| {
                d <= HASH_HEX_LEN as u32
            }),
            mining_reward: parse_checked(
                &lookup,
                "MINING_REWARD",
                defaults.mining_reward,
                |r: i64| r >= 0,
            ),
            private_key: lookup("PRIVATE_KEY").filter(|v| !v.trim().is_empty()),
            chain_file: lookup("CHAIN_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.chain_file),
            peer_timeout_secs: parse_or(&lookup, "PEER_TIMEOUT_SECS", defaults.peer_timeout_secs),
            sync_policy: parse_or(&lookup, "SYNC_POLICY", defaults.sync_policy),
        }
    }

    /// Node key from `PRIVATE_KEY`, or a fresh one when it is not configured.
    pub fn node_key(&self) -> Result<NodeKey> {
        match &self.private_key {
            Some(hex_key) => NodeKey::from_hex(hex_key),
            None => {
                let key = NodeKey::generate();
                warn!(
                    "PRIVATE_KEY not set; using ephemeral node key with address {}",
                    key.address()
                );
                Ok(key)
            }
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring malformed {key}={raw:?}");
            default
        }),
        None => default,
    }
}

/// Like `parse_or`, but a parsed value failing `accept` also falls back to the default.
fn parse_checked<F, T>(lookup: &F, key: &str, default: T, accept: impl Fn(T) -> bool) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    let value = parse_or(lookup, key, default);
    if accept(value) {
        value
    } else {
        warn!("ignoring out of range {key}={value}, using {default}");
        default
    }
}
