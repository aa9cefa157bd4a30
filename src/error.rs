use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChainError>;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("you cannot sign messages for other wallets")]
    Authorization,

    #[error("message is already signed")]
    AlreadySigned,

    #[error("no signature in this message")]
    MissingSignature,

    #[error("message signature is invalid")]
    InvalidSignature,

    #[error("message must include a sender")]
    MissingSender,

    #[error("message amount must not be negative (got {0})")]
    NegativeAmount(i64),

    #[error("not enough balance: {address} has {balance}, needs {amount}")]
    InsufficientBalance {
        address: String,
        balance: i128,
        amount: i64,
    },

    #[error("blockchain is not valid")]
    ChainInvalid,

    #[error("block {0} already exists in blockchain")]
    DuplicateBlock(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("peer request failed: {0}")]
    Network(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ChainError {
    fn from(e: reqwest::Error) -> Self {
        ChainError::Network(e.to_string())
    }
}
