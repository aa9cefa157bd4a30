pub mod block;
pub mod hash;
pub mod model;
pub mod pool;

pub use block::Block;
pub use hash::HexHash;
pub use model::Blockchain;
pub use pool::PendingPool;
