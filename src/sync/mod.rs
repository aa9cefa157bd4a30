pub mod transport;

pub use transport::{HttpTransport, Transport};

/// Known peer base URLs, in registration order.
#[derive(Debug, Default, Clone)]
pub struct PeerSet {
    endpoints: Vec<String>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// No reachability or duplicate checks.
    pub fn register(&mut self, endpoint: impl Into<String>) {
        self.endpoints.push(endpoint.into());
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }
}
