use std::fs;
use std::path::PathBuf;

use log::{info, warn};

use crate::blockchain::Block;
use crate::error::Result;

/// Where the chain snapshot lives between restarts.
pub trait ChainStore: Send + Sync {
    /// `None` when there is no usable prior chain.
    fn load(&self) -> Option<Vec<Block>>;
    fn save(&self, blocks: &[Block]) -> Result<()>;
}

/// Pretty-printed JSON file holding the whole chain.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ChainStore for FileStore {
    fn load(&self) -> Option<Vec<Block>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                info!("no blockchain file at {}: {e}", self.path.display());
                return None;
            }
        };
        match serde_json::from_str::<Vec<Block>>(&raw) {
            Ok(blocks) if !blocks.is_empty() => Some(blocks),
            Ok(_) => None,
            Err(e) => {
                warn!("ignoring corrupt blockchain file {}: {e}", self.path.display());
                None
            }
        }
    }

    /// Write to a sibling temp file, then rename over the target.
    fn save(&self, blocks: &[Block]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(blocks)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        info!(
            "saved {} block(s) to {}",
            blocks.len(),
            self.path.display()
        );
        Ok(())
    }
}
