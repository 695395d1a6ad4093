//! Shared request state
//!
//! Built once at startup and cloned into every handler.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::storage::PathAllocator;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub allocator: Arc<PathAllocator>,
    pub data_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let data_dir = Arc::new(config.data_dir_path());
        Self {
            config: Arc::new(config),
            allocator: Arc::new(PathAllocator::new()),
            data_dir,
        }
    }
}
