use axum::Router;
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::FileServerError;
use crate::server::AppState;
use crate::server::router::{UPLOAD_PATH, build_router};

pub struct Server {
    listener: TcpListener,
    router: Router,
    config: Arc<ServerConfig>,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Result<Self, FileServerError> {
        let socket = config.listen_addr()?;

        if let Err(e) = tokio::fs::create_dir_all(&config.data_dir).await {
            warn!("Failed to create storage root directory: {}", e);
        } else {
            info!("Storage root directory: {}", config.data_dir);
        }

        let listener = match TcpListener::bind(socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(FileServerError::Bind(socket, e));
            }
        };

        let state = AppState::new(config);
        let config = Arc::clone(&state.config);

        Ok(Self {
            listener,
            router: build_router(state),
            config,
        })
    }

    /// Address the listener actually bound to
    pub fn local_addr(&self) -> Result<SocketAddr, FileServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn start(self) -> Result<(), FileServerError> {
        self.log_banner();
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    fn log_banner(&self) {
        let port = self
            .listener
            .local_addr()
            .map(|a| a.port())
            .unwrap_or(self.config.port);

        info!("----------------------------------------------------------------");
        info!("    port:         {}", port);
        info!("    storage root: {}", self.config.data_dir);
        info!("    domain:       {}", self.config.domain);
        info!("    group:        {}", self.config.group_name().unwrap_or(""));
        info!("    upload path:  {}", UPLOAD_PATH);
        info!("----------------------------------------------------------------");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_ephemeral_port_and_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        let config = ServerConfig {
            bind_address: "127.0.0.1".into(),
            port: 0,
            data_dir: root.to_string_lossy().to_string(),
            ..Default::default()
        };

        let server = Server::new(config).await.unwrap();
        assert!(root.is_dir());
        assert_ne!(server.local_addr().unwrap().port(), 0);
    }
}
