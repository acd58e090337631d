//! Test server harness for integration tests.
//!
//! Provides a way to spin up the real router on a random port for
//! integration testing with WebSocket and HTTP clients.

use std::net::SocketAddr;

use overlay_server::{router, AppState, ServerConfig, SyncState};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A test server instance with control handles.
pub struct TestServer {
    addr: SocketAddr,
    ws_path: String,
    sync: SyncState,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server on a random available port.
    ///
    /// # Panics
    ///
    /// Panics if no port is available or server fails to bind.
    pub async fn start() -> Self {
        Self::start_with(ServerConfig::default()).await
    }

    /// Start a test server with the given configuration; the port is replaced.
    ///
    /// # Panics
    ///
    /// Panics if no port is available or server fails to bind.
    pub async fn start_with(mut config: ServerConfig) -> Self {
        config.port = portpicker::pick_unused_port().expect("no available port");
        let addr = config.socket_addr();
        let ws_path = config.ws_path.clone();

        let state = AppState::new(config);
        let sync = state.sync.clone();
        let app = router(state, None);

        let listener = TcpListener::bind(addr).await.expect("failed to bind");
        let actual_addr = listener.local_addr().expect("failed to get local addr");

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        // Spawn the server
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("server error");
        });

        // Give the server a moment to start
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr: actual_addr,
            ws_path,
            sync,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Get the server's socket address.
    #[allow(dead_code)]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// WebSocket URL announcing the given role.
    #[allow(dead_code)]
    pub fn ws_url(&self, role: &str) -> String {
        format!("ws://{}{}?role={}", self.addr, self.ws_path, role)
    }

    /// WebSocket URL without a role parameter.
    #[allow(dead_code)]
    pub fn ws_url_bare(&self) -> String {
        format!("ws://{}{}", self.addr, self.ws_path)
    }

    /// WebSocket URL on an arbitrary path.
    #[allow(dead_code)]
    pub fn ws_url_at(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    /// Get access to the sync state (for test assertions).
    #[allow(dead_code)]
    pub fn sync_state(&self) -> &SyncState {
        &self.sync
    }

    /// Wait until the server has `count` registered connections.
    #[allow(dead_code)]
    pub async fn wait_for_connections(&self, count: usize) -> bool {
        for _ in 0..200 {
            if self.sync.connection_count() == count {
                return true;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        }
        false
    }

    /// Gracefully shut down the server.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(tokio::time::Duration::from_secs(5), self.handle).await;
    }
}
