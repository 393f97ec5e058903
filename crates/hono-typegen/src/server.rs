// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Hosting dev-server lifecycle.

use std::sync::Arc;
use tokio::sync::watch;

/// Handle to the hosting dev server, exposing its shutdown event.
///
/// Cloning shares the same lifecycle. Closing is idempotent: the second and
/// later calls are no-ops.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    shutdown: Arc<watch::Sender<bool>>,
}

impl ServerHandle {
    /// Creates an open server handle.
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shutdown: Arc::new(shutdown),
        }
    }

    /// Fires the shutdown event. Returns true if this call closed the server.
    pub fn close(&self) -> bool {
        !self.shutdown.send_replace(true)
    }

    /// Returns true once the server has been closed.
    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Receiver that observes the shutdown event.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Resolves once the server is closed.
    pub async fn closed(&self) {
        wait_closed(self.subscribe()).await
    }
}

impl Default for ServerHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves once `shutdown` observes the closed state (or its sender is gone).
pub async fn wait_closed(mut shutdown: watch::Receiver<bool>) {
    // An error means the server handle was dropped, which also ends its lifecycle
    let _ = shutdown.wait_for(|closed| *closed).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let server = ServerHandle::new();
        assert!(!server.is_closed());
        assert!(server.close());
        assert!(!server.close());
        assert!(server.is_closed());
    }

    #[tokio::test]
    async fn test_closed_resolves_after_close() {
        let server = ServerHandle::new();
        let waiter = {
            let server = server.clone();
            tokio::spawn(async move { server.closed().await })
        };

        server.close();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("closed() should resolve")
            .unwrap();
    }

    #[test]
    fn test_closed_is_pending_until_close() {
        let server = ServerHandle::new();
        let mut closed = tokio_test::task::spawn(server.closed());

        tokio_test::assert_pending!(closed.poll());
        server.close();
        assert!(closed.is_woken());
        tokio_test::assert_ready!(closed.poll());
    }

    #[tokio::test]
    async fn test_subscribe_after_close_sees_closed() {
        let server = ServerHandle::new();
        server.close();
        tokio::time::timeout(Duration::from_secs(1), wait_closed(server.subscribe()))
            .await
            .expect("already closed");
    }
}
