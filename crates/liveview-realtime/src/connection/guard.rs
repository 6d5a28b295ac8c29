//! Guaranteed disconnect cleanup for a registered connection.

use std::sync::Arc;

use tracing::{debug, warn};

use super::handle::ConnectionHandle;
use super::manager::ConnectionManager;

/// Owns a connection on behalf of its socket task, from the moment it
/// joins its group.
///
/// [`close`](Self::close) runs the disconnect path in place. If the guard
/// is dropped instead (task aborted mid-activation, panic while handling
/// a frame) the disconnect path is spawned onto the runtime so the viewer
/// is still removed from presence and from its group.
#[derive(Debug)]
pub struct ConnectionGuard {
    handle: Arc<ConnectionHandle>,
    manager: Arc<ConnectionManager>,
    armed: bool,
}

impl ConnectionGuard {
    /// Take ownership of a connection that is activating or active.
    pub fn new(handle: Arc<ConnectionHandle>, manager: Arc<ConnectionManager>) -> Self {
        Self {
            handle,
            manager,
            armed: true,
        }
    }

    /// The guarded connection.
    pub fn handle(&self) -> &Arc<ConnectionHandle> {
        &self.handle
    }

    /// Disconnect now and disarm the guard.
    pub async fn close(mut self) {
        self.armed = false;
        self.manager.disconnect(&self.handle).await;
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if !self.armed || self.handle.state().is_terminal() {
            return;
        }

        let handle = self.handle.clone();
        let manager = self.manager.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(rt) => {
                debug!(conn_id = %handle.id, "Connection dropped without close; spawning cleanup");
                rt.spawn(async move {
                    manager.disconnect(&handle).await;
                });
            }
            Err(_) => {
                warn!(conn_id = %handle.id, "No runtime available for connection cleanup");
            }
        }
    }
}
