//! Connection state shared between a session backend and its callers.
//!
//! The backend owns a [`ConnectionMonitor`] and flips it whenever the link to
//! the remote service drops or comes back. Callers hold a [`ConnectionWatch`]
//! and can only observe: check the current state, or suspend until the
//! current disconnect episode ends.

use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// Writer side, owned by the session backend.
#[derive(Clone, Debug)]
pub struct ConnectionMonitor {
    tx: Arc<watch::Sender<ConnectionState>>,
}

impl ConnectionMonitor {
    pub fn new(initial: ConnectionState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn connected() -> Self {
        Self::new(ConnectionState::Connected)
    }

    pub fn state(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    /// Start a disconnect episode. Returns false if one is already in progress.
    pub fn mark_disconnected(&self) -> bool {
        self.transition(ConnectionState::Disconnected)
    }

    /// End the current disconnect episode, waking every waiter.
    /// Returns false if the session was already connected.
    pub fn mark_connected(&self) -> bool {
        self.transition(ConnectionState::Connected)
    }

    pub fn watch(&self) -> ConnectionWatch {
        ConnectionWatch {
            rx: self.tx.subscribe(),
        }
    }

    fn transition(&self, next: ConnectionState) -> bool {
        self.tx.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        })
    }
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::connected()
    }
}

/// Reader side, handed to the pipeline.
#[derive(Clone, Debug)]
pub struct ConnectionWatch {
    rx: watch::Receiver<ConnectionState>,
}

impl ConnectionWatch {
    pub fn state(&self) -> ConnectionState {
        *self.rx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Suspend until the session reports connected.
    ///
    /// Returns immediately when already connected, or when the backend that
    /// owned the monitor has gone away.
    pub async fn wait_reconnected(&self) {
        let mut rx = self.rx.clone();
        if rx
            .wait_for(|state| *state == ConnectionState::Connected)
            .await
            .is_err()
        {
            tracing::debug!("Connection monitor dropped while waiting for reconnect");
        }
    }
}
