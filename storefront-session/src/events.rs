//! Session event channel
//!
//! Decouples the HTTP client from the session provider: the client announces
//! that the session ended, the provider (or anyone else) subscribes.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::info;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// The refresh endpoint refused or returned no token
    RefreshFailed,
    /// The user logged out
    UserRequested,
}

/// Events published on the session channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    LoggedOut { reason: LogoutReason },
}

/// Broadcast channel shared by everything that cares about the session
#[derive(Debug, Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEvents {
    pub fn new() -> Self {
        // Create broadcaster with a buffer of 16 messages
        let (sender, _) = broadcast::channel(16);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Announce a logout. Returns how many subscribers saw it.
    pub fn logout(&self, reason: LogoutReason) -> usize {
        info!(?reason, "Broadcasting logout");
        // Err only means nobody subscribed yet
        self.sender
            .send(SessionEvent::LoggedOut { reason })
            .unwrap_or(0)
    }
}
