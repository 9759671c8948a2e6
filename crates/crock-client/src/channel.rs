//! Remote-call channel capability consumed by the store clients.

use async_trait::async_trait;
use crock_protocol::{ChangeNotification, Item, ScopeRequest, UpdateRequest};
use thiserror::Error;
use tokio::sync::mpsc;

/// Error raised when a remote storage call could not be completed.
///
/// Whatever the channel reports is surfaced to the caller unchanged: this
/// layer never retries, queues, or swallows a failed call.
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote error: {0}")]
    Remote(String),

    #[error("decode error: {0}")]
    Decode(String),
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

impl ChannelError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

/// Channel to the process that owns the physical stores.
///
/// Implementations carry the named request/response calls plus the
/// shared-store change broadcast; how they do it (Unix socket JSON-RPC,
/// pipes, an in-memory fake) is entirely their business. Note there is no
/// open or close operation: store lifecycle belongs to the remote side and
/// clients have nothing to say about it.
#[async_trait]
pub trait StorageChannel: Send + Sync {
    /// `storage.fetch_all`: every item currently in the store named by
    /// `request`, as ordered (key, value) pairs.
    async fn fetch_all(&self, request: &ScopeRequest) -> ChannelResult<Vec<Item>>;

    /// `storage.update`: apply one insert/delete batch to the store named
    /// in the request. No payload on success.
    async fn submit_update(&self, request: &UpdateRequest) -> ChannelResult<()>;

    /// Subscribe to `storage.shared_changed` broadcasts.
    ///
    /// Each call registers a fresh subscription; dropping the receiver
    /// releases it. Only global-store deltas are ever delivered — workspace
    /// stores are single-writer and the daemon does not broadcast for them.
    fn subscribe_shared_changes(&self) -> mpsc::UnboundedReceiver<ChangeNotification>;
}
