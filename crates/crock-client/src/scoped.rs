//! Scope-bound request plumbing shared by both store clients.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use crock_protocol::{Item, ScopeRequest, UpdateRequest, WorkspaceId};
use futures::stream::BoxStream;
use tracing::debug;

use crate::channel::{ChannelResult, StorageChannel};
use crate::global::StorageChangeEvent;

/// Which physical store a client addresses.
///
/// Bound once at construction and never changed; every request the client
/// sends carries it so the daemon routes to the right store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageScope {
    /// The store shared by every consumer talking to this daemon.
    Global,
    /// The store private to one workspace.
    Workspace(WorkspaceId),
}

impl StorageScope {
    pub(crate) fn to_request(&self) -> ScopeRequest {
        match self {
            Self::Global => ScopeRequest::global(),
            Self::Workspace(id) => ScopeRequest::workspace(id.clone()),
        }
    }
}

/// Full key→value contents of one store at the time of a fetch.
pub type Snapshot = HashMap<String, String>;

/// One logical write: items to insert or overwrite plus keys to delete.
///
/// Both sides are optional. An empty batch is still a valid operation and
/// is still sent to the daemon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateBatch {
    pub insert: Option<Vec<Item>>,
    pub delete: Option<Vec<String>>,
}

impl UpdateBatch {
    /// Batch that only inserts.
    pub fn insert(items: Vec<Item>) -> Self {
        Self {
            insert: Some(items),
            delete: None,
        }
    }

    /// Batch that only deletes.
    pub fn delete(keys: Vec<String>) -> Self {
        Self {
            insert: None,
            delete: Some(keys),
        }
    }

    pub fn with_delete(mut self, keys: Vec<String>) -> Self {
        self.delete = Some(keys);
        self
    }
}

/// Capability shared by [`GlobalStore`](crate::GlobalStore) and
/// [`WorkspaceStore`](crate::WorkspaceStore).
///
/// Consumers that don't care which scope they hold can take this trait and
/// get reads, writes, change events, and teardown uniformly.
#[async_trait]
pub trait ScopedStore: Send + Sync {
    /// Fetch the full contents of this store.
    ///
    /// Authoritative at call time — nothing is cached locally. When the
    /// response repeats a key, the later item wins.
    async fn fetch_all(&self) -> ChannelResult<Snapshot>;

    /// Send one update batch to this store.
    ///
    /// Exactly one remote call per batch; concurrent batches from the same
    /// client are delivered in issue order (channel FIFO) but nothing is
    /// merged or queued here, and a failed batch is not retried.
    async fn submit_update(&self, batch: UpdateBatch) -> ChannelResult<()>;

    /// Stream of deltas applied to this store by someone else.
    ///
    /// Only the global store broadcasts; a workspace store's stream
    /// terminates immediately. Events fired before the stream was obtained
    /// are not replayed.
    fn change_stream(&self) -> BoxStream<'static, StorageChangeEvent>;

    /// Release this client's local subscriptions.
    ///
    /// Never emits a remote call — the daemon owns store lifecycle, and a
    /// close-on-teardown here would desynchronize it from its true owner.
    /// Calling this more than once has no additional effect.
    fn teardown(&self);
}

/// Channel handle plus the scope identity stamped on every request.
pub(crate) struct ScopedClient {
    channel: Arc<dyn StorageChannel>,
    scope: StorageScope,
}

impl ScopedClient {
    pub(crate) fn new(channel: Arc<dyn StorageChannel>, scope: StorageScope) -> Self {
        Self { channel, scope }
    }

    pub(crate) async fn fetch_all(&self) -> ChannelResult<Snapshot> {
        let items = self.channel.fetch_all(&self.scope.to_request()).await?;
        debug!(scope = ?self.scope, items = items.len(), "Fetched store contents");
        Ok(items.into_iter().collect())
    }

    pub(crate) async fn submit_update(&self, batch: UpdateBatch) -> ChannelResult<()> {
        let mut request = UpdateRequest::new(self.scope.to_request());
        request.insert = batch.insert.filter(|items| !items.is_empty());
        request.delete = batch.delete.filter(|keys| !keys.is_empty());

        debug!(
            scope = ?self.scope,
            inserts = request.insert.as_ref().map_or(0, Vec::len),
            deletes = request.delete.as_ref().map_or(0, Vec::len),
            "Submitting update batch"
        );
        self.channel.submit_update(&request).await
    }
}
