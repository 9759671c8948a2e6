//! Workspace-private store client.

use std::sync::Arc;

use async_trait::async_trait;
use crock_protocol::WorkspaceId;
use futures::stream::BoxStream;

use crate::channel::{ChannelResult, StorageChannel};
use crate::global::StorageChangeEvent;
use crate::scoped::{ScopedClient, ScopedStore, Snapshot, StorageScope, UpdateBatch};

/// Client for the store private to one workspace.
///
/// Workspace stores are single-writer: exactly one process instance writes
/// to a given workspace's store at a time. The daemon therefore sends no
/// change broadcasts for this scope and [`change_stream`] terminates
/// immediately.
///
/// [`change_stream`]: ScopedStore::change_stream
pub struct WorkspaceStore {
    inner: ScopedClient,
    workspace: WorkspaceId,
}

impl WorkspaceStore {
    /// A workspace store cannot exist without a workspace identity, so one
    /// is required here rather than checked at call time.
    pub fn new(channel: Arc<dyn StorageChannel>, workspace: WorkspaceId) -> Self {
        Self {
            inner: ScopedClient::new(channel, StorageScope::Workspace(workspace.clone())),
            workspace,
        }
    }

    /// The identity this store is bound to.
    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace
    }
}

#[async_trait]
impl ScopedStore for WorkspaceStore {
    async fn fetch_all(&self) -> ChannelResult<Snapshot> {
        self.inner.fetch_all().await
    }

    async fn submit_update(&self, batch: UpdateBatch) -> ChannelResult<()> {
        self.inner.submit_update(batch).await
    }

    fn change_stream(&self) -> BoxStream<'static, StorageChangeEvent> {
        Box::pin(futures::stream::empty())
    }

    // Nothing local to release: this client holds no subscriptions. The
    // remote store stays untouched either way.
    fn teardown(&self) {}
}
