//! Facade composing the two store handles behind one constructor.

use std::sync::Arc;

use crock_protocol::WorkspaceId;

use crate::channel::StorageChannel;
use crate::global::GlobalStore;
use crate::scoped::ScopedStore;
use crate::workspace::WorkspaceStore;

/// The storage handles a consumer works with, as one unit with one
/// lifetime.
///
/// The global handle always exists. The workspace handle exists only when
/// a workspace identity was known at construction — a consumer running
/// outside any workspace simply gets `None` there.
pub struct CrockStorage {
    global: GlobalStore,
    workspace: Option<WorkspaceStore>,
}

impl CrockStorage {
    pub fn new(channel: Arc<dyn StorageChannel>, workspace: Option<WorkspaceId>) -> Self {
        let global = GlobalStore::new(Arc::clone(&channel));
        let workspace = workspace.map(|id| WorkspaceStore::new(channel, id));
        Self { global, workspace }
    }

    /// The store shared by every consumer of this daemon.
    pub fn global(&self) -> &GlobalStore {
        &self.global
    }

    /// The store private to this workspace, when one is bound.
    pub fn workspace(&self) -> Option<&WorkspaceStore> {
        self.workspace.as_ref()
    }

    /// Tear down both handles.
    ///
    /// Local-only and idempotent, like the handles' own teardown; the
    /// remote stores are left to their owner.
    pub fn teardown(&self) {
        self.global.teardown();
        if let Some(workspace) = &self.workspace {
            workspace.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryChannel;

    #[tokio::test]
    async fn test_workspace_handle_present_when_identity_supplied() {
        let channel = InMemoryChannel::new();
        let storage = CrockStorage::new(channel, Some(WorkspaceId::from("ws-1")));

        assert!(storage.workspace().is_some());
        assert_eq!(
            storage.workspace().unwrap().workspace_id().as_str(),
            "ws-1"
        );
    }

    #[tokio::test]
    async fn test_workspace_handle_absent_without_identity() {
        let channel = InMemoryChannel::new();
        let storage = CrockStorage::new(channel, None);

        assert!(storage.workspace().is_none());
    }

    #[tokio::test]
    async fn test_teardown_is_idempotent() {
        let channel = InMemoryChannel::new();
        let storage = CrockStorage::new(channel, Some(WorkspaceId::from("ws-1")));

        storage.teardown();
        storage.teardown();
    }
}
