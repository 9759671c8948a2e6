//! In-memory storage channel for tests.
//!
//! Stands in for a live daemon connection: it applies updates to real
//! per-scope maps, records every call it observes, lets tests inject
//! channel failures, and lets tests play the "other process" by
//! broadcasting shared-change notifications.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use crock_protocol::{ChangeNotification, Item, ScopeRequest, UpdateRequest, WorkspaceId};
use tokio::sync::mpsc;

use crate::channel::{ChannelError, ChannelResult, StorageChannel};

/// One call observed by the channel, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    FetchAll(ScopeRequest),
    SubmitUpdate(UpdateRequest),
    SubscribeSharedChanges,
}

/// Storage channel backed by in-process maps.
pub struct InMemoryChannel {
    global: Mutex<HashMap<String, String>>,
    workspaces: Mutex<HashMap<WorkspaceId, HashMap<String, String>>>,
    calls: Mutex<Vec<RecordedCall>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ChangeNotification>>>,
    fail_next: Mutex<Option<ChannelError>>,
}

impl InMemoryChannel {
    /// Returns an `Arc` directly since every consumer of the channel trait
    /// takes one.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            global: Mutex::new(HashMap::new()),
            workspaces: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
        })
    }

    /// Every call observed so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Make the next `fetch_all` or `submit_update` fail with `error`.
    pub fn fail_next_call(&self, error: ChannelError) {
        *self.fail_next.lock().unwrap() = Some(error);
    }

    /// Deliver a shared-change notification to every live subscriber, the
    /// way the daemon would after another process wrote to the global
    /// store. Subscribers whose receiver was dropped are pruned.
    pub fn broadcast_shared_change(&self, notification: ChangeNotification) {
        self.subscribers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(notification.clone()).is_ok());
    }

    /// Current contents of the store a scope addresses.
    pub fn contents(&self, request: &ScopeRequest) -> HashMap<String, String> {
        match &request.workspace {
            None => self.global.lock().unwrap().clone(),
            Some(id) => self
                .workspaces
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Number of subscriptions still held open by clients.
    pub fn live_subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    fn take_failure(&self) -> Option<ChannelError> {
        self.fail_next.lock().unwrap().take()
    }

    fn apply(&self, store: &mut HashMap<String, String>, request: &UpdateRequest) {
        if let Some(items) = &request.insert {
            for (key, value) in items {
                store.insert(key.clone(), value.clone());
            }
        }
        if let Some(keys) = &request.delete {
            for key in keys {
                store.remove(key);
            }
        }
    }
}

#[async_trait]
impl StorageChannel for InMemoryChannel {
    async fn fetch_all(&self, request: &ScopeRequest) -> ChannelResult<Vec<Item>> {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall::FetchAll(request.clone()));
        if let Some(error) = self.take_failure() {
            return Err(error);
        }

        let items = self
            .contents(request)
            .into_iter()
            .collect::<Vec<Item>>();
        Ok(items)
    }

    async fn submit_update(&self, request: &UpdateRequest) -> ChannelResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall::SubmitUpdate(request.clone()));
        if let Some(error) = self.take_failure() {
            return Err(error);
        }

        match &request.scope.workspace {
            None => self.apply(&mut self.global.lock().unwrap(), request),
            Some(id) => {
                let mut workspaces = self.workspaces.lock().unwrap();
                let store = workspaces.entry(id.clone()).or_default();
                self.apply(store, request);
            }
        }
        Ok(())
    }

    fn subscribe_shared_changes(&self) -> mpsc::UnboundedReceiver<ChangeNotification> {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall::SubscribeSharedChanges);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }
}
