//! Global store client with change-notification fan-out.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use crock_protocol::ChangeNotification;
use futures::stream::BoxStream;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::channel::{ChannelResult, StorageChannel};
use crate::scoped::{ScopedClient, ScopedStore, Snapshot, StorageScope, UpdateBatch};

/// Capacity of the local change-event fan-out.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Delta applied to the global store by activity elsewhere (typically
/// another process instance sharing the same daemon).
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChangeEvent {
    /// Keys changed remotely with their new values. `None` when the
    /// notification carried no changed set.
    pub changed: Option<HashMap<String, String>>,
    /// Keys deleted remotely. `None` when the notification carried no
    /// deleted set.
    pub deleted: Option<HashSet<String>>,
}

impl StorageChangeEvent {
    /// Materialize a wire notification into a local event.
    ///
    /// Returns `None` when the notification carries neither a changed nor a
    /// deleted set — such notifications are dropped, not surfaced.
    pub(crate) fn from_notification(notification: ChangeNotification) -> Option<Self> {
        if notification.is_empty() {
            return None;
        }
        Some(Self {
            changed: notification
                .changed
                .map(|items| items.into_iter().collect()),
            deleted: notification.deleted.map(|keys| keys.into_iter().collect()),
        })
    }
}

/// Client for the store shared by every consumer talking to the daemon.
///
/// Construction subscribes to the daemon's shared-change broadcast;
/// meaningful notifications are republished on [`change_stream`] so
/// concurrent writers can converge by reconciling deltas instead of
/// locking. Teardown (or drop) releases the subscription.
///
/// Must be constructed inside a tokio runtime: the notification forwarder
/// runs as a spawned task.
///
/// [`change_stream`]: ScopedStore::change_stream
pub struct GlobalStore {
    inner: ScopedClient,
    change_tx: broadcast::Sender<StorageChangeEvent>,
    forward_task: Mutex<Option<JoinHandle<()>>>,
}

impl GlobalStore {
    pub fn new(channel: Arc<dyn StorageChannel>) -> Self {
        let mut notifications = channel.subscribe_shared_changes();
        let (change_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let tx = change_tx.clone();
        let forward_task = tokio::spawn(async move {
            while let Some(notification) = notifications.recv().await {
                match StorageChangeEvent::from_notification(notification) {
                    Some(event) => {
                        // Send only fails when nobody is subscribed; events
                        // are not buffered for late subscribers.
                        let _ = tx.send(event);
                    }
                    None => debug!("Dropping shared-change notification with no payload"),
                }
            }
        });

        Self {
            inner: ScopedClient::new(channel, StorageScope::Global),
            change_tx,
            forward_task: Mutex::new(Some(forward_task)),
        }
    }
}

#[async_trait]
impl ScopedStore for GlobalStore {
    async fn fetch_all(&self) -> ChannelResult<Snapshot> {
        self.inner.fetch_all().await
    }

    async fn submit_update(&self, batch: UpdateBatch) -> ChannelResult<()> {
        self.inner.submit_update(batch).await
    }

    fn change_stream(&self) -> BoxStream<'static, StorageChangeEvent> {
        let mut rx = self.change_tx.subscribe();
        Box::pin(async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(event) => yield event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Change-event consumer lagged; events were dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    fn teardown(&self) {
        if let Some(task) = self.forward_task.lock().unwrap().take() {
            debug!("Tearing down global store client");
            task.abort();
        }
    }
}

impl Drop for GlobalStore {
    fn drop(&mut self) {
        self.teardown();
    }
}
