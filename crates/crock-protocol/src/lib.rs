//! Protocol types for talking to the crockd storage daemon.
//!
//! These are the logical message shapes exchanged over the storage channel:
//! scope-routed requests, update batches, and shared-store change
//! notifications. The shapes are transport-agnostic; whatever carries them
//! (Unix socket JSON-RPC, pipes, an in-memory channel in tests) only needs
//! to preserve the field structure and the method names exported here.

mod protocol;

pub use protocol::{
    ChangeNotification, Item, ScopeRequest, UpdateRequest, WorkspaceId, EVENT_SHARED_CHANGED,
    METHOD_FETCH_ALL, METHOD_UPDATE,
};
