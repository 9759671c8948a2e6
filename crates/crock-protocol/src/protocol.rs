use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire-level unit of exchange: an ordered (key, value) pair.
///
/// Serializes as a two-element JSON array, so item lists come out as
/// `[["k1","v1"],["k2","v2"]]`.
pub type Item = (String, String);

/// Method name for the fetch-all request.
pub const METHOD_FETCH_ALL: &str = "storage.fetch_all";
/// Method name for the update request.
pub const METHOD_UPDATE: &str = "storage.update";
/// Broadcast name for shared-store change notifications.
pub const EVENT_SHARED_CHANGED: &str = "storage.shared_changed";

/// Opaque identifier naming one workspace's private store.
///
/// How identifiers are derived (paths, UUIDs, ...) is the caller's concern;
/// crockd only ever compares them for equality when routing requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(String);

impl WorkspaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkspaceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for WorkspaceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Routing envelope attached to every storage request.
///
/// An absent `workspace` addresses the global store shared by all
/// consumers; a present one addresses that workspace's private store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<WorkspaceId>,
}

impl ScopeRequest {
    /// Address the global store.
    pub fn global() -> Self {
        Self { workspace: None }
    }

    /// Address a workspace's private store.
    pub fn workspace(id: WorkspaceId) -> Self {
        Self {
            workspace: Some(id),
        }
    }
}

/// One logical update operation: items to insert or overwrite plus keys to
/// delete, applied by crockd against the store named in `scope`.
///
/// Both sides are optional and an all-absent request is still valid on the
/// wire (it reaches the daemon and applies nothing).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    #[serde(flatten)]
    pub scope: ScopeRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert: Option<Vec<Item>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Vec<String>>,
}

impl UpdateRequest {
    pub fn new(scope: ScopeRequest) -> Self {
        Self {
            scope,
            insert: None,
            delete: None,
        }
    }

    pub fn with_insert(mut self, items: Vec<Item>) -> Self {
        self.insert = Some(items);
        self
    }

    pub fn with_delete(mut self, keys: Vec<String>) -> Self {
        self.delete = Some(keys);
        self
    }
}

/// Delta pushed by crockd when the shared store changed elsewhere.
///
/// A notification is meaningful when at least one of the two sides is
/// present; clients drop one with neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeNotification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed: Option<Vec<Item>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<Vec<String>>,
}

impl ChangeNotification {
    pub fn changed(items: Vec<Item>) -> Self {
        Self {
            changed: Some(items),
            deleted: None,
        }
    }

    pub fn deleted(keys: Vec<String>) -> Self {
        Self {
            changed: None,
            deleted: Some(keys),
        }
    }

    /// True when neither side is present.
    pub fn is_empty(&self) -> bool {
        self.changed.is_none() && self.deleted.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_scope_omits_workspace() {
        let json = serde_json::to_string(&ScopeRequest::global()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_workspace_scope_serializes_identity() {
        let req = ScopeRequest::workspace(WorkspaceId::from("ws-1"));
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"workspace\":\"ws-1\""));
    }

    #[test]
    fn test_scope_request_deserializes_absent_workspace() {
        let req: ScopeRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.workspace, None);
    }

    #[test]
    fn test_update_request_flattens_scope() {
        let req = UpdateRequest::new(ScopeRequest::workspace(WorkspaceId::from("ws-1")))
            .with_insert(vec![("a".to_string(), "1".to_string())]);
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"workspace\":\"ws-1\""));
        assert!(json.contains("\"insert\":[[\"a\",\"1\"]]"));
        assert!(!json.contains("delete"));
        assert!(!json.contains("scope"));
    }

    #[test]
    fn test_update_request_with_no_payload() {
        let req = UpdateRequest::new(ScopeRequest::global());
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_update_request_roundtrip() {
        let req = UpdateRequest::new(ScopeRequest::global())
            .with_insert(vec![("k".to_string(), "v".to_string())])
            .with_delete(vec!["old".to_string()]);
        let json = serde_json::to_string(&req).unwrap();
        let back: UpdateRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn test_notification_emptiness() {
        assert!(ChangeNotification::default().is_empty());
        assert!(!ChangeNotification::changed(vec![]).is_empty());
        assert!(!ChangeNotification::deleted(vec![]).is_empty());
    }

    #[test]
    fn test_notification_deserializes_partial_payload() {
        let n: ChangeNotification =
            serde_json::from_str(r#"{"deleted":["a","b"]}"#).unwrap();
        assert_eq!(n.changed, None);
        assert_eq!(n.deleted, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_workspace_id_display() {
        let id = WorkspaceId::new("ws-42");
        assert_eq!(format!("{}", id), "ws-42");
        assert_eq!(id.as_str(), "ws-42");
    }
}
