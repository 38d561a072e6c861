//! API client contract (C3, spec.md §4.3).
//!
//! The core depends only on this capability set; the wire protocol
//! (REST/gRPC-web) is an out-of-scope collaborator concern (spec.md §1).
//! Grounded on the teacher's adapter-trait style (`async_trait` interfaces
//! consumed by orchestration actors, e.g. `orchestration/integrations/mcp.rs`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Application;
use crate::errors::StructuredError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WatchEventType {
    Added,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchEvent {
    #[serde(rename = "type")]
    pub kind: WatchEventType,
    pub application: Application,
}

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub prune: bool,
    pub app_namespace: Option<String>,
    pub dry_run: bool,
    pub strategy: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RollbackOptions {
    pub prune: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct HistoryRow {
    pub revision_id: i64,
    pub revision: String,
    pub source: String,
    pub deployed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RevisionMetadata {
    pub author: String,
    pub date: DateTime<Utc>,
    pub message: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ResourceDiff {
    pub group: String,
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
    pub live: Option<String>,
    pub target: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResourceNode {
    pub uid: String,
    pub name: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub parent_uid: Option<String>,
    pub health: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceTree {
    pub nodes: Vec<ResourceNode>,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    pub cascade: bool,
    pub propagation_policy: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResourceRef {
    pub group: String,
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
}

/// An event stream of `WatchEvent`s, boxed so implementations can be
/// backed by SSE (`eventsource-client`), gRPC-web, or a test double.
pub type WatchStream =
    std::pin::Pin<Box<dyn futures_core_stream::Stream<Item = Result<WatchEvent, StructuredError>> + Send>>;

/// A tiny re-export shim so this module doesn't need to depend on the
/// `futures` crate just for the `Stream` trait alias above.
mod futures_core_stream {
    pub use tokio_stream::Stream;
}

/// Decodes one raw watch-stream payload (spec.md §6: "The watch stream
/// delivers JSON events `{type, application}`"). A free function rather
/// than a method on a concrete client, so any `ApiClient` implementation
/// (SSE, gRPC-web, or a test double) can reuse the same decode step.
pub fn decode_watch_event(raw: &str) -> Result<WatchEvent, StructuredError> {
    serde_json::from_str(raw).map_err(|e| StructuredError::stream(format!("malformed watch event: {e}")))
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn list_applications(&self) -> Result<Vec<Application>, StructuredError>;

    async fn watch_applications(&self) -> Result<WatchStream, StructuredError>;

    async fn sync_application(&self, name: &str, opts: SyncOptions) -> Result<(), StructuredError>;

    async fn rollback_application(
        &self,
        name: &str,
        revision_id: i64,
        opts: RollbackOptions,
    ) -> Result<(), StructuredError>;

    async fn get_rollback_history(&self, name: &str) -> Result<Vec<HistoryRow>, StructuredError>;

    async fn get_revision_metadata(&self, name: &str, revision: &str) -> Result<RevisionMetadata, StructuredError>;

    async fn get_managed_resource_diffs(&self, name: &str) -> Result<Vec<ResourceDiff>, StructuredError>;

    async fn get_resource_tree(&self, name: &str) -> Result<ResourceTree, StructuredError>;

    async fn watch_resource_tree(
        &self,
        name: &str,
    ) -> Result<std::pin::Pin<Box<dyn tokio_stream::Stream<Item = Result<ResourceTree, StructuredError>> + Send>>, StructuredError>;

    async fn delete_application(&self, name: &str, opts: DeleteOptions) -> Result<(), StructuredError>;

    async fn delete_resource(&self, name: &str, resource: ResourceRef, force: bool, propagation_policy: Option<String>) -> Result<(), StructuredError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_well_formed_watch_event() {
        let raw = r#"{"type":"MODIFIED","application":{"name":"frontend","app_namespace":null,"cluster_label":"prod","namespace":"web","project":"ecommerce","application_set":null,"sync_status":"Synced","health_status":"Healthy","last_sync_at":null}}"#;
        let event = decode_watch_event(raw).unwrap();
        assert_eq!(event.kind, WatchEventType::Modified);
        assert_eq!(event.application.name, "frontend");
    }

    #[test]
    fn rejects_malformed_payload_as_a_stream_error() {
        let err = decode_watch_event("{not json").unwrap_err();
        assert_eq!(err.category, crate::errors::ErrorCategory::Stream);
    }

    #[tokio::test]
    async fn mock_client_reports_the_sync_options_it_was_given() {
        let mut mock = MockApiClient::new();
        mock.expect_sync_application()
            .withf(|name, opts| name == "frontend" && opts.prune)
            .returning(|_, _| Ok(()));

        let result = mock.sync_application("frontend", SyncOptions { prune: true, ..Default::default() }).await;
        assert!(result.is_ok());
    }
}
