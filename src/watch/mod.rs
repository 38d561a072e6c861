//! Watch coordinator (C4, spec.md §4.4).
//!
//! Long-lived task per `Server`, run in a dedicated tokio task parallel to
//! the UI. Grounded directly on the teacher's `orchestration/sse_subscriber.rs`
//! reconnect loop: seed → stream → classify → reconnect, generalized from a
//! single CLI-event SSE feed to the ArgoCD application watch protocol with
//! the authoritative-reset semantics spec.md §4.4/P4 require.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, WatchEventType};
use crate::errors::{ErrorCategory, StructuredError};
use crate::retry::RetryConfig;
use crate::state::{DomainEvent, Msg};

/// Runs the watch protocol until `cancel` fires. Emits `Msg`s onto `tx` in
/// order (spec.md §4.4 "Ordering guarantees"): a single producer, so
/// `AppUpdated`/`AppDeleted` for the same app are totally ordered, and each
/// reconnect epoch begins with a fresh `AppsLoaded` fence.
pub async fn run(client: Arc<dyn ApiClient>, tx: mpsc::UnboundedSender<Msg>, cancel: CancellationToken) {
    let policy = RetryConfig::network_policy();
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            info!("watch coordinator: cancelled, stopping");
            return;
        }

        let _ = tx.send(Msg::Domain(DomainEvent::StatusChange("Loading…".to_string())));

        match client.list_applications().await {
            Ok(apps) => {
                attempt = 0;
                let _ = tx.send(Msg::Domain(DomainEvent::AppsLoaded(apps)));
                let _ = tx.send(Msg::Domain(DomainEvent::StatusChange("Live".to_string())));
            }
            Err(err) if err.category == ErrorCategory::Auth => {
                error!("watch coordinator: auth failure, entering auth-required");
                let _ = tx.send(Msg::Domain(DomainEvent::AuthError(err)));
                return;
            }
            Err(err) => {
                warn!("watch coordinator: list_applications failed: {}", err.message);
                if !policy.should_retry(&err) {
                    let _ = tx.send(Msg::Domain(DomainEvent::ApiError {
                        operation: "list_applications".to_string(),
                        error: err,
                    }));
                    return;
                }
                attempt += 1;
                let delay = policy.delay_for_attempt(attempt);
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return,
                }
                continue;
            }
        }

        match stream_until_failure(client.as_ref(), &tx, &cancel).await {
            StreamOutcome::Cancelled => {
                info!("watch coordinator: cancelled during stream");
                return;
            }
            StreamOutcome::AuthFailure(err) => {
                let _ = tx.send(Msg::Domain(DomainEvent::AuthError(err)));
                return;
            }
            StreamOutcome::Transient(err) => {
                debug!("watch coordinator: transient stream error, reconnecting: {}", err.message);
                let _ = tx.send(Msg::Domain(DomainEvent::StatusChange("Reconnecting…".to_string())));
                attempt += 1;
                let delay = policy.delay_for_attempt(attempt);
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return,
                }
            }
        }
    }
}

enum StreamOutcome {
    Cancelled,
    AuthFailure(StructuredError),
    Transient(StructuredError),
}

async fn stream_until_failure(
    client: &dyn ApiClient,
    tx: &mpsc::UnboundedSender<Msg>,
    cancel: &CancellationToken,
) -> StreamOutcome {
    let mut stream = match client.watch_applications().await {
        Ok(s) => s,
        Err(err) if err.category == ErrorCategory::Auth => return StreamOutcome::AuthFailure(err),
        Err(err) => return StreamOutcome::Transient(err),
    };

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return StreamOutcome::Cancelled,
            next = stream.next() => {
                match next {
                    Some(Ok(event)) => {
                        let msg = match event.kind {
                            WatchEventType::Added | WatchEventType::Modified => {
                                Msg::Domain(DomainEvent::AppUpdated(event.application))
                            }
                            WatchEventType::Deleted => {
                                Msg::Domain(DomainEvent::AppDeleted(event.application.name))
                            }
                        };
                        if tx.send(msg).is_err() {
                            return StreamOutcome::Cancelled;
                        }
                    }
                    Some(Err(err)) if err.category == ErrorCategory::Auth => {
                        return StreamOutcome::AuthFailure(err);
                    }
                    Some(Err(err)) if err.category == ErrorCategory::Stream => {
                        // Malformed event: log and skip, the stream continues
                        // (spec.md §4.4 "Failure taxonomy").
                        warn!("watch coordinator: malformed event skipped: {}", err.message);
                    }
                    Some(Err(err)) => return StreamOutcome::Transient(err),
                    None => {
                        return StreamOutcome::Transient(StructuredError::stream("watch stream ended"));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        DeleteOptions, HistoryRow, ResourceDiff, ResourceRef, ResourceTree, RevisionMetadata, RollbackOptions,
        SyncOptions, WatchEvent, WatchStream,
    };
    use crate::domain::Application;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeClient {
        list_calls: AtomicUsize,
        lists: Mutex<Vec<Vec<Application>>>,
        events: Mutex<Vec<Vec<Result<WatchEvent, StructuredError>>>>,
    }

    #[async_trait]
    impl ApiClient for FakeClient {
        async fn list_applications(&self) -> Result<Vec<Application>, StructuredError> {
            let idx = self.list_calls.fetch_add(1, Ordering::SeqCst);
            let lists = self.lists.lock().unwrap();
            Ok(lists.get(idx).cloned().unwrap_or_default())
        }

        async fn watch_applications(&self) -> Result<WatchStream, StructuredError> {
            let idx = self.list_calls.load(Ordering::SeqCst) - 1;
            let events = self.events.lock().unwrap();
            let batch = events.get(idx).cloned().unwrap_or_default();
            Ok(Box::pin(tokio_stream::iter(batch)))
        }

        async fn sync_application(&self, _name: &str, _opts: SyncOptions) -> Result<(), StructuredError> {
            Ok(())
        }
        async fn rollback_application(&self, _name: &str, _revision_id: i64, _opts: RollbackOptions) -> Result<(), StructuredError> {
            Ok(())
        }
        async fn get_rollback_history(&self, _name: &str) -> Result<Vec<HistoryRow>, StructuredError> {
            Ok(vec![])
        }
        async fn get_revision_metadata(&self, _name: &str, _revision: &str) -> Result<RevisionMetadata, StructuredError> {
            unimplemented!()
        }
        async fn get_managed_resource_diffs(&self, _name: &str) -> Result<Vec<ResourceDiff>, StructuredError> {
            Ok(vec![])
        }
        async fn get_resource_tree(&self, _name: &str) -> Result<ResourceTree, StructuredError> {
            Ok(ResourceTree::default())
        }
        async fn watch_resource_tree(
            &self,
            _name: &str,
        ) -> Result<std::pin::Pin<Box<dyn tokio_stream::Stream<Item = Result<ResourceTree, StructuredError>> + Send>>, StructuredError> {
            Ok(Box::pin(tokio_stream::empty()))
        }
        async fn delete_application(&self, _name: &str, _opts: DeleteOptions) -> Result<(), StructuredError> {
            Ok(())
        }
        async fn delete_resource(&self, _name: &str, _resource: ResourceRef, _force: bool, _propagation_policy: Option<String>) -> Result<(), StructuredError> {
            Ok(())
        }
    }

    fn app(name: &str) -> Application {
        Application::new(name)
    }

    /// Scenario S4 (spec.md §8): reconnect replaces the application set.
    #[tokio::test]
    async fn reconnect_is_authoritative() {
        let client = Arc::new(FakeClient {
            list_calls: AtomicUsize::new(0),
            lists: Mutex::new(vec![vec![app("a"), app("b")], vec![app("a"), app("c")]]),
            events: Mutex::new(vec![
                vec![Err(StructuredError::network("dropped"))],
                vec![],
            ]),
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();

        let handle = tokio::spawn(run(client, tx, cancel_clone));

        let mut state = crate::state::AppState::default();
        let mut saw_second_load = false;
        while let Some(msg) = rx.recv().await {
            state = crate::state::reduce(state, msg);
            if state.apps.len() == 2 && state.apps.contains_key("c") {
                saw_second_load = true;
                break;
            }
        }
        cancel.cancel();
        let _ = handle.await;

        assert!(saw_second_load);
        assert!(!state.apps.contains_key("b"));
    }
}
