//! Resource-tree streamer (C5, spec.md §4.5).
//!
//! One subscription per inspected application; results merge into a single
//! logical view keyed by `(app_name, node_uid)`. Grounded on the same
//! reconnect-loop idiom as the watch coordinator (`crate::watch`), which in
//! turn follows the teacher's `orchestration/sse_subscriber.rs`.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{ApiClient, ResourceNode};
use crate::errors::StructuredError;

#[derive(Debug, Clone)]
pub struct MergedNode {
    pub app_name: String,
    pub node: ResourceNode,
}

#[derive(Debug, Clone)]
pub enum TreeEvent {
    NodesReplaced { app_name: String, nodes: Vec<ResourceNode> },
    SubscriptionError { app_name: String, error: StructuredError },
}

/// Merges node partitions from multiple concurrently-subscribed apps. Each
/// app owns exactly one partition; unsubscribing removes its nodes
/// atomically (spec.md §4.5 invariants).
#[derive(Debug, Default)]
pub struct MergedTreeView {
    partitions: HashMap<String, Vec<ResourceNode>>,
}

impl MergedTreeView {
    pub fn apply(&mut self, event: &TreeEvent) {
        match event {
            TreeEvent::NodesReplaced { app_name, nodes } => {
                self.partitions.insert(app_name.clone(), nodes.clone());
            }
            TreeEvent::SubscriptionError { .. } => {}
        }
    }

    /// Removes an app's partition entirely (closing its subscription).
    pub fn remove(&mut self, app_name: &str) {
        self.partitions.remove(app_name);
    }

    pub fn nodes(&self) -> impl Iterator<Item = MergedNode> + '_ {
        self.partitions.iter().flat_map(|(app_name, nodes)| {
            nodes.iter().map(move |node| MergedNode {
                app_name: app_name.clone(),
                node: node.clone(),
            })
        })
    }

    /// A node belongs to exactly one app partition, keyed by `(app_name,
    /// node_uid)`.
    pub fn find(&self, app_name: &str, uid: &str) -> Option<&ResourceNode> {
        self.partitions.get(app_name)?.iter().find(|n| n.uid == uid)
    }
}

/// Handle to a single app's tree subscription task.
pub struct TreeSubscription {
    pub app_name: String,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TreeSubscription {
    pub fn stop(self) {
        self.cancel.cancel();
    }

    pub async fn join(self) {
        let _ = self.handle.await;
    }
}

/// Opens a subscription for `app_name`, forwarding `TreeEvent`s onto `tx`.
pub fn subscribe(client: Arc<dyn ApiClient>, app_name: String, tx: mpsc::UnboundedSender<TreeEvent>) -> TreeSubscription {
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    let name_for_task = app_name.clone();

    let handle = tokio::spawn(async move {
        let mut stream = match client.watch_resource_tree(&name_for_task).await {
            Ok(s) => s,
            Err(err) => {
                let _ = tx.send(TreeEvent::SubscriptionError { app_name: name_for_task, error: err });
                return;
            }
        };

        loop {
            tokio::select! {
                _ = cancel_clone.cancelled() => {
                    debug!("tree subscription for {} cancelled", name_for_task);
                    return;
                }
                next = stream.next() => {
                    match next {
                        Some(Ok(tree)) => {
                            let _ = tx.send(TreeEvent::NodesReplaced {
                                app_name: name_for_task.clone(),
                                nodes: tree.nodes,
                            });
                        }
                        Some(Err(err)) => {
                            warn!("tree subscription for {}: {}", name_for_task, err.message);
                            let _ = tx.send(TreeEvent::SubscriptionError { app_name: name_for_task.clone(), error: err });
                        }
                        None => return,
                    }
                }
            }
        }
    });

    TreeSubscription { app_name, cancel, handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ResourceNode;

    fn node(uid: &str, parent: Option<&str>) -> ResourceNode {
        ResourceNode {
            uid: uid.to_string(),
            name: uid.to_string(),
            kind: "Pod".to_string(),
            namespace: Some("default".to_string()),
            parent_uid: parent.map(|p| p.to_string()),
            health: None,
        }
    }

    #[test]
    fn partitions_are_isolated_and_removable() {
        let mut view = MergedTreeView::default();
        view.apply(&TreeEvent::NodesReplaced {
            app_name: "frontend".to_string(),
            nodes: vec![node("n1", None)],
        });
        view.apply(&TreeEvent::NodesReplaced {
            app_name: "cache".to_string(),
            nodes: vec![node("n1", None)],
        });

        assert!(view.find("frontend", "n1").is_some());
        assert!(view.find("cache", "n1").is_some());
        assert_eq!(view.nodes().count(), 2);

        view.remove("frontend");
        assert!(view.find("frontend", "n1").is_none());
        assert_eq!(view.nodes().count(), 1);
    }
}
