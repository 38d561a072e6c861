//! Application entity (spec.md §3) and its state attributes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sync status reported by the server for a single application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum SyncStatus {
    Synced,
    OutOfSync,
    Unknown,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncStatus::Synced => "Synced",
            SyncStatus::OutOfSync => "OutOfSync",
            SyncStatus::Unknown => "Unknown",
        };
        write!(f, "{s}")
    }
}

/// Health status reported by the server for a single application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum HealthStatus {
    Healthy,
    Progressing,
    Degraded,
    Suspended,
    Missing,
    Unknown,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Progressing => "Progressing",
            HealthStatus::Degraded => "Degraded",
            HealthStatus::Suspended => "Suspended",
            HealthStatus::Missing => "Missing",
            HealthStatus::Unknown => "Unknown",
        };
        write!(f, "{s}")
    }
}

/// An ArgoCD-managed application. Every field except `name` is nullable
/// (spec.md §3): the client may see partially-populated entities while the
/// watch stream is still converging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub app_namespace: Option<String>,
    pub cluster_label: Option<String>,
    pub namespace: Option<String>,
    pub project: Option<String>,
    pub application_set: Option<String>,
    pub sync_status: Option<SyncStatus>,
    pub health_status: Option<HealthStatus>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl Application {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            app_namespace: None,
            cluster_label: None,
            namespace: None,
            project: None,
            application_set: None,
            sync_status: None,
            health_status: None,
            last_sync_at: None,
        }
    }
}
