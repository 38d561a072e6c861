//! Derived projections over `AppState` (spec.md §3, I1; §4.2).
//!
//! Every projection here is a pure function of state. They may be memoized
//! by a caller (e.g. the render adapter) but the memo key is exactly
//! `(apps, scope_*, search_query, active_filter, view)` as spec.md
//! requires — nothing else may perturb the result.

use crate::domain::{sort_unique, Application, View};

use super::AppState;

/// One row of the `apps`-view visible list.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleRow {
    pub label: String,
    pub app: Option<Application>,
}

/// The visible list at the current view (spec.md §3, I1).
pub fn visible(state: &AppState) -> Vec<VisibleRow> {
    match state.navigation.view {
        View::Clusters => sort_unique(
            state
                .apps
                .values()
                .filter_map(|a| a.cluster_label.clone()),
        )
        .into_iter()
        .map(|label| VisibleRow { label, app: None })
        .collect(),

        View::Namespaces => sort_unique(state.apps.values().filter_map(|a| {
            let cluster_ok = state.scope_clusters.is_empty()
                || a.cluster_label.as_deref().is_some_and(|c| state.scope_clusters.contains(c));
            if cluster_ok {
                a.namespace.clone()
            } else {
                None
            }
        }))
        .into_iter()
        .map(|label| VisibleRow { label, app: None })
        .collect(),

        View::Projects => sort_unique(state.apps.values().filter_map(|a| {
            let cluster_ok = state.scope_clusters.is_empty()
                || a.cluster_label.as_deref().is_some_and(|c| state.scope_clusters.contains(c));
            let ns_ok = state.scope_namespaces.is_empty()
                || a.namespace.as_deref().is_some_and(|n| state.scope_namespaces.contains(n));
            if cluster_ok && ns_ok {
                a.project.clone()
            } else {
                None
            }
        }))
        .into_iter()
        .map(|label| VisibleRow { label, app: None })
        .collect(),

        View::Apps => {
            let mut rows: Vec<Application> = state
                .apps
                .values()
                .filter(|a| {
                    let cluster_ok = state.scope_clusters.is_empty()
                        || a.cluster_label.as_deref().is_some_and(|c| state.scope_clusters.contains(c));
                    let ns_ok = state.scope_namespaces.is_empty()
                        || a.namespace.as_deref().is_some_and(|n| state.scope_namespaces.contains(n));
                    let proj_ok = state.scope_projects.is_empty()
                        || a.project.as_deref().is_some_and(|p| state.scope_projects.contains(p));
                    let search_ok = state.search_query.is_empty()
                        || a.name.to_lowercase().contains(&state.search_query.to_lowercase());
                    let filter_ok = match &state.active_filter {
                        None => true,
                        Some(f) => {
                            a.sync_status.map(|s| s.to_string()) == Some(f.clone())
                                || a.health_status.map(|h| h.to_string()) == Some(f.clone())
                        }
                    };
                    cluster_ok && ns_ok && proj_ok && search_ok && filter_ok
                })
                .cloned()
                .collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            rows.into_iter()
                .map(|app| VisibleRow { label: app.name.clone(), app: Some(app) })
                .collect()
        }
    }
}

/// Unique `cluster_label`s across all apps (used by C7 for `arg_type =
/// cluster`).
pub fn unique_clusters(state: &AppState) -> Vec<String> {
    sort_unique(state.apps.values().filter_map(|a| a.cluster_label.clone()))
}

/// Unique `namespace`s across apps whose `cluster_label` is in
/// `scope_clusters` (no filter if empty).
pub fn unique_namespaces(state: &AppState) -> Vec<String> {
    sort_unique(state.apps.values().filter_map(|a| {
        let ok = state.scope_clusters.is_empty()
            || a.cluster_label.as_deref().is_some_and(|c| state.scope_clusters.contains(c));
        ok.then(|| a.namespace.clone()).flatten()
    }))
}

/// Unique `project`s across apps further filtered by `scope_namespaces`.
pub fn unique_projects(state: &AppState) -> Vec<String> {
    sort_unique(state.apps.values().filter_map(|a| {
        let cluster_ok = state.scope_clusters.is_empty()
            || a.cluster_label.as_deref().is_some_and(|c| state.scope_clusters.contains(c));
        let ns_ok = state.scope_namespaces.is_empty()
            || a.namespace.as_deref().is_some_and(|n| state.scope_namespaces.contains(n));
        (cluster_ok && ns_ok).then(|| a.project.clone()).flatten()
    }))
}

/// Unique app names further filtered by `scope_projects`.
pub fn unique_app_names(state: &AppState) -> Vec<String> {
    sort_unique(state.apps.values().filter_map(|a| {
        let proj_ok = state.scope_projects.is_empty()
            || a.project.as_deref().is_some_and(|p| state.scope_projects.contains(p));
        proj_ok.then(|| a.name.clone())
    }))
}
