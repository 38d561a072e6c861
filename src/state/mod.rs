//! State store (C2, spec.md §4.2).
//!
//! A single authoritative `AppState` value plus a pure, total `reduce`
//! function over a closed set of `Msg` variants. `reduce` never performs
//! I/O, never spawns concurrency, and never panics — unknown messages
//! (there are none, the enum is closed) would return the input unchanged.
//!
//! Grounded on the teacher's `orchestration/state.rs` state-machine shape,
//! generalized from Mnemosyne's work-queue states to the navigation/scope
//! state spec.md §3 requires. Unlike the teacher's `ractor`-actor model,
//! `reduce` here is a plain function: every producer in §5 sends a `Msg`
//! over a channel, and a single task applies them serially.

mod msg;
pub mod selectors;

pub use msg::{DomainEvent, Msg, OperationEvent, SystemEvent};

use std::collections::HashMap;

use crate::domain::{Application, Mode, Modals, Navigation, Scope, View};
use crate::errors::{ErrorCategory, StructuredError};

/// Single authoritative application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub apps: HashMap<String, Application>,
    pub scope_clusters: Scope,
    pub scope_namespaces: Scope,
    pub scope_projects: Scope,
    pub selected_apps: std::collections::HashSet<String>,
    pub navigation: Navigation,
    pub mode: Mode,
    pub search_query: String,
    pub active_filter: Option<String>,
    pub command_buffer: String,
    pub command_input_key: u64,
    pub latest_version: Option<String>,
    pub is_version_outdated: bool,
    pub modals: Modals,
    pub status_line: Option<String>,
    /// Errors keyed by `(category, code, operation)` (spec.md §4.2).
    pub errors: HashMap<(ErrorCategory, String, String), StructuredError>,
    pub window_rows: u16,
    pub window_cols: u16,
    pub quit: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            apps: HashMap::new(),
            scope_clusters: Scope::new(),
            scope_namespaces: Scope::new(),
            scope_projects: Scope::new(),
            selected_apps: std::collections::HashSet::new(),
            navigation: Navigation::default(),
            mode: Mode::InitialLoading,
            search_query: String::new(),
            active_filter: None,
            command_buffer: String::new(),
            command_input_key: 0,
            latest_version: None,
            is_version_outdated: false,
            modals: Modals::default(),
            status_line: None,
            errors: HashMap::new(),
            window_rows: 24,
            window_cols: 80,
            quit: false,
        }
    }
}

impl AppState {
    fn scope_for(&self, view: View) -> &Scope {
        match view {
            View::Clusters => &self.scope_clusters,
            View::Namespaces => &self.scope_namespaces,
            View::Projects => &self.scope_projects,
            View::Apps => unreachable!("apps view has no scope of its own"),
        }
    }

    fn scope_for_mut(&mut self, view: View) -> &mut Scope {
        match view {
            View::Clusters => &mut self.scope_clusters,
            View::Namespaces => &mut self.scope_namespaces,
            View::Projects => &mut self.scope_projects,
            View::Apps => unreachable!("apps view has no scope of its own"),
        }
    }

    /// Zeroes every scope strictly below `view` (spec.md §3, I3).
    fn zero_scopes_below(&mut self, view: View) {
        match view {
            View::Clusters => {
                self.scope_namespaces.clear();
                self.scope_projects.clear();
            }
            View::Namespaces => {
                self.scope_projects.clear();
            }
            View::Projects | View::Apps => {}
        }
    }

    /// Clamp the cursor into `[0, max(0, len-1)]` (spec.md §3, I2).
    fn clamp_cursor(&mut self, visible_len: usize) {
        let max_idx = visible_len.saturating_sub(1);
        if self.navigation.selected_idx > max_idx {
            self.navigation.selected_idx = max_idx;
        }
    }
}

/// Applies `msg` to `state`, returning the new state. Pure and total.
pub fn reduce(mut state: AppState, msg: Msg) -> AppState {
    match msg {
        Msg::Noop => state,

        Msg::SetMode(mode) => {
            state.mode = mode;
            state
        }

        Msg::DrillDown(label) => {
            let view = state.navigation.view;
            if let Some(next) = view.next() {
                state.scope_for_mut(view).clear();
                state.scope_for_mut(view).insert(label);
                state.zero_scopes_below(view);
                state.navigation.view = next;
                state.navigation.selected_idx = 0;
            }
            state
        }

        Msg::NavigateUp => {
            let view = state.navigation.view;
            if let Some(prev) = view.prev() {
                state.navigation.view = prev;
                state.zero_scopes_below(prev);
                state.navigation.selected_idx = 0;
            }
            state
        }

        Msg::ClearCurrentScope => {
            let view = state.navigation.view;
            if view != View::Apps {
                state.scope_for_mut(view).clear();
            }
            state
        }

        Msg::Escape { now } => {
            let view = state.navigation.view;
            let has_own_scope = view != View::Apps && !state.scope_for(view).is_empty();
            if has_own_scope {
                state.scope_for_mut(view).clear();
            } else if let Some(prev) = view.prev() {
                state.navigation.view = prev;
                state.zero_scopes_below(prev);
                state.navigation.selected_idx = 0;
            }
            state.navigation.last_esc_pressed = Some(now);
            state
        }

        Msg::RecordKeyPress { now } => {
            state.navigation.last_g_pressed = Some(now);
            state
        }

        Msg::SetCursor(idx) => {
            state.navigation.selected_idx = idx;
            let len = selectors::visible(&state).len();
            state.clamp_cursor(len);
            state
        }

        Msg::CursorDelta(delta) => {
            let next = state.navigation.selected_idx as i64 + delta;
            state.navigation.selected_idx = next.max(0) as usize;
            let len = selectors::visible(&state).len();
            state.clamp_cursor(len);
            state
        }

        Msg::ToggleAppSelection(name) => {
            if !state.selected_apps.remove(&name) {
                state.selected_apps.insert(name);
            }
            state
        }

        Msg::DrillDownCursor => {
            let label = selectors::visible(&state)
                .get(state.navigation.selected_idx)
                .map(|row| row.label.clone());
            match label {
                Some(label) => reduce(state, Msg::DrillDown(label)),
                None => state,
            }
        }

        Msg::ToggleCursorSelection => {
            if state.navigation.view == View::Apps {
                let label = selectors::visible(&state)
                    .get(state.navigation.selected_idx)
                    .map(|row| row.label.clone());
                if let Some(label) = label {
                    return reduce(state, Msg::ToggleAppSelection(label));
                }
            }
            state
        }

        Msg::ClearSelection => {
            state.selected_apps.clear();
            state
        }

        Msg::ResetAll => {
            state.scope_clusters.clear();
            state.scope_namespaces.clear();
            state.scope_projects.clear();
            state.selected_apps.clear();
            state.navigation.view = View::Clusters;
            state.navigation.selected_idx = 0;
            state
        }

        Msg::SetSearchQuery(q) => {
            state.search_query = q;
            let len = selectors::visible(&state).len();
            state.clamp_cursor(len);
            state
        }

        Msg::AppendSearchChar(c) => {
            state.search_query.push(c);
            let len = selectors::visible(&state).len();
            state.clamp_cursor(len);
            state
        }

        Msg::SetActiveFilter(f) => {
            state.active_filter = f;
            let len = selectors::visible(&state).len();
            state.clamp_cursor(len);
            state
        }

        Msg::SetCommandBuffer(buf) => {
            state.command_buffer = buf;
            state
        }

        Msg::BumpCommandInputKey => {
            state.command_input_key = state.command_input_key.wrapping_add(1);
            state
        }

        Msg::OpenModal(modal) => {
            let prior = state.mode;
            state.modals.clear();
            match modal {
                ModalRequest::ConfirmSync { target, prune, watch } => {
                    state.modals.confirm_target = Some(target);
                    state.modals.confirm_sync_prune = prune;
                    state.modals.confirm_sync_watch = watch;
                    state.mode = Mode::ConfirmSync;
                }
                ModalRequest::ConfirmDelete { target } => {
                    state.modals.confirm_target = Some(target);
                    state.mode = Mode::ConfirmDelete;
                }
                ModalRequest::Rollback { app_name } => {
                    state.modals.rollback_app_name = Some(app_name);
                    state.mode = Mode::Rollback;
                }
                ModalRequest::Resources { app_name } => {
                    state.modals.sync_view_app = Some(app_name);
                    state.mode = Mode::Resources;
                }
                ModalRequest::InitialLoading => {
                    state.modals.initial_loading = true;
                    state.mode = Mode::InitialLoading;
                }
            }
            state.modals.prior_mode = Some(prior);
            state
        }

        Msg::CloseModal => {
            let restore = state.modals.prior_mode.take().unwrap_or(Mode::Normal);
            state.modals.clear();
            state.mode = restore;
            state
        }

        Msg::Domain(event) => apply_domain_event(state, event),
        Msg::Operation(event) => apply_operation_event(state, event),
        Msg::System(event) => apply_system_event(state, event),
    }
}

/// A request to open exactly one modal; translated into `Modals` field
/// writes by `reduce` so "setting any modal field clears the others"
/// (spec.md §3, I6) can't be violated by a caller setting two at once.
#[derive(Debug, Clone)]
pub enum ModalRequest {
    ConfirmSync { target: String, prune: bool, watch: bool },
    ConfirmDelete { target: String },
    Rollback { app_name: String },
    Resources { app_name: String },
    InitialLoading,
}

fn apply_domain_event(mut state: AppState, event: DomainEvent) -> AppState {
    match event {
        DomainEvent::AppsLoaded(apps) => {
            // Authoritative reset (spec.md §4.4, P4): the new list replaces
            // the application set wholesale, dropping anything not present.
            state.apps = apps.into_iter().map(|a| (a.name.clone(), a)).collect();
            let len = selectors::visible(&state).len();
            state.clamp_cursor(len);
            state
        }
        DomainEvent::AppUpdated(app) => {
            state.apps.insert(app.name.clone(), app);
            state
        }
        DomainEvent::AppDeleted(name) => {
            state.apps.remove(&name);
            let len = selectors::visible(&state).len();
            state.clamp_cursor(len);
            state
        }
        DomainEvent::AuthError(err) => {
            state.mode = Mode::AuthRequired;
            let key = err.coverage_key("watch");
            state.errors.insert(key, err);
            state
        }
        DomainEvent::ApiError { operation, error } => {
            let key = error.coverage_key(&operation);
            state.errors.insert(key, error);
            state
        }
        DomainEvent::StructuredError { operation, error } => {
            let key = error.coverage_key(&operation);
            state.errors.insert(key, error);
            state
        }
        DomainEvent::ErrorRecovered { category, code, operation } => {
            state.errors.remove(&(category, code, operation));
            state
        }
        DomainEvent::StatusChange(status) => {
            state.status_line = Some(status);
            state
        }
    }
}

fn apply_operation_event(mut state: AppState, event: OperationEvent) -> AppState {
    match event {
        OperationEvent::SyncCompleted { app_name, success, error } => {
            let op = format!("sync:{app_name}");
            if success {
                state.errors.retain(|(_, _, operation), _| operation != &op);
            } else if let Some(err) = error {
                let key = err.coverage_key(&op);
                state.errors.insert(key, err);
            }
            state
        }
        OperationEvent::MultiSyncCompleted { total: _, failures } => {
            for (app_name, err) in failures {
                let op = format!("sync:{app_name}");
                let key = err.coverage_key(&op);
                state.errors.insert(key, err);
            }
            state
        }
        OperationEvent::RollbackExecuted { app_name, success, error } => {
            let op = format!("rollback:{app_name}");
            if success {
                state.errors.retain(|(_, _, operation), _| operation != &op);
            } else if let Some(err) = error {
                let key = err.coverage_key(&op);
                state.errors.insert(key, err);
            }
            state
        }
        OperationEvent::ResourceTreeLoaded { .. } | OperationEvent::ResourceTreeStream { .. } => {
            // Tree payloads are owned by the resource-tree streamer (C5);
            // the store only needs to know operations completed without
            // error, which is handled via the generic error-coverage path.
            state
        }
    }
}

fn apply_system_event(mut state: AppState, event: SystemEvent) -> AppState {
    match event {
        SystemEvent::WindowSize(rows, cols) => {
            state.window_rows = rows;
            state.window_cols = cols;
            state
        }
        SystemEvent::Tick => state,
        SystemEvent::Quit => {
            state.quit = true;
            state
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Application;

    fn app(name: &str, cluster: &str, ns: &str, proj: &str) -> Application {
        let mut a = Application::new(name);
        a.cluster_label = Some(cluster.to_string());
        a.namespace = Some(ns.to_string());
        a.project = Some(proj.to_string());
        a
    }

    #[test]
    fn noop_is_identity() {
        let state = AppState::default();
        let before = format!("{state:?}");
        let after = reduce(state, Msg::Noop);
        assert_eq!(format!("{after:?}"), before);
    }

    #[test]
    fn drill_down_sets_scope_and_zeroes_below() {
        let mut state = AppState::default();
        state.apps = [app("frontend", "prod", "web", "e")]
            .into_iter()
            .map(|a| (a.name.clone(), a))
            .collect();
        state = reduce(state, Msg::DrillDown("prod".to_string()));
        assert_eq!(state.navigation.view, View::Namespaces);
        assert!(state.scope_clusters.contains("prod"));
        assert!(state.scope_namespaces.is_empty());
        assert_eq!(state.navigation.selected_idx, 0);
    }

    #[test]
    fn navigate_up_does_not_touch_scopes_at_or_above() {
        let mut state = AppState::default();
        state.scope_clusters.insert("prod");
        state.navigation.view = View::Namespaces;
        state.scope_namespaces.insert("web");
        state = reduce(state, Msg::NavigateUp);
        assert_eq!(state.navigation.view, View::Clusters);
        assert!(state.scope_clusters.contains("prod"));
        assert!(state.scope_namespaces.is_empty());
    }

    #[test]
    fn append_search_char_accumulates_a_multi_character_query() {
        let mut state = AppState::default();
        state = reduce(state, Msg::AppendSearchChar('f'));
        state = reduce(state, Msg::AppendSearchChar('e'));
        state = reduce(state, Msg::AppendSearchChar('n'));
        assert_eq!(state.search_query, "fen");
    }

    #[test]
    fn record_key_press_sets_last_g_pressed() {
        let state = AppState::default();
        let now = std::time::Instant::now();
        let state = reduce(state, Msg::RecordKeyPress { now });
        assert_eq!(state.navigation.last_g_pressed, Some(now));
    }

    #[test]
    fn escape_records_last_esc_pressed() {
        let state = AppState::default();
        let now = std::time::Instant::now();
        let state = reduce(state, Msg::Escape { now });
        assert_eq!(state.navigation.last_esc_pressed, Some(now));
    }

    #[test]
    fn toggle_selection_is_idempotent_pair() {
        let mut state = AppState::default();
        state = reduce(state, Msg::ToggleAppSelection("frontend".to_string()));
        assert!(state.selected_apps.contains("frontend"));
        state = reduce(state, Msg::ToggleAppSelection("frontend".to_string()));
        assert!(!state.selected_apps.contains("frontend"));
    }

    #[test]
    fn apps_loaded_is_authoritative_reset() {
        let mut state = AppState::default();
        let a = app("a", "prod", "web", "e");
        let b = app("b", "prod", "web", "e");
        state = reduce(state, Msg::Domain(DomainEvent::AppsLoaded(vec![a.clone(), b.clone()])));
        assert_eq!(state.apps.len(), 2);

        let mut a_updated = a.clone();
        a_updated.health_status = Some(crate::domain::HealthStatus::Degraded);
        state = reduce(state, Msg::Domain(DomainEvent::AppUpdated(a_updated)));

        let c = app("c", "stg", "db", "p");
        state = reduce(
            state,
            Msg::Domain(DomainEvent::AppsLoaded(vec![
                {
                    let mut a2 = a.clone();
                    a2.health_status = Some(crate::domain::HealthStatus::Healthy);
                    a2
                },
                c.clone(),
            ])),
        );
        assert_eq!(state.apps.len(), 2);
        assert!(!state.apps.contains_key("b"));
        assert!(state.apps.contains_key("c"));
    }

    #[test]
    fn opening_modal_clears_others_and_records_prior_mode() {
        let mut state = AppState::default();
        state.mode = Mode::Normal;
        state = reduce(
            state,
            Msg::OpenModal(ModalRequest::Rollback { app_name: "frontend".to_string() }),
        );
        assert_eq!(state.mode, Mode::Rollback);
        assert_eq!(state.modals.rollback_app_name.as_deref(), Some("frontend"));
        assert_eq!(state.modals.prior_mode, Some(Mode::Normal));

        state = reduce(state, Msg::CloseModal);
        assert_eq!(state.mode, Mode::Normal);
        assert!(!state.modals.is_active());
    }

    #[test]
    fn error_recovered_clears_slot() {
        let mut state = AppState::default();
        let err = StructuredError::network("refused");
        let key = err.coverage_key("sync:frontend");
        state = reduce(
            state,
            Msg::Domain(DomainEvent::ApiError { operation: "sync:frontend".to_string(), error: err }),
        );
        assert!(state.errors.contains_key(&key));
        state = reduce(
            state,
            Msg::Domain(DomainEvent::ErrorRecovered {
                category: key.0,
                code: key.1.clone(),
                operation: key.2.clone(),
            }),
        );
        assert!(!state.errors.contains_key(&key));
    }
}
