//! View, Mode and Modals (spec.md §3).

/// A level in the navigation hierarchy. Ordered; each view has a unique
/// parent except `Clusters` (spec.md §3, I3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Clusters,
    Namespaces,
    Projects,
    Apps,
}

impl View {
    /// The view one level toward `Apps`, or `None` if already there.
    pub fn next(self) -> Option<View> {
        match self {
            View::Clusters => Some(View::Namespaces),
            View::Namespaces => Some(View::Projects),
            View::Projects => Some(View::Apps),
            View::Apps => None,
        }
    }

    /// The view one level toward `Clusters`, or `None` if already there.
    pub fn prev(self) -> Option<View> {
        match self {
            View::Clusters => None,
            View::Namespaces => Some(View::Clusters),
            View::Projects => Some(View::Namespaces),
            View::Apps => Some(View::Projects),
        }
    }
}

/// Determines which input handler may fire (spec.md §3, I5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Normal,
    Command,
    Search,
    Loading,
    AuthRequired,
    Help,
    External,
    Rollback,
    Resources,
    ConfirmSync,
    ConfirmDelete,
    InitialLoading,
}

/// At most one modal is active at a time (spec.md §3, I6). Setting any
/// field clears the others and records the mode to restore on close.
#[derive(Debug, Clone, Default)]
pub struct Modals {
    pub confirm_target: Option<String>,
    pub confirm_sync_prune: bool,
    pub confirm_sync_watch: bool,
    pub rollback_app_name: Option<String>,
    pub sync_view_app: Option<String>,
    pub initial_loading: bool,
    /// Mode to restore when the active modal closes.
    pub prior_mode: Option<Mode>,
}

impl Modals {
    pub fn is_active(&self) -> bool {
        self.confirm_target.is_some()
            || self.rollback_app_name.is_some()
            || self.sync_view_app.is_some()
            || self.initial_loading
    }

    /// Clears every modal field; does not touch `prior_mode` (callers
    /// restore it themselves once they've read it).
    pub fn clear(&mut self) {
        self.confirm_target = None;
        self.confirm_sync_prune = false;
        self.confirm_sync_watch = false;
        self.rollback_app_name = None;
        self.sync_view_app = None;
        self.initial_loading = false;
    }
}
