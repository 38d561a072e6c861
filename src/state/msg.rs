//! The closed message set `reduce` dispatches over (spec.md §4.2).

use std::time::Instant;

use crate::domain::{Application, Mode};
use crate::errors::{ErrorCategory, StructuredError};

use super::ModalRequest;

#[derive(Debug, Clone)]
pub enum Msg {
    Noop,

    // Mode transitions
    SetMode(Mode),

    // View / selection updates
    DrillDown(String),
    NavigateUp,
    ClearCurrentScope,
    Escape { now: Instant },
    /// Records the first press of a double-key gesture (`gg`) onto
    /// `Navigation::last_g_pressed` so the second press can be recognized
    /// within the debounce window (spec.md §4.8/§9).
    RecordKeyPress { now: Instant },
    SetCursor(usize),
    CursorDelta(i64),
    ToggleAppSelection(String),
    ClearSelection,
    ResetAll,

    /// `Enter`/`Space` resolve against whatever label is under the cursor
    /// at reduce time, since the input dispatcher (C8) only has access to
    /// `Navigation`, not the full visible-list projection (spec.md §6 key
    /// bindings table: `Enter` "drill down", `Space` "toggle app
    /// selection"). `reduce` expands these into the label-carrying
    /// `DrillDown`/`ToggleAppSelection` semantics above.
    DrillDownCursor,
    ToggleCursorSelection,

    // Scope mutations are expressed through DrillDown/NavigateUp/ClearCurrentScope above.

    // Modal toggles
    OpenModal(ModalRequest),
    CloseModal,

    // UI field setters
    SetSearchQuery(String),
    /// Appends one typed character to the search buffer. The input
    /// dispatcher only sees `Navigation`, not `AppState::search_query`, so
    /// per-keystroke accumulation happens here in `reduce` rather than at
    /// the handler (spec.md §3 I1: substring search over `name`).
    AppendSearchChar(char),
    SetActiveFilter(Option<String>),
    SetCommandBuffer(String),
    BumpCommandInputKey,

    // Inbound domain events / operation lifecycle / system events
    Domain(DomainEvent),
    Operation(OperationEvent),
    System(SystemEvent),
}

#[derive(Debug, Clone)]
pub enum DomainEvent {
    AppsLoaded(Vec<Application>),
    AppUpdated(Application),
    AppDeleted(String),
    AuthError(StructuredError),
    ApiError { operation: String, error: StructuredError },
    StructuredError { operation: String, error: StructuredError },
    ErrorRecovered { category: ErrorCategory, code: String, operation: String },
    StatusChange(String),
}

#[derive(Debug, Clone)]
pub enum OperationEvent {
    SyncCompleted {
        app_name: String,
        success: bool,
        error: Option<StructuredError>,
    },
    MultiSyncCompleted {
        total: usize,
        failures: Vec<(String, StructuredError)>,
    },
    RollbackExecuted {
        app_name: String,
        success: bool,
        error: Option<StructuredError>,
    },
    ResourceTreeLoaded {
        app_name: String,
    },
    ResourceTreeStream {
        app_name: String,
    },
}

#[derive(Debug, Clone)]
pub enum SystemEvent {
    WindowSize(u16, u16),
    Tick,
    Quit,
}
