//! Domain model (C1)
//!
//! Value types for Argonaut's navigation and application entities. Nothing
//! in this module performs I/O or owns mutable shared state; the state
//! store (`crate::state`) is the only place these values are mutated.

mod application;
mod navigation;
mod scope;
mod server;
mod ui;

pub use application::{Application, HealthStatus, SyncStatus};
pub use navigation::Navigation;
pub use scope::Scope;
pub use server::Server;
pub use ui::{Mode, Modals, View};

/// Deterministic sort-unique over an iterator of owned strings.
///
/// Used throughout the visible-list derivation (state::selectors) and the
/// autocomplete engine (C7) to turn a multiset of scope attributes into the
/// ordered, deduplicated candidate lists those components require.
pub fn sort_unique<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    let mut set: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
    for item in items {
        set.insert(item);
    }
    set.into_iter().collect()
}
