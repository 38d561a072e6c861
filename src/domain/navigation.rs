//! Navigation cursor and double-key debounce bookkeeping (spec.md §3, §9).

use std::time::Instant;

use super::ui::View;

/// The debounce window shared by `gg` and double-`Esc` (spec.md §4.8, §9).
/// Always the same constant for both gestures, stored on the `Navigation`
/// record rather than an external timer so `reduce` stays pure and
/// deterministic given a supplied `now`.
pub const DOUBLE_KEY_WINDOW_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct Navigation {
    pub view: View,
    pub selected_idx: usize,
    pub last_g_pressed: Option<Instant>,
    pub last_esc_pressed: Option<Instant>,
}

impl Default for Navigation {
    fn default() -> Self {
        Self {
            view: View::Clusters,
            selected_idx: 0,
            last_g_pressed: None,
            last_esc_pressed: None,
        }
    }
}

impl Navigation {
    /// Whether `now` falls within the double-key window of a prior press.
    pub fn within_window(prior: Option<Instant>, now: Instant) -> bool {
        match prior {
            Some(t) => now.duration_since(t).as_millis() <= DOUBLE_KEY_WINDOW_MS as u128,
            None => false,
        }
    }
}
