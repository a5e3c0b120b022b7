//! When to fit the map to the marker set.
//!
//! The view is fitted automatically when data arrives, until the user moves
//! the map themselves. After that only an explicit reset fits again.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitState {
    /// No fit has happened yet.
    #[default]
    Unfitted,
    /// The current view came from an automatic fit.
    AutoFitted,
    /// The user moved the map themselves, before or after a fit.
    UserAdjusted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitEvent {
    /// The marker set was (re)loaded.
    DataLoaded,
    /// The user asked to see all markers again.
    ResetRequested,
    /// A user-originated map movement.
    UserMoved,
}

/// Outcome of one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitTransition {
    pub state: FitState,
    /// Whether the view should be fitted now.
    pub fit: bool,
}

impl FitState {
    /// Next state for `event`. A fit is only ever requested when there are
    /// markers to fit to.
    pub fn on_event(self, event: FitEvent, has_markers: bool) -> FitTransition {
        use FitState::*;

        let (state, fit) = match (self, event) {
            (_, FitEvent::ResetRequested) if has_markers => (AutoFitted, true),
            (_, FitEvent::ResetRequested) => (Unfitted, false),

            (Unfitted | AutoFitted, FitEvent::DataLoaded) if has_markers => (AutoFitted, true),
            (state, FitEvent::DataLoaded) => (state, false),

            (_, FitEvent::UserMoved) => (UserAdjusted, false),
        };

        FitTransition { state, fit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_data_fits() {
        let t = FitState::Unfitted.on_event(FitEvent::DataLoaded, true);
        assert_eq!(t, FitTransition { state: FitState::AutoFitted, fit: true });
    }

    #[test]
    fn test_empty_data_does_not_fit() {
        let t = FitState::Unfitted.on_event(FitEvent::DataLoaded, false);
        assert_eq!(t, FitTransition { state: FitState::Unfitted, fit: false });
    }

    #[test]
    fn test_user_move_blocks_refit() {
        let t = FitState::AutoFitted.on_event(FitEvent::UserMoved, true);
        assert_eq!(t.state, FitState::UserAdjusted);

        let t = t.state.on_event(FitEvent::DataLoaded, true);
        assert_eq!(t, FitTransition { state: FitState::UserAdjusted, fit: false });
    }

    #[test]
    fn test_reset_always_fits() {
        let t = FitState::UserAdjusted.on_event(FitEvent::ResetRequested, true);
        assert_eq!(t, FitTransition { state: FitState::AutoFitted, fit: true });

        let t = FitState::UserAdjusted.on_event(FitEvent::ResetRequested, false);
        assert_eq!(t, FitTransition { state: FitState::Unfitted, fit: false });
    }

    #[test]
    fn test_move_before_data_blocks_first_fit() {
        let t = FitState::Unfitted.on_event(FitEvent::UserMoved, false);
        assert_eq!(t, FitTransition { state: FitState::UserAdjusted, fit: false });

        let t = t.state.on_event(FitEvent::DataLoaded, true);
        assert_eq!(t, FitTransition { state: FitState::UserAdjusted, fit: false });

        let t = t.state.on_event(FitEvent::ResetRequested, true);
        assert_eq!(t, FitTransition { state: FitState::AutoFitted, fit: true });
    }
}
