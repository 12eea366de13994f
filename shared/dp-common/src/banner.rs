//! Cookie Banner State Machine
//!
//! Models the consent banner lifecycle: hidden for users who already
//! consented, a summary view, an expanded per-category view, and a terminal
//! submitted state. Transitions are triggered purely by user interaction —
//! there are no timers or external events.
//!
//! On submission the chosen per-category booleans map to processing purposes
//! via [`crate::types::consent::purposes_for`]; the server records one
//! consent per category.

use serde::{Deserialize, Serialize};

use crate::types::consent::ConsentType;

/// Visible state of the consent banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BannerState {
    /// Banner not shown (user already consented, or submission acknowledged).
    #[default]
    Hidden,
    /// Banner shown without per-category detail.
    VisibleSummary,
    /// Banner shown with the category breakdown expanded.
    VisibleDetailed,
    /// A choice was made; waiting for the UI to acknowledge and hide.
    Submitted,
}

/// User interaction driving a banner transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerEvent {
    /// Show the banner (no valid prior consent was found).
    Open,
    /// Expand the per-category breakdown.
    Expand,
    /// Collapse back to the summary view.
    Collapse,
    /// Accept every category.
    AcceptAll,
    /// Reject every revocable category.
    RejectAll,
    /// Accept the currently selected categories.
    AcceptSelected,
    /// Acknowledge the submission and hide the banner.
    Acknowledge,
}

/// Attempted transition is not defined for the current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("banner event {event:?} is not valid in state {state:?}")]
pub struct InvalidTransition {
    /// State the banner was in.
    pub state: BannerState,
    /// Event that was rejected.
    pub event: BannerEvent,
}

/// Per-category choices collected from the banner.
///
/// `essential` is not represented: it is always granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConsentSelection {
    /// Usage analytics.
    pub analytics: bool,
    /// Marketing communication.
    pub marketing: bool,
    /// Convenience features.
    pub functional: bool,
    /// Third-party processors.
    pub third_party: bool,
}

impl ConsentSelection {
    /// Selection with every revocable category granted.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            analytics: true,
            marketing: true,
            functional: true,
            third_party: true,
        }
    }

    /// Selection with every revocable category rejected.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            analytics: false,
            marketing: false,
            functional: false,
            third_party: false,
        }
    }

    /// The (category, granted) pairs this selection implies, essential first.
    #[must_use]
    pub const fn grants(&self) -> [(ConsentType, bool); 5] {
        [
            (ConsentType::Essential, true),
            (ConsentType::Analytics, self.analytics),
            (ConsentType::Marketing, self.marketing),
            (ConsentType::Functional, self.functional),
            (ConsentType::ThirdParty, self.third_party),
        ]
    }
}

/// Consent banner with its current state and working selection.
#[derive(Debug, Clone, Default)]
pub struct CookieBanner {
    state: BannerState,
    selection: ConsentSelection,
}

impl CookieBanner {
    /// Banner for a user with no valid prior consent (shown immediately).
    #[must_use]
    pub fn for_new_user() -> Self {
        Self {
            state: BannerState::VisibleSummary,
            selection: ConsentSelection::none(),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> BannerState {
        self.state
    }

    /// Current working selection (meaningful in the detailed view).
    #[must_use]
    pub const fn selection(&self) -> ConsentSelection {
        self.selection
    }

    /// Toggle one category in the working selection (detailed view only).
    pub fn set_category(&mut self, consent_type: ConsentType, granted: bool) {
        match consent_type {
            // Essential cannot be toggled.
            ConsentType::Essential => {}
            ConsentType::Analytics => self.selection.analytics = granted,
            ConsentType::Marketing => self.selection.marketing = granted,
            ConsentType::Functional => self.selection.functional = granted,
            ConsentType::ThirdParty => self.selection.third_party = granted,
        }
    }

    /// Apply a user interaction.
    ///
    /// Returns the selection to submit when the event completes the banner
    /// (`AcceptAll`, `RejectAll`, `AcceptSelected`), `None` otherwise.
    pub fn apply(
        &mut self,
        event: BannerEvent,
    ) -> Result<Option<ConsentSelection>, InvalidTransition> {
        use BannerEvent as E;
        use BannerState as S;

        let submitted = match (self.state, event) {
            (S::Hidden, E::Open) => {
                self.state = S::VisibleSummary;
                None
            }
            (S::VisibleSummary, E::Expand) => {
                self.state = S::VisibleDetailed;
                None
            }
            (S::VisibleDetailed, E::Collapse) => {
                self.state = S::VisibleSummary;
                None
            }
            (S::VisibleSummary | S::VisibleDetailed, E::AcceptAll) => {
                self.selection = ConsentSelection::all();
                self.state = S::Submitted;
                Some(self.selection)
            }
            (S::VisibleSummary | S::VisibleDetailed, E::RejectAll) => {
                self.selection = ConsentSelection::none();
                self.state = S::Submitted;
                Some(self.selection)
            }
            (S::VisibleDetailed, E::AcceptSelected) => {
                self.state = S::Submitted;
                Some(self.selection)
            }
            (S::Submitted, E::Acknowledge) => {
                self.state = S::Hidden;
                None
            }
            (state, event) => return Err(InvalidTransition { state, event }),
        };

        Ok(submitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_all_from_summary() {
        let mut banner = CookieBanner::for_new_user();
        let selection = banner.apply(BannerEvent::AcceptAll).unwrap().unwrap();
        assert_eq!(selection, ConsentSelection::all());
        assert_eq!(banner.state(), BannerState::Submitted);

        banner.apply(BannerEvent::Acknowledge).unwrap();
        assert_eq!(banner.state(), BannerState::Hidden);
    }

    #[test]
    fn detailed_selection_flow() {
        let mut banner = CookieBanner::for_new_user();
        banner.apply(BannerEvent::Expand).unwrap();
        assert_eq!(banner.state(), BannerState::VisibleDetailed);

        banner.set_category(ConsentType::Analytics, true);
        banner.set_category(ConsentType::Essential, false); // ignored

        let selection = banner.apply(BannerEvent::AcceptSelected).unwrap().unwrap();
        assert!(selection.analytics);
        assert!(!selection.marketing);

        let grants = selection.grants();
        assert_eq!(grants[0], (ConsentType::Essential, true));
        assert_eq!(grants[1], (ConsentType::Analytics, true));
    }

    #[test]
    fn accept_selected_requires_detailed_view() {
        let mut banner = CookieBanner::for_new_user();
        let err = banner.apply(BannerEvent::AcceptSelected).unwrap_err();
        assert_eq!(err.state, BannerState::VisibleSummary);
    }

    #[test]
    fn reject_all_clears_selection() {
        let mut banner = CookieBanner::for_new_user();
        banner.apply(BannerEvent::Expand).unwrap();
        banner.set_category(ConsentType::Marketing, true);

        let selection = banner.apply(BannerEvent::RejectAll).unwrap().unwrap();
        assert_eq!(selection, ConsentSelection::none());
    }

    #[test]
    fn hidden_banner_only_accepts_open() {
        let mut banner = CookieBanner::default();
        assert!(banner.apply(BannerEvent::AcceptAll).is_err());
        banner.apply(BannerEvent::Open).unwrap();
        assert_eq!(banner.state(), BannerState::VisibleSummary);
    }
}
