//! Guided setup state machine: which step the user is on.

use serde::{Deserialize, Serialize};

use super::model::PreferenceSet;

/// The steps of SMS setup.
///
/// PhoneEntry → Verification → Preferences → Complete, with two explicit
/// regressions: Verification → PhoneEntry (back) and Complete → Preferences
/// (edit settings).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStep {
    #[default]
    PhoneEntry,
    Verification,
    Preferences,
    Complete,
}

impl SetupStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: SetupStep) -> bool {
        use SetupStep::*;
        matches!(
            (self, target),
            (PhoneEntry, Verification)
                | (Verification, Preferences)
                | (Verification, PhoneEntry)
                | (Preferences, Complete)
                | (Complete, Preferences)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// 1-based position shown in the progress indicator.
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::PhoneEntry => 1,
            Self::Verification => 2,
            Self::Preferences => 3,
            Self::Complete => 4,
        }
    }
}

impl std::fmt::Display for SetupStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PhoneEntry => "phone_entry",
            Self::Verification => "verification",
            Self::Preferences => "preferences",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// Live state of one setup session.
///
/// The issued verification code is not part of this struct; it lives only
/// inside the verification service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupState {
    pub step: SetupStep,
    pub country_code: String,
    pub phone_number: String,
    /// Last code the user typed, kept for redisplay.
    pub submitted_code: String,
    pub verified: bool,
    pub preferences: PreferenceSet,
    /// User-correctable error from the last rejected input.
    pub error: Option<String>,
    /// A test message went out since setup last completed.
    pub test_sent: bool,
}

impl SetupState {
    pub fn new(country_code: impl Into<String>) -> Self {
        Self {
            step: SetupStep::default(),
            country_code: country_code.into(),
            phone_number: String::new(),
            submitted_code: String::new(),
            verified: false,
            preferences: PreferenceSet::default(),
            error: None,
            test_sent: false,
        }
    }

    /// Move to `target`, clearing the error. Returns `false` (and changes
    /// nothing) if the table does not allow the transition.
    pub fn transition(&mut self, target: SetupStep) -> bool {
        if !self.step.can_transition_to(target) {
            return false;
        }
        self.step = target;
        self.error = None;
        true
    }

    /// Full destination number, country code first.
    pub fn destination(&self) -> String {
        format!("{}{}", self.country_code, self.phone_number)
    }
}
