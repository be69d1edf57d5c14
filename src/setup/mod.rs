//! Guided SMS setup. Enrolls a phone number for offline internship alerts.
//!
//! The flow is a small state machine (`state`) driven by `SetupManager`:
//! the user enters a phone number, proves ownership with a short code,
//! picks notification preferences and activates. Saved settings go through
//! a `SettingsRepository`, so a restarted session resumes where it ended.

pub mod manager;
pub mod model;
pub mod notification;
pub mod state;
pub mod verification;

pub use manager::{SetupDeps, SetupManager};
pub use model::{
    COUNTRY_CODES, CountryCode, Frequency, MaxItems, PreferenceSet, SavedSettings, TimeSlot,
    suggest_country_code,
};
pub use notification::NotificationBuilder;
pub use state::{SetupState, SetupStep};
pub use verification::{CodeCheck, VerificationCodeService};
