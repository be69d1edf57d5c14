//! External collaborators the assistant talks to.
//!
//! The dialogue engine and the setup state machine never reach into the
//! application directly; everything goes through these traits so each
//! side can be swapped for a stub in tests.

pub mod local;
pub mod model;

use async_trait::async_trait;

use crate::error::CollaboratorError;

pub use local::{ConsoleNavigator, InMemoryProfileService, ModeFlags, OutboxSender, TextResumeService};
pub use model::{DEFAULT_MATCH_SCORE, Recommendation, SkillGaps, UserProfile};

/// Page navigation. Fire-and-forget.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, route: &str);
}

/// Read access to the profile and recommendation data, plus generation.
#[async_trait]
pub trait ProfileService: Send + Sync {
    async fn profile(&self) -> UserProfile;

    async fn recommendations(&self) -> Vec<Recommendation>;

    async fn skill_gaps(&self) -> SkillGaps;

    /// Recompute recommendations for the given profile.
    async fn generate_recommendations(&self, profile: &UserProfile) -> Result<(), CollaboratorError>;
}

/// Resume generation.
#[async_trait]
pub trait ResumeService: Send + Sync {
    async fn generate_resume(&self, profile: &UserProfile) -> Result<(), CollaboratorError>;
}

/// Delivers a text message to a phone number.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, destination: &str, body: &str) -> Result<(), CollaboratorError>;
}

/// Application-wide mode flags.
pub trait ModeSwitch: Send + Sync {
    fn voice_mode(&self) -> bool;

    fn set_voice_mode(&self, enabled: bool);

    fn offline_mode(&self) -> bool;
}

/// Mask a phone number for logs, keeping the last four digits.
pub fn mask_destination(destination: &str) -> String {
    let chars: Vec<char> = destination.chars().collect();
    let keep = chars.len().min(4);
    let hidden = chars.len() - keep;
    let mut masked: String = std::iter::repeat_n('*', hidden).collect();
    masked.extend(&chars[hidden..]);
    masked
}
