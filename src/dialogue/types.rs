//! Shared types for the dialogue engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Intent ──────────────────────────────────────────────────────────

/// Category of user goal inferred from free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentTag {
    Profile,
    Recommendations,
    SkillGap,
    Resume,
    Sms,
    Voice,
    Navigation,
    GeneralHelp,
    Application,
    Unknown,
}

impl std::fmt::Display for IntentTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Profile => "profile",
            Self::Recommendations => "recommendations",
            Self::SkillGap => "skill_gap",
            Self::Resume => "resume",
            Self::Sms => "sms",
            Self::Voice => "voice",
            Self::Navigation => "navigation",
            Self::GeneralHelp => "general_help",
            Self::Application => "application",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

// ── Domain context ──────────────────────────────────────────────────

/// Read-only snapshot of application state taken for each turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainContext {
    pub profile_complete: bool,
    pub recommendation_count: usize,
    pub skill_gap_count: usize,
    pub voice_mode_enabled: bool,
    pub offline_mode_enabled: bool,
}

// ── Commands ────────────────────────────────────────────────────────

/// Application pages reachable by navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Home,
    Profile,
    Recommendations,
    Feedback,
    SmsSetup,
}

impl Route {
    /// Router path handed to the navigation collaborator.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Profile => "/profile",
            Self::Recommendations => "/recommendations",
            Self::Feedback => "/feedback",
            Self::SmsSetup => "/sms-setup",
        }
    }

    /// Human-readable page name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Profile => "profile",
            Self::Recommendations => "recommendations",
            Self::Feedback => "feedback",
            Self::SmsSetup => "sms setup",
        }
    }
}

/// Informational follow-ups that only post a system message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipTopic {
    Profile,
    Resume,
    Voice,
    VoiceFeatures,
    SmsInfo,
    ApplicationProcess,
}

/// A deferred operation attached to a suggested action.
///
/// Closed set so messages stay serializable; the session executes them
/// against its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    Navigate { route: Route },
    SetVoiceMode { enabled: bool },
    InvokeIntent { intent: IntentTag },
    ShowNavigationOptions,
    GenerateRecommendations,
    GenerateResume,
    ExplainMatches,
    ShowCourses,
    ShowTips { topic: TipTopic },
}

/// A labeled, user-triggerable follow-up command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub label: String,
    pub command: Command,
}

impl Action {
    pub fn new(label: impl Into<String>, command: Command) -> Self {
        Self {
            label: label.into(),
            command,
        }
    }

    pub fn navigate(label: impl Into<String>, route: Route) -> Self {
        Self::new(label, Command::Navigate { route })
    }
}

// ── Message bodies ──────────────────────────────────────────────────

/// Usage instructions shown on open and for unrecognized input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guidelines {
    pub title: String,
    pub intro: String,
    pub how_to_use: Vec<String>,
    /// `(topic, example command)` pairs.
    pub examples: Vec<(String, String)>,
    pub tips: Vec<String>,
}

impl std::fmt::Display for Guidelines {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f)?;
        writeln!(f, "{}", self.intro)?;
        writeln!(f)?;
        writeln!(f, "How to use me:")?;
        for (i, step) in self.how_to_use.iter().enumerate() {
            writeln!(f, "{}. {}", i + 1, step)?;
        }
        writeln!(f)?;
        writeln!(f, "What can I do for you?")?;
        for (topic, example) in &self.examples {
            writeln!(f, "• {topic}: \"{example}\"")?;
        }
        for tip in &self.tips {
            writeln!(f)?;
            write!(f, "{tip}")?;
        }
        Ok(())
    }
}

/// Body of a message: plain text or rich content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum MessageBody {
    Text(String),
    Guidelines(Guidelines),
}

impl MessageBody {
    /// Plain-text rendering, used for speech output and terminals.
    pub fn as_plain_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Guidelines(g) => g.to_string(),
        }
    }
}

impl From<&str> for MessageBody {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for MessageBody {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// What the response generator produces for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePayload {
    pub body: MessageBody,
    pub actions: Vec<Action>,
}

impl ResponsePayload {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: MessageBody::Text(body.into()),
            actions: Vec::new(),
        }
    }

    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = actions;
        self
    }
}

// ── Messages ────────────────────────────────────────────────────────

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    System,
}

/// One entry in the session log. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Monotonically increasing within a session.
    pub id: u64,
    pub sender: Sender,
    pub body: MessageBody,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_actions: Vec<Action>,
}
