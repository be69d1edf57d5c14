//! Keyword rules that map free text to an intent.
//!
//! Rules are checked in order and the first match wins, so earlier rules
//! shadow later ones on overlapping vocabulary ("internship profile help"
//! is a profile question). Matching is case-insensitive substring
//! containment; there is no scoring or tokenization.

use tracing::debug;

use crate::dialogue::types::IntentTag;

/// How a rule's trigger phrases combine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Matches when any phrase is contained in the input.
    Any(Vec<String>),
    /// Matches when every phrase is contained in the input.
    All(Vec<String>),
}

impl Trigger {
    pub fn any(phrases: &[&str]) -> Self {
        Self::Any(phrases.iter().map(|p| p.to_lowercase()).collect())
    }

    pub fn all(phrases: &[&str]) -> Self {
        Self::All(phrases.iter().map(|p| p.to_lowercase()).collect())
    }

    /// `normalized` must already be lowercased.
    fn matches(&self, normalized: &str) -> bool {
        match self {
            Self::Any(phrases) => phrases.iter().any(|p| normalized.contains(p.as_str())),
            Self::All(phrases) => {
                !phrases.is_empty() && phrases.iter().all(|p| normalized.contains(p.as_str()))
            }
        }
    }
}

/// A single intent rule.
#[derive(Debug, Clone)]
pub struct IntentRule {
    pub intent: IntentTag,
    pub trigger: Trigger,
}

/// Ordered keyword classifier.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl IntentClassifier {
    /// The assistant's rule table, in priority order.
    pub fn default_rules() -> Self {
        let rules = vec![
            IntentRule {
                intent: IntentTag::Profile,
                trigger: Trigger::any(&["profile"]),
            },
            IntentRule {
                intent: IntentTag::Recommendations,
                trigger: Trigger::any(&["recommendation", "internship", "match"]),
            },
            IntentRule {
                intent: IntentTag::SkillGap,
                trigger: Trigger::all(&["skill", "gap"]),
            },
            IntentRule {
                intent: IntentTag::Resume,
                trigger: Trigger::any(&["resume", "cv"]),
            },
            IntentRule {
                intent: IntentTag::Sms,
                trigger: Trigger::any(&["sms", "offline"]),
            },
            IntentRule {
                intent: IntentTag::Voice,
                trigger: Trigger::any(&["voice", "speak"]),
            },
            IntentRule {
                intent: IntentTag::Navigation,
                trigger: Trigger::any(&["navigate", "go to", "page"]),
            },
            IntentRule {
                intent: IntentTag::GeneralHelp,
                trigger: Trigger::any(&["help", "how"]),
            },
            IntentRule {
                intent: IntentTag::Application,
                trigger: Trigger::any(&["apply", "application"]),
            },
        ];

        Self { rules }
    }

    /// A classifier with no rules; everything is `Unknown`.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule at the lowest priority.
    pub fn add_rule(&mut self, intent: IntentTag, trigger: Trigger) {
        self.rules.push(IntentRule { intent, trigger });
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    /// Classify raw input. Returns `Unknown` when no rule matches.
    pub fn classify(&self, text: &str) -> IntentTag {
        let normalized = text.to_lowercase();
        for rule in &self.rules {
            if rule.trigger.matches(&normalized) {
                debug!(intent = %rule.intent, "Input matched intent rule");
                return rule.intent;
            }
        }
        debug!("No intent rule matched");
        IntentTag::Unknown
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::default_rules()
    }
}
