//! Profile and recommendation records shared by the dialogue engine and the
//! notification builder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Match percentage used when a record carries no score.
pub const DEFAULT_MATCH_SCORE: u32 = 85;

/// The user's profile as seen by the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(default = "default_language")]
    pub preferred_language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            skills: Vec::new(),
            location: None,
            education: None,
            preferred_language: default_language(),
        }
    }
}

impl UserProfile {
    /// A profile is complete once it has a name and at least one skill.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.skills.is_empty()
    }

    /// Display name, if one is set.
    pub fn display_name(&self) -> Option<&str> {
        let name = self.name.trim();
        (!name.is_empty()).then_some(name)
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s.eq_ignore_ascii_case(skill))
    }
}

/// One internship recommendation.
///
/// Producers disagree on the score field name, so both `skillMatch` and
/// `match` are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_match: Option<u32>,
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stipend: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_skills: Vec<String>,
}

impl Recommendation {
    pub fn new(title: impl Into<String>, company: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            location: location.into(),
            ..Default::default()
        }
    }

    /// Score to display: `skill_match`, then `match_score`, then the default.
    pub fn display_match(&self) -> u32 {
        self.skill_match
            .or(self.match_score)
            .unwrap_or(DEFAULT_MATCH_SCORE)
    }
}

/// Missing skills keyed by recommendation title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillGaps(pub BTreeMap<String, Vec<String>>);

impl SkillGaps {
    /// Total missing skills across all recommendations.
    pub fn total(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// All missing skills, deduplicated, in first-seen order.
    pub fn all_missing(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for skill in self.0.values().flatten() {
            if !seen.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
                seen.push(skill.as_str());
            }
        }
        seen
    }

    pub fn insert(&mut self, title: impl Into<String>, missing: Vec<String>) {
        self.0.insert(title.into(), missing);
    }
}
