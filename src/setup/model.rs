//! Setup data models: notification preferences and the persisted settings
//! record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How often digests go out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Immediate,
    #[default]
    Daily,
    Weekly,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate => write!(f, "immediate"),
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "immediate" => Ok(Self::Immediate),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            other => Err(format!("unknown frequency '{other}'")),
        }
    }
}

/// Preferred delivery window for scheduled digests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    #[default]
    Morning,
    Afternoon,
    Evening,
}

impl std::str::FromStr for TimeSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Ok(Self::Morning),
            "afternoon" => Ok(Self::Afternoon),
            "evening" => Ok(Self::Evening),
            other => Err(format!("unknown time slot '{other}'")),
        }
    }
}

/// Items per message. Only 1, 3 or 5 are offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum MaxItems {
    One,
    #[default]
    Three,
    Five,
}

impl MaxItems {
    pub fn get(&self) -> usize {
        match self {
            Self::One => 1,
            Self::Three => 3,
            Self::Five => 5,
        }
    }
}

impl TryFrom<u32> for MaxItems {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            3 => Ok(Self::Three),
            5 => Ok(Self::Five),
            other => Err(format!("max items must be 1, 3 or 5, got {other}")),
        }
    }
}

impl From<MaxItems> for u32 {
    fn from(value: MaxItems) -> Self {
        value.get() as u32
    }
}

/// Notification preferences chosen during the Preferences step.
///
/// Missing fields in stored JSON take their defaults, so a partial record
/// merges over the defaults on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreferenceSet {
    pub frequency: Frequency,
    #[serde(rename = "maxRecommendations")]
    pub max_items: MaxItems,
    #[serde(rename = "preferredLanguage")]
    pub language: String,
    pub include_location: bool,
    pub include_stipend: bool,
    pub time_slot: TimeSlot,
}

impl Default for PreferenceSet {
    fn default() -> Self {
        Self {
            frequency: Frequency::default(),
            max_items: MaxItems::default(),
            language: "en".to_string(),
            include_location: true,
            include_stipend: false,
            time_slot: TimeSlot::default(),
        }
    }
}

impl PreferenceSet {
    /// Defaults with the language taken from the user's profile.
    pub fn for_language(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Self::default()
        }
    }
}

/// What gets written to the settings store when setup completes.
///
/// Stored in the `settings` table as JSON under key `"sms_settings"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSettings {
    pub phone_number: String,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub preferences: PreferenceSet,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub setup_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_date: Option<DateTime<Utc>>,
}

/// A dialing prefix offered in the phone step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryCode {
    pub code: &'static str,
    pub country: &'static str,
    pub flag: &'static str,
}

pub const COUNTRY_CODES: &[CountryCode] = &[
    CountryCode { code: "+91", country: "India", flag: "🇮🇳" },
    CountryCode { code: "+1", country: "USA", flag: "🇺🇸" },
    CountryCode { code: "+44", country: "UK", flag: "🇬🇧" },
    CountryCode { code: "+65", country: "Singapore", flag: "🇸🇬" },
];

pub fn is_supported_country_code(code: &str) -> bool {
    COUNTRY_CODES.iter().any(|c| c.code == code)
}

/// Guess the dialing prefix from a free-text location.
pub fn suggest_country_code(location: &str) -> Option<&'static str> {
    let location = location.to_lowercase();
    ["india", "mumbai", "delhi"]
        .iter()
        .any(|place| location.contains(place))
        .then_some("+91")
}

/// Setting keys used in the settings table.
pub mod settings_keys {
    /// Key for the SavedSettings JSON blob.
    pub const SMS_SETTINGS: &str = "sms_settings";
}
