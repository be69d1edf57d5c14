//! Per-language message templates and `{placeholder}` substitution.
//!
//! Lookups never fail: an unsupported language code resolves to the
//! English template set.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_]*)\}").expect("static regex"));

/// Languages with a template set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Hindi,
    Tamil,
}

impl Language {
    pub const DEFAULT: Language = Language::English;

    /// Resolve a language code (`"en"`, `"hi-IN"`, `"TA"`), if supported.
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code.split(['-', '_']).next().unwrap_or("").trim();
        match primary.to_lowercase().as_str() {
            "en" => Some(Self::English),
            "hi" => Some(Self::Hindi),
            "ta" => Some(Self::Tamil),
            _ => None,
        }
    }

    /// Resolve a language code, falling back to the default language.
    pub fn from_code_or_default(code: &str) -> Self {
        Self::from_code(code).unwrap_or(Self::DEFAULT)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Tamil => "ta",
        }
    }

    /// BCP 47 tag used for speech input and output.
    pub fn speech_tag(&self) -> &'static str {
        match self {
            Self::English => "en-IN",
            Self::Hindi => "hi-IN",
            Self::Tamil => "ta-IN",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "हिन्दी (Hindi)",
            Self::Tamil => "தமிழ் (Tamil)",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Named templates available in every language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateName {
    /// Opening line. Placeholders: `{name}`.
    Greeting,
    /// One recommendation line. Placeholders: `{index}`, `{title}`,
    /// `{company}`, `{match}`, `{location}`.
    Item,
    /// Closing line. Placeholders: `{helpline}`.
    Footer,
    /// Sent once when alerts are activated.
    Confirmation,
}

/// The full template set for one language.
#[derive(Debug, Clone, Copy)]
pub struct TemplateSet {
    pub greeting: &'static str,
    pub item: &'static str,
    pub footer: &'static str,
    pub confirmation: &'static str,
}

impl TemplateSet {
    pub fn get(&self, name: TemplateName) -> &'static str {
        match name {
            TemplateName::Greeting => self.greeting,
            TemplateName::Item => self.item,
            TemplateName::Footer => self.footer,
            TemplateName::Confirmation => self.confirmation,
        }
    }
}

const ENGLISH: TemplateSet = TemplateSet {
    greeting: "Hi {name}! Here are your top internship matches from InternPath:",
    item: "{index}. {title} at {company} ({match}% match) - {location}",
    footer: "Apply online at internpath.com or call {helpline}",
    confirmation: "SMS alerts activated! You'll receive internship matches even when offline.",
};

const HINDI: TemplateSet = TemplateSet {
    greeting: "नमस्ते {name}! InternPath से आपके टॉप इंटर्नशिप मैच:",
    item: "{index}. {title} - {company} ({match}% मैच) - {location}",
    footer: "ऑनलाइन अप्लाई करें internpath.com या कॉल करें {helpline}",
    confirmation: "SMS अलर्ट एक्टिवेट! ऑफलाइन होने पर भी आपको इंटर्नशिप मैच मिलेंगे।",
};

const TAMIL: TemplateSet = TemplateSet {
    greeting: "வணக்கம் {name}! InternPath-ல் இருந்து உங்களின் சிறந்த internship matches:",
    item: "{index}. {title} - {company} ({match}% match) - {location}",
    footer: "internpath.com-ல் apply செய்யுங்கள் அல்லது {helpline}-க்கு அழைக்கவும்",
    confirmation: "SMS alerts செயல்படுத்தப்பட்டது! Offline-ல் இருந்தாலும் matches கிடைக்கும்.",
};

/// Template set for a language.
pub fn template_set(language: Language) -> &'static TemplateSet {
    match language {
        Language::English => &ENGLISH,
        Language::Hindi => &HINDI,
        Language::Tamil => &TAMIL,
    }
}

/// Look up a template by language code; unknown codes use the default language.
pub fn lookup(language_code: &str, name: TemplateName) -> &'static str {
    template_set(Language::from_code_or_default(language_code)).get(name)
}

/// Replace every `{key}` with its value. Placeholders without a value are
/// left as-is.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let key = &caps[1];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Look up and render in one step.
pub fn render_named(language_code: &str, name: TemplateName, values: &[(&str, &str)]) -> String {
    render(lookup(language_code, name), values)
}
