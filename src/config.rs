//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::ConfigError;

/// Verification code accepted unconditionally when the debug bypass is on.
pub const DEBUG_BYPASS_CODE: &str = "1234";

/// Range the simulated "typing" delay is drawn from for each system reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingDelay {
    pub min: Duration,
    pub max: Duration,
}

impl TypingDelay {
    /// A delay range. `min` and `max` are swapped if given out of order.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// A constant delay (use `Duration::ZERO` in tests).
    pub fn fixed(delay: Duration) -> Self {
        Self {
            min: delay,
            max: delay,
        }
    }

    /// Draw a delay uniformly from the range.
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    /// Parse `"500-1500"` (milliseconds) or a single value like `"0"`.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let parse_ms = |s: &str| {
            s.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| ConfigError::InvalidValue {
                    key: "typing_delay".to_string(),
                    message: format!("{s:?}: {e}"),
                })
        };
        match value.split_once('-') {
            Some((lo, hi)) => Ok(Self::new(parse_ms(lo)?, parse_ms(hi)?)),
            None => Ok(Self::fixed(parse_ms(value)?)),
        }
    }
}

impl Default for TypingDelay {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(500),
            max: Duration::from_millis(1500),
        }
    }
}

/// Dialogue engine configuration.
#[derive(Debug, Clone)]
pub struct DialogueConfig {
    /// Delay range for scheduled system replies.
    pub typing_delay: TypingDelay,
    /// Current UI locale (language code). Drives the speech language tag.
    pub locale: String,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            typing_delay: TypingDelay::default(),
            locale: "en".to_string(),
        }
    }
}

/// Guided SMS setup configuration.
#[derive(Debug, Clone)]
pub struct SetupConfig {
    /// When set, this code always passes verification. Debug builds and demos only.
    pub debug_bypass_code: Option<String>,
    /// Lifetime of an issued verification code. `None` means codes never expire.
    pub code_ttl: Option<Duration>,
    /// Country code selected at session start.
    pub default_country_code: String,
    /// Contact string substituted into the message footer.
    pub helpline: String,
    /// Minimum digits a phone number must have.
    pub min_phone_digits: usize,
}

impl SetupConfig {
    /// Enable the fixed debug bypass code.
    pub fn with_debug_bypass(mut self) -> Self {
        self.debug_bypass_code = Some(DEBUG_BYPASS_CODE.to_string());
        self
    }
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            debug_bypass_code: None,
            code_ttl: None,
            default_country_code: "+91".to_string(),
            helpline: "+91-80-4567-8900".to_string(),
            min_phone_digits: 10,
        }
    }
}

/// Top-level assistant configuration.
#[derive(Debug, Clone)]
pub struct AssistConfig {
    pub dialogue: DialogueConfig,
    pub setup: SetupConfig,
    /// Path of the SQLite settings database.
    pub db_path: PathBuf,
    /// Whether the console speech engine should be used.
    pub voice: bool,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            dialogue: DialogueConfig::default(),
            setup: SetupConfig::default(),
            db_path: PathBuf::from("./data/internpath.db"),
            voice: false,
        }
    }
}

impl AssistConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Invalid values are logged
    /// and replaced by their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("INTERNPATH_TYPING_DELAY_MS") {
            match TypingDelay::parse(&raw) {
                Ok(delay) => config.dialogue.typing_delay = delay,
                Err(e) => warn!("Ignoring INTERNPATH_TYPING_DELAY_MS: {}", e),
            }
        }

        if let Some(locale) = lookup("INTERNPATH_LOCALE").filter(|s| !s.trim().is_empty()) {
            config.dialogue.locale = locale.trim().to_lowercase();
        }

        if lookup("INTERNPATH_DEBUG_BYPASS").is_some_and(|v| is_truthy(&v)) {
            config.setup = config.setup.with_debug_bypass();
        }

        if let Some(raw) = lookup("INTERNPATH_CODE_TTL_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.setup.code_ttl = Some(Duration::from_secs(secs)),
                Err(e) => warn!("Ignoring INTERNPATH_CODE_TTL_SECS={:?}: {}", raw, e),
            }
        }

        if let Some(code) = lookup("INTERNPATH_COUNTRY_CODE") {
            config.setup.default_country_code = code.trim().to_string();
        }

        if let Some(helpline) = lookup("INTERNPATH_HELPLINE") {
            config.setup.helpline = helpline;
        }

        if let Some(path) = lookup("INTERNPATH_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        config.voice = lookup("INTERNPATH_VOICE").is_some_and(|v| is_truthy(&v));

        config
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = AssistConfig::from_lookup(|_| None);
        assert_eq!(config.dialogue.typing_delay, TypingDelay::default());
        assert_eq!(config.dialogue.locale, "en");
        assert!(config.setup.debug_bypass_code.is_none());
        assert!(config.setup.code_ttl.is_none());
        assert_eq!(config.setup.default_country_code, "+91");
        assert_eq!(config.setup.min_phone_digits, 10);
        assert!(!config.voice);
    }

    #[test]
    fn reads_all_overrides() {
        let config = AssistConfig::from_lookup(lookup_from(&[
            ("INTERNPATH_TYPING_DELAY_MS", "0"),
            ("INTERNPATH_LOCALE", "HI"),
            ("INTERNPATH_DEBUG_BYPASS", "true"),
            ("INTERNPATH_CODE_TTL_SECS", "300"),
            ("INTERNPATH_COUNTRY_CODE", "+44"),
            ("INTERNPATH_DB_PATH", "/tmp/x.db"),
            ("INTERNPATH_VOICE", "1"),
        ]));
        assert_eq!(config.dialogue.typing_delay, TypingDelay::fixed(Duration::ZERO));
        assert_eq!(config.dialogue.locale, "hi");
        assert_eq!(config.setup.debug_bypass_code.as_deref(), Some(DEBUG_BYPASS_CODE));
        assert_eq!(config.setup.code_ttl, Some(Duration::from_secs(300)));
        assert_eq!(config.setup.default_country_code, "+44");
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert!(config.voice);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = AssistConfig::from_lookup(lookup_from(&[
            ("INTERNPATH_TYPING_DELAY_MS", "fast"),
            ("INTERNPATH_CODE_TTL_SECS", "-5"),
            ("INTERNPATH_DEBUG_BYPASS", "0"),
        ]));
        assert_eq!(config.dialogue.typing_delay, TypingDelay::default());
        assert!(config.setup.code_ttl.is_none());
        assert!(config.setup.debug_bypass_code.is_none());
    }

    #[test]
    fn typing_delay_parse_range() {
        let delay = TypingDelay::parse("200-50").unwrap();
        assert_eq!(delay.min, Duration::from_millis(50));
        assert_eq!(delay.max, Duration::from_millis(200));
        assert!(TypingDelay::parse("a-b").is_err());
    }

    #[test]
    fn typing_delay_sample_stays_in_range() {
        let delay = TypingDelay::default();
        for _ in 0..100 {
            let d = delay.sample();
            assert!(d >= delay.min && d <= delay.max);
        }
        assert_eq!(TypingDelay::fixed(Duration::ZERO).sample(), Duration::ZERO);
    }
}
