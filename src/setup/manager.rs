//! `SetupManager` drives the guided SMS setup: phone capture, code
//! verification, preferences and completion.
//!
//! Rejected input never fails an operation. It sets the state's `error`
//! field and the step stays where it was. Calling an operation the current
//! step does not offer is a `SetupError::InvalidTransition`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::model::{
    Frequency, MaxItems, PreferenceSet, SavedSettings, TimeSlot, is_supported_country_code,
    settings_keys, suggest_country_code,
};
use super::notification::{NotificationBuilder, Recommendation, sample_record};
use super::state::{SetupState, SetupStep};
use super::verification::{CodeCheck, VerificationCodeService};
use crate::config::SetupConfig;
use crate::error::{DatabaseError, SetupError};
use crate::services::{ModeSwitch, NotificationSender, mask_destination};
use crate::speech::SpeechEngine;
use crate::store::SettingsRepository;
use crate::templates::Language;

/// User-facing texts set on the error field or spoken aloud.
pub mod messages {
    pub const INVALID_PHONE: &str = "Please enter a valid phone number";
    pub const SEND_CODE_FAILED: &str = "Failed to send verification code";
    pub const INVALID_CODE: &str = "Please enter a valid 4-digit code";
    pub const WRONG_CODE: &str = "Incorrect verification code";
    pub const CODE_EXPIRED: &str = "Verification code expired. Please request a new one.";
    pub const UNSUPPORTED_COUNTRY: &str = "Unsupported country code";
    pub const UNSUPPORTED_LANGUAGE: &str = "Unsupported language";
    pub const SETUP_FAILED: &str = "Setup failed. Please try again.";
    pub const TEST_FAILED: &str = "Failed to send test SMS";
    pub const DIGEST_FAILED: &str = "Failed to send recommendations";

    pub const CODE_SENT: &str = "Verification code sent to your phone";
    pub const PHONE_VERIFIED: &str = "Phone number verified successfully";
    pub const SETUP_COMPLETE: &str = "SMS service activated successfully";
    pub const TEST_SENT: &str = "Test SMS sent successfully";
}

/// Collaborators the setup flow talks to.
pub struct SetupDeps {
    pub settings: Arc<dyn SettingsRepository>,
    pub sender: Arc<dyn NotificationSender>,
    pub speech: Arc<dyn SpeechEngine>,
    pub modes: Arc<dyn ModeSwitch>,
}

/// Clears an in-flight flag when dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool, action: &str) -> Result<Self, SetupError> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| SetupError::Busy {
                action: action.to_string(),
            })?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Coordinates one setup session.
pub struct SetupManager {
    config: SetupConfig,
    deps: SetupDeps,
    codes: VerificationCodeService,
    builder: NotificationBuilder,
    state: RwLock<SetupState>,
    is_verifying: AtomicBool,
    is_setting_up: AtomicBool,
}

impl SetupManager {
    /// Start a fresh session. `language` seeds the preferred language
    /// (normally the profile's).
    pub fn new(config: SetupConfig, deps: SetupDeps, language: &str) -> Self {
        let codes = VerificationCodeService::new(config.debug_bypass_code.clone(), config.code_ttl);
        let builder = NotificationBuilder::new(config.helpline.clone());
        let state = fresh_state(&config, language);
        Self {
            config,
            deps,
            codes,
            builder,
            state: RwLock::new(state),
            is_verifying: AtomicBool::new(false),
            is_setting_up: AtomicBool::new(false),
        }
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> SetupState {
        self.state.read().await.clone()
    }

    pub async fn step(&self) -> SetupStep {
        self.state.read().await.step
    }

    /// A code is being sent.
    pub fn is_verifying(&self) -> bool {
        self.is_verifying.load(Ordering::SeqCst)
    }

    /// Completion is being saved.
    pub fn is_setting_up(&self) -> bool {
        self.is_setting_up.load(Ordering::SeqCst)
    }

    /// Restore saved settings. A completed record resumes in `Complete`;
    /// anything else starts over at phone entry with the saved values
    /// filled in.
    pub async fn load(&self) -> crate::error::Result<SetupState> {
        let Some(value) = self.deps.settings.load(settings_keys::SMS_SETTINGS).await? else {
            return Ok(self.state().await);
        };
        let saved: SavedSettings = serde_json::from_value(value)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        let mut state = self.state.write().await;
        if saved.phone_number.is_empty() {
            return Ok(state.clone());
        }
        state.phone_number = saved.phone_number;
        state.country_code = saved
            .country_code
            .unwrap_or_else(|| self.config.default_country_code.clone());
        state.preferences = saved.preferences;
        state.verified = saved.is_verified;
        if saved.setup_complete {
            state.step = SetupStep::Complete;
        }
        info!(
            destination = %mask_destination(&state.destination()),
            step = %state.step,
            "Setup settings restored"
        );
        Ok(state.clone())
    }

    /// Pick the country code from a profile location, if it suggests one.
    pub async fn apply_location(&self, location: &str) {
        if let Some(code) = suggest_country_code(location) {
            let mut state = self.state.write().await;
            if state.step == SetupStep::PhoneEntry {
                state.country_code = code.to_string();
            }
        }
    }

    pub async fn set_country_code(&self, code: &str) -> Result<SetupStep, SetupError> {
        let mut state = self.state.write().await;
        require(&state, SetupStep::PhoneEntry, "set country code")?;
        if is_supported_country_code(code) {
            state.country_code = code.to_string();
            state.error = None;
        } else {
            state.error = Some(messages::UNSUPPORTED_COUNTRY.to_string());
        }
        Ok(state.step)
    }

    /// Submit the phone number. Non-digits are stripped first.
    pub async fn submit_phone(&self, phone: &str) -> Result<SetupStep, SetupError> {
        require(&*self.state.read().await, SetupStep::PhoneEntry, "submit phone")?;
        let _in_flight = InFlight::acquire(&self.is_verifying, "sending verification code")?;

        let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
        let destination = {
            let mut state = self.state.write().await;
            state.phone_number = digits;
            if state.phone_number.len() < self.config.min_phone_digits {
                warn!(digits = state.phone_number.len(), "Phone number rejected");
                state.error = Some(messages::INVALID_PHONE.to_string());
                return Ok(state.step);
            }
            state.error = None;
            state.destination()
        };

        if let Err(e) = self.codes.issue(self.deps.sender.as_ref(), &destination).await {
            warn!(error = %e, "Verification code delivery failed");
            let mut state = self.state.write().await;
            state.error = Some(messages::SEND_CODE_FAILED.to_string());
            return Ok(state.step);
        }

        let step = {
            let mut state = self.state.write().await;
            state.submitted_code.clear();
            state.transition(SetupStep::Verification);
            state.step
        };
        info!(destination = %mask_destination(&destination), "Awaiting verification code");
        self.announce(messages::CODE_SENT).await;
        Ok(step)
    }

    /// Submit the code the user received.
    pub async fn submit_code(&self, code: &str) -> Result<SetupStep, SetupError> {
        let code = code.trim();
        {
            let mut state = self.state.write().await;
            require(&state, SetupStep::Verification, "submit code")?;
            state.submitted_code = code.to_string();
        }

        let check = self.codes.check(code).await;
        let mut state = self.state.write().await;
        let error = match check {
            CodeCheck::Accepted => {
                state.verified = true;
                state.transition(SetupStep::Preferences);
                info!("Phone number verified");
                None
            }
            CodeCheck::Malformed => Some(messages::INVALID_CODE),
            CodeCheck::Rejected => Some(messages::WRONG_CODE),
            CodeCheck::Expired => Some(messages::CODE_EXPIRED),
        };
        if let Some(error) = error {
            warn!(check = ?check, "Verification code rejected");
            state.error = Some(error.to_string());
            return Ok(state.step);
        }
        let step = state.step;
        drop(state);
        self.announce(messages::PHONE_VERIFIED).await;
        Ok(step)
    }

    /// Go back from verification to phone entry. The outstanding code is
    /// discarded.
    pub async fn back(&self) -> Result<SetupStep, SetupError> {
        let mut state = self.state.write().await;
        require(&state, SetupStep::Verification, "go back")?;
        self.codes.clear().await;
        state.submitted_code.clear();
        state.transition(SetupStep::PhoneEntry);
        Ok(state.step)
    }

    /// Issue and send a fresh code, replacing the previous one.
    pub async fn resend_code(&self) -> Result<SetupStep, SetupError> {
        let destination = {
            let state = self.state.read().await;
            require(&state, SetupStep::Verification, "resend code")?;
            state.destination()
        };
        let _in_flight = InFlight::acquire(&self.is_verifying, "sending verification code")?;

        let result = self.codes.issue(self.deps.sender.as_ref(), &destination).await;
        let mut state = self.state.write().await;
        match result {
            Ok(()) => {
                state.error = None;
                drop(state);
                self.announce(messages::CODE_SENT).await;
            }
            Err(e) => {
                warn!(error = %e, "Verification code resend failed");
                state.error = Some(messages::SEND_CODE_FAILED.to_string());
            }
        }
        Ok(SetupStep::Verification)
    }

    pub async fn set_frequency(&self, frequency: Frequency) -> Result<SetupStep, SetupError> {
        self.edit_preferences("set frequency", |p| p.frequency = frequency)
            .await
    }

    pub async fn set_max_items(&self, max_items: MaxItems) -> Result<SetupStep, SetupError> {
        self.edit_preferences("set max items", |p| p.max_items = max_items)
            .await
    }

    pub async fn set_include_location(&self, include: bool) -> Result<SetupStep, SetupError> {
        self.edit_preferences("set include location", |p| p.include_location = include)
            .await
    }

    pub async fn set_include_stipend(&self, include: bool) -> Result<SetupStep, SetupError> {
        self.edit_preferences("set include stipend", |p| p.include_stipend = include)
            .await
    }

    pub async fn set_time_slot(&self, slot: TimeSlot) -> Result<SetupStep, SetupError> {
        self.edit_preferences("set time slot", |p| p.time_slot = slot)
            .await
    }

    /// Change the message language. Unsupported codes set the error field.
    pub async fn set_language(&self, code: &str) -> Result<SetupStep, SetupError> {
        match Language::from_code(code) {
            Some(language) => {
                self.edit_preferences("set language", |p| p.language = language.code().to_string())
                    .await
            }
            None => {
                let mut state = self.state.write().await;
                require(&state, SetupStep::Preferences, "set language")?;
                state.error = Some(messages::UNSUPPORTED_LANGUAGE.to_string());
                Ok(state.step)
            }
        }
    }

    /// Save the settings and activate alerts.
    pub async fn complete(&self) -> Result<SetupStep, SetupError> {
        let (saved, destination, preferences) = {
            let state = self.state.read().await;
            require(&state, SetupStep::Preferences, "complete setup")?;
            if !state.verified {
                return Err(SetupError::InvalidTransition {
                    from: state.step.to_string(),
                    action: "complete setup without verification".to_string(),
                });
            }
            let saved = SavedSettings {
                phone_number: state.phone_number.clone(),
                country_code: Some(state.country_code.clone()),
                preferences: state.preferences.clone(),
                is_verified: true,
                setup_complete: true,
                setup_date: Some(Utc::now()),
            };
            (saved, state.destination(), state.preferences.clone())
        };
        let _in_flight = InFlight::acquire(&self.is_setting_up, "completing setup")?;

        if let Err(e) = self.persist(&saved).await {
            warn!(error = %e, "Saving setup settings failed");
            let mut state = self.state.write().await;
            state.error = Some(messages::SETUP_FAILED.to_string());
            return Ok(state.step);
        }

        {
            let mut state = self.state.write().await;
            state.transition(SetupStep::Complete);
            state.test_sent = false;
        }
        info!(destination = %mask_destination(&destination), "SMS setup complete");
        self.announce(messages::SETUP_COMPLETE).await;

        let confirmation = self.builder.confirmation(&preferences);
        if let Err(e) = self.deps.sender.send(&destination, &confirmation).await {
            warn!(error = %e, "Activation confirmation not delivered");
        }
        Ok(SetupStep::Complete)
    }

    /// Reopen preferences after completion, without verifying again.
    pub async fn edit_settings(&self) -> Result<SetupStep, SetupError> {
        let mut state = self.state.write().await;
        require(&state, SetupStep::Complete, "edit settings")?;
        state.transition(SetupStep::Preferences);
        Ok(state.step)
    }

    /// Send one sample digest marked as a test. Does nothing once a test has
    /// gone out since the last completion.
    pub async fn send_test(&self, recipient: Option<&str>) -> Result<SetupStep, SetupError> {
        let (destination, preferences) = {
            let state = self.state.read().await;
            require(&state, SetupStep::Complete, "send test message")?;
            if state.test_sent {
                return Ok(state.step);
            }
            (state.destination(), state.preferences.clone())
        };

        let body = self
            .builder
            .build(recipient, &[sample_record()], &preferences, true);
        let result = self.deps.sender.send(&destination, &body).await;

        let mut state = self.state.write().await;
        match result {
            Ok(()) => {
                state.test_sent = true;
                state.error = None;
                drop(state);
                info!(destination = %mask_destination(&destination), "Test message sent");
                self.announce(messages::TEST_SENT).await;
            }
            Err(e) => {
                warn!(error = %e, "Test message failed");
                state.error = Some(messages::TEST_FAILED.to_string());
            }
        }
        Ok(SetupStep::Complete)
    }

    /// Send a digest of `records` to the verified number. Returns whether
    /// it was delivered.
    pub async fn send_recommendations(
        &self,
        recipient: Option<&str>,
        records: &[Recommendation],
    ) -> Result<bool, SetupError> {
        let (destination, preferences) = {
            let state = self.state.read().await;
            require(&state, SetupStep::Complete, "send recommendations")?;
            (state.destination(), state.preferences.clone())
        };

        let body = self.builder.build(recipient, records, &preferences, false);
        match self.deps.sender.send(&destination, &body).await {
            Ok(()) => {
                info!(
                    destination = %mask_destination(&destination),
                    items = records.len().min(preferences.max_items.get()),
                    "Recommendations sent"
                );
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "Recommendation digest failed");
                self.state.write().await.error = Some(messages::DIGEST_FAILED.to_string());
                Ok(false)
            }
        }
    }

    /// Forget everything: saved settings, outstanding code and live state.
    pub async fn reset(&self) -> crate::error::Result<()> {
        self.deps.settings.clear(settings_keys::SMS_SETTINGS).await?;
        self.codes.clear().await;
        let mut state = self.state.write().await;
        let language = state.preferences.language.clone();
        *state = fresh_state(&self.config, &language);
        info!("Setup reset");
        Ok(())
    }

    async fn edit_preferences(
        &self,
        action: &str,
        edit: impl FnOnce(&mut PreferenceSet),
    ) -> Result<SetupStep, SetupError> {
        let mut state = self.state.write().await;
        require(&state, SetupStep::Preferences, action)?;
        edit(&mut state.preferences);
        state.error = None;
        Ok(state.step)
    }

    async fn persist(&self, saved: &SavedSettings) -> crate::error::Result<()> {
        let value =
            serde_json::to_value(saved).map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        self.deps
            .settings
            .save(settings_keys::SMS_SETTINGS, &value)
            .await?;
        Ok(())
    }

    /// Speak a status line when voice mode is on.
    async fn announce(&self, text: &str) {
        if !self.deps.modes.voice_mode() {
            return;
        }
        let language = self.state.read().await.preferences.language.clone();
        let tag = Language::from_code_or_default(&language).speech_tag();
        self.deps.speech.speak(text, tag);
    }
}

fn fresh_state(config: &SetupConfig, language: &str) -> SetupState {
    let mut state = SetupState::new(config.default_country_code.clone());
    state.preferences = PreferenceSet::for_language(Language::from_code_or_default(language).code());
    state
}

fn require(state: &SetupState, expected: SetupStep, action: &str) -> Result<(), SetupError> {
    if state.step == expected {
        Ok(())
    } else {
        Err(SetupError::InvalidTransition {
            from: state.step.to_string(),
            action: action.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::error::SpeechError;
    use crate::services::{ModeFlags, OutboxSender};
    use crate::store::InMemorySettings;

    #[derive(Default)]
    struct RecordingSpeech(std::sync::Mutex<Vec<(String, String)>>);

    #[async_trait]
    impl SpeechEngine for RecordingSpeech {
        fn is_available(&self) -> bool {
            true
        }

        fn speak(&self, text: &str, language_tag: &str) {
            self.0
                .lock()
                .unwrap()
                .push((text.to_string(), language_tag.to_string()));
        }

        async fn listen(&self, _language_tag: &str) -> Result<Option<String>, SpeechError> {
            Ok(None)
        }
    }

    struct FailingSettings;

    #[async_trait]
    impl SettingsRepository for FailingSettings {
        async fn load(&self, _key: &str) -> Result<Option<serde_json::Value>, DatabaseError> {
            Ok(None)
        }

        async fn save(&self, _key: &str, _value: &serde_json::Value) -> Result<(), DatabaseError> {
            Err(DatabaseError::Query("disk full".into()))
        }

        async fn clear(&self, _key: &str) -> Result<bool, DatabaseError> {
            Ok(false)
        }
    }

    struct Harness {
        manager: SetupManager,
        outbox: Arc<OutboxSender>,
        settings: Arc<InMemorySettings>,
        speech: Arc<RecordingSpeech>,
        modes: Arc<ModeFlags>,
    }

    fn harness_with(config: SetupConfig) -> Harness {
        let outbox = Arc::new(OutboxSender::new());
        let settings = Arc::new(InMemorySettings::new());
        let speech = Arc::new(RecordingSpeech::default());
        let modes = Arc::new(ModeFlags::new(false, false));
        let manager = SetupManager::new(
            config,
            SetupDeps {
                settings: settings.clone(),
                sender: outbox.clone(),
                speech: speech.clone(),
                modes: modes.clone(),
            },
            "en",
        );
        Harness {
            manager,
            outbox,
            settings,
            speech,
            modes,
        }
    }

    fn harness() -> Harness {
        harness_with(SetupConfig::default())
    }

    async fn last_code(outbox: &OutboxSender) -> String {
        let sent = outbox.sent().await;
        sent.last()
            .unwrap()
            .body
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect()
    }

    async fn verified(h: &Harness) {
        h.manager.submit_phone("9876543210").await.unwrap();
        let code = last_code(&h.outbox).await;
        assert_eq!(h.manager.submit_code(&code).await.unwrap(), SetupStep::Preferences);
    }

    #[tokio::test]
    async fn short_phone_stays_in_phone_entry() {
        let h = harness();
        let step = h.manager.submit_phone("987654321").await.unwrap();
        assert_eq!(step, SetupStep::PhoneEntry);
        let state = h.manager.state().await;
        assert_eq!(state.error.as_deref(), Some(messages::INVALID_PHONE));
        assert!(h.outbox.sent().await.is_empty());
        assert!(!h.manager.is_verifying());
    }

    #[tokio::test]
    async fn valid_phone_sends_code() {
        let h = harness();
        let step = h.manager.submit_phone("98765-43210").await.unwrap();
        assert_eq!(step, SetupStep::Verification);
        let state = h.manager.state().await;
        assert_eq!(state.phone_number, "9876543210");
        assert!(state.error.is_none());

        let sent = h.outbox.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].destination, "+919876543210");
        assert_eq!(last_code(&h.outbox).await.len(), 4);
    }

    #[tokio::test]
    async fn send_failure_keeps_phone_entry() {
        let h = harness();
        h.outbox.set_failing(true);
        let step = h.manager.submit_phone("9876543210").await.unwrap();
        assert_eq!(step, SetupStep::PhoneEntry);
        assert_eq!(
            h.manager.state().await.error.as_deref(),
            Some(messages::SEND_CODE_FAILED)
        );
    }

    #[tokio::test]
    async fn wrong_code_then_right_code() {
        let h = harness();
        h.manager.submit_phone("9876543210").await.unwrap();
        let code = last_code(&h.outbox).await;
        let wrong = if code == "9999" { "1000" } else { "9999" };

        assert_eq!(h.manager.submit_code(wrong).await.unwrap(), SetupStep::Verification);
        assert_eq!(h.manager.state().await.error.as_deref(), Some(messages::WRONG_CODE));

        assert_eq!(h.manager.submit_code("12").await.unwrap(), SetupStep::Verification);
        assert_eq!(h.manager.state().await.error.as_deref(), Some(messages::INVALID_CODE));

        assert_eq!(h.manager.submit_code(&code).await.unwrap(), SetupStep::Preferences);
        let state = h.manager.state().await;
        assert!(state.verified);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn bypass_code_when_enabled() {
        let h = harness_with(SetupConfig::default().with_debug_bypass());
        h.manager.submit_phone("9876543210").await.unwrap();
        assert_eq!(h.manager.submit_code("1234").await.unwrap(), SetupStep::Preferences);
    }

    #[tokio::test]
    async fn back_discards_code() {
        let h = harness();
        h.manager.submit_phone("9876543210").await.unwrap();
        let code = last_code(&h.outbox).await;
        assert_eq!(h.manager.back().await.unwrap(), SetupStep::PhoneEntry);

        h.manager.submit_phone("9876543210").await.unwrap();
        let fresh = last_code(&h.outbox).await;
        if fresh != code {
            assert_eq!(h.manager.submit_code(&code).await.unwrap(), SetupStep::Verification);
        }
        assert_eq!(h.manager.submit_code(&fresh).await.unwrap(), SetupStep::Preferences);
    }

    #[tokio::test]
    async fn resend_replaces_code() {
        let h = harness();
        h.manager.submit_phone("9876543210").await.unwrap();
        h.manager.resend_code().await.unwrap();
        assert_eq!(h.outbox.sent().await.len(), 2);
        let latest = last_code(&h.outbox).await;
        assert_eq!(h.manager.submit_code(&latest).await.unwrap(), SetupStep::Preferences);
    }

    #[tokio::test]
    async fn operations_outside_their_step_are_rejected() {
        let h = harness();
        assert!(matches!(
            h.manager.submit_code("1234").await,
            Err(SetupError::InvalidTransition { .. })
        ));
        assert!(h.manager.complete().await.is_err());
        assert!(h.manager.edit_settings().await.is_err());
        assert!(h.manager.send_test(None).await.is_err());
        assert!(h.manager.set_frequency(Frequency::Weekly).await.is_err());
        assert!(h.manager.resend_code().await.is_err());
    }

    #[tokio::test]
    async fn country_code_validation() {
        let h = harness();
        h.manager.set_country_code("+33").await.unwrap();
        let state = h.manager.state().await;
        assert_eq!(state.country_code, "+91");
        assert_eq!(state.error.as_deref(), Some(messages::UNSUPPORTED_COUNTRY));

        h.manager.set_country_code("+44").await.unwrap();
        let state = h.manager.state().await;
        assert_eq!(state.country_code, "+44");
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn location_suggests_country_code() {
        let h = harness();
        h.manager.set_country_code("+1").await.unwrap();
        h.manager.apply_location("Navi Mumbai").await;
        assert_eq!(h.manager.state().await.country_code, "+91");
    }

    #[tokio::test]
    async fn complete_persists_and_confirms() {
        let h = harness();
        verified(&h).await;
        h.manager.set_max_items(MaxItems::Five).await.unwrap();
        h.manager.set_language("hi").await.unwrap();
        assert_eq!(h.manager.complete().await.unwrap(), SetupStep::Complete);

        let stored = h
            .settings
            .load(settings_keys::SMS_SETTINGS)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["phoneNumber"], "9876543210");
        assert_eq!(stored["countryCode"], "+91");
        assert_eq!(stored["isVerified"], true);
        assert_eq!(stored["setupComplete"], true);
        assert_eq!(stored["preferences"]["maxRecommendations"], 5);
        assert!(stored["setupDate"].is_string());

        let sent = h.outbox.sent().await;
        assert!(sent.last().unwrap().body.starts_with("SMS अलर्ट"));
        assert!(!h.manager.is_setting_up());
    }

    #[tokio::test]
    async fn save_failure_sets_error() {
        let outbox = Arc::new(OutboxSender::new());
        let manager = SetupManager::new(
            SetupConfig::default(),
            SetupDeps {
                settings: Arc::new(FailingSettings),
                sender: outbox.clone(),
                speech: Arc::new(RecordingSpeech::default()),
                modes: Arc::new(ModeFlags::default()),
            },
            "en",
        );
        manager.submit_phone("9876543210").await.unwrap();
        let code = last_code(&outbox).await;
        manager.submit_code(&code).await.unwrap();

        assert_eq!(manager.complete().await.unwrap(), SetupStep::Preferences);
        assert_eq!(manager.state().await.error.as_deref(), Some(messages::SETUP_FAILED));
    }

    #[tokio::test]
    async fn edit_settings_and_unsupported_language() {
        let h = harness();
        verified(&h).await;
        h.manager.complete().await.unwrap();
        assert_eq!(h.manager.edit_settings().await.unwrap(), SetupStep::Preferences);
        h.manager.set_language("fr").await.unwrap();
        assert_eq!(
            h.manager.state().await.error.as_deref(),
            Some(messages::UNSUPPORTED_LANGUAGE)
        );
        h.manager.set_include_stipend(true).await.unwrap();
        let state = h.manager.state().await;
        assert!(state.error.is_none());
        assert!(state.preferences.include_stipend);
        assert!(state.verified);
    }

    #[tokio::test]
    async fn test_message_sent_once() {
        let h = harness();
        verified(&h).await;
        h.manager.complete().await.unwrap();
        let before = h.outbox.sent().await.len();

        h.manager.send_test(Some("Asha")).await.unwrap();
        h.manager.send_test(Some("Asha")).await.unwrap();
        let sent = h.outbox.sent().await;
        assert_eq!(sent.len(), before + 1);
        let body = &sent.last().unwrap().body;
        assert!(body.contains("This is a test message."));
        assert!(body.contains("Sample Frontend Internship at Tech Corp (85% match) - Mumbai"));
        assert!(h.manager.state().await.test_sent);
    }

    #[tokio::test]
    async fn test_message_failure_sets_error() {
        let h = harness();
        verified(&h).await;
        h.manager.complete().await.unwrap();
        h.outbox.set_failing(true);
        h.manager.send_test(None).await.unwrap();
        let state = h.manager.state().await;
        assert!(!state.test_sent);
        assert_eq!(state.error.as_deref(), Some(messages::TEST_FAILED));
    }

    #[tokio::test]
    async fn digest_respects_preferences() {
        let h = harness();
        verified(&h).await;
        h.manager.set_max_items(MaxItems::One).await.unwrap();
        h.manager.complete().await.unwrap();

        let records = vec![
            Recommendation::new("First", "A", "Pune"),
            Recommendation::new("Second", "B", "Delhi"),
        ];
        assert!(h.manager.send_recommendations(Some("Asha"), &records).await.unwrap());
        let body = h.outbox.sent().await.last().unwrap().body.clone();
        assert!(body.contains("1. First at A"));
        assert!(!body.contains("Second"));
    }

    #[tokio::test]
    async fn load_restores_completed_setup() {
        let h = harness();
        h.settings
            .save(
                settings_keys::SMS_SETTINGS,
                &json!({
                    "phoneNumber": "9876543210",
                    "countryCode": "+65",
                    "preferences": {"frequency": "weekly"},
                    "isVerified": true,
                    "setupComplete": true
                }),
            )
            .await
            .unwrap();

        let state = h.manager.load().await.unwrap();
        assert_eq!(state.step, SetupStep::Complete);
        assert_eq!(state.country_code, "+65");
        assert_eq!(state.preferences.frequency, Frequency::Weekly);
        assert_eq!(state.preferences.max_items, MaxItems::Three);
        assert!(state.verified);
    }

    #[tokio::test]
    async fn load_without_settings_keeps_fresh_state() {
        let h = harness();
        let state = h.manager.load().await.unwrap();
        assert_eq!(state.step, SetupStep::PhoneEntry);
        assert_eq!(state.country_code, "+91");
    }

    #[tokio::test]
    async fn voice_mode_announces_progress() {
        let h = harness();
        h.modes.set_voice_mode(true);
        verified(&h).await;
        let spoken: Vec<String> = h
            .speech
            .0
            .lock()
            .unwrap()
            .iter()
            .map(|(text, _)| text.clone())
            .collect();
        assert_eq!(spoken, vec![messages::CODE_SENT, messages::PHONE_VERIFIED]);
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let h = harness();
        verified(&h).await;
        h.manager.complete().await.unwrap();
        h.manager.reset().await.unwrap();
        assert_eq!(h.manager.step().await, SetupStep::PhoneEntry);
        assert!(
            h.settings
                .load(settings_keys::SMS_SETTINGS)
                .await
                .unwrap()
                .is_none()
        );
    }
}
