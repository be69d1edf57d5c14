//! End-to-end tests for the dialogue session through the public API.
//!
//! Collaborators are stubs that record what they were asked to do.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use internpath_assist::config::{DialogueConfig, TypingDelay};
use internpath_assist::dialogue::{
    Command, DialogueDeps, DialogueSession, IntentTag, MessageBody, Route, Sender,
};
use internpath_assist::error::{CollaboratorError, SpeechError};
use internpath_assist::services::{
    InMemoryProfileService, ModeFlags, ModeSwitch, Navigator, ResumeService, SkillGaps, UserProfile,
};
use internpath_assist::speech::{NoSpeech, SpeechEngine};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct RecordingNavigator(Mutex<Vec<String>>);

impl Navigator for RecordingNavigator {
    fn navigate_to(&self, route: &str) {
        self.0.lock().unwrap().push(route.to_string());
    }
}

/// Resume service that always fails.
struct FailingResume;

#[async_trait]
impl ResumeService for FailingResume {
    async fn generate_resume(&self, _profile: &UserProfile) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::GenerationFailed {
            what: "resume".into(),
            reason: "printer on fire".into(),
        })
    }
}

/// Speech engine that records what it was asked to say.
#[derive(Default)]
struct RecordingSpeech(Mutex<Vec<(String, String)>>);

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

struct Fixture {
    session: DialogueSession,
    navigator: Arc<RecordingNavigator>,
    profiles: Arc<InMemoryProfileService>,
    modes: Arc<ModeFlags>,
}

fn fixture(speech: Arc<dyn SpeechEngine>) -> Fixture {
    let navigator = Arc::new(RecordingNavigator::default());
    let profiles = Arc::new(InMemoryProfileService::with_sample_catalog(UserProfile::default()));
    let modes = Arc::new(ModeFlags::new(false, true));
    let session = DialogueSession::new(
        DialogueConfig {
            typing_delay: TypingDelay::fixed(Duration::ZERO),
            locale: "ta".into(),
        },
        DialogueDeps {
            navigator: navigator.clone(),
            profiles: profiles.clone(),
            resumes: Arc::new(FailingResume),
            modes: modes.clone(),
            speech,
        },
    );
    Fixture {
        session,
        navigator,
        profiles,
        modes,
    }
}

async fn settle(session: &DialogueSession) {
    timeout(TEST_TIMEOUT, session.flush())
        .await
        .expect("replies did not settle");
}

#[tokio::test]
async fn first_visit_walkthrough() {
    let f = fixture(Arc::new(NoSpeech));
    f.session.open().await;

    // Teaching message first, before any input.
    let messages = f.session.messages().await;
    assert_eq!(messages.len(), 1);
    assert!(matches!(messages[0].body, MessageBody::Guidelines(_)));

    // Incomplete profile → go to profile.
    f.session.post_user_message("How do I complete my profile?").await.unwrap();
    settle(&f.session).await;
    let reply = f.session.messages().await.pop().unwrap();
    assert_eq!(reply.sender, Sender::System);
    assert!(reply.body.as_plain_text().contains("incomplete"));
    f.session.trigger(reply.id, 0).await.unwrap();
    assert_eq!(*f.navigator.0.lock().unwrap(), vec![Route::Profile.path().to_string()]);

    // Fill the profile in, then generate recommendations from the reply.
    f.profiles
        .set_profile(UserProfile {
            name: "Asha".into(),
            skills: vec!["Python".into(), "SQL".into()],
            ..Default::default()
        })
        .await;
    f.session.post_user_message("show internships").await.unwrap();
    settle(&f.session).await;
    let reply = f.session.messages().await.pop().unwrap();
    let generate = reply
        .suggested_actions
        .iter()
        .position(|a| a.command == Command::GenerateRecommendations)
        .unwrap();
    f.session.trigger(reply.id, generate).await.unwrap();
    assert_eq!(
        f.navigator.0.lock().unwrap().last().unwrap(),
        Route::Recommendations.path()
    );

    // Now the count is live.
    f.session.post_user_message("my recommendations").await.unwrap();
    settle(&f.session).await;
    let text = f.session.messages().await.pop().unwrap().body.as_plain_text();
    assert!(text.contains("You have 4 recommendations"), "{text}");

    // And the skill gaps have courses.
    f.session.post_user_message("any skill gap?").await.unwrap();
    settle(&f.session).await;
    let reply = f.session.messages().await.pop().unwrap();
    assert!(reply.body.as_plain_text().starts_with("I found"));
    f.session.trigger(reply.id, 0).await.unwrap();
    settle(&f.session).await;
    let courses = f.session.messages().await.pop().unwrap().body.as_plain_text();
    assert!(courses.starts_with("Here are courses to improve your skills:"));
    assert!(courses.contains("• Excel: "));
}

#[tokio::test]
async fn resume_failure_is_reported_in_chat() {
    let f = fixture(Arc::new(NoSpeech));
    f.session.open().await;
    f.session.post_user_message("I want to apply").await.unwrap();
    settle(&f.session).await;
    let reply = f.session.messages().await.pop().unwrap();
    assert_eq!(reply.suggested_actions[1].command, Command::GenerateResume);

    f.session.trigger(reply.id, 1).await.unwrap();
    settle(&f.session).await;
    let text = f.session.messages().await.pop().unwrap().body.as_plain_text();
    assert!(text.contains("error generating your resume"));
}

#[tokio::test]
async fn offline_sms_suggestion_routes_to_setup() {
    let f = fixture(Arc::new(NoSpeech));
    f.session.open().await;
    f.session.post_user_message("I'm offline, text me").await.unwrap();
    settle(&f.session).await;
    let reply = f.session.messages().await.pop().unwrap();
    f.session.trigger(reply.id, 0).await.unwrap();
    assert_eq!(*f.navigator.0.lock().unwrap(), vec!["/sms-setup".to_string()]);
}

#[tokio::test]
async fn help_menu_reinvokes_intents() {
    let f = fixture(Arc::new(NoSpeech));
    f.session.open().await;
    f.session.post_user_message("what can you help with").await.unwrap();
    settle(&f.session).await;
    let menu = f.session.messages().await.pop().unwrap();
    assert_eq!(menu.suggested_actions.len(), 6);
    assert_eq!(
        menu.suggested_actions[3].command,
        Command::InvokeIntent {
            intent: IntentTag::Voice
        }
    );

    f.session.trigger(menu.id, 3).await.unwrap();
    settle(&f.session).await;
    let voice = f.session.messages().await.pop().unwrap();
    assert!(voice.body.as_plain_text().starts_with("Voice mode is not active"));

    // Enable voice from the reply; later replies are spoken in Tamil.
    f.session.trigger(voice.id, 0).await.unwrap();
    settle(&f.session).await;
    assert!(f.modes.voice_mode());
}

#[tokio::test]
async fn spoken_replies_use_locale_tag() {
    let speech = Arc::new(RecordingSpeech::default());
    let f = fixture(speech.clone());
    f.modes.set_voice_mode(true);
    f.session.open().await;
    f.session.post_user_message("resume please").await.unwrap();
    settle(&f.session).await;

    let spoken = speech.0.lock().unwrap().clone();
    assert_eq!(spoken.len(), 1);
    assert_eq!(spoken[0].1, "ta-IN");
}

#[tokio::test]
async fn unknown_input_teaches_instead_of_apologising() {
    let f = fixture(Arc::new(NoSpeech));
    f.session.open().await;
    assert_eq!(f.session.classify("qwerty"), IntentTag::Unknown);
    f.session.post_user_message("qwerty").await.unwrap();
    settle(&f.session).await;
    let messages = f.session.messages().await;
    assert_eq!(messages[2].body, messages[0].body);
}

#[tokio::test]
async fn listen_without_speech_is_an_error() {
    let f = fixture(Arc::new(NoSpeech));
    f.session.open().await;
    assert!(f.session.listen().await.is_err());
    assert_eq!(f.session.messages().await.len(), 1);
}

#[tokio::test]
async fn no_skill_gaps_means_no_actions() {
    let f = fixture(Arc::new(NoSpeech));
    f.profiles.set_skill_gaps(SkillGaps::default()).await;
    f.session.open().await;
    f.session.post_user_message("skill gap analysis").await.unwrap();
    settle(&f.session).await;
    let reply = f.session.messages().await.pop().unwrap();
    assert!(reply.suggested_actions.is_empty());
}

#[tokio::test(start_paused = true)]
async fn reopen_after_close_has_no_ghost_reply() {
    let navigator = Arc::new(RecordingNavigator::default());
    let session = DialogueSession::new(
        DialogueConfig {
            typing_delay: TypingDelay::new(Duration::from_millis(500), Duration::from_millis(1500)),
            locale: "en".into(),
        },
        DialogueDeps {
            navigator,
            profiles: Arc::new(InMemoryProfileService::with_sample_catalog(UserProfile::default())),
            resumes: Arc::new(FailingResume),
            modes: Arc::new(ModeFlags::default()),
            speech: Arc::new(NoSpeech),
        },
    );
    session.open().await;
    session.post_user_message("help").await.unwrap();
    session.post_user_message("voice").await.unwrap();
    session.close().await;
    session.open().await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    let senders: Vec<Sender> = session.messages().await.iter().map(|m| m.sender).collect();
    assert_eq!(senders, vec![Sender::System, Sender::User, Sender::User]);
}
