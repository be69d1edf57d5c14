//! Dialogue session: the message log and turn-taking.
//!
//! User messages are appended immediately. System replies go through a
//! single FIFO worker that shows the typing indicator for a sampled delay
//! and then appends, so at most one reply is in flight and replies keep
//! the order of the turns that caused them.
//!
//! Each open starts a new worker generation. Closing bumps the generation
//! under the log lock and aborts the worker, so a reply scheduled before
//! the close can never land in the log afterwards.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use chrono::Utc;
use tokio::sync::{Mutex, Notify, RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{DialogueConfig, TypingDelay};
use crate::dialogue::responder::{ResponseGenerator, replies};
use crate::dialogue::rules::IntentClassifier;
use crate::dialogue::types::{
    Action, Command, DomainContext, IntentTag, Message, MessageBody, ResponsePayload, Route, Sender,
};
use crate::error::SessionError;
use crate::services::{ModeSwitch, Navigator, ProfileService, ResumeService};
use crate::speech::SpeechEngine;
use crate::templates::Language;

/// Collaborators the session talks to.
pub struct DialogueDeps {
    pub navigator: Arc<dyn Navigator>,
    pub profiles: Arc<dyn ProfileService>,
    pub resumes: Arc<dyn ResumeService>,
    pub modes: Arc<dyn ModeSwitch>,
    pub speech: Arc<dyn SpeechEngine>,
}

/// State shared between the session and its reply worker.
struct Shared {
    log: RwLock<Vec<Message>>,
    typing: AtomicBool,
    generation: AtomicU64,
    pending: AtomicUsize,
    idle: Notify,
}

impl Shared {
    fn new() -> Self {
        Self {
            log: RwLock::new(Vec::new()),
            typing: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            pending: AtomicUsize::new(0),
            idle: Notify::new(),
        }
    }

    fn push(log: &mut Vec<Message>, sender: Sender, body: MessageBody, actions: Vec<Action>) -> Message {
        let message = Message {
            id: log.len() as u64 + 1,
            sender,
            body,
            timestamp: Utc::now(),
            suggested_actions: actions,
        };
        log.push(message.clone());
        message
    }

    fn finish_one(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

struct ReplyWorker {
    tx: mpsc::UnboundedSender<ResponsePayload>,
    handle: JoinHandle<()>,
}

/// One conversation between the user and the assistant.
pub struct DialogueSession {
    id: Uuid,
    config: DialogueConfig,
    classifier: IntentClassifier,
    responder: ResponseGenerator,
    deps: Arc<DialogueDeps>,
    shared: Arc<Shared>,
    worker: Mutex<Option<ReplyWorker>>,
}

impl DialogueSession {
    pub fn new(config: DialogueConfig, deps: DialogueDeps) -> Self {
        Self::with_classifier(config, deps, IntentClassifier::default_rules())
    }

    pub fn with_classifier(config: DialogueConfig, deps: DialogueDeps, classifier: IntentClassifier) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            classifier,
            responder: ResponseGenerator::new(),
            deps: Arc::new(deps),
            shared: Arc::new(Shared::new()),
            worker: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Speech language tag derived from the configured locale.
    pub fn language_tag(&self) -> &'static str {
        Language::from_code_or_default(&self.config.locale).speech_tag()
    }

    /// Open the session and start the reply worker.
    ///
    /// An empty log gets exactly one welcome message, appended directly so
    /// it precedes any user input.
    pub async fn open(&self) {
        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            return;
        }

        {
            let mut log = self.shared.log.write().await;
            if log.is_empty() {
                let welcome = self.responder.welcome();
                Shared::push(&mut log, Sender::System, welcome.body, welcome.actions);
            }
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_replies(
            Arc::clone(&self.shared),
            rx,
            generation,
            self.config.typing_delay,
            Arc::clone(&self.deps),
            self.language_tag(),
        ));
        *worker = Some(ReplyWorker { tx, handle });
        info!(session = %self.id, generation, "Dialogue session opened");
    }

    /// Close the session, discarding any reply not yet appended.
    pub async fn close(&self) {
        let Some(worker) = self.worker.lock().await.take() else {
            return;
        };
        {
            let _log = self.shared.log.write().await;
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
        }
        worker.handle.abort();
        let _ = worker.handle.await;

        let dropped = self.shared.pending.swap(0, Ordering::SeqCst);
        self.shared.typing.store(false, Ordering::SeqCst);
        self.shared.idle.notify_waiters();
        info!(session = %self.id, dropped, "Dialogue session closed");
    }

    pub async fn is_open(&self) -> bool {
        self.worker.lock().await.is_some()
    }

    /// Whether a reply is currently "being typed".
    pub fn is_typing(&self) -> bool {
        self.shared.typing.load(Ordering::SeqCst)
    }

    /// Replies queued or in flight.
    pub fn pending_replies(&self) -> usize {
        self.shared.pending.load(Ordering::SeqCst)
    }

    /// Snapshot of the log.
    pub async fn messages(&self) -> Vec<Message> {
        self.shared.log.read().await.clone()
    }

    /// Wait until every queued reply has been appended (or dropped by close).
    pub async fn flush(&self) {
        loop {
            let notified = self.shared.idle.notified();
            if self.shared.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Append the user's message and schedule the assistant's reply.
    pub async fn post_user_message(&self, text: &str) -> Result<Message, SessionError> {
        if !self.is_open().await {
            return Err(SessionError::Closed);
        }

        let message = {
            let mut log = self.shared.log.write().await;
            Shared::push(&mut log, Sender::User, MessageBody::from(text), Vec::new())
        };

        let intent = self.classifier.classify(text);
        let context = self.snapshot().await;
        debug!(session = %self.id, intent = %intent, "Responding to user message");
        let payload = self.responder.respond(intent, text, &context);
        self.post_system_message(payload).await?;
        Ok(message)
    }

    /// Schedule a system message behind any reply already queued.
    pub async fn post_system_message(&self, payload: ResponsePayload) -> Result<(), SessionError> {
        let worker = self.worker.lock().await;
        let Some(worker) = worker.as_ref() else {
            return Err(SessionError::Closed);
        };
        self.shared.pending.fetch_add(1, Ordering::SeqCst);
        if worker.tx.send(payload).is_err() {
            self.shared.finish_one();
            return Err(SessionError::WorkerStopped { id: self.id });
        }
        Ok(())
    }

    /// Run the action at `index` on message `message_id`.
    pub async fn trigger(&self, message_id: u64, index: usize) -> Result<(), SessionError> {
        let command = {
            let log = self.shared.log.read().await;
            log.iter()
                .find(|m| m.id == message_id)
                .and_then(|m| m.suggested_actions.get(index))
                .map(|a| a.command.clone())
                .ok_or(SessionError::ActionNotFound { message_id, index })?
        };
        self.execute(&command).await
    }

    /// Execute a command against the collaborators. Commands that produce
    /// content post it as a system message.
    pub async fn execute(&self, command: &Command) -> Result<(), SessionError> {
        debug!(session = %self.id, command = ?command, "Executing command");
        match command {
            Command::Navigate { route } => {
                self.deps.navigator.navigate_to(route.path());
            }
            Command::SetVoiceMode { enabled } => {
                self.deps.modes.set_voice_mode(*enabled);
                let text = if *enabled {
                    replies::VOICE_ENABLED
                } else {
                    replies::VOICE_DISABLED
                };
                self.post_system_message(ResponsePayload::text(text)).await?;
            }
            Command::InvokeIntent { intent } => {
                let context = self.snapshot().await;
                let payload = self.responder.respond(*intent, "", &context);
                self.post_system_message(payload).await?;
            }
            Command::ShowNavigationOptions => {
                self.post_system_message(self.responder.navigation_options()).await?;
            }
            Command::GenerateRecommendations => {
                let profile = self.deps.profiles.profile().await;
                match self.deps.profiles.generate_recommendations(&profile).await {
                    Ok(()) => self.deps.navigator.navigate_to(Route::Recommendations.path()),
                    Err(e) => {
                        warn!(session = %self.id, error = %e, "Recommendation generation failed");
                        self.post_system_message(ResponsePayload::text(replies::RECOMMENDATIONS_FAILED))
                            .await?;
                    }
                }
            }
            Command::GenerateResume => {
                let profile = self.deps.profiles.profile().await;
                let text = match self.deps.resumes.generate_resume(&profile).await {
                    Ok(()) => replies::RESUME_GENERATED,
                    Err(e) => {
                        warn!(session = %self.id, error = %e, "Resume generation failed");
                        replies::RESUME_FAILED
                    }
                };
                self.post_system_message(ResponsePayload::text(text)).await?;
            }
            Command::ExplainMatches => {
                let recommendations = self.deps.profiles.recommendations().await;
                if let Some(payload) = self.responder.explain_matches(&recommendations) {
                    self.post_system_message(payload).await?;
                }
            }
            Command::ShowCourses => {
                let gaps = self.deps.profiles.skill_gaps().await;
                self.post_system_message(self.responder.course_suggestions(&gaps))
                    .await?;
            }
            Command::ShowTips { topic } => {
                self.post_system_message(self.responder.tips(*topic)).await?;
            }
        }
        Ok(())
    }

    /// Capture one spoken utterance and post it as a user message.
    ///
    /// Returns `Ok(None)` when nothing was heard.
    pub async fn listen(&self) -> crate::error::Result<Option<Message>> {
        if !self.is_open().await {
            return Err(SessionError::Closed.into());
        }
        let heard = self.deps.speech.listen(self.language_tag()).await?;
        match heard {
            Some(text) => Ok(Some(self.post_user_message(&text).await?)),
            None => {
                debug!(session = %self.id, "Nothing heard");
                Ok(None)
            }
        }
    }

    /// Intent the classifier assigns to `text`.
    pub fn classify(&self, text: &str) -> IntentTag {
        self.classifier.classify(text)
    }

    async fn snapshot(&self) -> DomainContext {
        let profile = self.deps.profiles.profile().await;
        let recommendations = self.deps.profiles.recommendations().await;
        let gaps = self.deps.profiles.skill_gaps().await;
        DomainContext {
            profile_complete: profile.is_complete(),
            recommendation_count: recommendations.len(),
            skill_gap_count: gaps.total(),
            voice_mode_enabled: self.deps.modes.voice_mode(),
            offline_mode_enabled: self.deps.modes.offline_mode(),
        }
    }
}

/// Reply worker: one payload at a time, in arrival order.
async fn run_replies(
    shared: Arc<Shared>,
    mut rx: mpsc::UnboundedReceiver<ResponsePayload>,
    generation: u64,
    delay: TypingDelay,
    deps: Arc<DialogueDeps>,
    language_tag: &'static str,
) {
    while let Some(payload) = rx.recv().await {
        if shared.generation.load(Ordering::SeqCst) != generation {
            break;
        }
        shared.typing.store(true, Ordering::SeqCst);
        let wait = delay.sample();
        debug!(delay_ms = wait.as_millis() as u64, "Typing");
        tokio::time::sleep(wait).await;

        let message = {
            let mut log = shared.log.write().await;
            if shared.generation.load(Ordering::SeqCst) != generation {
                break;
            }
            Shared::push(&mut log, Sender::System, payload.body, payload.actions)
        };
        shared.typing.store(false, Ordering::SeqCst);

        if deps.modes.voice_mode() {
            deps.speech.speak(&message.body.as_plain_text(), language_tag);
        }
        shared.finish_one();
    }
}
