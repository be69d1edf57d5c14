//! Speech input/output capability.
//!
//! Chosen once at startup: [`ConsoleSpeech`] when speech is available,
//! [`NoSpeech`] otherwise. Callers never probe for the capability again.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::error::SpeechError;

/// Text-to-speech and single-utterance speech-to-text.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Whether this engine can actually speak and listen.
    fn is_available(&self) -> bool;

    /// Speak `text` in the given BCP 47 language tag.
    fn speak(&self, text: &str, language_tag: &str);

    /// Capture one utterance. `Ok(None)` means nothing was heard.
    async fn listen(&self, language_tag: &str) -> Result<Option<String>, SpeechError>;
}

/// No speech capability: output is dropped, input is refused.
pub struct NoSpeech;

#[async_trait]
impl SpeechEngine for NoSpeech {
    fn is_available(&self) -> bool {
        false
    }

    fn speak(&self, _text: &str, _language_tag: &str) {}

    async fn listen(&self, _language_tag: &str) -> Result<Option<String>, SpeechError> {
        Err(SpeechError::Unavailable)
    }
}

/// Terminal stand-in for a speech engine: "speaks" to stderr and "hears"
/// one line from stdin.
pub struct ConsoleSpeech;

#[async_trait]
impl SpeechEngine for ConsoleSpeech {
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&self, text: &str, language_tag: &str) {
        debug!(language = language_tag, "Speaking");
        eprintln!("🔊 [{}] {}", language_tag, text);
    }

    async fn listen(&self, language_tag: &str) -> Result<Option<String>, SpeechError> {
        eprint!("🎤 [{}] ", language_tag);
        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| SpeechError::Recognition(e.to_string()))?;
        let heard = line.trim();
        Ok((!heard.is_empty()).then(|| heard.to_string()))
    }
}

/// Select the speech engine for this process.
pub fn select_engine(available: bool) -> Arc<dyn SpeechEngine> {
    if available {
        Arc::new(ConsoleSpeech)
    } else {
        Arc::new(NoSpeech)
    }
}
