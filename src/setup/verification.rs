//! Verification codes for phone ownership.
//!
//! A code is generated, delivered through the notification sender and kept
//! only here, wrapped in a `SecretString`. Nothing outside this module can
//! read it back; callers only learn whether a submitted code matched.

use std::time::Duration;

use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::CollaboratorError;
use crate::services::{NotificationSender, mask_destination};

/// Number of digits in a verification code.
pub const CODE_LENGTH: usize = 4;

/// Result of checking a submitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    /// Matched the issued code (which is now spent) or the bypass code.
    Accepted,
    /// Not exactly four digits.
    Malformed,
    /// Well-formed but wrong. The issued code stays valid.
    Rejected,
    /// Matched, but the code outlived its time-to-live.
    Expired,
}

struct IssuedCode {
    code: SecretString,
    issued_at: Instant,
}

/// Issues and checks verification codes.
pub struct VerificationCodeService {
    issued: RwLock<Option<IssuedCode>>,
    bypass: Option<String>,
    ttl: Option<Duration>,
}

impl VerificationCodeService {
    pub fn new(bypass: Option<String>, ttl: Option<Duration>) -> Self {
        Self {
            issued: RwLock::new(None),
            bypass,
            ttl,
        }
    }

    /// Generate a fresh code and deliver it to `destination`.
    ///
    /// The code is only stored once delivery succeeded, replacing any
    /// earlier one.
    pub async fn issue(
        &self,
        sender: &dyn NotificationSender,
        destination: &str,
    ) -> Result<(), CollaboratorError> {
        let code = SecretString::from(generate_code());
        let body = format!(
            "Your InternPath verification code is {}",
            code.expose_secret()
        );
        sender.send(destination, &body).await?;

        *self.issued.write().await = Some(IssuedCode {
            code,
            issued_at: Instant::now(),
        });
        info!(destination = %mask_destination(destination), "Verification code issued");
        Ok(())
    }

    /// Whether a code is currently outstanding.
    pub async fn has_code(&self) -> bool {
        self.issued.read().await.is_some()
    }

    /// Compare a submitted code. A successful match against the issued code
    /// spends it.
    pub async fn check(&self, submitted: &str) -> CodeCheck {
        if !is_well_formed(submitted) {
            return CodeCheck::Malformed;
        }

        if self.bypass.as_deref() == Some(submitted) {
            debug!("Debug bypass code accepted");
            self.clear().await;
            return CodeCheck::Accepted;
        }

        let mut issued = self.issued.write().await;
        let Some(current) = issued.as_ref() else {
            return CodeCheck::Rejected;
        };
        if current.code.expose_secret() != submitted {
            return CodeCheck::Rejected;
        }
        let expired = self
            .ttl
            .is_some_and(|ttl| current.issued_at.elapsed() > ttl);
        *issued = None;
        if expired {
            CodeCheck::Expired
        } else {
            CodeCheck::Accepted
        }
    }

    /// Forget the outstanding code.
    pub async fn clear(&self) {
        *self.issued.write().await = None;
    }
}

fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.chars().all(|c| c.is_ascii_digit())
}

fn generate_code() -> String {
    rand::thread_rng().gen_range(1000..=9999u32).to_string()
}
