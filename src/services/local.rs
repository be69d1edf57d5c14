//! In-process collaborator implementations used by the CLI and tests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::model::{Recommendation, SkillGaps, UserProfile};
use super::{ModeSwitch, Navigator, NotificationSender, ProfileService, ResumeService, mask_destination};
use crate::error::CollaboratorError;

// ── Navigation ──────────────────────────────────────────────────────

/// Navigator that just reports the requested route.
pub struct ConsoleNavigator;

impl ConsoleNavigator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for ConsoleNavigator {
    fn navigate_to(&self, route: &str) {
        info!(route = route, "Navigating");
        eprintln!("🧭 → {}", route);
    }
}

// ── Modes ───────────────────────────────────────────────────────────

/// Voice/offline flags held in memory.
#[derive(Debug, Default)]
pub struct ModeFlags {
    voice: AtomicBool,
    offline: AtomicBool,
}

impl ModeFlags {
    pub fn new(voice: bool, offline: bool) -> Self {
        Self {
            voice: AtomicBool::new(voice),
            offline: AtomicBool::new(offline),
        }
    }

    pub fn set_offline_mode(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

impl ModeSwitch for ModeFlags {
    fn voice_mode(&self) -> bool {
        self.voice.load(Ordering::SeqCst)
    }

    fn set_voice_mode(&self, enabled: bool) {
        info!(enabled, "Voice mode changed");
        self.voice.store(enabled, Ordering::SeqCst);
    }

    fn offline_mode(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }
}

// ── Profile & recommendations ───────────────────────────────────────

/// Profile service over a fixed internship catalog.
///
/// Generation scores each catalog entry by the share of its required skills
/// the profile already has, and records the rest as skill gaps.
pub struct InMemoryProfileService {
    profile: RwLock<UserProfile>,
    recommendations: RwLock<Vec<Recommendation>>,
    skill_gaps: RwLock<SkillGaps>,
    catalog: Vec<Recommendation>,
}

impl InMemoryProfileService {
    pub fn new(profile: UserProfile, catalog: Vec<Recommendation>) -> Self {
        Self {
            profile: RwLock::new(profile),
            recommendations: RwLock::new(Vec::new()),
            skill_gaps: RwLock::new(SkillGaps::default()),
            catalog,
        }
    }

    /// Seed with a few sample internships.
    pub fn with_sample_catalog(profile: UserProfile) -> Self {
        Self::new(profile, sample_catalog())
    }

    pub async fn set_profile(&self, profile: UserProfile) {
        *self.profile.write().await = profile;
    }

    pub async fn set_recommendations(&self, recommendations: Vec<Recommendation>) {
        *self.recommendations.write().await = recommendations;
    }

    pub async fn set_skill_gaps(&self, gaps: SkillGaps) {
        *self.skill_gaps.write().await = gaps;
    }
}

#[async_trait]
impl ProfileService for InMemoryProfileService {
    async fn profile(&self) -> UserProfile {
        self.profile.read().await.clone()
    }

    async fn recommendations(&self) -> Vec<Recommendation> {
        self.recommendations.read().await.clone()
    }

    async fn skill_gaps(&self) -> SkillGaps {
        self.skill_gaps.read().await.clone()
    }

    async fn generate_recommendations(&self, profile: &UserProfile) -> Result<(), CollaboratorError> {
        if profile.skills.is_empty() {
            return Err(CollaboratorError::GenerationFailed {
                what: "recommendations".to_string(),
                reason: "profile has no skills".to_string(),
            });
        }

        let mut scored = Vec::with_capacity(self.catalog.len());
        let mut gaps = SkillGaps::default();
        for entry in &self.catalog {
            let (have, missing): (Vec<&String>, Vec<&String>) = entry
                .required_skills
                .iter()
                .partition(|s| profile.has_skill(s));
            let score = if entry.required_skills.is_empty() {
                None
            } else {
                Some((have.len() * 100 / entry.required_skills.len()) as u32)
            };
            if !missing.is_empty() {
                gaps.insert(
                    entry.title.clone(),
                    missing.into_iter().cloned().collect(),
                );
            }
            let mut rec = entry.clone();
            rec.skill_match = score;
            scored.push(rec);
        }
        scored.sort_by(|a, b| b.display_match().cmp(&a.display_match()));

        info!(count = scored.len(), gaps = gaps.total(), "Recommendations generated");
        *self.recommendations.write().await = scored;
        *self.skill_gaps.write().await = gaps;
        Ok(())
    }
}

fn sample_catalog() -> Vec<Recommendation> {
    let entry = |title: &str, company: &str, location: &str, stipend: &str, skills: &[&str]| {
        let mut rec = Recommendation::new(title, company, location);
        rec.stipend = Some(stipend.to_string());
        rec.required_skills = skills.iter().map(|s| s.to_string()).collect();
        rec.explanation = Some(format!("Uses {}", skills.join(", ")));
        rec
    };
    vec![
        entry("Frontend Developer Intern", "Tech Corp", "Mumbai", "₹10,000/month", &["JavaScript", "React"]),
        entry("Data Analyst Intern", "Insight Labs", "Bengaluru", "₹12,000/month", &["Python", "SQL", "Excel"]),
        entry("ML Research Intern", "IIT Madras", "Chennai", "₹15,000/month", &["Python", "Machine Learning"]),
        entry("Marketing Intern", "GrowthCo", "Delhi", "₹8,000/month", &["Digital Marketing", "Communication"]),
    ]
}

// ── Resume ──────────────────────────────────────────────────────────

/// Writes a plain-text resume into a directory.
pub struct TextResumeService {
    output_dir: PathBuf,
}

impl TextResumeService {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join("resume.txt")
    }
}

#[async_trait]
impl ResumeService for TextResumeService {
    async fn generate_resume(&self, profile: &UserProfile) -> Result<(), CollaboratorError> {
        let failed = |reason: String| CollaboratorError::GenerationFailed {
            what: "resume".to_string(),
            reason,
        };

        let name = profile
            .display_name()
            .ok_or_else(|| failed("profile has no name".to_string()))?;

        let mut text = format!("{name}\n{}\n\n", "=".repeat(name.chars().count()));
        if let Some(ref location) = profile.location {
            text.push_str(&format!("Location: {location}\n"));
        }
        if let Some(ref education) = profile.education {
            text.push_str(&format!("Education: {education}\n"));
        }
        if !profile.skills.is_empty() {
            text.push_str(&format!("Skills: {}\n", profile.skills.join(", ")));
        }

        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| failed(e.to_string()))?;
        let path = self.output_path();
        fs::write(&path, text).await.map_err(|e| failed(e.to_string()))?;
        info!(path = %path.display(), "Resume written");
        Ok(())
    }
}

// ── Sending ─────────────────────────────────────────────────────────

/// A message accepted by [`OutboxSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub destination: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// Sender that keeps every message in memory instead of calling a gateway.
#[derive(Default)]
pub struct OutboxSender {
    sent: RwLock<Vec<SentMessage>>,
    fail: AtomicBool,
}

impl OutboxSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl NotificationSender for OutboxSender {
    async fn send(&self, destination: &str, body: &str) -> Result<(), CollaboratorError> {
        if self.fail.load(Ordering::SeqCst) {
            warn!(destination = %mask_destination(destination), "Outbox send rejected");
            return Err(CollaboratorError::SendFailed {
                destination: mask_destination(destination),
                reason: "gateway unavailable".to_string(),
            });
        }
        info!(
            destination = %mask_destination(destination),
            chars = body.chars().count(),
            "Message queued"
        );
        self.sent.write().await.push(SentMessage {
            destination: destination.to_string(),
            body: body.to_string(),
            sent_at: Utc::now(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(skills: &[&str]) -> UserProfile {
        UserProfile {
            name: "Asha".into(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn generation_scores_and_records_gaps() {
        let service = InMemoryProfileService::with_sample_catalog(profile(&["Python", "SQL"]));
        let p = service.profile().await;
        service.generate_recommendations(&p).await.unwrap();

        let recs = service.recommendations().await;
        assert_eq!(recs.len(), 4);
        assert_eq!(recs[0].title, "Data Analyst Intern");
        assert_eq!(recs[0].skill_match, Some(66));

        let gaps = service.skill_gaps().await;
        assert_eq!(gaps.0["Data Analyst Intern"], vec!["Excel".to_string()]);
        assert!(gaps.total() >= 5);
    }

    #[tokio::test]
    async fn generation_requires_skills() {
        let service = InMemoryProfileService::with_sample_catalog(profile(&[]));
        let p = service.profile().await;
        assert!(service.generate_recommendations(&p).await.is_err());
        assert!(service.recommendations().await.is_empty());
    }

    #[tokio::test]
    async fn resume_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let service = TextResumeService::new(dir.path().join("out"));
        service.generate_resume(&profile(&["Python"])).await.unwrap();

        let text = tokio::fs::read_to_string(service.output_path()).await.unwrap();
        assert!(text.starts_with("Asha\n===="));
        assert!(text.contains("Skills: Python"));
    }

    #[tokio::test]
    async fn resume_requires_name() {
        let dir = tempfile::tempdir().unwrap();
        let service = TextResumeService::new(dir.path().to_path_buf());
        let err = service
            .generate_resume(&UserProfile::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::GenerationFailed { .. }));
    }

    #[tokio::test]
    async fn outbox_records_and_fails_on_demand() {
        let outbox = OutboxSender::new();
        outbox.send("+919876543210", "hello").await.unwrap();
        outbox.set_failing(true);
        assert!(outbox.send("+919876543210", "again").await.is_err());

        let sent = outbox.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body, "hello");
    }

    #[test]
    fn mode_flags_toggle() {
        let flags = ModeFlags::new(false, true);
        assert!(!flags.voice_mode());
        flags.set_voice_mode(true);
        assert!(flags.voice_mode());
        assert!(flags.offline_mode());
    }
}
