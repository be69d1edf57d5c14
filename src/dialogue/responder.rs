//! Response generation: maps an intent plus a context snapshot to a reply.
//!
//! Pure: nothing here touches collaborators. Side effects live in the
//! `Command`s attached to the returned actions.

use crate::dialogue::courses::course_for;
use crate::dialogue::types::{
    Action, Command, DomainContext, Guidelines, IntentTag, MessageBody, ResponsePayload, Route,
    TipTopic,
};
use crate::services::{Recommendation, SkillGaps};

/// Follow-up texts posted by command execution.
pub mod replies {
    pub const RESUME_GENERATED: &str = "Resume generated successfully! Check your downloads.";
    pub const RESUME_FAILED: &str =
        "Sorry, there was an error generating your resume. Please try again.";
    pub const RECOMMENDATIONS_FAILED: &str =
        "Sorry, I couldn't generate recommendations right now. Please complete your profile and try again.";
    pub const VOICE_ENABLED: &str = "Voice mode enabled. I'll read my replies aloud.";
    pub const VOICE_DISABLED: &str = "Voice mode disabled.";
    pub const NO_COURSES: &str =
        "No specific courses found, but you can check NPTEL and SWAYAM for relevant skills.";
    pub const DEFAULT_EXPLANATION: &str = "Good match based on your profile";
}

/// Destination keywords checked in priority order.
const DESTINATIONS: &[(&[&str], Route)] = &[
    (&["profile"], Route::Profile),
    (&["recommendation"], Route::Recommendations),
    (&["feedback"], Route::Feedback),
    (&["home", "start"], Route::Home),
];

/// Stateless reply builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseGenerator;

impl ResponseGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Build the reply for one classified turn. `raw_text` is only consulted
    /// by the navigation branch.
    pub fn respond(&self, intent: IntentTag, raw_text: &str, ctx: &DomainContext) -> ResponsePayload {
        match intent {
            IntentTag::Profile => self.profile(ctx),
            IntentTag::Recommendations => self.recommendations(ctx),
            IntentTag::SkillGap => self.skill_gap(ctx),
            IntentTag::Resume => self.resume(),
            IntentTag::Sms => self.sms(ctx),
            IntentTag::Voice => self.voice(ctx),
            IntentTag::Navigation => self.navigation(raw_text),
            IntentTag::GeneralHelp => self.general_help(),
            IntentTag::Application => self.application(),
            IntentTag::Unknown => self.welcome(),
        }
    }

    /// The usage guide. Shown when a session opens and for unrecognized input.
    pub fn welcome(&self) -> ResponsePayload {
        ResponsePayload {
            body: MessageBody::Guidelines(guidelines()),
            actions: Vec::new(),
        }
    }

    fn profile(&self, ctx: &DomainContext) -> ResponsePayload {
        if !ctx.profile_complete {
            ResponsePayload::text("I see your profile is incomplete. Let me help you fill it out!")
                .with_actions(vec![
                    Action::navigate("Go to Profile", Route::Profile),
                    Action::new(
                        "Profile Tips",
                        Command::ShowTips {
                            topic: TipTopic::Profile,
                        },
                    ),
                ])
        } else {
            ResponsePayload::text(
                "Your profile looks good! Would you like to update anything or get recommendations?",
            )
            .with_actions(vec![
                Action::navigate("Update Profile", Route::Profile),
                Action::navigate("Get Recommendations", Route::Recommendations),
            ])
        }
    }

    fn recommendations(&self, ctx: &DomainContext) -> ResponsePayload {
        if ctx.recommendation_count == 0 {
            ResponsePayload::text(
                "You don't have recommendations yet. Let me help you generate some!",
            )
            .with_actions(vec![
                Action::navigate("Complete Profile", Route::Profile),
                Action::new("Generate Now", Command::GenerateRecommendations),
            ])
        } else {
            ResponsePayload::text(format!(
                "You have {} recommendations! I can explain matches, skill gaps, or help with applications.",
                ctx.recommendation_count
            ))
            .with_actions(vec![
                Action::navigate("View Recommendations", Route::Recommendations),
                Action::new("Explain My Matches", Command::ExplainMatches),
            ])
        }
    }

    fn skill_gap(&self, ctx: &DomainContext) -> ResponsePayload {
        if ctx.skill_gap_count > 0 {
            ResponsePayload::text(format!(
                "I found {} skill gaps. I can recommend courses to help you improve!",
                ctx.skill_gap_count
            ))
            .with_actions(vec![
                Action::new("Show Courses", Command::ShowCourses),
                Action::navigate("View in Recommendations", Route::Recommendations),
            ])
        } else {
            ResponsePayload::text(
                "Great! You don't have any major skill gaps for your current recommendations.",
            )
        }
    }

    fn resume(&self) -> ResponsePayload {
        ResponsePayload::text(
            "I can generate a professional resume for you automatically! This makes applying much easier.",
        )
        .with_actions(vec![
            Action::new("Generate Resume", Command::GenerateResume),
            Action::new(
                "Resume Tips",
                Command::ShowTips {
                    topic: TipTopic::Resume,
                },
            ),
        ])
    }

    fn sms(&self, ctx: &DomainContext) -> ResponsePayload {
        if ctx.offline_mode_enabled {
            ResponsePayload::text(
                "Since you're offline, I can send your top recommendations via SMS!",
            )
            .with_actions(vec![
                Action::navigate("Setup SMS", Route::SmsSetup),
                Action::new(
                    "How SMS Works",
                    Command::ShowTips {
                        topic: TipTopic::SmsInfo,
                    },
                ),
            ])
        } else {
            ResponsePayload::text(
                "SMS recommendations are available for offline access. Would you like to set it up for later?",
            )
        }
    }

    fn voice(&self, ctx: &DomainContext) -> ResponsePayload {
        if ctx.voice_mode_enabled {
            ResponsePayload::text(
                "Voice mode is currently active! You can speak to me in your preferred language.",
            )
            .with_actions(vec![
                Action::new("Disable Voice", Command::SetVoiceMode { enabled: false }),
                Action::new(
                    "Voice Tips",
                    Command::ShowTips {
                        topic: TipTopic::Voice,
                    },
                ),
            ])
        } else {
            ResponsePayload::text("Voice mode is not active. I can help you enable it!")
                .with_actions(vec![
                    Action::new("Enable Voice", Command::SetVoiceMode { enabled: true }),
                    Action::new(
                        "Voice Features",
                        Command::ShowTips {
                            topic: TipTopic::VoiceFeatures,
                        },
                    ),
                ])
        }
    }

    fn navigation(&self, raw_text: &str) -> ResponsePayload {
        match destination_in(raw_text) {
            Some(route) => ResponsePayload::text(format!("Taking you to {}!", route.label()))
                .with_actions(vec![Action::navigate("Go Now", route)]),
            None => self.navigation_options(),
        }
    }

    /// Chooser listing every top-level page.
    pub fn navigation_options(&self) -> ResponsePayload {
        ResponsePayload::text("Where would you like to go?").with_actions(vec![
            Action::navigate("🏠 Home", Route::Home),
            Action::navigate("👤 Profile", Route::Profile),
            Action::navigate("🎯 Recommendations", Route::Recommendations),
            Action::navigate("💬 Feedback", Route::Feedback),
        ])
    }

    fn general_help(&self) -> ResponsePayload {
        let invoke = |label: &str, intent: IntentTag| Action::new(label, Command::InvokeIntent { intent });
        ResponsePayload::text("Here are the main things I can help you with:").with_actions(vec![
            invoke("👤 Profile Help", IntentTag::Profile),
            invoke("🎯 Find Internships", IntentTag::Recommendations),
            invoke("📄 Resume Generation", IntentTag::Resume),
            invoke("🔊 Voice Features", IntentTag::Voice),
            invoke("📱 SMS Setup", IntentTag::Sms),
            Action::new("🧭 Navigation", Command::ShowNavigationOptions),
        ])
    }

    fn application(&self) -> ResponsePayload {
        ResponsePayload::text(
            "I can help you with applications! I can generate your resume and explain the process.",
        )
        .with_actions(vec![
            Action::new(
                "Application Process",
                Command::ShowTips {
                    topic: TipTopic::ApplicationProcess,
                },
            ),
            Action::new("Generate Resume", Command::GenerateResume),
        ])
    }

    /// Informational follow-up for a tip topic.
    pub fn tips(&self, topic: TipTopic) -> ResponsePayload {
        let text = match topic {
            TipTopic::Profile => {
                "Profile tips:\n\
                 • Add your full name and location so we can match nearby internships.\n\
                 • List every skill you have, including tools and languages.\n\
                 • Mention your education and current year of study.\n\
                 • Keep your preferred language up to date for SMS and voice."
            }
            TipTopic::Resume => {
                "Resume tips:\n\
                 • Keep it to one page.\n\
                 • Lead each project with what you achieved.\n\
                 • Match the skills section to the internship you apply for.\n\
                 • Proofread names, dates and contact details."
            }
            TipTopic::Voice => {
                "Voice tips:\n\
                 • Speak clearly in a quiet place.\n\
                 • Use short commands like \"show recommendations\".\n\
                 • You can speak in English, Hindi or Tamil."
            }
            TipTopic::VoiceFeatures => {
                "With voice mode on I read every reply aloud, and you can use the microphone \
                 to ask questions instead of typing."
            }
            TipTopic::SmsInfo => {
                "How SMS works: verify your phone number once, choose how often and how many \
                 internships you want, and we text your top matches even when you have no internet."
            }
            TipTopic::ApplicationProcess => {
                "Application process:\n\
                 1. Complete your profile.\n\
                 2. Review your recommendations and skill gaps.\n\
                 3. Generate your resume.\n\
                 4. Apply online at internpath.com before the deadline.\n\
                 5. Track responses and give us feedback."
            }
        };
        ResponsePayload::text(text)
    }

    /// Why each recommendation matched. `None` when there are none.
    pub fn explain_matches(&self, recommendations: &[Recommendation]) -> Option<ResponsePayload> {
        if recommendations.is_empty() {
            return None;
        }
        let explanations = recommendations
            .iter()
            .map(|rec| {
                format!(
                    "{}: {}",
                    rec.title,
                    rec.explanation
                        .as_deref()
                        .unwrap_or(replies::DEFAULT_EXPLANATION)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        Some(ResponsePayload::text(format!(
            "Here's why these internships match you:\n\n{explanations}"
        )))
    }

    /// Courses for missing skills found in the catalog.
    pub fn course_suggestions(&self, gaps: &SkillGaps) -> ResponsePayload {
        let lines: Vec<String> = gaps
            .all_missing()
            .into_iter()
            .filter_map(|skill| {
                course_for(skill)
                    .map(|course| format!("• {}: {} ({})", skill, course.title, course.provider))
            })
            .collect();
        if lines.is_empty() {
            ResponsePayload::text(replies::NO_COURSES)
        } else {
            ResponsePayload::text(format!(
                "Here are courses to improve your skills:\n\n{}",
                lines.join("\n")
            ))
        }
    }
}

/// First destination keyword found in the text, in priority order.
pub fn destination_in(text: &str) -> Option<Route> {
    let lower = text.to_lowercase();
    DESTINATIONS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, route)| *route)
}

fn guidelines() -> Guidelines {
    let examples = [
        ("👤 Profile", "How do I complete my profile?"),
        ("🎯 Internships", "Show me internship recommendations"),
        ("📄 Resume", "Generate my resume"),
        ("🔊 Voice", "Enable voice mode"),
        ("📱 SMS", "Setup SMS alerts"),
        ("🧭 Navigation", "Go to profile page"),
        ("❓ General Help", "What can you do?"),
    ];
    Guidelines {
        title: "👋 Welcome to InternPath Assistant!".to_string(),
        intro: "I am your smart chatbot, designed to help you find internships, improve your \
                profile, generate resumes, and much more."
            .to_string(),
        how_to_use: vec![
            "Type your question or command in the chat box below.".to_string(),
            "Use the microphone button to speak your query (if voice mode is enabled).".to_string(),
            "Click on suggested actions for quick navigation.".to_string(),
            "Type \"help\" anytime to see these instructions again.".to_string(),
        ],
        examples: examples
            .iter()
            .map(|(topic, example)| (topic.to_string(), example.to_string()))
            .collect(),
        tips: vec![
            "Tip: You can ask me anything related to internships, your profile, or application \
             process. I'm here to make your journey easier!"
                .to_string(),
            "Need more help? Just type help or click on any suggested button.".to_string(),
        ],
    }
}
