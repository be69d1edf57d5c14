//! Builds outbound SMS text from recommendation records and preferences.

use tracing::debug;

use super::model::PreferenceSet;
use crate::templates::{Language, TemplateName, render, template_set};

pub use crate::services::Recommendation;

/// Name used when the profile has none.
pub const GENERIC_RECIPIENT: &str = "Dear User";

/// Line inserted after the greeting in test messages.
pub const TEST_DISCLAIMER: &str = "This is a test message.";

/// Renders digests and confirmations in the recipient's language.
#[derive(Debug, Clone)]
pub struct NotificationBuilder {
    helpline: String,
}

impl NotificationBuilder {
    pub fn new(helpline: impl Into<String>) -> Self {
        Self {
            helpline: helpline.into(),
        }
    }

    /// Build a digest: greeting, optional test disclaimer, at most
    /// `max_items` item lines in the given order, then the footer.
    pub fn build(
        &self,
        recipient: Option<&str>,
        records: &[Recommendation],
        preferences: &PreferenceSet,
        is_test: bool,
    ) -> String {
        let language = Language::from_code_or_default(&preferences.language);
        let templates = template_set(language);
        let name = recipient
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(GENERIC_RECIPIENT);

        let mut message = render(templates.greeting, &[("name", name)]);
        if is_test {
            message.push_str("\n\n");
            message.push_str(TEST_DISCLAIMER);
        }
        message.push_str("\n\n");

        let shown = records.iter().take(preferences.max_items.get());
        for (i, rec) in shown.enumerate() {
            let index = (i + 1).to_string();
            let score = rec.display_match().to_string();
            let location = if preferences.include_location {
                rec.location.as_str()
            } else {
                ""
            };
            message.push_str(&render(
                templates.item,
                &[
                    ("index", index.as_str()),
                    ("title", rec.title.as_str()),
                    ("company", rec.company.as_str()),
                    ("match", score.as_str()),
                    ("location", location),
                ],
            ));
            if let Some(stipend) = rec.stipend.as_deref().filter(|_| preferences.include_stipend) {
                message.push_str(" | Stipend: ");
                message.push_str(stipend);
            }
            message.push('\n');
        }

        message.push('\n');
        message.push_str(&render(templates.footer, &[("helpline", self.helpline.as_str())]));

        debug!(
            language = language.code(),
            items = records.len().min(preferences.max_items.get()),
            is_test,
            "Notification built"
        );
        message
    }

    /// Activation confirmation in the preferred language.
    pub fn confirmation(&self, preferences: &PreferenceSet) -> String {
        let language = Language::from_code_or_default(&preferences.language);
        template_set(language).get(TemplateName::Confirmation).to_string()
    }
}

/// Representative record used for test messages.
pub fn sample_record() -> Recommendation {
    let mut rec = Recommendation::new("Sample Frontend Internship", "Tech Corp", "Mumbai");
    rec.skill_match = Some(85);
    rec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::model::MaxItems;

    const HELPLINE: &str = "+91-80-4567-8900";

    fn builder() -> NotificationBuilder {
        NotificationBuilder::new(HELPLINE)
    }

    fn records(n: usize) -> Vec<Recommendation> {
        (1..=n)
            .map(|i| {
                let mut rec = Recommendation::new(format!("Role {i}"), format!("Org {i}"), "Pune");
                rec.match_score = Some(70 + i as u32);
                rec
            })
            .collect()
    }

    #[test]
    fn empty_records_give_greeting_and_footer() {
        let text = builder().build(Some("Asha"), &[], &PreferenceSet::default(), false);
        assert_eq!(
            text,
            "Hi Asha! Here are your top internship matches from InternPath:\n\n\n\
             Apply online at internpath.com or call +91-80-4567-8900"
        );
    }

    #[test]
    fn caps_at_max_items_in_order() {
        let prefs = PreferenceSet {
            max_items: MaxItems::One,
            ..Default::default()
        };
        let text = builder().build(Some("Asha"), &records(5), &prefs, false);
        assert!(text.contains("1. Role 1 at Org 1 (71% match) - Pune\n"));
        assert!(!text.contains("Role 2"));
        assert_eq!(text.matches("% match)").count(), 1);
    }

    #[test]
    fn test_message_has_disclaimer_and_generic_name() {
        let text = builder().build(None, &[sample_record()], &PreferenceSet::default(), true);
        assert!(text.starts_with(
            "Hi Dear User! Here are your top internship matches from InternPath:\n\nThis is a test message.\n\n"
        ));
        assert!(text.contains("1. Sample Frontend Internship at Tech Corp (85% match) - Mumbai"));
    }

    #[test]
    fn location_omitted_when_disabled() {
        let prefs = PreferenceSet {
            include_location: false,
            ..Default::default()
        };
        let text = builder().build(Some("Asha"), &records(1), &prefs, false);
        assert!(text.contains("1. Role 1 at Org 1 (71% match) - \n"));
    }

    #[test]
    fn default_score_when_absent() {
        let rec = Recommendation::new("Intern", "Acme", "Delhi");
        let text = builder().build(Some("A"), &[rec], &PreferenceSet::default(), false);
        assert!(text.contains("(85% match)"));
    }

    #[test]
    fn stipend_suffix() {
        let mut rec = Recommendation::new("Intern", "Acme", "Delhi");
        rec.stipend = Some("₹10,000/month".into());
        let prefs = PreferenceSet {
            include_stipend: true,
            ..Default::default()
        };
        let text = builder().build(Some("A"), &[rec.clone()], &prefs, false);
        assert!(text.contains("- Delhi | Stipend: ₹10,000/month\n"));

        let plain = builder().build(Some("A"), &[rec], &PreferenceSet::default(), false);
        assert!(!plain.contains("Stipend"));
    }

    #[test]
    fn hindi_and_unknown_language() {
        let hindi = PreferenceSet::for_language("hi");
        let text = builder().build(Some("Asha"), &records(1), &hindi, false);
        assert!(text.starts_with("नमस्ते Asha!"));
        assert!(text.contains("(71% मैच)"));

        let unknown = PreferenceSet::for_language("fr");
        let text = builder().build(Some("Asha"), &[], &unknown, false);
        assert!(text.starts_with("Hi Asha!"));
    }

    #[test]
    fn confirmation_per_language() {
        let b = builder();
        assert!(b.confirmation(&PreferenceSet::default()).starts_with("SMS alerts activated!"));
        assert!(b.confirmation(&PreferenceSet::for_language("ta")).contains("Offline"));
    }
}
