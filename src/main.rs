use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use internpath_assist::config::AssistConfig;
use internpath_assist::dialogue::{DialogueDeps, DialogueSession, Message, Sender};
use internpath_assist::services::{
    ConsoleNavigator, InMemoryProfileService, ModeFlags, ModeSwitch, OutboxSender, ProfileService,
    TextResumeService, UserProfile, mask_destination,
};
use internpath_assist::setup::{
    COUNTRY_CODES, Frequency, MaxItems, SetupDeps, SetupManager, SetupState, TimeSlot,
};
use internpath_assist::speech::select_engine;
use internpath_assist::store::{LibSqlSettings, SettingsRepository};

const HELP: &str = "\
Commands:
  <text>                     talk to the assistant
  /do <message> <action>     run a suggested action
  /listen                    speak instead of typing
  /voice on|off              toggle voice mode
  /offline on|off            toggle offline mode
  /profile name <name>       set your name
  /profile skills <a,b,..>   set your skills
  /profile location <place>  set your location
  /sms                       show SMS setup status
  /sms phone <number>        /sms country <code>   /sms code <1234>
  /sms back | resend | done | edit | test | send | reset
  /sms freq immediate|daily|weekly   /sms max 1|3|5   /sms lang en|hi|ta
  /sms location on|off   /sms stipend on|off   /sms slot morning|afternoon|evening
  /quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AssistConfig::from_env();

    eprintln!("🎓 InternPath Assistant v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!("   Voice: {}", if config.voice { "console" } else { "unavailable" });
    if config.setup.debug_bypass_code.is_some() {
        eprintln!("   ⚠️  Debug verification bypass is ON");
    }
    eprintln!("   Type a message and press Enter. /help for commands, /quit to exit.\n");

    // ── Collaborators ───────────────────────────────────────────────────
    let settings: Arc<dyn SettingsRepository> =
        Arc::new(LibSqlSettings::new_local(&config.db_path).await?);
    let speech = select_engine(config.voice);
    let modes = Arc::new(ModeFlags::new(false, false));
    let profiles = Arc::new(InMemoryProfileService::with_sample_catalog(UserProfile {
        preferred_language: config.dialogue.locale.clone(),
        ..Default::default()
    }));
    let outbox = Arc::new(OutboxSender::new());
    let resumes = Arc::new(TextResumeService::new(resume_dir(&config.db_path)));

    // ── Dialogue ────────────────────────────────────────────────────────
    let session = DialogueSession::new(
        config.dialogue.clone(),
        DialogueDeps {
            navigator: Arc::new(ConsoleNavigator::new()),
            profiles: profiles.clone(),
            resumes,
            modes: modes.clone(),
            speech: speech.clone(),
        },
    );

    // ── SMS setup ───────────────────────────────────────────────────────
    let setup = SetupManager::new(
        config.setup.clone(),
        SetupDeps {
            settings,
            sender: outbox.clone(),
            speech,
            modes: modes.clone(),
        },
        &config.dialogue.locale,
    );
    let restored = setup.load().await?;
    if restored.step.is_terminal() {
        eprintln!(
            "   SMS alerts active for {}",
            mask_destination(&restored.destination())
        );
    }

    session.open().await;
    let mut printed = print_new(&session.messages().await, 0);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprint!("> ");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            eprint!("> ");
            continue;
        }

        let mut words = line.split_whitespace();
        match words.next() {
            Some("/quit") => break,
            Some("/help") => eprintln!("{HELP}"),
            Some("/do") => {
                let id = words.next().and_then(|w| w.parse::<u64>().ok());
                let index = words.next().and_then(|w| w.parse::<usize>().ok());
                match (id, index) {
                    (Some(id), Some(index)) => {
                        if let Err(e) = session.trigger(id, index).await {
                            eprintln!("❌ {e}");
                        }
                    }
                    _ => eprintln!("Usage: /do <message> <action>"),
                }
            }
            Some("/listen") => match session.listen().await {
                Ok(Some(_)) => {}
                Ok(None) => eprintln!("🎤 Didn't catch that."),
                Err(e) => eprintln!("❌ {e}"),
            },
            Some("/voice") => modes.set_voice_mode(on_off(words.next()).unwrap_or(!modes.voice_mode())),
            Some("/offline") => {
                modes.set_offline_mode(on_off(words.next()).unwrap_or(!modes.offline_mode()))
            }
            Some("/profile") => {
                let field = words.next();
                let value = words.collect::<Vec<_>>().join(" ");
                edit_profile(&profiles, field, &value, &setup).await;
            }
            Some("/sms") => {
                let action = words.next();
                let args: Vec<&str> = words.collect();
                run_setup(&setup, &profiles, action, &args).await;
                print_setup(&setup.state().await, setup.is_verifying());
                for sent in outbox.sent().await.iter().rev().take(1) {
                    eprintln!("📨 last SMS → {}:\n{}", mask_destination(&sent.destination), sent.body);
                }
            }
            _ => {
                if let Err(e) = session.post_user_message(&line).await {
                    eprintln!("❌ {e}");
                }
            }
        }

        if session.pending_replies() > 0 {
            eprintln!("…");
        }
        session.flush().await;
        printed = print_new(&session.messages().await, printed);
        eprint!("> ");
    }

    session.close().await;
    eprintln!("Goodbye!");
    Ok(())
}

fn resume_dir(db_path: &Path) -> PathBuf {
    db_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .join("resumes")
}

fn on_off(word: Option<&str>) -> Option<bool> {
    match word {
        Some("on") | Some("true") | Some("1") => Some(true),
        Some("off") | Some("false") | Some("0") => Some(false),
        _ => None,
    }
}

/// Print messages past `printed` and return the new count.
fn print_new(messages: &[Message], printed: usize) -> usize {
    for message in messages.iter().skip(printed) {
        let who = match message.sender {
            Sender::User => "🧑",
            Sender::System => "🤖",
        };
        println!("\n[{}] {} {}", message.id, who, message.body.as_plain_text());
        for (i, action) in message.suggested_actions.iter().enumerate() {
            println!("    ({i}) {}", action.label);
        }
    }
    messages.len()
}

async fn edit_profile(
    profiles: &InMemoryProfileService,
    field: Option<&str>,
    value: &str,
    setup: &SetupManager,
) {
    let mut profile = profiles.profile().await;
    match field {
        Some("name") => profile.name = value.to_string(),
        Some("skills") => {
            profile.skills = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        Some("location") => {
            setup.apply_location(value).await;
            profile.location = Some(value.to_string());
        }
        _ => {
            eprintln!("Usage: /profile name|skills|location <value>");
            return;
        }
    }
    profiles.set_profile(profile).await;
    eprintln!("✅ Profile updated");
}

async fn run_setup(
    setup: &SetupManager,
    profiles: &InMemoryProfileService,
    action: Option<&str>,
    args: &[&str],
) {
    let arg = args.first().copied().unwrap_or_default();
    let name = profiles.profile().await.display_name().map(str::to_string);
    let result = match action {
        None => return,
        Some("phone") => setup.submit_phone(&args.concat()).await,
        Some("country") => setup.set_country_code(arg).await,
        Some("code") => setup.submit_code(arg).await,
        Some("back") => setup.back().await,
        Some("resend") => setup.resend_code().await,
        Some("done") => setup.complete().await,
        Some("edit") => setup.edit_settings().await,
        Some("test") => setup.send_test(name.as_deref()).await,
        Some("send") => {
            let records = profiles.recommendations().await;
            match setup.send_recommendations(name.as_deref(), &records).await {
                Ok(true) => eprintln!("✅ Recommendations sent"),
                Ok(false) => {}
                Err(e) => eprintln!("❌ {e}"),
            }
            return;
        }
        Some("reset") => {
            if let Err(e) = setup.reset().await {
                eprintln!("❌ {e}");
            }
            return;
        }
        Some("freq") => match arg.parse::<Frequency>() {
            Ok(f) => setup.set_frequency(f).await,
            Err(e) => {
                eprintln!("❌ {e}");
                return;
            }
        },
        Some("max") => match arg.parse::<u32>().map_err(|e| e.to_string()).and_then(MaxItems::try_from) {
            Ok(n) => setup.set_max_items(n).await,
            Err(e) => {
                eprintln!("❌ {e}");
                return;
            }
        },
        Some("slot") => match arg.parse::<TimeSlot>() {
            Ok(slot) => setup.set_time_slot(slot).await,
            Err(e) => {
                eprintln!("❌ {e}");
                return;
            }
        },
        Some("lang") => setup.set_language(arg).await,
        Some("location") => setup.set_include_location(on_off(Some(arg)).unwrap_or(true)).await,
        Some("stipend") => setup.set_include_stipend(on_off(Some(arg)).unwrap_or(false)).await,
        Some(other) => {
            eprintln!("Unknown /sms command '{other}'. /help for commands.");
            return;
        }
    };
    if let Err(e) = result {
        eprintln!("❌ {e}");
    }
}

fn print_setup(state: &SetupState, verifying: bool) {
    let country = COUNTRY_CODES
        .iter()
        .find(|c| c.code == state.country_code)
        .map(|c| format!("{} {}", c.flag, c.country))
        .unwrap_or_else(|| state.country_code.clone());
    eprintln!(
        "📱 SMS setup: step {}/4 ({}) · {} {}",
        state.step.ordinal(),
        state.step,
        country,
        if state.phone_number.is_empty() {
            "no number".to_string()
        } else {
            mask_destination(&state.destination())
        }
    );
    let p = &state.preferences;
    eprintln!(
        "   {} · {} per message · {} · {:?} · location {} · stipend {}",
        p.frequency,
        p.max_items.get(),
        p.language,
        p.time_slot,
        if p.include_location { "on" } else { "off" },
        if p.include_stipend { "on" } else { "off" },
    );
    if verifying {
        eprintln!("   ⏳ sending code…");
    }
    if let Some(ref error) = state.error {
        eprintln!("   ⚠️  {error}");
    }
}
