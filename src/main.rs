use anyhow::Result;
use clap::Parser;
use std::io::Write;
use tchai::cli::{Cli, Commands};
use tchai::config::Settings;
use tchai::{
    utils, AgeBracket, Credentials, Message, Mode, Profile, Session, SessionError, SessionOptions,
    SessionRegistry, SessionServices, Turn,
};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const CLI_SESSION: &str = "cli";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::new()?;
    init_tracing(&settings.logging.level);

    let cli = Cli::parse();
    let credentials: Credentials = cli.credentials.into();
    let services = SessionServices::from_settings(&settings, &credentials)?;

    match cli.command {
        Commands::Interactive { mode, age, rag } => {
            let profile = parse_profile(&mode, &age)?;
            handle_interactive(&settings, services, profile, rag).await
        }
        Commands::Ask {
            prompt,
            mode,
            age,
            rag,
            speak,
        } => {
            let profile = parse_profile(&mode, &age)?;
            handle_ask(&settings, services, profile, rag, &prompt, speak).await
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn parse_profile(mode: &str, age: &str) -> Result<Profile> {
    let mode: Mode = mode.parse().map_err(anyhow::Error::msg)?;
    let age: AgeBracket = age.parse().map_err(anyhow::Error::msg)?;
    Ok(Profile::new(mode, age))
}

async fn handle_ask(
    settings: &Settings,
    services: SessionServices,
    profile: Profile,
    rag: bool,
    prompt: &str,
    speak: bool,
) -> Result<()> {
    let options = SessionOptions::from_config(&settings.retrieval, rag);
    let mut session = Session::new(CLI_SESSION, services, options);
    session.observe_profile(profile).await?;

    utils::display::print_info("Thinking...");
    let turn = session.submit(prompt).await?;
    print_turn(&turn);

    if speak {
        read_aloud(&session, settings).await;
    }
    Ok(())
}

async fn handle_interactive(
    settings: &Settings,
    services: SessionServices,
    profile: Profile,
    rag: bool,
) -> Result<()> {
    let registry = SessionRegistry::new();
    let options = SessionOptions::from_config(&settings.retrieval, rag);
    let handle = registry
        .open_with(CLI_SESSION, |id| Session::new(id, services, options))
        .await;

    let mut session = handle.lock().await;
    let cancel = session.cancellation_token();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    session.observe_profile(profile).await?;

    utils::display::print_header("T-chai");
    utils::display::print_info(&format!(
        "Profile: {} | backend: {} | RAG: {}",
        profile,
        session.backend_name(),
        if session.use_rag() { "on" } else { "off" }
    ));
    utils::display::print_info("Type /help for commands (Ctrl+C to exit)\n");
    print_help_banner(&session);

    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        utils::display::print_prompt("You: ");
        std::io::stdout().flush().ok();

        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            if !handle_command(&mut session, settings, command).await? {
                break;
            }
            continue;
        }

        utils::display::print_info("Thinking...");
        match session.submit(&line).await {
            Ok(turn) => print_turn(&turn),
            Err(SessionError::Cancelled) => break,
            Err(e) => utils::display::print_error(&format!(
                "Could not get an answer ({}). Your conversation is unchanged, please try again.",
                e
            )),
        }
    }

    drop(session);
    registry.close(CLI_SESSION).await;
    utils::display::print_info("\nGoodbye!");
    Ok(())
}

/// Returns false when the user asked to quit.
async fn handle_command(session: &mut Session, settings: &Settings, command: &str) -> Result<bool> {
    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map(|(n, a)| (n, a.trim()))
        .unwrap_or((command, ""));

    match name {
        "mode" | "age" => {
            let Some(current) = session.profile() else {
                return Ok(true);
            };
            let next = if name == "mode" {
                arg.parse::<Mode>().map(|mode| Profile { mode, ..current })
            } else {
                arg.parse::<AgeBracket>().map(|age| Profile { age, ..current })
            };
            match next {
                Ok(profile) => {
                    if session.observe_profile(profile).await? {
                        utils::display::print_success(&format!(
                            "Profile changed to {}, conversation restarted",
                            profile
                        ));
                        print_help_banner(session);
                    }
                }
                Err(e) => utils::display::print_error(&e),
            }
        }
        "rag" => match arg {
            "on" => {
                session.set_use_rag(true);
                utils::display::print_success("RAG [Wikipedia] enabled");
            }
            "off" => {
                session.set_use_rag(false);
                utils::display::print_success("RAG [Wikipedia] disabled");
            }
            _ => utils::display::print_error("Usage: /rag on|off"),
        },
        "read" => read_aloud(session, settings).await,
        "new" => {
            if session.start_new_conversation().await? {
                utils::display::print_success("Started a new conversation");
                print_help_banner(session);
            } else {
                utils::display::print_notice("Nothing to reset yet");
            }
        }
        "history" => utils::display::print_history(session.history()),
        "help" => {
            println!("Commands:");
            println!("  /mode <student|parent>   - Switch persona (restarts conversation)");
            println!("  /age <5-10|11-13|14-18|19+> - Switch age (restarts conversation)");
            println!("  /rag <on|off>            - Toggle Wikipedia augmentation");
            println!("  /read                    - Read the last answer aloud");
            println!("  /new                     - Start a new conversation");
            println!("  /history                 - Show the conversation");
            println!("  /quit                    - Exit\n");
        }
        "quit" | "exit" => return Ok(false),
        other => utils::display::print_error(&format!("Unknown command '/{}'", other)),
    }

    Ok(true)
}

async fn read_aloud(session: &Session, settings: &Settings) {
    match session.read_aloud().await {
        Ok(Some(audio)) => match audio.save(&settings.speech.output_path).await {
            Ok(()) => utils::display::print_success(&format!(
                "Audio ({}) saved to {}",
                audio.format, settings.speech.output_path
            )),
            Err(e) => utils::display::print_notice(&format!("Could not save audio: {}", e)),
        },
        Ok(None) => utils::display::print_notice("Nothing to read aloud yet"),
        Err(e) => utils::display::print_notice(&format!("Read aloud unavailable: {}", e)),
    }
}

fn print_turn(turn: &Turn) {
    if let Some(reason) = &turn.retrieval_skipped {
        utils::display::print_notice(&format!("Answered without a reference: {}", reason));
    }
    if let Some(retrieval) = &turn.retrieval {
        utils::display::print_message(&Message::info(retrieval.info_message()));
    }
    utils::display::print_message(&Message::assistant(turn.reply.as_str()));
}

fn print_help_banner(session: &Session) {
    if let Some(help) = session.help_message() {
        utils::display::print_message(&Message::assistant(help));
    }
}
