//! railchat binary - composition root.
//!
//! 1. Parse flags and resolve configuration (file, env, flags)
//! 2. Install tracing (stderr, so stdout carries only the conversation)
//! 3. Build the HTTP assistant client and probe for a speech recognizer
//! 4. Run the interactive loop until EOF or /quit

mod cli;
mod repl;

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use railchat_chat::{ChatSession, ChatWidget, HttpAssistant, SubmitOutcome, VoiceToggle};
use railchat_voice::{CommandEngine, VoiceCapture};

use crate::cli::CliArgs;
use crate::repl::{render_from, ReplCommand, HELP};

type Widget = ChatWidget<HttpAssistant>;

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Send and print whatever was appended.
async fn send(widget: &Widget, text: Option<&str>) {
    let before = widget.session().messages().len();
    let outcome = match text {
        Some(text) => widget.send_text(text).await,
        None => widget.send().await,
    };
    match outcome {
        SubmitOutcome::Ignored => {}
        SubmitOutcome::Busy => println!("(still waiting for the previous reply)"),
        SubmitOutcome::Replied | SubmitOutcome::Failed => {
            // A typed line is already on screen; a dictated one is not.
            let skip = usize::from(text.is_some());
            render_from(&widget.session().messages(), before + skip);
        }
    }
}

/// Start or stop voice capture. Capture runs in the background so a second
/// /voice can stop it.
async fn toggle_voice(widget: &Arc<Widget>) {
    if widget.voice().is_listening() {
        widget.toggle_voice().await;
        println!("(stopping voice input)");
        return;
    }

    if widget.voice().is_supported() {
        println!("(listening... type /voice again to stop)");
    }
    let widget = Arc::clone(widget);
    tokio::spawn(async move {
        match widget.toggle_voice().await {
            VoiceToggle::Transcribed(text) if !text.trim().is_empty() => {
                println!("heard: {}  (press Enter to send)", text);
            }
            VoiceToggle::Transcribed(_) => println!("(nothing heard)"),
            VoiceToggle::Alert(e) => println!("! {}", e.alert_message()),
            VoiceToggle::Stopped => {}
        }
        prompt();
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let config = args.resolve_config();

    init_tracing(&config.general.log_level);
    tracing::info!("Starting railchat v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        base_url = %config.api.normalized_base_url(),
        voice_enabled = config.voice.enabled,
        "Configuration resolved"
    );

    let api = HttpAssistant::from_config(&config.api)?;
    let voice = VoiceCapture::probe(|| CommandEngine::probe(&config.voice));
    let widget = Arc::new(ChatWidget::new(ChatSession::new(api), voice));

    println!("Train Booking Assistant (type /help for commands)");
    println!("Tip: use station codes like NDLS, BCT, SBC");
    render_from(&widget.session().messages(), 0);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Say(text) => send(&widget, Some(&text)).await,
            ReplCommand::SendPending => send(&widget, None).await,
            ReplCommand::Clear => {
                widget.clear().await;
                render_from(&widget.session().messages(), 0);
            }
            ReplCommand::Voice => toggle_voice(&widget).await,
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Quit => break,
            ReplCommand::Unknown(cmd) => println!("unknown command {} (try /help)", cmd),
        }
    }

    widget.voice().stop_listening();
    tracing::info!(session_id = %widget.session().session_id(), "railchat exiting");
    Ok(())
}
