//! Recognition engine backed by an external speech-to-text command.
//!
//! The command records and recognizes one utterance, printing recognized
//! text on stdout (one segment per line) and exiting. A non-zero exit is a
//! recognition error whose cause is the last line the command wrote to
//! stderr, so a recognizer can report `no-speech` or `not-allowed`.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;

use railchat_core::config::VoiceConfig;

use crate::engine::{EventSender, RecognitionEngine, RecognitionEvent, RecognitionSettings};
use crate::error::VoiceError;

/// Placeholder in the configured arguments replaced by the locale.
const LANG_PLACEHOLDER: &str = "{lang}";

/// Runs an external recognizer process per capture.
#[derive(Debug)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    lang: String,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            lang: RecognitionSettings::default().lang,
            stop_tx: None,
        }
    }

    /// Build from a full argument vector. `None` if it is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self::new(program.clone(), args.to_vec()))
    }

    /// Capability probe: an engine exists only when voice is enabled and a
    /// recognizer command is configured.
    pub fn probe(config: &VoiceConfig) -> Option<Box<dyn RecognitionEngine>> {
        if !config.enabled {
            return None;
        }
        let engine = Self::from_argv(&config.command)?;
        tracing::info!(program = %engine.program, "Using external speech recognizer");
        Some(Box::new(engine))
    }

    fn resolved_args(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(LANG_PLACEHOLDER, &self.lang))
            .collect()
    }
}

impl RecognitionEngine for CommandEngine {
    fn configure(&mut self, settings: &RecognitionSettings) {
        self.lang = settings.lang.clone();
    }

    fn start(&mut self, events: EventSender) -> Result<(), VoiceError> {
        let child = Command::new(&self.program)
            .args(self.resolved_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                VoiceError::Failed(format!("failed to launch {}: {}", self.program, e))
            })?;

        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop_tx = Some(stop_tx);
        tokio::spawn(run_recognizer(child, events, stop_rx));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }
}

async fn run_recognizer(mut child: Child, events: EventSender, mut stop: oneshot::Receiver<()>) {
    let stderr = child.stderr.take();
    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        if let Some(mut stderr) = stderr {
            let _ = stderr.read_to_string(&mut buf).await;
        }
        buf
    });

    let mut stopped = false;
    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        let mut first = true;
        loop {
            tokio::select! {
                // A dropped sender also counts: the engine was restarted.
                _ = &mut stop, if !stopped => {
                    stopped = true;
                    if let Err(e) = child.start_kill() {
                        tracing::debug!(error = %e, "Recognizer already exited");
                    }
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        let text = line.trim();
                        if text.is_empty() {
                            continue;
                        }
                        let segment = if first {
                            text.to_string()
                        } else {
                            format!(" {}", text)
                        };
                        first = false;
                        let _ = events.send(RecognitionEvent::Segment(segment));
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read recognizer output");
                        break;
                    }
                },
            }
        }
    }

    let status = child.wait().await;
    let stderr_text = stderr_task.await.unwrap_or_default();
    match status {
        Ok(status) if status.success() || stopped => {}
        Ok(status) => {
            let cause = stderr_text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .last()
                .map(str::to_string)
                .unwrap_or_else(|| format!("recognizer exited with {}", status));
            let _ = events.send(RecognitionEvent::Error(cause));
        }
        Err(e) => {
            let _ = events.send(RecognitionEvent::Error(e.to_string()));
        }
    }
    let _ = events.send(RecognitionEvent::End);
}
