use std::sync::mpsc as std_mpsc;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// What the line reader produced for one prompt.
#[derive(Debug)]
pub enum InputEvent {
    Line(String),
    /// Ctrl-C at the prompt, or the cancellation token fired.
    Interrupted,
    /// Ctrl-D, or the reader thread is gone.
    Eof,
}

/// Blocking rustyline editor driven from a dedicated thread. The async side
/// sends a prompt, the thread reads one line and sends it back.
pub struct LineReader {
    prompts: std_mpsc::Sender<String>,
    events: mpsc::UnboundedReceiver<InputEvent>,
}

impl LineReader {
    pub fn spawn() -> Self {
        let (prompt_tx, prompt_rx) = std_mpsc::channel::<String>();
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            let mut rl = match DefaultEditor::new() {
                Ok(rl) => rl,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to start line editor");
                    let _ = tx.send(InputEvent::Eof);
                    return;
                }
            };
            for prompt in prompt_rx {
                let event = match rl.readline(&prompt) {
                    Ok(line) => {
                        if !line.trim().is_empty() {
                            let _ = rl.add_history_entry(line.as_str());
                        }
                        InputEvent::Line(line)
                    }
                    Err(ReadlineError::Interrupted) => InputEvent::Interrupted,
                    Err(ReadlineError::Eof) => InputEvent::Eof,
                    Err(e) => {
                        tracing::warn!(error = %e, "line editor failed");
                        InputEvent::Eof
                    }
                };
                let done = matches!(event, InputEvent::Eof);
                if tx.send(event).is_err() || done {
                    break;
                }
            }
        });
        Self {
            prompts: prompt_tx,
            events: rx,
        }
    }

    /// Show `prompt` and wait for the next line, or for cancellation.
    pub async fn read(&mut self, prompt: &str, token: &CancellationToken) -> InputEvent {
        if self.prompts.send(prompt.to_string()).is_err() {
            return InputEvent::Eof;
        }
        tokio::select! {
            _ = token.cancelled() => InputEvent::Interrupted,
            event = self.events.recv() => event.unwrap_or(InputEvent::Eof),
        }
    }
}
