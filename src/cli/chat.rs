//! Line-oriented chat over stdin.

use std::error::Error;
use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::core::config::defaults::ChatSettings;
use crate::core::conversation::Conversation;
use crate::core::transcript::{StreamKind, Transcript, TranscriptUpdate};

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

pub async fn run_chat(settings: ChatSettings) -> Result<(), Box<dyn Error>> {
    let mut conversation = Conversation::new(settings)?;

    eprintln!("🚀 gotcha ({})", conversation.settings().model);
    eprintln!("💡 Type a message and press Enter. /exit or Ctrl+D quits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if matches!(prompt, "/exit" | "/quit") {
            break;
        }

        conversation.submit(prompt);
        let mut printer = TurnPrinter::default();
        let mut io_result = Ok(());
        conversation
            .run_turn(|transcript, update| {
                if io_result.is_ok() {
                    io_result = printer.print(transcript, update);
                }
            })
            .await;
        io_result?;
    }
    Ok(())
}

/// Renders transcript increments for one turn as plain terminal output.
#[derive(Default)]
struct TurnPrinter {
    last_kind: Option<StreamKind>,
    last_label: Option<String>,
}

impl TurnPrinter {
    fn print(&mut self, transcript: &Transcript, update: &TranscriptUpdate) -> io::Result<()> {
        let mut stdout = io::stdout();
        match update {
            TranscriptUpdate::Appended {
                kind, index, delta, ..
            } => {
                if self.last_kind != Some(*kind) {
                    self.switch_to(&mut stdout, *kind)?;
                }
                match kind {
                    StreamKind::Text => write!(stdout, "{delta}")?,
                    StreamKind::Reasoning => write!(stdout, "{DIM}{delta}{RESET}")?,
                    StreamKind::Tool => {
                        let label = transcript.entries()[*index].display_text().to_string();
                        if self.last_label.as_deref() != Some(label.as_str()) {
                            writeln!(stdout, "{DIM}🔎 {label}{RESET}")?;
                            self.last_label = Some(label);
                        }
                    }
                }
            }
            TranscriptUpdate::Completed => {
                if self.last_kind.is_some() {
                    writeln!(stdout)?;
                }
            }
            TranscriptUpdate::Failed { index } => {
                if self.last_kind.is_some() {
                    writeln!(stdout)?;
                }
                let entry = &transcript.entries()[*index];
                let marker = entry.text.lines().last().unwrap_or_default();
                eprintln!("❌ {marker}");
            }
        }
        stdout.flush()
    }

    fn switch_to(&mut self, stdout: &mut io::Stdout, kind: StreamKind) -> io::Result<()> {
        if matches!(self.last_kind, Some(StreamKind::Text | StreamKind::Reasoning)) {
            writeln!(stdout)?;
        }
        if kind == StreamKind::Reasoning {
            write!(stdout, "{DIM}💭 {RESET}")?;
        }
        if kind != StreamKind::Tool {
            self.last_label = None;
        }
        self.last_kind = Some(kind);
        Ok(())
    }
}
