//! One-shot "say" command

use std::error::Error;
use std::io::{self, Write};

use tokio::sync::mpsc;
use tracing::debug;

use crate::core::chat_stream::{ResponsesClient, STREAM_QUEUE_CAPACITY};
use crate::core::config::defaults::ChatSettings;
use crate::core::conversation::build_request;
use crate::core::sse::StreamEvent;
use crate::core::transcript::{extract_query, TOOL_PLACEHOLDER};

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Tracks which side channel printed last so status lines are not repeated
/// for every delta.
#[derive(Debug, Default, PartialEq)]
enum StatusLine {
    #[default]
    None,
    Searching,
    Thinking,
}

pub async fn run_say(settings: ChatSettings, prompt: String) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.trim().to_string();
    if prompt.is_empty() {
        eprintln!("Usage: gotcha say <prompt>");
        std::process::exit(1);
    }

    let client = ResponsesClient::new(&settings.transport_config(), settings.model.clone())?;
    let request = build_request(&settings, &prompt, Vec::new());

    let (tx, mut rx) = mpsc::channel(STREAM_QUEUE_CAPACITY);
    let producer = tokio::spawn(async move { client.stream(&request, &tx).await });

    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    let mut status = StatusLine::None;
    let mut wrote_text = false;
    while let Some(event) = rx.recv().await {
        match event {
            StreamEvent::TextDelta(delta) => {
                end_status(&mut stderr, &mut status)?;
                write!(stdout, "{delta}")?;
                stdout.flush()?;
                wrote_text = true;
            }
            StreamEvent::ToolDelta(payload) => {
                let query = extract_query(&payload);
                if status != StatusLine::Searching || query.is_some() {
                    end_status(&mut stderr, &mut status)?;
                    let label = query.unwrap_or_else(|| TOOL_PLACEHOLDER.to_string());
                    writeln!(stderr, "{DIM}🔎 {label}{RESET}")?;
                    status = StatusLine::Searching;
                }
            }
            StreamEvent::ReasoningDelta(delta) => {
                if status != StatusLine::Thinking {
                    end_status(&mut stderr, &mut status)?;
                    write!(stderr, "{DIM}💭 ")?;
                    status = StatusLine::Thinking;
                }
                write!(stderr, "{delta}")?;
                stderr.flush()?;
            }
            StreamEvent::Completed | StreamEvent::Error(_) => break,
        }
    }
    end_status(&mut stderr, &mut status)?;

    match producer.await? {
        Ok(completion) => {
            if wrote_text {
                writeln!(stdout)?;
            }
            debug!(
                input_tokens = completion.input_tokens,
                output_tokens = completion.output_tokens,
                fell_back = completion.fell_back,
                "Say finished"
            );
            Ok(())
        }
        Err(err) => {
            eprintln!("\n❌ Error: {err}");
            std::process::exit(1);
        }
    }
}

/// Closes an open reasoning line so the next output starts on its own line.
fn end_status(stderr: &mut io::Stderr, status: &mut StatusLine) -> io::Result<()> {
    if *status == StatusLine::Thinking {
        writeln!(stderr, "{RESET}")?;
    }
    *status = StatusLine::None;
    Ok(())
}
