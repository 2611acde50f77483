use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use tracing::{debug, info};

use crate::conversation::Conversation;
use crate::templates::Messages;
use crate::transport::CompletionTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Empty,
    Quit,
    Prompt(&'a str),
}

/// Matching is exact and case-sensitive; surrounding whitespace is kept.
pub fn parse_command(line: &str) -> Command<'_> {
    match line {
        "" => Command::Empty,
        "quit" | "exit" => Command::Quit,
        prompt => Command::Prompt(prompt),
    }
}

fn strip_line_ending(line: &str) -> &str {
    match line.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => line,
    }
}

pub async fn run_repl<R, W, T>(
    mut input: R,
    mut output: W,
    messages: &Messages,
    conversation: &mut Conversation,
    transport: &T,
) -> Result<()>
where
    R: BufRead,
    W: Write,
    T: CompletionTransport + ?Sized,
{
    writeln!(output, "{}", messages.greeting).context("Failed to write to stdout")?;

    let mut turns = 0usize;
    loop {
        writeln!(output, "{}", messages.prompt).context("Failed to write to stdout")?;
        output.flush().context("Failed to flush stdout")?;

        let mut raw = Vec::new();
        let read = input
            .read_until(b'\n', &mut raw)
            .context("Failed to read stdin")?;
        if read == 0 {
            debug!("stdin closed, ending session");
            break;
        }

        // Invalid UTF-8 is replaced, not rejected.
        let line = String::from_utf8_lossy(&raw);
        match parse_command(strip_line_ending(&line)) {
            Command::Empty => {
                writeln!(output, "{}", messages.empty_input).context("Failed to write to stdout")?;
            }
            Command::Quit => break,
            Command::Prompt(prompt) => {
                let reply = conversation.run_turn(transport, prompt).await?;
                turns += 1;
                writeln!(output, "{}\n", reply).context("Failed to write to stdout")?;
            }
        }
    }

    info!(turns, "chat session finished");
    writeln!(output, "{}", messages.exit).context("Failed to write to stdout")?;
    output.flush().context("Failed to flush stdout")?;
    Ok(())
}
