//! Terminal input source and ANSI output sink.

use async_trait::async_trait;
use codepilot_agent::io::{OutputSink, UserInput};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

const BLUE: &str = "\u{1b}[94m";
const YELLOW: &str = "\u{1b}[93m";
const CYAN: &str = "\u{1b}[96m";
const GREEN: &str = "\u{1b}[92m";
const RED: &str = "\u{1b}[91m";
const RESET: &str = "\u{1b}[0m";

/// Reads user messages line by line from stdin.
///
/// `exit`, `quit` and end of file all end the session.
pub struct StdinInput {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinInput {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

fn is_exit_command(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "exit" | "quit")
}

#[async_trait]
impl UserInput for StdinInput {
    async fn next_message(&mut self) -> Option<String> {
        print!("{BLUE}You{RESET}: ");
        std::io::stdout().flush().ok();

        match self.lines.next_line().await {
            Ok(Some(line)) if is_exit_command(&line) => None,
            Ok(Some(line)) => Some(line),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read from stdin: {e}");
                None
            }
        }
    }
}

/// Prints the conversation with colored role prefixes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleOutput;

impl OutputSink for ConsoleOutput {
    fn assistant_message(&self, text: &str) {
        println!("{YELLOW}Codepilot{RESET}: {text}");
    }

    fn tool_call(&self, name: &str, arguments: &str) {
        println!("{CYAN}tool{RESET}: {name}({arguments})");
    }

    fn tool_result(&self, _name: &str, output: &str) {
        println!("{GREEN}result{RESET}: {output}");
    }

    fn tool_error(&self, _name: &str, error: &str) {
        println!("{RED}error{RESET}: {error}");
    }
}
