//! Console stand-in for the voice front end.
//!
//! Commands and confirmation replies are read from stdin; everything the
//! assistant says is printed to stdout.

use std::io::Write;

use async_trait::async_trait;
use sara_action::{ConfirmationChannel, SpeechSink};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Words that end the interactive loop.
const EXIT_WORDS: &[&str] = &["exit", "quit", "goodbye", "bye"];

pub struct ConsoleIo {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleIo {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    /// Prompt for the next command. `None` once stdin is closed.
    pub async fn read_command(&self) -> Option<String> {
        print!("> ");
        let _ = std::io::stdout().flush();
        self.read_line().await
    }

    async fn read_line(&self) -> Option<String> {
        match self.lines.lock().await.next_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read from stdin");
                None
            }
        }
    }
}

/// Whether `text` asks to leave the interactive loop.
pub fn is_exit_command(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    EXIT_WORDS.contains(&text.as_str())
}

#[async_trait]
impl ConfirmationChannel for ConsoleIo {
    async fn ask(&self, prompt: &str) -> Option<String> {
        println!("SARA: {}", prompt);
        print!("(yes/no) > ");
        let _ = std::io::stdout().flush();
        self.read_line().await
    }
}

impl SpeechSink for ConsoleIo {
    fn speak(&self, text: &str) {
        println!("SARA: {}", text);
    }
}
