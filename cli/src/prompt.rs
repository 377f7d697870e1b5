//! Line-oriented terminal input

use std::io::Write;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

type LineSource = Box<dyn AsyncBufRead + Unpin + Send>;

pub struct Prompt {
    lines: Lines<LineSource>,
}

impl Prompt {
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }

    /// Read answers from any line source (a file, a pipe, canned test input)
    pub fn from_reader(reader: impl AsyncBufRead + Unpin + Send + 'static) -> Self {
        let source: LineSource = Box::new(reader);
        Self {
            lines: source.lines(),
        }
    }

    /// Ask for one line; the answer is trimmed
    pub async fn ask(&mut self, label: &str) -> Result<String> {
        print!("{}: ", label);
        std::io::stdout().flush().context("failed to flush stdout")?;

        match self.lines.next_line().await.context("failed to read input")? {
            Some(line) => Ok(line.trim().to_string()),
            None => bail!("input closed"),
        }
    }

    /// Ask with a current value that an empty answer keeps
    pub async fn ask_with_default(&mut self, label: &str, current: &str) -> Result<String> {
        let answer = if current.is_empty() {
            self.ask(label).await?
        } else {
            self.ask(&format!("{} [{}]", label, current)).await?
        };
        Ok(if answer.is_empty() { current.to_string() } else { answer })
    }

    /// Ask for a value that must never be shown back, such as a password
    pub async fn ask_secret(&mut self, label: &str) -> Result<String> {
        self.ask(label).await
    }

    /// Yes/no question, defaulting to no
    pub async fn confirm(&mut self, label: &str) -> Result<bool> {
        let answer = self.ask(&format!("{} [y/N]", label)).await?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }
}

#[cfg(test)]
impl Prompt {
    /// Prompt that answers from `answers`, one per line
    pub fn scripted(answers: &[&str]) -> Self {
        Self::from_reader(std::io::Cursor::new(answers.join("\n").into_bytes()))
    }
}
