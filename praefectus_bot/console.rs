use async_trait::async_trait;
use std::io::{self, BufRead, Write};

use praefectus_app::operator::Operator;
use praefectus_types::{Result, errors::ApplicationError};

/// [`Operator`] on the terminal. Reads happen on the blocking pool so the
/// runtime isn't stalled while the bot waits for an answer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleOperator;

#[async_trait]
impl Operator for ConsoleOperator {
    async fn ask_string(
        &self,
        question: &str,
        default: Option<&str>,
        example: Option<&str>,
    ) -> Result<String> {
        let prompt = string_prompt(question, default, example);

        loop {
            let answer = read_line(prompt.clone()).await?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            if let Some(default) = default {
                return Ok(default.to_string());
            }
        }
    }

    async fn ask_bool(&self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        let prompt = format!("{question} [{hint}]: ");

        loop {
            let answer = read_line(prompt.clone()).await?;
            if let Some(value) = parse_bool(&answer, default) {
                return Ok(value);
            }
        }
    }

    async fn wait_for_enter(&self, message: &str) -> Result<()> {
        read_line(format!("{message} ")).await.map(|_| ())
    }
}

fn string_prompt(question: &str, default: Option<&str>, example: Option<&str>) -> String {
    match (default, example) {
        (Some(default), _) => format!("{question} [{default}]: "),
        (None, Some(example)) => format!("{question} (e.g. {example}): "),
        (None, None) => format!("{question}: "),
    }
}

fn parse_bool(answer: &str, default: bool) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

async fn read_line(prompt: String) -> Result<String> {
    let line = tokio::task::spawn_blocking(move || -> io::Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        }
        Ok(line.trim().to_string())
    })
    .await
    .map_err(|e| ApplicationError::Unknown(e.to_string()))??;

    Ok(line)
}
