/// Adapters for the external service that invents secret words
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Environment variable the credential is handed to generator commands in.
pub const CREDENTIAL_ENV: &str = "MRWHITE_API_KEY";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no API credential configured")]
    MissingCredential,
    #[error("no word generator configured")]
    NotConfigured,
    #[error("word generator timed out after {0:?}")]
    Timeout(Duration),
    #[error("could not run word generator: {0}")]
    Io(#[from] std::io::Error),
    #[error("word generator exited with {0}")]
    Exit(ExitStatus),
    #[error("unusable word generator output: {0:?}")]
    Malformed(String),
}

/// Produces raw text for a prompt. Anything returned here is sanitized by the caller.
#[async_trait]
pub trait WordGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, credential: &str) -> Result<String, GenerateError>;
}

/// Used when no generator is configured; every word comes from the fallback pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct Disabled;

#[async_trait]
impl WordGenerator for Disabled {
    async fn generate(&self, _prompt: &str, _credential: &str) -> Result<String, GenerateError> {
        Err(GenerateError::NotConfigured)
    }
}

/// Runs an external program with the prompt as its last argument and reads the
/// word from stdout. The credential is passed in [`CREDENTIAL_ENV`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }

    /// Split a whitespace-separated command line. `None` if it is blank.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

#[async_trait]
impl WordGenerator for CommandGenerator {
    async fn generate(&self, prompt: &str, credential: &str) -> Result<String, GenerateError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(prompt)
            .env(CREDENTIAL_ENV, credential)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(GenerateError::Exit(output.status));
        }
        String::from_utf8(output.stdout)
            .map_err(|e| GenerateError::Malformed(String::from_utf8_lossy(e.as_bytes()).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_program_and_args() {
        let generator = CommandGenerator::parse("  llm -m  gemini ").unwrap();
        assert_eq!(generator, CommandGenerator::new("llm", vec!["-m".into(), "gemini".into()]));
        assert!(CommandGenerator::parse("   ").is_none());
    }

    #[tokio::test]
    async fn disabled_always_fails() {
        let err = Disabled.generate("prompt", "key").await.unwrap_err();
        assert!(matches!(err, GenerateError::NotConfigured));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_output_is_returned_raw() {
        // `echo` prints its arguments, so the prompt comes back after the fixed args.
        let generator = CommandGenerator::new("echo", vec!["Harbor.".into()]);
        let raw = generator.generate("prompt", "key").await.unwrap();
        assert_eq!(raw, "Harbor. prompt\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_is_an_error() {
        let generator = CommandGenerator::new("false", Vec::new());
        let err = generator.generate("prompt", "key").await.unwrap_err();
        assert!(matches!(err, GenerateError::Exit(_)));
    }

    #[tokio::test]
    async fn missing_program_is_an_io_error() {
        let generator = CommandGenerator::new("mrwhite-no-such-generator", Vec::new());
        let err = generator.generate("prompt", "key").await.unwrap_err();
        assert!(matches!(err, GenerateError::Io(_)));
    }
}
