//! Reading replies aloud.
//!
//! Speech is optional: the app holds a [`Capability`] and only narrates when
//! one is supported. Narration is an exclusive resource, so starting a new
//! utterance stops the one still playing.

use std::io;
use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};

/// An optional environment feature.
#[derive(Debug)]
pub enum Capability<T> {
    /// Available and ready to use.
    Supported(T),
    /// Not available here.
    Unsupported,
}

impl<T> Capability<T> {
    /// Whether the capability is available.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }

    /// Borrow the capability if it is available.
    pub fn as_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Supported(inner) => Some(inner),
            Self::Unsupported => None,
        }
    }
}

impl<T> From<Option<T>> for Capability<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unsupported, Self::Supported)
    }
}

/// Errors from a narrator.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// The configured command line was empty.
    #[error("speech command is empty")]
    EmptyCommand,

    /// The speech program could not be started.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        /// Program that failed.
        program: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

/// Something that can read text aloud.
pub trait Narrator: Send {
    /// Start reading `text`, stopping anything still being read.
    ///
    /// # Errors
    ///
    /// Returns an error if speech cannot be started.
    fn speak(&mut self, text: &str) -> Result<(), SpeechError>;

    /// Stop reading.
    fn stop(&mut self);

    /// Whether something is being read right now.
    fn is_speaking(&mut self) -> bool;
}

/// Narrates by piping text into an external program such as `espeak`.
#[derive(Debug)]
pub struct CommandNarrator {
    program: String,
    args: Vec<String>,
    current: Option<Child>,
}

impl CommandNarrator {
    /// Parse a command line like `espeak -s 150`.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::EmptyCommand`] for a blank command line.
    pub fn new(command_line: &str) -> Result<Self, SpeechError> {
        let mut parts = command_line.split_whitespace().map(ToString::to_string);
        let program = parts.next().ok_or(SpeechError::EmptyCommand)?;
        Ok(Self {
            program,
            args: parts.collect(),
            current: None,
        })
    }

    /// Program that is run for each utterance.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Narrator for CommandNarrator {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        self.stop();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpeechError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            let text = text.to_string();
            tokio::spawn(async move {
                // A program killed mid-utterance closes its stdin.
                if let Err(err) = stdin.write_all(text.as_bytes()).await {
                    tracing::debug!(error = %err, "Speech input not fully written");
                }
            });
        }

        tracing::debug!(program = %self.program, chars = text.chars().count(), "Speaking");
        self.current = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.current.take() {
            if let Err(err) = child.start_kill() {
                tracing::debug!(error = %err, "Speech process already gone");
            }
        }
    }

    fn is_speaking(&mut self) -> bool {
        let finished = match self.current.as_mut() {
            Some(child) => !matches!(child.try_wait(), Ok(None)),
            None => return false,
        };
        if finished {
            self.current = None;
        }
        !finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_line() {
        let narrator = CommandNarrator::new("  espeak -s 150 ").unwrap();
        assert_eq!(narrator.program(), "espeak");
        assert_eq!(narrator.args, vec!["-s", "150"]);
    }

    #[test]
    fn blank_command_is_rejected() {
        assert!(matches!(
            CommandNarrator::new("   "),
            Err(SpeechError::EmptyCommand)
        ));
    }

    #[test]
    fn capability_from_option() {
        let mut supported: Capability<u8> = Some(1).into();
        assert!(supported.is_supported());
        assert_eq!(supported.as_mut().copied(), Some(1));

        let mut unsupported: Capability<u8> = None.into();
        assert!(!unsupported.is_supported());
        assert!(unsupported.as_mut().is_none());
    }

    #[tokio::test]
    async fn stop_ends_speech() {
        let mut narrator = CommandNarrator::new("sleep 5").unwrap();
        narrator.speak("hello").unwrap();
        assert!(narrator.is_speaking());

        narrator.stop();
        assert!(!narrator.is_speaking());
    }

    #[tokio::test]
    async fn missing_program_fails_to_spawn() {
        let mut narrator = CommandNarrator::new("study-buddy-no-such-tts-program").unwrap();
        assert!(matches!(
            narrator.speak("hello"),
            Err(SpeechError::Spawn { .. })
        ));
        assert!(!narrator.is_speaking());
    }
}
