//! Advisory service reached through an external command
//!
//! The command receives the system prompt, a blank line and the user prompt on
//! stdin, and must print the recommendation on stdout.

use std::io::Write;
use std::process::{Command, Stdio};
use watertwin_core::advisory::{AdvisoryError, TextGenerator};

/// Runs `sh -c <command>` once per request
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    command: String,
}

impl CommandGenerator {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl TextGenerator for CommandGenerator {
    fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AdvisoryError> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AdvisoryError::RequestFailed(format!("cannot start '{}': {e}", self.command)))?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = write!(stdin, "{system_prompt}\n\n{user_prompt}") {
                // Reap the child before reporting
                drop(stdin);
                let _ = child.kill();
                let _ = child.wait();
                return Err(AdvisoryError::RequestFailed(e.to_string()));
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| AdvisoryError::RequestFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AdvisoryError::RequestFailed(format!(
                "'{}' exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map(|text| text.trim().to_string())
            .map_err(|e| AdvisoryError::RequestFailed(e.to_string()))
    }
}

/// Stand-in used when no advisory command is configured
#[derive(Debug, Clone, Copy)]
pub struct Unconfigured;

impl TextGenerator for Unconfigured {
    fn generate(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String, AdvisoryError> {
        Err(AdvisoryError::NotConfigured)
    }
}
