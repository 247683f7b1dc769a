//! Asynchronous utilities for use with Tokio.
//!
//! The document pipeline mixes slow external processes, blocking filesystem
//! work and pure CPU-bound analysis. The helpers here let the rest of the
//! crate treat all of that as ordinary futures and streams.

use std::pin::Pin;

use futures::Stream;

use crate::prelude::*;

pub mod blocking_iter_streams;
pub mod io;

/// A type alias for a boxed stream. This is used to make it easier to work
/// streams that return complex types.
pub type BoxedStream<Item> = Pin<Box<dyn Stream<Item = Item> + Send>>;

/// Report any command failures, and include any error output.
///
/// Standard output and standard error are logged at appropriate levels. If
/// `is_error_line` is given, a successful command that printed a matching
/// line to standard error is still treated as a failure.
pub fn check_for_command_failure(
    command_name: &str,
    output: &std::process::Output,
    is_error_line: Option<&dyn Fn(&str) -> bool>,
) -> Result<()> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    trace!(command_name, output = %stdout, "Standard output from command");
    if !stderr.trim().is_empty() {
        debug!(command_name, output = %stderr, "Standard error from command");
    }

    if output.status.success() {
        match is_error_line {
            Some(is_error_line) if stderr.lines().any(is_error_line) => Err(anyhow!(
                "{} printed error output:\n{}",
                command_name,
                stderr,
            )),
            _ => Ok(()),
        }
    } else if let Some(exit_code) = output.status.code() {
        Err(anyhow!(
            "{} failed with exit code {} and error output:\n{}",
            command_name,
            exit_code,
            stderr,
        ))
    } else {
        Err(anyhow!(
            "{} failed with error output:\n{}",
            command_name,
            stderr,
        ))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::{os::unix::process::ExitStatusExt as _, process::Output};

    use super::*;

    fn output(code: i32, stderr: &str) -> Output {
        Output {
            status: std::process::ExitStatus::from_raw(code << 8),
            stdout: vec![],
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[test]
    fn nonzero_exit_is_a_failure() {
        let err = check_for_command_failure("pdfinfo", &output(1, "boom"), None)
            .unwrap_err()
            .to_string();
        assert!(err.contains("exit code 1"), "{err}");
        assert!(err.contains("boom"), "{err}");
    }

    #[test]
    fn error_lines_fail_successful_commands() {
        let is_error = |line: &str| line.starts_with("Error");
        let failed = output(0, "Error: bad");
        assert!(check_for_command_failure("pdftocairo", &failed, Some(&is_error)).is_err());
        let warned = output(0, "Syntax Warning");
        assert!(check_for_command_failure("pdftocairo", &warned, Some(&is_error)).is_ok());
    }
}
