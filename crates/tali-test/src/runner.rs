//! Runs the emulator as a child process

use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::assembler::{AssembledScript, MARKER_PREFIX};
use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};

/// Launches the emulator with an image and feeds it a script
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    /// Emulator executable
    program: PathBuf,
    /// Arguments placed before the image path
    args: Vec<String>,
    /// Image loaded by the emulator
    image: PathBuf,
}

/// Everything the emulator wrote to stdout during one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Captured output, invalid UTF-8 replaced
    pub output: String,
    /// Exit code, `None` if the child was killed by a signal
    pub status: Option<i32>,
    /// Wall-clock time of the round trip
    pub duration: Duration,
}

impl ProcessRunner {
    pub fn new(program: impl AsRef<Path>, image: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            image: image.as_ref().to_path_buf(),
        }
    }

    /// Runner for the emulator and image named in the config
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(&config.emulator, &config.image).with_args(config.emulator_args.clone())
    }

    /// Set arguments passed before the image path
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Pipe `script` into the emulator and block until it exits.
    ///
    /// There is no timeout: a target that never closes its output hangs the
    /// caller.
    pub fn run(&self, script: &AssembledScript) -> HarnessResult<ExecutionResult> {
        self.run_text(script.render())
    }

    /// Same as [`ProcessRunner::run`] for an already rendered script
    pub fn run_text(&self, input: String) -> HarnessResult<ExecutionResult> {
        let start = Instant::now();
        tracing::debug!(
            program = %self.program.display(),
            image = %self.image.display(),
            bytes = input.len(),
            "launching emulator"
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(&self.image)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| HarnessError::LaunchFailure {
                program: self.program.clone(),
                source,
            })?;

        // Feed stdin from its own thread so a chatty child can't fill the
        // stdout pipe while we are still blocked writing.
        let writer = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || match stdin.write_all(input.as_bytes()) {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            })
        });

        let mut raw = Vec::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout.read_to_end(&mut raw).map_err(HarnessError::Capture)?;
        }

        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("failed to write script to emulator: {}", e),
                Err(_) => tracing::warn!("stdin writer thread panicked"),
            }
        }

        let status = child.wait().map_err(HarnessError::Capture)?;
        let duration = start.elapsed();
        tracing::debug!(status = ?status.code(), ?duration, bytes = raw.len(), "emulator exited");

        Ok(ExecutionResult {
            output: String::from_utf8_lossy(&raw).into_owned(),
            status: status.code(),
            duration,
        })
    }
}

impl ExecutionResult {
    /// Output to echo to the console.
    ///
    /// With `skip_tester`, drops everything echoed before the first test
    /// marker, i.e. the noise of loading the tester. Output without any
    /// marker is returned whole.
    pub fn transcript(&self, skip_tester: bool) -> &str {
        if !skip_tester {
            return &self.output;
        }
        match self.output.find(MARKER_PREFIX) {
            Some(pos) => {
                let line_start = self.output[..pos].rfind('\n').map_or(0, |i| i + 1);
                &self.output[line_start..]
            }
            None => &self.output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(output: &str) -> ExecutionResult {
        ExecutionResult {
            output: output.to_string(),
            status: Some(0),
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_transcript_skips_tester_noise() {
        let out = result("tester ok\nok\n ( Running test 'ed' from file 'ed.fs' )  ok\nbye\n");
        assert_eq!(
            out.transcript(true),
            " ( Running test 'ed' from file 'ed.fs' )  ok\nbye\n"
        );
        assert_eq!(out.transcript(false), out.output);
    }

    #[test]
    fn test_transcript_without_marker() {
        let out = result("crashed during tester\n");
        assert_eq!(out.transcript(true), "crashed during tester\n");
    }

    #[test]
    fn test_missing_binary_is_launch_failure() {
        let runner = ProcessRunner::new("/nonexistent/c65", "tali.bin");
        match runner.run_text("bye\n".to_string()) {
            Err(HarnessError::LaunchFailure { program, .. }) => {
                assert_eq!(program, PathBuf::from("/nonexistent/c65"));
            }
            other => panic!("expected LaunchFailure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_round_trip_through_child() {
        // `sh -c cat <image>` echoes stdin; the image becomes $0
        let runner = ProcessRunner::new("sh", "tali.bin")
            .with_args(vec!["-c".to_string(), "cat".to_string()]);
        let result = runner.run_text("1 2 + .\nbye\n".to_string()).unwrap();

        assert_eq!(result.output, "1 2 + .\nbye\n");
        assert_eq!(result.status, Some(0));
    }

    #[cfg(unix)]
    #[test]
    fn test_invalid_utf8_is_replaced() {
        let runner = ProcessRunner::new("sh", "tali.bin")
            .with_args(vec!["-c".to_string(), r"printf 'ok\377\n'".to_string()]);
        let result = runner.run_text(String::new()).unwrap();

        assert_eq!(result.output, "ok\u{FFFD}\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_child_ignoring_stdin() {
        let runner = ProcessRunner::new("sh", "tali.bin")
            .with_args(vec!["-c".to_string(), "echo early; exit 3".to_string()]);
        let big = "x".repeat(1 << 20);
        let result = runner.run_text(big).unwrap();

        assert_eq!(result.output, "early\n");
        assert_eq!(result.status, Some(3));
    }
}
