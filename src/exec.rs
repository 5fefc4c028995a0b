//! External command execution
//!
//! Every quality gate is an opaque external command; the only contract
//! with the rest of the system is "exit code + captured output". The
//! [CommandExecutor] trait keeps the pipeline testable with an in-memory
//! fake, never requiring real external tools in unit tests.

use std::collections::HashMap;
use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::debug;

use crate::error::{ReleaseError, Result};

/// Outcome of one external command execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub exit_code: i32,
    /// Combined stdout + stderr, verbatim
    pub output: String,
    pub timed_out: bool,
}

impl Execution {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }
}

/// Capability interface for running external commands
///
/// Implementors must be `Send + Sync`. The real implementation is
/// [ProcessExecutor]; tests use [MockExecutor].
pub trait CommandExecutor: Send + Sync {
    /// Run `command` (argv form) to completion or until `timeout` expires.
    ///
    /// A non-zero exit or a timeout is a normal [Execution] outcome, not
    /// an `Err`; `Err` means the command could not be run at all.
    fn execute(&self, command: &[String], timeout: Duration) -> Result<Execution>;
}

/// Runs commands as real child processes with a bounded timeout.
///
/// The child is polled rather than waited on so an expired deadline can
/// kill it; stdout and stderr are drained concurrently to keep the pipe
/// buffers from stalling the child.
pub struct ProcessExecutor;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

impl CommandExecutor for ProcessExecutor {
    fn execute(&self, command: &[String], timeout: Duration) -> Result<Execution> {
        let (program, args) = command.split_first().ok_or_else(|| {
            ReleaseError::config("Cannot execute an empty command".to_string())
        })?;

        debug!("executing: {} (timeout {}s)", command.join(" "), timeout.as_secs());

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_reader = std::thread::spawn(move || drain(stdout));
        let stderr_reader = std::thread::spawn(move || drain(stderr));

        let deadline = Instant::now() + timeout;
        let mut timed_out = false;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break Some(status);
            }
            if Instant::now() >= deadline {
                timed_out = true;
                let _ = child.kill();
                let _ = child.wait();
                break None;
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        let mut output = stdout_reader.join().unwrap_or_default();
        output.push_str(&stderr_reader.join().unwrap_or_default());

        let exit_code = status.and_then(|s| s.code()).unwrap_or(-1);

        debug!(
            "finished: {} -> exit {}{}",
            program,
            exit_code,
            if timed_out { " (timed out)" } else { "" }
        );

        Ok(Execution {
            exit_code,
            output,
            timed_out,
        })
    }
}

fn drain(stream: Option<impl Read>) -> String {
    let mut buf = String::new();
    if let Some(mut stream) = stream {
        let _ = stream.read_to_string(&mut buf);
    }
    buf
}

/// In-memory executor for tests: scripted outcomes, recorded calls.
///
/// Responses are keyed by the space-joined argv; commands without a
/// scripted response succeed with empty output.
#[derive(Default)]
pub struct MockExecutor {
    responses: HashMap<String, Execution>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a failure for the given command line
    pub fn fail_with(&mut self, command: &str, exit_code: i32, output: impl Into<String>) {
        self.responses.insert(
            command.to_string(),
            Execution {
                exit_code,
                output: output.into(),
                timed_out: false,
            },
        );
    }

    /// Script a timeout for the given command line
    pub fn time_out(&mut self, command: &str) {
        self.responses.insert(
            command.to_string(),
            Execution {
                exit_code: -1,
                output: String::new(),
                timed_out: true,
            },
        );
    }

    /// Commands executed so far, in order
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of commands executed so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl CommandExecutor for MockExecutor {
    fn execute(&self, command: &[String], _timeout: Duration) -> Result<Execution> {
        self.calls.lock().unwrap().push(command.to_vec());

        let key = command.join(" ");
        Ok(self.responses.get(&key).cloned().unwrap_or(Execution {
            exit_code: 0,
            output: String::new(),
            timed_out: false,
        }))
    }
}
