//! Quality gate pipeline
//!
//! An ordered, named sequence of external checks. Execution is strictly
//! sequential and deterministic: the pipeline itself introduces no
//! randomness or time-dependent branching, and it stops at the first
//! failing required gate. Gates after a hard stop are never attempted and
//! do not appear in the report - "not reached" is distinct from "ran and
//! failed".

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ReleaseError;
use crate::exec::CommandExecutor;

/// One named quality check: an external command with pass/fail outcome
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GateSpec {
    pub name: String,
    pub command: Vec<String>,
    /// A failing required gate aborts the pipeline; a failing optional
    /// gate is recorded and execution continues.
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl GateSpec {
    pub fn new(name: impl Into<String>, command: &[&str], required: bool) -> Self {
        GateSpec {
            name: name.into(),
            command: command.iter().map(|s| s.to_string()).collect(),
            required,
        }
    }

    pub fn required(name: impl Into<String>, command: &[&str]) -> Self {
        Self::new(name, command, true)
    }

    pub fn optional(name: impl Into<String>, command: &[&str]) -> Self {
        Self::new(name, command, false)
    }
}

/// Outcome of one gate that actually ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResult {
    pub gate: String,
    pub succeeded: bool,
    pub exit_code: i32,
    pub output: String,
    pub required: bool,
    pub timed_out: bool,
}

/// Ordered outcomes of a pipeline run.
///
/// Contains exactly the gates that executed; a hard stop leaves the
/// remaining gates absent rather than marked failed.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub results: Vec<GateResult>,
}

impl PipelineReport {
    /// True when every required gate that ran succeeded and none was
    /// skipped by a hard stop.
    pub fn passed(&self) -> bool {
        self.failure().is_none()
    }

    /// The gate that caused a hard stop, if any
    pub fn failure(&self) -> Option<&GateResult> {
        self.results.iter().find(|r| r.required && !r.succeeded)
    }

    /// Convert a hard stop into the matching error, carrying the failing
    /// gate's name and raw diagnostic output verbatim.
    pub fn gate_error(&self, timeout: Duration) -> Option<ReleaseError> {
        self.failure().map(|r| {
            if r.timed_out {
                ReleaseError::GateTimeout {
                    gate: r.gate.clone(),
                    secs: timeout.as_secs(),
                }
            } else {
                ReleaseError::GateFailed {
                    gate: r.gate.clone(),
                    exit_code: r.exit_code,
                    output: r.output.clone(),
                }
            }
        })
    }
}

/// Runs gate tables through a [CommandExecutor].
///
/// The executor is a capability parameter so the whole pipeline is
/// testable with an in-memory fake.
pub struct QualityGatePipeline<'a> {
    executor: &'a dyn CommandExecutor,
    timeout: Duration,
}

impl<'a> QualityGatePipeline<'a> {
    pub fn new(executor: &'a dyn CommandExecutor, timeout: Duration) -> Self {
        QualityGatePipeline { executor, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute each gate in order, short-circuiting at the first failing
    /// required gate.
    pub fn run(&self, gates: &[GateSpec]) -> PipelineReport {
        self.run_with_progress(gates, |_| {})
    }

    /// Like [run](Self::run), invoking `progress` before each gate starts.
    pub fn run_with_progress(
        &self,
        gates: &[GateSpec],
        mut progress: impl FnMut(&GateSpec),
    ) -> PipelineReport {
        let mut report = PipelineReport::default();

        for gate in gates {
            progress(gate);

            let result = match self.executor.execute(&gate.command, self.timeout) {
                Ok(execution) => GateResult {
                    gate: gate.name.clone(),
                    succeeded: execution.succeeded(),
                    exit_code: execution.exit_code,
                    output: execution.output,
                    required: gate.required,
                    timed_out: execution.timed_out,
                },
                // The command could not be started at all (e.g. binary
                // missing); surface it as a failed gate, not a crash.
                Err(e) => GateResult {
                    gate: gate.name.clone(),
                    succeeded: false,
                    exit_code: -1,
                    output: e.to_string(),
                    required: gate.required,
                    timed_out: false,
                },
            };

            let hard_stop = gate.required && !result.succeeded;
            report.results.push(result);
            if hard_stop {
                break;
            }
        }

        report
    }
}
