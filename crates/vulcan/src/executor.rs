//! Subprocess executor with wall-clock timeout and guaranteed cleanup

use std::io::Write;
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::time::timeout;

use colosseum_common::{Language, TestCase};

use crate::config::SandboxConfig;
use crate::wrapper::wrap_python;

/// Why an execution ended the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecStatus {
    /// Process exited zero
    Success,
    /// Process killed at the wall-clock timeout; stdout discarded
    TimeoutExceeded,
    /// Process exited non-zero; stdout preserved, stderr surfaced
    NonZeroExit,
    /// No execution attempted for this language
    UnsupportedLanguage,
    /// Sandbox plumbing failure (temp file, spawn)
    InternalError,
}

/// Result of running one snippet against one input.
///
/// Never an `Err` to callers: every outcome, including timeouts and
/// crashes, is a comparison input for the mode evaluators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub success: bool,
    pub output: String,
    pub error: String,
    pub duration_ms: u64,
    pub status: ExecStatus,
}

impl Execution {
    fn failure(status: ExecStatus, error: String, duration_ms: u64) -> Self {
        Self {
            success: false,
            output: String::new(),
            error,
            duration_ms,
            status,
        }
    }
}

/// Outcome of one test case inside a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    /// 1-indexed position in the batch
    pub test_id: usize,
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
    pub error: String,
    pub duration_ms: u64,
}

/// Aggregated report for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
    pub all_passed: bool,
    pub results: Vec<CaseResult>,
}

impl BatchReport {
    /// First failing case, if any
    pub fn first_failure(&self) -> Option<&CaseResult> {
        self.results.iter().find(|r| !r.passed)
    }
}

/// Quick syntax check report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxReport {
    pub valid: bool,
    pub error: String,
}

/// Sandboxed executor. Knows nothing about matches or modes.
pub struct Executor {
    config: SandboxConfig,
}

impl Executor {
    /// Create a new executor
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    /// Configured per-case timeout in seconds
    pub fn default_timeout_secs(&self) -> u64 {
        self.config.default_timeout_secs
    }

    /// Run one snippet against one textual input.
    ///
    /// The snippet is auto-wrapped (see [`crate::wrapper`]), written to a
    /// fresh temp file and executed as a child process bound to the given
    /// wall-clock timeout. The temp file is removed on every exit path.
    pub async fn execute(
        &self,
        code: &str,
        language: Language,
        test_input: &str,
        timeout_secs: u64,
    ) -> Execution {
        if !language.is_executable() {
            return Execution::failure(
                ExecStatus::UnsupportedLanguage,
                format!(
                    "Language '{language}' is not supported in local execution mode. Only Python is supported."
                ),
                0,
            );
        }

        let limit = Duration::from_secs(self.config.clamp_timeout(timeout_secs));
        let wrapped = wrap_python(code, test_input);
        let start = Instant::now();

        // NamedTempFile removes itself on drop, so cleanup holds across
        // success, non-zero exit, timeout and every error branch below.
        let mut source_file = match tempfile::Builder::new()
            .prefix("vulcan_")
            .suffix(".py")
            .tempfile()
        {
            Ok(f) => f,
            Err(e) => {
                return Execution::failure(
                    ExecStatus::InternalError,
                    format!("Failed to create temp file: {e}"),
                    0,
                );
            }
        };
        if let Err(e) = source_file.write_all(wrapped.as_bytes()) {
            return Execution::failure(
                ExecStatus::InternalError,
                format!("Failed to write temp file: {e}"),
                0,
            );
        }

        tracing::debug!(
            path = %source_file.path().display(),
            timeout_secs = limit.as_secs(),
            "Executing python snippet"
        );

        let child = Command::new(&self.config.python_bin)
            .arg(source_file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(c) => c,
            Err(e) => {
                return Execution::failure(
                    ExecStatus::InternalError,
                    format!("Failed to spawn interpreter: {e}"),
                    start.elapsed().as_millis() as u64,
                );
            }
        };

        match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                if output.status.success() {
                    Execution {
                        success: true,
                        output: stdout,
                        error: stderr,
                        duration_ms,
                        status: ExecStatus::Success,
                    }
                } else {
                    let exit_code = output.status.code().unwrap_or(-1);
                    Execution {
                        success: false,
                        output: stdout,
                        error: if stderr.is_empty() {
                            format!("Process exited with code {exit_code}")
                        } else {
                            stderr
                        },
                        duration_ms,
                        status: ExecStatus::NonZeroExit,
                    }
                }
            }
            Ok(Err(e)) => Execution::failure(
                ExecStatus::InternalError,
                format!("Failed to execute process: {e}"),
                start.elapsed().as_millis() as u64,
            ),
            Err(_) => {
                // kill_on_drop reaps the child when the future is dropped
                Execution::failure(
                    ExecStatus::TimeoutExceeded,
                    format!("Execution timed out after {} seconds", limit.as_secs()),
                    limit.as_millis() as u64,
                )
            }
        }
    }

    /// Run every test case sequentially, with no inter-case state.
    ///
    /// Both expected and actual output are trimmed before comparison.
    pub async fn run_all(
        &self,
        code: &str,
        language: Language,
        test_cases: &[TestCase],
    ) -> BatchReport {
        let mut results = Vec::with_capacity(test_cases.len());
        let mut passed = 0usize;

        for (i, case) in test_cases.iter().enumerate() {
            let execution = self
                .execute(code, language, &case.input, self.config.default_timeout_secs)
                .await;
            let expected = case.expected.trim().to_string();
            let actual = execution.output.trim().to_string();
            let case_passed = execution.success && actual == expected;
            if case_passed {
                passed += 1;
            }
            results.push(CaseResult {
                test_id: i + 1,
                input: case.input.clone(),
                expected,
                actual,
                passed: case_passed,
                error: execution.error,
                duration_ms: execution.duration_ms,
            });
        }

        let total = test_cases.len();
        BatchReport {
            passed,
            failed: total - passed,
            total,
            all_passed: passed == total,
            results,
        }
    }

    /// Cheap validity check: execute with empty input and a short timeout
    pub async fn validate_syntax(&self, code: &str, language: Language) -> SyntaxReport {
        let result = self.execute(code, language, "", 5).await;
        SyntaxReport {
            valid: result.success || result.error.is_empty(),
            error: result.error,
        }
    }
}
