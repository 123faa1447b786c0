// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! External process execution.

use crate::shared::error::{JeraError, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Stdout of a successful run, [`JeraError::ToolFailure`] otherwise.
    pub fn into_stdout(self, program: &str, args: &[String]) -> Result<String> {
        if self.success {
            Ok(self.stdout)
        } else {
            Err(JeraError::tool_failure(
                program,
                args.join(" "),
                self.stderr.trim(),
            ))
        }
    }
}

/// Convert borrowed arguments into the owned form the runner takes.
pub fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

/// Runs external tools. Implemented by [`SystemRunner`] and by fakes in tests.
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion with stdout and stderr captured.
    async fn capture(&self, program: &str, args: &[String]) -> Result<ProcessOutput>;

    /// Run attached to the terminal and return the exit code.
    async fn interactive(&self, program: &str, args: &[String]) -> Result<i32>;
}

/// Spawns real processes through `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit captured runs to `timeout`. Interactive runs are never limited.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

fn spawn_error(program: &str, err: std::io::Error) -> JeraError {
    if err.kind() == std::io::ErrorKind::NotFound {
        JeraError::tool_missing(program)
    } else {
        JeraError::Io(err)
    }
}

#[async_trait::async_trait]
impl CommandRunner for SystemRunner {
    async fn capture(&self, program: &str, args: &[String]) -> Result<ProcessOutput> {
        tracing::debug!("Running {} {}", program, args.join(" "));

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child).await.map_err(|_| {
                JeraError::Timeout(format!(
                    "{} {} did not finish within {}s",
                    program,
                    args.join(" "),
                    limit.as_secs()
                ))
            })?,
            None => child.await,
        }
        .map_err(|e| spawn_error(program, e))?;

        let result = ProcessOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        if !result.success {
            tracing::debug!(
                "{} exited with {:?}: {}",
                program,
                result.code,
                result.stderr.trim()
            );
        }
        Ok(result)
    }

    async fn interactive(&self, program: &str, args: &[String]) -> Result<i32> {
        tracing::debug!("Running interactively {} {}", program, args.join(" "));

        let status = Command::new(program)
            .args(args)
            .status()
            .await
            .map_err(|e| spawn_error(program, e))?;

        Ok(status.code().unwrap_or(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_stdout() {
        let args = to_args(&["top", "pods"]);
        assert_eq!(
            ProcessOutput::ok("out").into_stdout("kubectl", &args).unwrap(),
            "out"
        );
        let err = ProcessOutput::failed(1, "error: boom\n")
            .into_stdout("kubectl", &args)
            .unwrap_err();
        assert_eq!(err.to_string(), "`kubectl top pods` failed: error: boom");
    }

    #[tokio::test]
    async fn test_missing_program_is_tool_missing() {
        let runner = SystemRunner::new();
        let err = runner
            .capture("jera-definitely-not-installed", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, JeraError::ToolMissing { .. }));
    }
}
