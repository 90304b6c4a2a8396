use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use super::error::ProcessError;

/// A fully specified subprocess invocation.
#[derive(Debug, Clone)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

/// Captured result of a completed subprocess.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
    Signal(i32),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Success => Some(0),
            ExitStatus::Error(code) => Some(*code),
            ExitStatus::Signal(_) => None,
        }
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError>;
}

/// Production runner backed by `tokio::process`.
///
/// Children run in their own process group with a cleared environment
/// (PATH and a few basics preserved) and are killed when the wall-clock
/// timeout elapses.
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    fn configure_command(command: &ProcessCommand) -> Result<tokio::process::Command, ProcessError> {
        let mut cmd = tokio::process::Command::new(&command.program);

        #[cfg(unix)]
        {
            // Own process group so a timeout kill cannot orphan grandchildren.
            cmd.process_group(0);
        }

        cmd.args(&command.args);
        cmd.env_clear();
        Self::preserve_essential_env(&mut cmd)?;

        for (key, value) in &command.env {
            cmd.env(key, value);
        }

        cmd.stdin(std::process::Stdio::null());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());

        // Dropping the wait future on timeout must take the child with it.
        cmd.kill_on_drop(true);

        Ok(cmd)
    }

    /// The environment is cleared for isolation; PATH must survive or the
    /// interpreter cannot be found at all.
    fn preserve_essential_env(cmd: &mut tokio::process::Command) -> Result<(), ProcessError> {
        match std::env::var("PATH") {
            Ok(path) => {
                cmd.env("PATH", path);
            }
            Err(_) => {
                return Err(ProcessError::InternalError {
                    message: "PATH is not available in the parent environment".to_string(),
                });
            }
        }

        for var in ["HOME", "LANG", "TMPDIR"] {
            if let Ok(value) = std::env::var(var) {
                cmd.env(var, value);
            }
        }

        Ok(())
    }

    fn parse_exit_status(status: std::process::ExitStatus) -> ExitStatus {
        if status.success() {
            ExitStatus::Success
        } else if let Some(code) = status.code() {
            ExitStatus::Error(code)
        } else {
            Self::parse_signal_status(status)
        }
    }

    #[cfg(unix)]
    fn parse_signal_status(status: std::process::ExitStatus) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        match status.signal() {
            Some(signal) => ExitStatus::Signal(signal),
            None => ExitStatus::Error(1),
        }
    }

    #[cfg(not(unix))]
    fn parse_signal_status(_status: std::process::ExitStatus) -> ExitStatus {
        ExitStatus::Error(1)
    }

    fn map_spawn_error(error: std::io::Error, command: &ProcessCommand) -> ProcessError {
        if error.kind() == std::io::ErrorKind::NotFound {
            ProcessError::CommandNotFound(command.program.clone())
        } else {
            ProcessError::SpawnFailed {
                command: format!("{} {}", command.program, command.args.join(" ")),
                source: error,
            }
        }
    }

    fn log_result(result: &ProcessOutput, command: &ProcessCommand) {
        match &result.status {
            ExitStatus::Success => {
                tracing::debug!(
                    "Subprocess {} completed in {:?}",
                    command.program,
                    result.duration
                );
            }
            ExitStatus::Error(code) => {
                tracing::debug!(
                    "Subprocess {} exited with code {} in {:?}",
                    command.program,
                    code,
                    result.duration
                );
            }
            ExitStatus::Signal(signal) => {
                tracing::warn!(
                    "Subprocess {} terminated by signal {} in {:?}",
                    command.program,
                    signal,
                    result.duration
                );
            }
        }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        let start = std::time::Instant::now();

        tracing::debug!(
            "Executing subprocess: {} ({} args, timeout {:?})",
            command.program,
            command.args.len(),
            command.timeout
        );

        let mut cmd = Self::configure_command(&command)?;
        let child = cmd
            .spawn()
            .map_err(|e| Self::map_spawn_error(e, &command))?;

        let output = match command.timeout {
            Some(duration) => {
                match tokio::time::timeout(duration, child.wait_with_output()).await {
                    Ok(result) => result.map_err(ProcessError::Io)?,
                    // kill_on_drop reaps the child when the future is dropped.
                    Err(_) => return Err(ProcessError::Timeout(duration)),
                }
            }
            None => child.wait_with_output().await.map_err(ProcessError::Io)?,
        };

        let result = ProcessOutput {
            status: Self::parse_exit_status(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: start.elapsed(),
        };

        Self::log_result(&result, &command);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::ProcessCommandBuilder;

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let command = ProcessCommandBuilder::new("sh")
            .arg("-c")
            .arg("echo hello")
            .build();

        let output = TokioProcessRunner.run(command).await.unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout, "hello\n");
        assert_eq!(output.stderr, "");
    }

    #[tokio::test]
    async fn test_run_captures_stderr_and_exit_code() {
        let command = ProcessCommandBuilder::new("sh")
            .arg("-c")
            .arg("echo oops >&2; exit 3")
            .build();

        let output = TokioProcessRunner.run(command).await.unwrap();
        assert_eq!(output.status, ExitStatus::Error(3));
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stderr, "oops\n");
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let command = ProcessCommandBuilder::new("sh")
            .arg("-c")
            .arg("sleep 5")
            .timeout(Duration::from_millis(100))
            .build();

        let result = TokioProcessRunner.run(command).await;
        assert!(matches!(result, Err(ProcessError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let command = ProcessCommandBuilder::new("definitely_not_a_real_program_xyz").build();

        let result = TokioProcessRunner.run(command).await;
        assert!(matches!(result, Err(ProcessError::CommandNotFound(_))));
    }

    #[tokio::test]
    async fn test_env_is_cleared_except_essentials() {
        std::env::set_var("PYSTEP_LEAK_CHECK", "should-not-appear");
        let command = ProcessCommandBuilder::new("sh")
            .arg("-c")
            .arg("echo ${PYSTEP_LEAK_CHECK:-clean}")
            .env("EXPLICIT", "yes")
            .build();

        let output = TokioProcessRunner.run(command).await.unwrap();
        assert_eq!(output.stdout, "clean\n");
        std::env::remove_var("PYSTEP_LEAK_CHECK");
    }
}
