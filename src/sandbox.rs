//! Sandboxed interpreter invocation.
//!
//! Each step runs the instrumented program as a fresh child process with
//! the program passed inline (`-c`), both output streams captured, and a
//! wall-clock timeout. No interpreter state survives between invocations.

use std::sync::Arc;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::subprocess::{
    ProcessCommandBuilder, ProcessError, ProcessRunner, TokioProcessRunner,
};

/// Captured outcome of one sandboxed run.
///
/// `exit_ok` distinguishes an interpreter-level crash (the instrumented
/// error handling never ran) from an instrumented error reported through
/// the sentinel protocol on stdout.
#[derive(Debug, Clone)]
pub struct SandboxOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_ok: bool,
}

pub struct SandboxRunner {
    runner: Arc<dyn ProcessRunner>,
    interpreter: String,
    timeout: Duration,
}

impl SandboxRunner {
    pub fn new(runner: Arc<dyn ProcessRunner>, config: &EngineConfig) -> Self {
        Self {
            runner,
            interpreter: config.interpreter.clone(),
            timeout: config.step_timeout,
        }
    }

    pub fn production(config: &EngineConfig) -> Self {
        Self::new(Arc::new(TokioProcessRunner), config)
    }

    /// Run one instrumented program to completion.
    pub async fn run(&self, program: &str) -> Result<SandboxOutcome> {
        let command = ProcessCommandBuilder::new(&self.interpreter)
            .arg("-c")
            .arg(program)
            .env("PYTHONDONTWRITEBYTECODE", "1")
            .env("PYTHONIOENCODING", "utf-8")
            .timeout(self.timeout)
            .build();

        match self.runner.run(command).await {
            Ok(output) => Ok(SandboxOutcome {
                exit_ok: output.status.success(),
                stdout: output.stdout,
                stderr: output.stderr,
            }),
            Err(ProcessError::Timeout(duration)) => Err(EngineError::Timeout(duration)),
            Err(e) => Err(EngineError::Process(e)),
        }
    }
}
