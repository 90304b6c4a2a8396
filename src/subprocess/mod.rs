//! Unified subprocess abstraction layer.
//!
//! Interpreter invocations go through the [`ProcessRunner`] trait so the
//! engine can be exercised in tests without spawning real processes.

pub mod builder;
pub mod error;
pub mod mock;
pub mod runner;

pub use builder::ProcessCommandBuilder;
pub use error::ProcessError;
pub use mock::MockProcessRunner;
pub use runner::{ExitStatus, ProcessCommand, ProcessOutput, ProcessRunner, TokioProcessRunner};
