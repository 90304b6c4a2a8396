//! # Pystep
//!
//! Stepped execution engine for an interactive algorithm visualizer.
//!
//! A caller submits a short Python script and advances through it one
//! logical line at a time, observing local-variable state, output, and
//! errors after each step. State is re-derived on every step by re-running
//! the prefix of the script in a fresh interpreter subprocess; there is no
//! live interpreter being paused.
//!
//! ## Modules
//!
//! - `analyzer` - Remote static-analysis client used to pick a visualizer type
//! - `config` - Engine configuration (interpreter, timeouts, eviction)
//! - `engine` - Session registry and the start/step/reset/get operations
//! - `error` - Engine error taxonomy
//! - `hints` - Text-pattern heuristics producing visualization hints
//! - `instrument` - Per-step script instrumentation
//! - `protocol` - Sentinel-framed output protocol parsing
//! - `sandbox` - Sandboxed interpreter invocation
//! - `server` - Thin HTTP layer over the engine
//! - `session` - Debug session record and state machine
//! - `source` - Source text indexing and validation
//! - `subprocess` - Unified subprocess abstraction layer for testing

pub mod analyzer;
pub mod config;
pub mod engine;
pub mod error;
pub mod hints;
pub mod instrument;
pub mod protocol;
pub mod sandbox;
pub mod server;
pub mod session;
pub mod source;
pub mod subprocess;

pub use config::EngineConfig;
pub use engine::{DebugEngine, StepOutcome};
pub use error::{EngineError, Result};
pub use session::{DebugSession, SessionStatus, Variable, VisualizerType};
