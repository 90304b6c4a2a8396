//! Sentinel-framed output protocol.
//!
//! The instrumented program reports back through its stdout stream: a pair
//! of literal marker lines delimits a single-line JSON payload. Error
//! markers are checked before success markers, so a program that emits both
//! is treated as errored. Markers are plain literals inside freely generated
//! text; a script that prints one of them itself will corrupt the frame,
//! which surfaces as a protocol error rather than being silently repaired.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::session::Variable;

pub const DEBUG_START: &str = "__DEBUG_START__";
pub const DEBUG_END: &str = "__DEBUG_END__";
pub const ERROR_START: &str = "__ERROR_START__";
pub const ERROR_END: &str = "__ERROR_END__";

/// Payload emitted when the prefix ran to completion.
///
/// `output` is always empty by construction: anything the executed lines
/// print goes to the raw process stdout outside the frame, never into the
/// payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessFrame {
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub output: String,
    pub line: usize,
}

/// Payload emitted when the prefix raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorFrame {
    pub error: String,
    #[serde(default)]
    pub traceback: String,
}

/// A decoded sentinel frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Success(SuccessFrame),
    Error(ErrorFrame),
}

/// Scan captured stdout for a sentinel frame and decode its payload.
pub fn parse(stdout: &str) -> Result<Frame> {
    // Error markers take precedence over success markers.
    if let Some(payload) = extract(stdout, ERROR_START, ERROR_END)? {
        let frame: ErrorFrame = serde_json::from_str(payload.trim()).map_err(|e| {
            EngineError::Protocol(format!("Failed to decode error payload: {e}"))
        })?;
        return Ok(Frame::Error(frame));
    }

    if let Some(payload) = extract(stdout, DEBUG_START, DEBUG_END)? {
        let frame: SuccessFrame = serde_json::from_str(payload.trim()).map_err(|e| {
            EngineError::Protocol(format!("Failed to decode debug payload: {e}"))
        })?;
        return Ok(Frame::Success(frame));
    }

    Err(EngineError::Protocol(
        "No sentinel frame found in interpreter output".to_string(),
    ))
}

/// Substring strictly between `start` and `end`, or `None` when `start` is
/// absent. A start marker without a matching end marker is malformed.
fn extract<'a>(output: &'a str, start: &str, end: &str) -> Result<Option<&'a str>> {
    let Some(start_pos) = output.find(start) else {
        return Ok(None);
    };

    let after = &output[start_pos + start.len()..];
    match after.find(end) {
        Some(end_pos) => Ok(Some(&after[..end_pos])),
        None => Err(EngineError::Protocol(format!(
            "Found {start} without matching {end}"
        ))),
    }
}
