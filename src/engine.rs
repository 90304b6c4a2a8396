//! Session registry and the start/step/reset/get operations.
//!
//! Each registered session lives behind its own `tokio::sync::Mutex`, held
//! for the full duration of a step so operations against one session are
//! serialized while different sessions run their subprocesses in parallel.
//! The registry itself is an `RwLock`ed map: insert on start, lookup on
//! step/reset/get, lazy TTL eviction on start.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::analyzer::{visualizer_type_for, CodeAnalyzer, HttpAnalyzer, NoopAnalyzer};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::hints;
use crate::instrument;
use crate::protocol::{self, Frame};
use crate::sandbox::SandboxRunner;
use crate::session::{DebugSession, SessionStatus, VisualizerType};
use crate::source::SourceIndex;
use crate::subprocess::{ProcessRunner, TokioProcessRunner};

struct SessionEntry {
    session: DebugSession,
    source: SourceIndex,
    last_touched: Instant,
}

/// Result of a step operation.
///
/// A failed step still carries the session so callers can inspect the
/// partial state; `failure` holds what went wrong.
#[derive(Debug)]
pub struct StepOutcome {
    pub session: DebugSession,
    pub failure: Option<EngineError>,
}

impl StepOutcome {
    fn success(session: DebugSession) -> Self {
        Self {
            session,
            failure: None,
        }
    }

    fn failed(session: DebugSession, failure: EngineError) -> Self {
        Self {
            session,
            failure: Some(failure),
        }
    }
}

/// The stepped execution engine.
pub struct DebugEngine {
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionEntry>>>>,
    sandbox: SandboxRunner,
    analyzer: Arc<dyn CodeAnalyzer>,
    config: EngineConfig,
}

impl DebugEngine {
    pub fn new(
        config: EngineConfig,
        runner: Arc<dyn ProcessRunner>,
        analyzer: Arc<dyn CodeAnalyzer>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            sandbox: SandboxRunner::new(runner, &config),
            analyzer,
            config,
        }
    }

    /// Engine wired to the real interpreter and, when configured, the real
    /// analysis service.
    pub fn production(config: EngineConfig) -> Self {
        let analyzer: Arc<dyn CodeAnalyzer> = match config.analyzer_url.as_deref() {
            Some(url) => Arc::new(HttpAnalyzer::new(url)),
            None => Arc::new(NoopAnalyzer),
        };
        Self::new(config, Arc::new(TokioProcessRunner), analyzer)
    }

    /// Create a new session from source text.
    pub async fn start(&self, code: &str) -> Result<DebugSession> {
        let source = SourceIndex::build(code)?;
        let visualizer_type = self.classify(code).await;
        let session = DebugSession::new(code, visualizer_type);
        let snapshot = session.clone();

        let mut sessions = self.sessions.write().await;
        self.evict_stale(&mut sessions);
        sessions.insert(
            session.id.clone(),
            Arc::new(Mutex::new(SessionEntry {
                session,
                source,
                last_touched: Instant::now(),
            })),
        );

        info!(
            "Started debug session {} ({} lines)",
            snapshot.id,
            snapshot.code.lines().count()
        );
        Ok(snapshot)
    }

    /// Advance a session by one line.
    pub async fn step(&self, id: &str) -> Result<StepOutcome> {
        let entry = self.entry(id).await?;
        // Held across the whole step: serializes concurrent steps on the
        // same session.
        let mut entry = entry.lock().await;
        entry.last_touched = Instant::now();

        if entry.session.status == SessionStatus::Completed {
            return Err(EngineError::Session(
                "Debug session already completed".to_string(),
            ));
        }

        let target_line = entry.session.current_line;
        let program = instrument::build_program(&entry.source, target_line);

        let outcome = match self.sandbox.run(&program).await {
            Ok(outcome) => outcome,
            Err(failure) => {
                entry.session.record_failure(failure.step_message());
                return Ok(StepOutcome::failed(entry.session.clone(), failure));
            }
        };

        if !outcome.exit_ok {
            // The interpreter died before the instrumented except block
            // could run; the frame never made it to stdout.
            let stderr = outcome.stderr.trim().to_string();
            let failure = EngineError::Interpreter(if stderr.is_empty() {
                "Interpreter exited abnormally".to_string()
            } else {
                stderr
            });
            entry.session.record_failure(failure.step_message());
            return Ok(StepOutcome::failed(entry.session.clone(), failure));
        }

        match protocol::parse(&outcome.stdout)? {
            Frame::Error(frame) => {
                entry.session.record_failure(frame.error.clone());
                Ok(StepOutcome::failed(
                    entry.session.clone(),
                    EngineError::Runtime {
                        message: frame.error,
                        traceback: frame.traceback,
                    },
                ))
            }
            Frame::Success(frame) => {
                let line_text = entry
                    .source
                    .line_at(target_line)
                    .unwrap_or_default()
                    .to_string();

                entry.session.variables = frame.variables;
                // Always empty by protocol; user prints live on the raw
                // subprocess stream outside the frame.
                entry.session.output.push_str(&frame.output);
                entry.session.error.clear();
                entry.session.current_line += 1;
                entry.session.visualization_hints =
                    hints::generate(&line_text, &entry.session.variables);
                entry.session.status = if entry.session.current_line > entry.source.line_count() {
                    SessionStatus::Completed
                } else {
                    SessionStatus::Running
                };
                entry.session.touch();

                debug!(
                    "Session {} stepped to line {} ({:?})",
                    entry.session.id, entry.session.current_line, entry.session.status
                );
                Ok(StepOutcome::success(entry.session.clone()))
            }
        }
    }

    /// Return a session to its initial state, keeping the source text.
    pub async fn reset(&self, id: &str) -> Result<DebugSession> {
        let entry = self.entry(id).await?;
        let mut entry = entry.lock().await;
        entry.last_touched = Instant::now();
        entry.session.reset();
        Ok(entry.session.clone())
    }

    /// Snapshot a session's current state.
    pub async fn get(&self, id: &str) -> Result<DebugSession> {
        let entry = self.entry(id).await?;
        let entry = entry.lock().await;
        Ok(entry.session.clone())
    }

    async fn entry(&self, id: &str) -> Result<Arc<Mutex<SessionEntry>>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    async fn classify(&self, code: &str) -> VisualizerType {
        match self.analyzer.analyze(code, "python").await {
            Ok(result) => visualizer_type_for(&result),
            Err(e) => {
                debug!("Code analysis unavailable, defaulting to array visualizer: {e}");
                VisualizerType::Array
            }
        }
    }

    /// Drop sessions idle past the TTL; at the capacity limit, drop the
    /// stalest remaining session to make room. Sessions mid-step hold
    /// their lock and are never considered stale.
    fn evict_stale(&self, sessions: &mut HashMap<String, Arc<Mutex<SessionEntry>>>) {
        let mut expired = Vec::new();
        let mut stalest: Option<(String, Instant)> = None;

        for (id, entry) in sessions.iter() {
            let Ok(entry) = entry.try_lock() else {
                continue;
            };
            if entry.last_touched.elapsed() > self.config.session_ttl {
                expired.push(id.clone());
            } else if stalest
                .as_ref()
                .map_or(true, |(_, touched)| entry.last_touched < *touched)
            {
                stalest = Some((id.clone(), entry.last_touched));
            }
        }

        for id in &expired {
            sessions.remove(id);
            debug!("Evicted expired session {id}");
        }

        if sessions.len() >= self.config.max_sessions {
            if let Some((id, _)) = stalest {
                sessions.remove(&id);
                warn!("Session limit reached, evicted stalest session {id}");
            }
        }
    }
}
