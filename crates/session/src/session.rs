//! Training session management.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use repcoach_common::clock::{FrameClock, RateController};
use repcoach_common::config::AppConfig;
use repcoach_common::error::{RepcoachError, RepcoachResult};
use repcoach_pose_model::output::FrameOutput;
use repcoach_pose_model::results::ResultsRecord;
use repcoach_pose_source::PoseSource;
use repcoach_processing_core::{ExerciseEngine, ExerciseProfile};

use crate::history::{ExportPaths, HistoryStore};

/// Configuration for running a training session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Frame rate the driver is capped at.
    pub fps: u32,

    /// Pace frames at `fps` in wall-clock time. Off for replays and tests.
    pub realtime: bool,

    /// Where history and exports are written. `None` skips persistence.
    pub history_dir: Option<PathBuf>,

    /// Finalize when the stream ends or the session is stopped before the
    /// rep target is reached.
    pub finalize_on_end: bool,
}

impl SessionConfig {
    pub fn from_app_config(app: &AppConfig) -> Self {
        Self {
            fps: app.processing.fps,
            realtime: app.processing.realtime,
            history_dir: Some(app.history_dir.clone()),
            finalize_on_end: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            realtime: false,
            history_dir: None,
            finalize_on_end: true,
        }
    }
}

/// State of a training session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Session created but not started.
    Idle,
    /// Frames are being processed.
    Running,
    /// Stream ended, target reached, or stopped.
    Finished,
    /// The source failed.
    Error,
}

/// Admits exactly one finalize/export per session.
#[derive(Debug, Clone, Default)]
pub struct ExportGuard {
    claimed: Arc<AtomicBool>,
}

impl ExportGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` for the first caller only.
    pub fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }
}

/// What a finished session produced.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    /// The results record, unless finalization was skipped.
    pub record: Option<ResultsRecord>,

    /// Frames handed to the engine.
    pub frames: u64,

    /// Whether the stop flag ended the session.
    pub stopped: bool,

    /// Exported files, when persistence succeeded.
    pub exports: Option<ExportPaths>,

    /// Persistence failure, if any. Counting results are kept regardless.
    pub export_error: Option<String>,
}

type FrameObserver = Box<dyn FnMut(&FrameOutput) + Send>;

/// A training session that drives an exercise engine from a pose source.
pub struct TrainingSession {
    config: SessionConfig,
    state: SessionState,
    engine: ExerciseEngine,
    source: Box<dyn PoseSource>,
    stop_flag: Arc<AtomicBool>,
    guard: ExportGuard,
    observer: Option<FrameObserver>,
}

impl TrainingSession {
    pub fn new(
        config: SessionConfig,
        engine: ExerciseEngine,
        source: Box<dyn PoseSource>,
    ) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            engine,
            source,
            stop_flag: Arc::new(AtomicBool::new(false)),
            guard: ExportGuard::new(),
            observer: None,
        }
    }

    /// Build the engine for `profile` and wrap it in a session.
    pub fn for_profile(
        config: SessionConfig,
        profile: ExerciseProfile,
        source: Box<dyn PoseSource>,
    ) -> RepcoachResult<Self> {
        let name = profile.name.clone();
        let engine = ExerciseEngine::new(profile)
            .map_err(|e| RepcoachError::config(format!("Invalid profile '{name}': {e}")))?;
        Ok(Self::new(config, engine, source))
    }

    /// Call `observer` with every frame output, in order.
    pub fn with_observer(mut self, observer: impl FnMut(&FrameOutput) + Send + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn engine(&self) -> &ExerciseEngine {
        &self.engine
    }

    /// Get a clone of the stop flag for use in signal handlers.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    pub fn export_guard(&self) -> ExportGuard {
        self.guard.clone()
    }

    /// Ask the loop to stop after the current frame.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Process frames until the rep target is reached, the source ends, or
    /// the stop flag is set. Then finalize and persist, at most once.
    pub async fn run(&mut self) -> RepcoachResult<SessionOutcome> {
        if self.state != SessionState::Idle {
            return Err(RepcoachError::session("Session already started"));
        }
        if !self.source.is_available() {
            self.state = SessionState::Error;
            return Err(RepcoachError::pose_source(format!(
                "Pose source '{}' is not available",
                self.source.name()
            )));
        }

        self.state = SessionState::Running;
        tracing::info!(
            source = %self.source.name(),
            exercise = %self.engine.profile().name,
            fps = self.config.fps,
            realtime = self.config.realtime,
            "Training session started"
        );

        let clock = FrameClock::start();
        let mut rate = RateController::new(self.config.fps);
        let mut frames = 0u64;
        let mut completed = None;

        while !self.stop_flag.load(Ordering::Relaxed) {
            if self.config.realtime {
                let wait = rate.time_until_next(clock.elapsed_ms());
                if !wait.is_zero() {
                    tokio::time::sleep(wait).await;
                }
                rate.should_tick(clock.elapsed_ms());
            }

            let frame = match self.source.next_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::info!(frames, "Pose stream ended");
                    break;
                }
                Err(e) => {
                    self.state = SessionState::Error;
                    tracing::error!(error = %e, frames, "Pose source failed");
                    return Err(e);
                }
            };

            let output = self.engine.process_frame(&frame);
            frames += 1;
            if let Some(observer) = self.observer.as_mut() {
                observer(&output);
            }
            if let Some(record) = output.completed_record() {
                completed = Some(record.clone());
                break;
            }
        }

        let stopped = self.stop_flag.load(Ordering::Relaxed);
        if stopped {
            tracing::info!(frames, "Training session stopped");
        }

        let record = match completed {
            Some(record) => Some(record),
            None if self.config.finalize_on_end => self.engine.finalize(),
            None => None,
        };

        let mut outcome = SessionOutcome {
            record,
            frames,
            stopped,
            exports: None,
            export_error: None,
        };
        if let Some(record) = outcome.record.as_ref() {
            self.persist(record, &mut outcome.exports, &mut outcome.export_error);
        }

        self.state = SessionState::Finished;
        tracing::info!(
            frames,
            duration_secs = clock.elapsed_secs(),
            "Training session finished"
        );
        Ok(outcome)
    }

    fn persist(
        &self,
        record: &ResultsRecord,
        exports: &mut Option<ExportPaths>,
        export_error: &mut Option<String>,
    ) {
        let Some(dir) = &self.config.history_dir else {
            return;
        };
        if !self.guard.try_claim() {
            tracing::debug!("Results already exported for this session");
            return;
        }

        match HistoryStore::new(dir).persist(record) {
            Ok(paths) => *exports = Some(paths),
            Err(e) => {
                let err = RepcoachError::from(e);
                tracing::warn!(error = %err, "Failed to persist session results");
                *export_error = Some(err.to_string());
            }
        }
    }
}
