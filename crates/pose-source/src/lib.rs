//! RepCoach Pose Source
//!
//! Supplies timestamped keypoint frames to the exercise engine. Sources are
//! pluggable so the engine never knows where poses come from:
//!
//! - **Replay:** A recorded JSONL pose stream (one frame per line)
//! - **Synthetic:** A deterministic scripted exercise, for demos and tests
//!
//! Frames can be recorded to the same append-only JSONL format with
//! [`PoseRecorder`].

pub mod backends;
pub mod writer;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use repcoach_common::error::{RepcoachError, RepcoachResult};
use repcoach_pose_model::frame::{PoseFrame, PoseStreamHeader};

pub use backends::{Dropout, ReplaySource, SyntheticConfig, SyntheticMotion, SyntheticSource};

/// A stream of pose frames.
#[async_trait]
pub trait PoseSource: Send {
    /// Next frame, or `None` once the stream has ended.
    async fn next_frame(&mut self) -> RepcoachResult<Option<PoseFrame>>;

    /// Source name for logging.
    fn name(&self) -> &str;

    /// Whether the source can produce frames at all.
    fn is_available(&self) -> bool;

    /// Nominal frame rate of the stream.
    fn fps(&self) -> u32 {
        30
    }
}

/// Copies a source's frames into a JSONL file.
pub struct PoseRecorder {
    source: Box<dyn PoseSource>,
    writer: writer::FrameWriter<BufWriter<File>>,
    output_path: PathBuf,
    stop_flag: Arc<AtomicBool>,
}

impl PoseRecorder {
    pub fn new(
        source: Box<dyn PoseSource>,
        output_path: PathBuf,
        width: u32,
        height: u32,
    ) -> RepcoachResult<Self> {
        if !source.is_available() {
            return Err(RepcoachError::pose_source(format!(
                "Source '{}' is not available",
                source.name()
            )));
        }
        let header = PoseStreamHeader::new(source.name(), source.fps(), width, height);
        let writer = writer::FrameWriter::create(&output_path, &header)?;

        Ok(Self {
            source,
            writer,
            output_path,
            stop_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Record until the source ends or the stop flag is set.
    pub async fn run(&mut self) -> RepcoachResult<u64> {
        tracing::info!(source = %self.source.name(), "Pose recorder started");

        while !self.stop_flag.load(Ordering::Relaxed) {
            match self.source.next_frame().await? {
                Some(frame) => self.writer.write_frame(&frame)?,
                None => break,
            }
        }

        self.writer.flush()?;
        let frames = self.writer.frames_written();
        tracing::info!(
            frames,
            path = %self.output_path.display(),
            "Pose recorder stopped"
        );
        Ok(frames)
    }

    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Get the stop flag for external coordination.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    pub fn frames_written(&self) -> u64 {
        self.writer.frames_written()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_squat() -> SyntheticSource {
        let mut config = SyntheticConfig::for_motion(SyntheticMotion::Squat);
        config.reps = 1;
        config.warmup_ms = 500;
        config.cooldown_ms = 0;
        SyntheticSource::new(config)
    }

    #[tokio::test]
    async fn test_recorder_copies_whole_stream() {
        let dir = std::env::temp_dir().join("repcoach_test_recorder");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("squat.jsonl");

        let source = short_squat();
        let expected = source.frames();
        let mut recorder = PoseRecorder::new(Box::new(source), path.clone(), 640, 480).unwrap();
        let written = recorder.run().await.unwrap();
        assert_eq!(written, expected.len() as u64);

        let mut replay = ReplaySource::new(&path);
        let mut replayed = Vec::new();
        while let Some(frame) = replay.next_frame().await.unwrap() {
            replayed.push(frame);
        }
        assert_eq!(replayed, expected);
        assert_eq!(
            replay.header().map(|h| h.source.as_str()),
            Some("synthetic:squat")
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_recorder_honors_stop_flag() {
        let dir = std::env::temp_dir().join("repcoach_test_recorder_stop");
        let _ = std::fs::remove_dir_all(&dir);

        let mut recorder =
            PoseRecorder::new(Box::new(short_squat()), dir.join("out.jsonl"), 640, 480).unwrap();
        recorder.stop_flag().store(true, Ordering::SeqCst);
        assert_eq!(recorder.run().await.unwrap(), 0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_recorder_rejects_unavailable_source() {
        let dir = std::env::temp_dir().join("repcoach_test_recorder_missing");
        let source = ReplaySource::new(dir.join("missing.jsonl"));
        let result = PoseRecorder::new(Box::new(source), dir.join("out.jsonl"), 640, 480);
        assert!(matches!(result, Err(RepcoachError::PoseSource { .. })));
    }
}
