//! JSONL output for pose streams.
//!
//! The line format is shared with [`parse_frames`]: a `# {header}` line, then
//! one frame per line as produced by [`serialize_frames`].
//!
//! [`parse_frames`]: repcoach_pose_model::frame::parse_frames

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use repcoach_common::error::{RepcoachError, RepcoachResult};
use repcoach_pose_model::frame::{serialize_frames, PoseFrame, PoseStreamHeader};

/// Stream time between flushes of buffered output.
pub const FLUSH_INTERVAL_MS: u64 = 10_000;

/// Writes a pose stream to any [`Write`] sink.
///
/// Output is flushed whenever the stream clock has advanced
/// [`FLUSH_INTERVAL_MS`] past the previous flush, so a crash loses at most
/// that much recording.
pub struct FrameWriter<W: Write> {
    out: W,
    frames_written: u64,
    flushed_at_ms: Option<u64>,
}

impl FrameWriter<BufWriter<File>> {
    /// Create (or truncate) `path`, creating parent directories.
    pub fn create(path: &Path, header: &PoseStreamHeader) -> RepcoachResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), header)
    }
}

impl<W: Write> FrameWriter<W> {
    /// Wrap `out` and write the header line.
    pub fn new(mut out: W, header: &PoseStreamHeader) -> RepcoachResult<Self> {
        let line = format!("# {}\n", serde_json::to_string(header)?);
        out.write_all(line.as_bytes())
            .map_err(|e| RepcoachError::pose_source(format!("Failed to write header: {e}")))?;
        Ok(Self {
            out,
            frames_written: 0,
            flushed_at_ms: None,
        })
    }

    pub fn write_frame(&mut self, frame: &PoseFrame) -> RepcoachResult<()> {
        self.write_frames(std::slice::from_ref(frame))
    }

    /// Append `frames` in order.
    pub fn write_frames(&mut self, frames: &[PoseFrame]) -> RepcoachResult<()> {
        let Some(last) = frames.last() else {
            return Ok(());
        };

        let jsonl = serialize_frames(frames)?;
        self.out
            .write_all(jsonl.as_bytes())
            .map_err(|e| RepcoachError::pose_source(format!("Failed to write frames: {e}")))?;
        self.frames_written += frames.len() as u64;

        let t = last.timestamp_ms;
        let anchor = *self.flushed_at_ms.get_or_insert(t);
        if t.saturating_sub(anchor) >= FLUSH_INTERVAL_MS {
            self.flush()?;
            self.flushed_at_ms = Some(t);
        }
        Ok(())
    }

    pub fn flush(&mut self) -> RepcoachResult<()> {
        self.out
            .flush()
            .map_err(|e| RepcoachError::pose_source(format!("Failed to flush frames: {e}")))
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Flush and hand back the sink.
    pub fn finish(mut self) -> RepcoachResult<W> {
        self.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repcoach_pose_model::frame::{parse_frames, parse_header};
    use repcoach_pose_model::keypoint::{Keypoint, Skeleton, JOINT_COUNT};

    #[derive(Default)]
    struct Sink {
        data: Vec<u8>,
        flushes: usize,
    }

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    fn skeleton() -> Skeleton {
        Skeleton::from_array([Keypoint::new(1.0, 2.0, 0.9); JOINT_COUNT])
    }

    #[test]
    fn test_output_parses_back() {
        let header = PoseStreamHeader::new("synthetic", 30, 640, 480);
        let mut writer = FrameWriter::new(Vec::new(), &header).unwrap();
        writer
            .write_frame(&PoseFrame::with_skeleton(0, skeleton()))
            .unwrap();
        writer.write_frames(&[PoseFrame::empty(33)]).unwrap();
        writer.write_frames(&[]).unwrap();
        assert_eq!(writer.frames_written(), 2);

        let content = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert_eq!(parse_header(&content), Some(header));

        let frames = parse_frames(&content).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].primary(), Some(&skeleton()));
        assert!(frames[1].primary().is_none());
    }

    #[test]
    fn test_flushes_on_stream_time() {
        let header = PoseStreamHeader::new("synthetic", 30, 640, 480);
        let mut writer = FrameWriter::new(Sink::default(), &header).unwrap();

        for t in (0..FLUSH_INTERVAL_MS).step_by(100) {
            writer.write_frame(&PoseFrame::empty(t)).unwrap();
        }
        assert_eq!(writer.out.flushes, 0);

        writer
            .write_frame(&PoseFrame::empty(FLUSH_INTERVAL_MS))
            .unwrap();
        assert_eq!(writer.out.flushes, 1);
        writer
            .write_frame(&PoseFrame::empty(FLUSH_INTERVAL_MS + 100))
            .unwrap();
        assert_eq!(writer.out.flushes, 1);

        let sink = writer.finish().unwrap();
        assert_eq!(sink.flushes, 2);
    }

    #[test]
    fn test_create_makes_parent_dirs() {
        let dir = std::env::temp_dir().join("repcoach_test_frame_writer");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("poses.jsonl");
        let header = PoseStreamHeader::new("synthetic", 30, 640, 480);

        let mut writer = FrameWriter::create(&path, &header).unwrap();
        writer.write_frame(&PoseFrame::empty(0)).unwrap();
        writer.finish().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(parse_frames(&content).unwrap().len(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }
}
