//! Terminal renderer: prints engine events and feedback as they change.

use std::collections::BTreeSet;

use repcoach_common::clock::FrameClock;
use repcoach_pose_model::output::{EngineEvent, FrameOutput, Severity};
use repcoach_pose_model::results::RepVerdict;

pub struct TerminalRenderer {
    quiet: bool,
    shown: BTreeSet<String>,
    last_countdown: Option<u32>,
}

impl TerminalRenderer {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            shown: BTreeSet::new(),
            last_countdown: None,
        }
    }

    pub fn render(&mut self, out: &FrameOutput) {
        if self.quiet {
            return;
        }
        for line in self.lines(out) {
            println!("{line}");
        }
    }

    /// Lines to print for `out`, given what was printed before.
    fn lines(&mut self, out: &FrameOutput) -> Vec<String> {
        let stamp = format!("[{:>7.2}s]", FrameClock::ms_to_secs(out.timestamp_ms));
        let mut lines = Vec::new();

        if out.countdown_secs != self.last_countdown {
            if let Some(secs) = out.countdown_secs {
                lines.push(format!("{stamp} Starting in {secs}..."));
            }
            self.last_countdown = out.countdown_secs;
        }

        for event in &out.events {
            if let Some(text) = describe(event, out) {
                lines.push(format!("{stamp} {text}"));
            }
        }

        let current: BTreeSet<String> = out.feedback.iter().map(|f| f.message.clone()).collect();
        for view in &out.feedback {
            if !self.shown.contains(&view.message) {
                lines.push(format!("{stamp} {} {}", marker(view.severity), view.message));
            }
        }
        self.shown = current;
        lines
    }
}

fn describe(event: &EngineEvent, out: &FrameOutput) -> Option<String> {
    let text = match event {
        EngineEvent::CountdownStarted => "Hold it, countdown started".to_string(),
        EngineEvent::CountdownCancelled => "Countdown cancelled".to_string(),
        EngineEvent::CountingStarted => "Go!".to_string(),
        EngineEvent::RepCounted {
            rep,
            verdict,
            failed,
        } => {
            let verdict = match verdict {
                RepVerdict::Correct => "correct",
                RepVerdict::Incorrect => "incorrect",
            };
            let mut text = format!(
                "Rep {rep}: {verdict}  (correct {}, incorrect {})",
                out.display.correct, out.display.incorrect
            );
            if !failed.is_empty() {
                let labels: Vec<_> = failed.iter().map(|issue| issue.label()).collect();
                text.push_str(&format!(" - {}", labels.join(", ")));
            }
            text
        }
        EngineEvent::RangeOfMotionIssue { issue, extreme } => {
            format!("{} (reached {extreme:.0} deg)", issue.label())
        }
        EngineEvent::TrackingLost { missed_frames } => {
            format!("Pose lost for {missed_frames} frames")
        }
        EngineEvent::TrackingReset => "Back to start position".to_string(),
        EngineEvent::SessionCompleted { .. } => return None,
    };
    Some(text)
}

fn marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Prompt => ">>",
        Severity::Fault => "!!",
        Severity::Notice => "--",
    }
}
