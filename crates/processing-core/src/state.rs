//! Mutable per-session exercise state.

use std::collections::BTreeSet;

use repcoach_pose_model::keypoint::Side;
use repcoach_pose_model::output::{Measurements, Phase, RepCycle};
use repcoach_pose_model::results::{IssueKind, IssueTally, RepBreakdown, RepSnapshot, RepVerdict};

use crate::profile::ExerciseProfile;

/// Everything the state machine tracks between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseSession {
    pub phase: Phase,
    pub cycle: RepCycle,
    /// Ready-position hold counter.
    pub hold_frames: u32,
    /// Frame timestamp at which the countdown started.
    pub countdown_started_ms: Option<u64>,
    /// Session-wide counts, kept across detection-loss resets.
    pub totals: RepBreakdown,
    /// Counts since counting last started.
    pub display: RepBreakdown,
    pub tally: IssueTally,
    /// Timestamp of the last counted rep; `None` before the first one.
    pub last_rep_ms: Option<u64>,
    /// Whether the current down phase already produced a rep.
    pub counted_this_cycle: bool,
    /// Furthest primary angle seen in the current down phase.
    pub extreme: Option<f64>,
    pub missed_frames: u32,
    pub side: Side,
    pub rep_log: Vec<RepSnapshot>,
    pub finished: bool,
}

impl ExerciseSession {
    pub fn new(profile: &ExerciseProfile) -> Self {
        Self {
            phase: Phase::Waiting,
            cycle: RepCycle::Up,
            hold_frames: 0,
            countdown_started_ms: None,
            totals: RepBreakdown::default(),
            display: RepBreakdown::default(),
            tally: profile.issues().into_iter().map(|issue| (issue, 0)).collect(),
            last_rep_ms: None,
            counted_this_cycle: false,
            extreme: None,
            missed_frames: 0,
            side: profile.side.initial,
            rep_log: Vec::new(),
            finished: false,
        }
    }

    /// Enter counting; the current-set counters start from zero.
    pub fn start_counting(&mut self) {
        self.phase = Phase::Counting;
        self.countdown_started_ms = None;
        self.display = RepBreakdown::default();
    }

    /// Back to waiting after losing the pose. Totals, tallies, and the rep
    /// log survive.
    pub fn return_to_waiting(&mut self) {
        self.phase = Phase::Waiting;
        self.cycle = RepCycle::Up;
        self.hold_frames = 0;
        self.countdown_started_ms = None;
        self.counted_this_cycle = false;
        self.extreme = None;
    }

    /// Whether enough time has passed since the last rep.
    pub fn dwell_elapsed(&self, now_ms: u64, min_interval_ms: u64) -> bool {
        self.last_rep_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= min_interval_ms)
    }

    /// Count one rep and log it. Each failed issue adds exactly one to its
    /// tally.
    pub fn record_rep(
        &mut self,
        frame: u64,
        timestamp_ms: u64,
        measurements: &Measurements,
        failed: &BTreeSet<IssueKind>,
    ) -> &RepSnapshot {
        let verdict = if failed.is_empty() {
            RepVerdict::Correct
        } else {
            RepVerdict::Incorrect
        };

        self.totals.total += 1;
        self.display.total += 1;
        match verdict {
            RepVerdict::Correct => {
                self.totals.correct += 1;
                self.display.correct += 1;
            }
            RepVerdict::Incorrect => {
                self.totals.incorrect += 1;
                self.display.incorrect += 1;
            }
        }
        for issue in failed {
            *self.tally.entry(*issue).or_insert(0) += 1;
        }

        self.last_rep_ms = Some(timestamp_ms);
        self.counted_this_cycle = true;
        self.rep_log.push(RepSnapshot {
            rep: self.totals.total,
            frame,
            timestamp_ms,
            primary: measurements.primary,
            secondary: measurements.secondary,
            lean: measurements.lean,
            instability: measurements.instability,
            verdict,
            failed: failed.iter().copied().collect(),
        });
        &self.rep_log[self.rep_log.len() - 1]
    }

    /// Add one occurrence of `issue` outside of rep classification.
    pub fn note_issue(&mut self, issue: IssueKind) {
        *self.tally.entry(issue).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurements() -> Measurements {
        Measurements {
            primary: 140.0,
            secondary: Some(160.0),
            lean: Some(2.0),
            instability: 4.0,
        }
    }

    #[test]
    fn test_new_session_tracks_every_issue() {
        let session = ExerciseSession::new(&ExerciseProfile::tricep_pushdown());
        assert_eq!(session.tally.len(), 5);
        assert!(session.tally.values().all(|count| *count == 0));
        assert_eq!(session.side, Side::Right);
        assert_eq!(session.phase, Phase::Waiting);
    }

    #[test]
    fn test_record_rep_counts_each_failure_once() {
        let mut session = ExerciseSession::new(&ExerciseProfile::tricep_pushdown());
        let failed: BTreeSet<_> = [IssueKind::ElbowSwinging, IssueKind::BackTooTilted]
            .into_iter()
            .collect();
        let snapshot = session.record_rep(40, 1_320, &measurements(), &failed);
        assert_eq!(snapshot.rep, 1);
        assert_eq!(snapshot.verdict, RepVerdict::Incorrect);

        assert_eq!(session.totals.incorrect, 1);
        assert_eq!(session.tally[&IssueKind::ElbowSwinging], 1);
        assert_eq!(session.tally[&IssueKind::BackTooTilted], 1);
        assert_eq!(session.tally[&IssueKind::BackTooStraight], 0);
        assert!(session.counted_this_cycle);
    }

    #[test]
    fn test_dwell() {
        let mut session = ExerciseSession::new(&ExerciseProfile::squat());
        assert!(session.dwell_elapsed(0, 500));
        session.record_rep(0, 1_000, &measurements(), &BTreeSet::new());
        assert!(!session.dwell_elapsed(1_499, 500));
        assert!(session.dwell_elapsed(1_500, 500));
    }

    #[test]
    fn test_return_to_waiting_keeps_totals() {
        let mut session = ExerciseSession::new(&ExerciseProfile::tricep_pushdown());
        session.start_counting();
        session.cycle = RepCycle::Down;
        session.record_rep(10, 500, &measurements(), &BTreeSet::new());
        session.return_to_waiting();

        assert_eq!(session.phase, Phase::Waiting);
        assert_eq!(session.cycle, RepCycle::Up);
        assert!(!session.counted_this_cycle);
        assert_eq!(session.totals.total, 1);
        assert_eq!(session.rep_log.len(), 1);
    }

    #[test]
    fn test_start_counting_resets_display_only() {
        let mut session = ExerciseSession::new(&ExerciseProfile::tricep_pushdown());
        session.record_rep(1, 0, &measurements(), &BTreeSet::new());
        session.start_counting();
        assert_eq!(session.display.total, 0);
        assert_eq!(session.totals.total, 1);
    }
}
