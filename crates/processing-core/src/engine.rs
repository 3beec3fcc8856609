//! The exercise engine: one profile-driven state machine per session.
//!
//! # Per-frame pipeline
//!
//! 1. Age feedback messages ([`FeedbackDebouncer::tick`]).
//! 2. Reject frames without a usable pose (detection loss).
//! 3. Smooth joint positions, pick the analyzed side.
//! 4. Measure and smooth the primary, secondary, and lean angles, and update
//!    the instability window.
//! 5. Advance the waiting/counting state machine.
//! 6. Resolve everything into a [`FrameOutput`].
//!
//! The engine owns all mutable state and never blocks; the driver decides
//! when frames arrive.

use std::collections::BTreeSet;

use repcoach_pose_model::frame::PoseFrame;
use repcoach_pose_model::keypoint::{Joint, Point2D, Side, Skeleton, SKELETON_CONNECTIONS};
use repcoach_pose_model::output::{
    Arrow, Emphasis, EngineEvent, FrameOutput, Highlight, HighlightTarget, Measurements, Phase,
    RenderPoint, RenderSegment, RepCycle, Severity,
};
use repcoach_pose_model::results::{IssueKind, RepVerdict, ResultsRecord};

use crate::feedback::FeedbackDebouncer;
use crate::geometry::{choose_side, DEGENERATE_ANGLE};
use crate::profile::{
    Anchor, ExerciseProfile, LossPolicy, Metric, ProfileError, Reading, RuleInput,
};
use crate::scoring::performance_score;
use crate::smoothing::{AngleChannel, AngleSmoother, PositionSmoother};
use crate::stability::StabilityWindow;
use crate::state::ExerciseSession;

/// Debounced conditions tracked by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Condition {
    GetInPosition,
    Issue(IssueKind),
}

/// Drives one exercise session frame by frame.
pub struct ExerciseEngine {
    profile: ExerciseProfile,
    required: Vec<Joint>,
    positions: PositionSmoother,
    angles: AngleSmoother,
    stability: StabilityWindow,
    feedback: FeedbackDebouncer<Condition>,
    session: ExerciseSession,
    highlights: Vec<Highlight>,
    frame_index: u64,
    started_at: String,
    finalized: bool,
}

impl ExerciseEngine {
    /// Build an engine for a validated profile.
    pub fn new(profile: ExerciseProfile) -> Result<Self, ProfileError> {
        profile.validate()?;
        Ok(Self {
            required: profile.required_joints(),
            positions: PositionSmoother::new(profile.smoothing.position_alpha),
            angles: AngleSmoother::new(profile.smoothing.angle_window),
            stability: StabilityWindow::new(profile.stability.window),
            feedback: FeedbackDebouncer::new(profile.debounce),
            session: ExerciseSession::new(&profile),
            highlights: Vec::new(),
            frame_index: 0,
            started_at: chrono::Utc::now().to_rfc3339(),
            finalized: false,
            profile,
        })
    }

    pub fn profile(&self) -> &ExerciseProfile {
        &self.profile
    }

    pub fn session(&self) -> &ExerciseSession {
        &self.session
    }

    /// Whether the session has been finalized. Further frames are ignored.
    pub fn is_finished(&self) -> bool {
        self.session.finished
    }

    pub fn frames_processed(&self) -> u64 {
        self.frame_index
    }

    /// Whether a debounced condition is currently active.
    pub fn is_active(&self, condition: Condition) -> bool {
        self.feedback.is_active(&condition)
    }

    /// Start over as if freshly constructed.
    pub fn reset(&mut self) {
        self.positions.reset();
        self.angles.reset();
        self.stability.reset();
        self.feedback.reset();
        self.session = ExerciseSession::new(&self.profile);
        self.highlights.clear();
        self.frame_index = 0;
        self.started_at = chrono::Utc::now().to_rfc3339();
        self.finalized = false;
        tracing::debug!(exercise = %self.profile.name, "Engine reset");
    }

    /// Process one estimator frame.
    pub fn process_frame(&mut self, frame: &PoseFrame) -> FrameOutput {
        let t = frame.timestamp_ms;
        if self.session.finished {
            return self.finished_output(t);
        }

        let mut out = self.begin_frame(t);
        let visibility = self.profile.visibility_threshold;

        match frame.primary() {
            Some(skeleton) if self.is_usable(skeleton) => {
                self.session.missed_frames = 0;
                let smoothed = self.positions.smooth_skeleton(skeleton, visibility);
                let side = choose_side(
                    &smoothed,
                    self.profile.side.region,
                    self.profile.side.tie_break,
                    self.session.side,
                );
                self.session.side = side;
                out.side = Some(side);

                let measurements = self.measure(&smoothed, side);
                out.measurements = Some(measurements);
                self.advance(t, &measurements, &mut out);
                self.render_pose(&smoothed, Some(side), &mut out);
                self.render_cues(&smoothed, side, &mut out);
            }
            other => {
                if let Some(skeleton) = other {
                    self.render_pose(skeleton, None, &mut out);
                }
                self.handle_loss(&mut out);
            }
        }

        self.end_frame(out)
    }

    /// Advance the state machine with already-smoothed measurements,
    /// bypassing pose geometry.
    pub fn process_measurements(
        &mut self,
        timestamp_ms: u64,
        measurements: &Measurements,
    ) -> FrameOutput {
        if self.session.finished {
            return self.finished_output(timestamp_ms);
        }

        let mut out = self.begin_frame(timestamp_ms);
        self.session.missed_frames = 0;
        out.measurements = Some(*measurements);
        self.advance(timestamp_ms, measurements, &mut out);
        self.end_frame(out)
    }

    /// Feed a frame without a usable pose.
    pub fn process_missing(&mut self, timestamp_ms: u64) -> FrameOutput {
        self.process_frame(&PoseFrame::empty(timestamp_ms))
    }

    /// Produce the results record. Returns `Some` exactly once per session;
    /// afterwards the engine ignores frames.
    pub fn finalize(&mut self) -> Option<ResultsRecord> {
        if self.finalized {
            return None;
        }
        self.finalized = true;
        self.session.finished = true;

        let s = &self.session;
        let score = performance_score(&s.totals, &s.tally, self.profile.penalty);
        let record = ResultsRecord::new(
            self.profile.workout_name.clone(),
            self.profile.name.clone(),
            self.started_at.clone(),
            s.totals,
            s.tally.clone(),
            score,
            s.rep_log.clone(),
        );
        tracing::info!(
            session_id = %record.session_id,
            total = s.totals.total,
            correct = s.totals.correct,
            score,
            "Session finalized"
        );
        Some(record)
    }

    fn is_usable(&self, skeleton: &Skeleton) -> bool {
        let visible = skeleton.count_visible(&self.required, self.profile.visibility_threshold);
        visible + self.profile.max_missing >= self.required.len()
    }

    fn begin_frame(&mut self, timestamp_ms: u64) -> FrameOutput {
        self.feedback.tick();
        let out = FrameOutput {
            frame: self.frame_index,
            timestamp_ms,
            ..FrameOutput::default()
        };
        self.frame_index += 1;
        out
    }

    fn end_frame(&mut self, mut out: FrameOutput) -> FrameOutput {
        let s = &self.session;
        out.phase = s.phase;
        out.cycle = s.cycle;
        out.hold_progress =
            (s.hold_frames as f64 / self.profile.ready.hold_frames.max(1) as f64).min(1.0);
        out.totals = s.totals;
        out.display = s.display;
        out.feedback = self.feedback.views();

        let now = out.timestamp_ms;
        self.highlights.retain(|h| h.is_live(now));
        out.highlights = self.highlights.clone();
        out.finished = s.finished;
        out
    }

    fn finished_output(&self, timestamp_ms: u64) -> FrameOutput {
        let s = &self.session;
        FrameOutput {
            frame: self.frame_index,
            timestamp_ms,
            phase: s.phase,
            cycle: s.cycle,
            totals: s.totals,
            display: s.display,
            finished: true,
            ..FrameOutput::default()
        }
    }

    fn measure(&mut self, skeleton: &Skeleton, side: Side) -> Measurements {
        let visibility = self.profile.visibility_threshold;

        let metric = self.profile.primary.metric;
        let reading = metric.measure(skeleton, side, visibility);
        let primary = self
            .smooth_reading(AngleChannel::Primary, &metric, reading)
            .unwrap_or(DEGENERATE_ANGLE);

        let secondary = self.profile.secondary.and_then(|metric| {
            let reading = metric.measure(skeleton, side, visibility);
            self.smooth_reading(AngleChannel::Secondary, &metric, reading)
        });
        let lean = self.profile.lean.and_then(|metric| {
            let reading = metric.measure(skeleton, side, visibility);
            self.smooth_reading(AngleChannel::Lean, &metric, reading)
        });

        let stability = &self.profile.stability;
        let offset =
            skeleton.limb(stability.joint, side).x - skeleton.limb(stability.reference, side).x;
        let instability = self.stability.update(offset);

        Measurements {
            primary,
            secondary,
            lean,
            instability,
        }
    }

    fn smooth_reading(
        &mut self,
        channel: AngleChannel,
        metric: &Metric,
        reading: Reading,
    ) -> Option<f64> {
        match reading {
            Reading::Value(raw) => Some(self.angles.smooth(channel, raw)),
            Reading::Degenerate => {
                let reused = self.angles.last(channel).unwrap_or_else(|| metric.sentinel());
                tracing::debug!(?channel, reused, "Degenerate joint geometry, reusing last value");
                Some(reused)
            }
            Reading::Unavailable => None,
        }
    }

    fn advance(&mut self, t: u64, m: &Measurements, out: &mut FrameOutput) {
        if self.session.phase == Phase::Waiting {
            self.advance_waiting(t, m, out);
        }
        if self.session.phase == Phase::Counting {
            self.advance_counting(t, m, out);
        }
    }

    fn advance_waiting(&mut self, t: u64, m: &Measurements, out: &mut FrameOutput) {
        let ready = &self.profile.ready;
        let s = &mut self.session;

        if self.profile.primary.ready.contains(m.primary) {
            s.hold_frames = (s.hold_frames + ready.gain).min(ready.hold_frames);
            if s.hold_frames >= ready.hold_frames && s.countdown_started_ms.is_none() {
                s.countdown_started_ms = Some(t);
                out.events.push(EngineEvent::CountdownStarted);
                tracing::info!(at_ms = t, "Ready position held, countdown started");
            }
        } else {
            s.hold_frames = s.hold_frames.saturating_sub(ready.decay);
            if s.countdown_started_ms.take().is_some() {
                out.events.push(EngineEvent::CountdownCancelled);
                tracing::debug!(angle = m.primary, "Left ready position, countdown cancelled");
            }
        }

        match s.countdown_started_ms {
            Some(started) => {
                let elapsed = t.saturating_sub(started);
                if elapsed >= ready.countdown_ms {
                    s.start_counting();
                    out.events.push(EngineEvent::CountingStarted);
                    tracing::info!(exercise = %self.profile.name, "Counting started");
                } else {
                    let left_ms = ready.countdown_ms - elapsed;
                    out.countdown_secs = Some(left_ms.div_ceil(1_000) as u32);
                }
                self.feedback
                    .update(Condition::GetInPosition, false, &ready.prompt, Severity::Prompt);
            }
            None => {
                self.feedback
                    .update(Condition::GetInPosition, true, &ready.prompt, Severity::Prompt);
            }
        }
    }

    fn advance_counting(&mut self, t: u64, m: &Measurements, out: &mut FrameOutput) {
        for rule in &self.profile.rules {
            let Some(live) = &rule.live else {
                continue;
            };
            let violated = input_value(rule.input, m).is_some_and(|v| live.bound.contains(v));
            self.feedback.update(
                Condition::Issue(rule.issue),
                violated,
                &live.message,
                Severity::Fault,
            );
        }

        let primary = self.profile.primary;
        match self.session.cycle {
            RepCycle::Up => {
                if primary.is_down(m.primary) {
                    self.session.cycle = RepCycle::Down;
                    self.session.extreme = Some(m.primary);
                    tracing::debug!(angle = m.primary, "Cycle up -> down");

                    if !self.session.counted_this_cycle
                        && self.session.dwell_elapsed(t, self.profile.min_rep_interval_ms)
                    {
                        self.count_rep(t, m, out);
                    }
                }
            }
            RepCycle::Down => {
                let further = self
                    .session
                    .extreme
                    .map_or(true, |extreme| primary.direction.is_further(m.primary, extreme));
                if further {
                    self.session.extreme = Some(m.primary);
                }

                if primary.is_up(m.primary) {
                    tracing::debug!(angle = m.primary, "Cycle down -> up");
                    if self.session.counted_this_cycle {
                        self.check_range_of_motion(out);
                    }
                    self.session.cycle = RepCycle::Up;
                    self.session.counted_this_cycle = false;
                    self.session.extreme = None;
                }
            }
        }
    }

    fn count_rep(&mut self, t: u64, m: &Measurements, out: &mut FrameOutput) {
        let mut failed = BTreeSet::new();
        for rule in &self.profile.rules {
            let value = input_value(rule.input, m);
            let over_limit = rule
                .rep_limit
                .zip(value)
                .is_some_and(|(bound, v)| bound.contains(v));
            let live_fault =
                rule.live.is_some() && self.feedback.is_active(&Condition::Issue(rule.issue));
            if over_limit || live_fault {
                failed.insert(rule.issue);
            }
        }

        let snapshot = self.session.record_rep(out.frame, t, m, &failed);
        let (rep, verdict) = (snapshot.rep, snapshot.verdict);

        for rule in &self.profile.rules {
            if failed.contains(&rule.issue) {
                self.feedback.push_notice(&rule.notice, Severity::Notice);
            }
        }

        let target = match verdict {
            RepVerdict::Correct => HighlightTarget::CorrectCounter,
            RepVerdict::Incorrect => HighlightTarget::IncorrectCounter,
        };
        self.highlights.push(Highlight {
            target,
            expires_at_ms: t + self.profile.highlight_ms,
        });

        tracing::info!(
            rep,
            ?verdict,
            failed = ?failed,
            correct = self.session.totals.correct,
            incorrect = self.session.totals.incorrect,
            "Rep counted"
        );
        out.events.push(EngineEvent::RepCounted {
            rep,
            verdict,
            failed: failed.into_iter().collect(),
        });

        if self.session.totals.total >= self.profile.rep_target {
            if let Some(record) = self.finalize() {
                out.events.push(EngineEvent::SessionCompleted {
                    record: Box::new(record),
                });
            }
        }
    }

    fn check_range_of_motion(&mut self, out: &mut FrameOutput) {
        let Some(rom) = &self.profile.range_of_motion else {
            return;
        };
        let Some(extreme) = self.session.extreme else {
            return;
        };
        if rom.is_met(self.profile.primary.direction, extreme) {
            return;
        }

        self.session.note_issue(rom.issue);
        self.feedback.push_notice(&rom.notice, Severity::Notice);
        tracing::debug!(issue = ?rom.issue, extreme, "Range of motion short of target");
        out.events.push(EngineEvent::RangeOfMotionIssue {
            issue: rom.issue,
            extreme,
        });
    }

    fn handle_loss(&mut self, out: &mut FrameOutput) {
        let s = &mut self.session;
        s.missed_frames = s.missed_frames.saturating_add(1);
        let limit = self.profile.loss.frames;
        if s.missed_frames < limit {
            return;
        }

        let missed_frames = s.missed_frames;
        match &self.profile.loss.policy {
            LossPolicy::Reset => {
                if missed_frames == limit {
                    tracing::warn!(missed_frames, "Pose lost, returning to waiting");
                    s.return_to_waiting();
                    out.events.push(EngineEvent::TrackingLost { missed_frames });
                    out.events.push(EngineEvent::TrackingReset);
                }
            }
            LossPolicy::Warn { message } => {
                if missed_frames == limit {
                    tracing::warn!(missed_frames, "Pose lost");
                    out.events.push(EngineEvent::TrackingLost { missed_frames });
                }
                self.feedback.push_notice(message, Severity::Fault);
            }
        }
    }

    fn render_pose(&self, skeleton: &Skeleton, side: Option<Side>, out: &mut FrameOutput) {
        let visibility = self.profile.visibility_threshold;
        out.points = skeleton
            .iter()
            .filter(|(_, kp)| kp.is_visible(visibility))
            .map(|(joint, kp)| RenderPoint {
                joint,
                position: kp.position(),
                confidence: kp.confidence,
            })
            .collect();

        let primary_chain = side
            .map(|side| self.profile.primary.metric.segments(side))
            .unwrap_or_default();
        let secondary_chain = side
            .and_then(|side| self.profile.secondary.map(|metric| metric.segments(side)))
            .unwrap_or_default();

        let mut pairs: Vec<(Joint, Joint)> = SKELETON_CONNECTIONS.to_vec();
        for pair in primary_chain.iter().chain(secondary_chain.iter()) {
            if !contains_pair(&pairs, *pair) {
                pairs.push(*pair);
            }
        }

        for (from, to) in pairs {
            let (a, b) = (skeleton.get(from), skeleton.get(to));
            if !a.is_visible(visibility) || !b.is_visible(visibility) {
                continue;
            }
            let emphasis = if contains_pair(&primary_chain, (from, to)) {
                Emphasis::Primary
            } else if contains_pair(&secondary_chain, (from, to)) {
                Emphasis::Secondary
            } else if side.is_some() && from.side() == side && to.side() == side {
                Emphasis::Side
            } else {
                Emphasis::Background
            };
            out.segments.push(RenderSegment {
                from,
                to,
                a: a.position(),
                b: b.position(),
                emphasis,
            });
        }
    }

    fn render_cues(&self, skeleton: &Skeleton, side: Side, out: &mut FrameOutput) {
        if self.session.phase != Phase::Counting {
            return;
        }
        let visibility = self.profile.visibility_threshold;

        for rule in &self.profile.rules {
            let Some(cue) = &rule.cue else {
                continue;
            };
            if !self.feedback.is_active(&Condition::Issue(rule.issue)) {
                continue;
            }
            let anchors = cue.anchor.limbs();
            if anchors
                .iter()
                .any(|limb| !skeleton.limb(*limb, side).is_visible(visibility))
            {
                continue;
            }

            let from = match cue.anchor {
                Anchor::Joint(limb) => skeleton.limb(limb, side).position(),
                Anchor::Midpoint(a, b) => Point2D::midpoint(
                    &skeleton.limb(a, side).position(),
                    &skeleton.limb(b, side).position(),
                ),
            };
            out.arrows.push(Arrow {
                from,
                to: from.offset(cue.dx, cue.dy),
                label: cue.label.clone(),
                color: Severity::Fault.color().to_string(),
            });
        }
    }
}

fn input_value(input: RuleInput, m: &Measurements) -> Option<f64> {
    match input {
        RuleInput::Secondary => m.secondary,
        RuleInput::Lean => m.lean,
        RuleInput::Instability => Some(m.instability),
    }
}

fn contains_pair(pairs: &[(Joint, Joint)], (a, b): (Joint, Joint)) -> bool {
    pairs
        .iter()
        .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Bound;
    use repcoach_pose_model::keypoint::{Keypoint, JOINT_COUNT};

    const FRAME_MS: u64 = 33;

    fn m(primary: f64) -> Measurements {
        Measurements {
            primary,
            secondary: Some(160.0),
            lean: Some(0.0),
            instability: 0.0,
        }
    }

    fn tricep() -> ExerciseEngine {
        ExerciseEngine::new(ExerciseProfile::tricep_pushdown()).unwrap()
    }

    /// Hold the ready position through the countdown. Returns the next timestamp.
    fn start_counting(engine: &mut ExerciseEngine) -> u64 {
        let mut t = 0;
        while engine.session().phase != Phase::Counting {
            engine.process_measurements(t, &m(90.0));
            t += FRAME_MS;
            assert!(t < 10_000, "never started counting");
        }
        t
    }

    #[test]
    fn test_invalid_profile_rejected() {
        let mut profile = ExerciseProfile::tricep_pushdown();
        profile.debounce.threshold = 0;
        assert!(ExerciseEngine::new(profile).is_err());
    }

    #[test]
    fn test_waiting_prompt_and_countdown() {
        let mut engine = tricep();
        let mut t = 0;
        let mut started = None;
        for _ in 0..40 {
            let out = engine.process_measurements(t, &m(90.0));
            if out.events.contains(&EngineEvent::CountdownStarted) {
                started = Some(out.frame);
                assert_eq!(out.countdown_secs, Some(3));
                assert_eq!(out.hold_progress, 1.0);
            }
            t += FRAME_MS;
        }
        assert_eq!(started, Some(29));
        assert_eq!(engine.session().phase, Phase::Waiting);

        let out = engine.process_measurements(t, &m(150.0));
        assert!(out.events.contains(&EngineEvent::CountdownCancelled));
        assert!(out.countdown_secs.is_none());
        assert_eq!(engine.session().hold_frames, 28);
    }

    #[test]
    fn test_get_in_position_prompt_appears_while_waiting() {
        let mut engine = tricep();
        let mut out = FrameOutput::default();
        for i in 0..8 {
            out = engine.process_measurements(i * FRAME_MS, &m(150.0));
        }
        assert!(out.shows("Get in position (arms bent)"));
        assert!(engine.is_active(Condition::GetInPosition));
    }

    #[test]
    fn test_counting_starts_after_countdown_and_counts_on_same_frame() {
        // Widen the ready band so one angle is both ready and past the down
        // threshold.
        let mut profile = ExerciseProfile::tricep_pushdown();
        profile.primary.ready = Bound::Below(140.0);
        let mut engine = ExerciseEngine::new(profile).unwrap();
        let mut t = 0;
        for _ in 0..30 {
            engine.process_measurements(t, &m(90.0));
            t += FRAME_MS;
        }
        // Countdown started at 29 * 33 = 957 ms.
        let out = engine.process_measurements(957 + 3_000, &m(135.0));
        assert!(out.events.contains(&EngineEvent::CountingStarted));
        assert_eq!(out.phase, Phase::Counting);
        assert_eq!(out.counted_rep(), Some((1, RepVerdict::Correct)));
    }

    #[test]
    fn test_rep_counts_once_and_rearms() {
        let mut engine = tricep();
        let t0 = start_counting(&mut engine);

        let out = engine.process_measurements(t0, &m(135.0));
        assert_eq!(out.counted_rep(), Some((1, RepVerdict::Correct)));
        assert_eq!(out.cycle, RepCycle::Down);

        // Staying down does not count again.
        let out = engine.process_measurements(t0 + 33, &m(170.0));
        assert!(out.counted_rep().is_none());

        let out = engine.process_measurements(t0 + 300, &m(95.0));
        assert_eq!(out.cycle, RepCycle::Up);

        // Within 500 ms of the last rep: no count.
        let out = engine.process_measurements(t0 + 400, &m(135.0));
        assert!(out.counted_rep().is_none());
        engine.process_measurements(t0 + 450, &m(95.0));

        let out = engine.process_measurements(t0 + 700, &m(170.0));
        assert_eq!(out.counted_rep(), Some((2, RepVerdict::Correct)));
        assert_eq!(engine.session().totals.total, 2);
    }

    #[test]
    fn test_instability_rep_is_incorrect_once() {
        let mut engine = tricep();
        let t0 = start_counting(&mut engine);

        let swinging = Measurements {
            instability: 40.0,
            ..m(135.0)
        };
        // Enough frames over the live threshold to activate the debounced
        // fault before the rep is counted.
        for i in 0..8 {
            let holding = Measurements {
                primary: 90.0,
                ..swinging
            };
            engine.process_measurements(t0 + i * FRAME_MS, &holding);
        }
        assert!(engine.is_active(Condition::Issue(IssueKind::ElbowSwinging)));

        let out = engine.process_measurements(t0 + 8 * FRAME_MS, &swinging);
        assert_eq!(out.counted_rep(), Some((1, RepVerdict::Incorrect)));
        assert!(out.shows("Too much elbow swinging on last rep"));
        assert!(out.shows("Stop swinging elbows!"));
        assert_eq!(engine.session().tally[&IssueKind::ElbowSwinging], 1);
        assert_eq!(
            engine.session().rep_log[0].failed,
            vec![IssueKind::ElbowSwinging]
        );
        assert_eq!(out.highlights[0].target, HighlightTarget::IncorrectCounter);
    }

    #[test]
    fn test_back_band_classification() {
        let mut engine = tricep();
        let t0 = start_counting(&mut engine);
        let out = engine.process_measurements(
            t0,
            &Measurements {
                secondary: Some(175.0),
                ..m(140.0)
            },
        );
        assert_eq!(out.counted_rep(), Some((1, RepVerdict::Incorrect)));
        assert!(out.shows("Back too straight on last rep"));
        assert_eq!(engine.session().tally[&IssueKind::BackTooStraight], 1);
        assert_eq!(engine.session().tally[&IssueKind::BackTooTilted], 0);
    }

    #[test]
    fn test_range_of_motion_tallied_without_changing_verdict() {
        let mut engine = tricep();
        let t0 = start_counting(&mut engine);
        engine.process_measurements(t0, &m(140.0));
        engine.process_measurements(t0 + 33, &m(150.0));
        let out = engine.process_measurements(t0 + 66, &m(95.0));

        assert!(out.events.iter().any(|e| matches!(
            e,
            EngineEvent::RangeOfMotionIssue {
                issue: IssueKind::ElbowNotExtended,
                ..
            }
        )));
        assert!(out.shows("Arms not fully extended on last rep"));
        assert_eq!(engine.session().totals.correct, 1);
        assert_eq!(engine.session().tally[&IssueKind::ElbowNotExtended], 1);
    }

    #[test]
    fn test_target_finalizes_exactly_once() {
        let mut engine = tricep();
        let mut t = start_counting(&mut engine);
        let mut completed = 0;
        for _ in 0..12 {
            for angle in [165.0, 95.0] {
                let out = engine.process_measurements(t, &m(angle));
                if out.completed_record().is_some() {
                    completed += 1;
                }
                t += 600;
            }
        }
        assert_eq!(completed, 1);
        assert!(engine.is_finished());
        assert!(engine.finalize().is_none());

        let out = engine.process_measurements(t, &m(165.0));
        assert!(out.finished);
        assert!(out.events.is_empty());
        assert_eq!(out.totals.total, 12);
    }

    #[test]
    fn test_external_finalize_stops_processing() {
        let mut engine = tricep();
        start_counting(&mut engine);
        let record = engine.finalize().unwrap();
        assert_eq!(record.reps.total, 0);
        assert_eq!(record.performance_score, 0);
        assert_eq!(record.exercise, "tricep-pushdown");
        assert!(engine.finalize().is_none());
        assert!(engine.process_missing(99_000).finished);
    }

    #[test]
    fn test_missing_frames_reset_to_waiting_after_limit() {
        let mut engine = tricep();
        let t0 = start_counting(&mut engine);
        engine.process_measurements(t0, &m(140.0));

        let mut reset_frames = 0;
        for i in 1..=40 {
            let out = engine.process_missing(t0 + i * FRAME_MS);
            if out.events.contains(&EngineEvent::TrackingReset) {
                reset_frames += 1;
                assert_eq!(i, 30);
            }
        }
        assert_eq!(reset_frames, 1);
        assert_eq!(engine.session().phase, Phase::Waiting);
        assert_eq!(engine.session().totals.total, 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut engine = tricep();
        let t0 = start_counting(&mut engine);
        engine.process_measurements(t0, &m(140.0));
        engine.reset();
        assert_eq!(engine.session().totals.total, 0);
        assert_eq!(engine.frames_processed(), 0);
        assert_eq!(engine.session().phase, Phase::Waiting);
    }

    fn degenerate_skeleton() -> Skeleton {
        Skeleton::from_array([Keypoint::new(50.0, 50.0, 0.9); JOINT_COUNT])
    }

    #[test]
    fn test_degenerate_geometry_uses_sentinel_without_nan() {
        let mut engine = tricep();
        let out = engine.process_frame(&PoseFrame::with_skeleton(0, degenerate_skeleton()));
        let measured = out.measurements.unwrap();
        assert_eq!(measured.primary, DEGENERATE_ANGLE);
        assert!(measured.secondary.unwrap().is_finite());
        assert_eq!(measured.lean, Some(0.0));
        assert_eq!(out.side, Some(Side::Right));
    }

    #[test]
    fn test_low_confidence_frame_counts_as_missing() {
        let mut engine = tricep();
        let mut skeleton = degenerate_skeleton();
        for joint in [
            Joint::LeftShoulder,
            Joint::RightShoulder,
            Joint::LeftElbow,
        ] {
            skeleton.get_mut(joint).confidence = 0.1;
        }
        engine.process_frame(&PoseFrame::with_skeleton(0, skeleton));
        assert_eq!(engine.session().missed_frames, 1);
    }
}
