//! Session results and bounded session history.
//!
//! A [`ResultsRecord`] is produced once when a session finishes and is never
//! mutated afterwards. [`SessionHistory`] keeps the most recent records.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

/// Current results-record schema version.
pub const RESULTS_VERSION: &str = "1.0";

/// Number of records kept in the session history.
pub const HISTORY_CAPACITY: usize = 20;

/// A form fault the trainer tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    ElbowNotExtended,
    BackTooStraight,
    BackTooTilted,
    ElbowLeaningForward,
    ElbowSwinging,
    TorsoTooFarForward,
    KneesDrifting,
    NotDeepEnough,
}

impl IssueKind {
    /// Title-case label used in text summaries.
    pub fn label(self) -> &'static str {
        match self {
            IssueKind::ElbowNotExtended => "Elbow Not Extended",
            IssueKind::BackTooStraight => "Back Too Straight",
            IssueKind::BackTooTilted => "Back Too Tilted",
            IssueKind::ElbowLeaningForward => "Elbow Leaning Forward",
            IssueKind::ElbowSwinging => "Elbow Swinging",
            IssueKind::TorsoTooFarForward => "Torso Too Far Forward",
            IssueKind::KneesDrifting => "Knees Drifting",
            IssueKind::NotDeepEnough => "Not Deep Enough",
        }
    }
}

/// Occurrence count per issue kind.
pub type IssueTally = BTreeMap<IssueKind, u32>;

/// Rep totals for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepBreakdown {
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
}

/// Classification of a single counted rep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepVerdict {
    Correct,
    Incorrect,
}

/// Measurements captured at the moment a rep was counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepSnapshot {
    /// 1-based rep number within the session.
    pub rep: u32,

    /// Processed-frame index at count time.
    pub frame: u64,

    /// Frame timestamp (ms since stream start).
    pub timestamp_ms: u64,

    /// Smoothed primary angle (degrees).
    pub primary: f64,

    /// Smoothed secondary angle, when the exercise tracks one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<f64>,

    /// Smoothed lean angle, when the exercise tracks one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lean: Option<f64>,

    /// Instability score (pixels).
    pub instability: f64,

    pub verdict: RepVerdict,

    /// Issues that made this rep incorrect.
    #[serde(default)]
    pub failed: Vec<IssueKind>,
}

/// The immutable record written when a session finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsRecord {
    /// Schema version.
    pub version: String,

    /// Unique session identifier (UUID v4).
    pub session_id: String,

    /// Human-readable workout name (e.g. "Tricep Pushdown").
    pub workout_name: String,

    /// Exercise identifier (e.g. `tricep-pushdown`).
    pub exercise: String,

    /// Session start (RFC 3339).
    pub started_at: String,

    /// Session end (RFC 3339).
    pub finished_at: String,

    /// Always 1: one set per session.
    pub sets: u32,

    pub reps: RepBreakdown,

    /// Occurrence count per tracked issue.
    pub form_issues: IssueTally,

    /// Overall score in `[0, 100]`.
    pub performance_score: u8,

    /// One entry per counted rep.
    #[serde(default)]
    pub rep_log: Vec<RepSnapshot>,
}

impl ResultsRecord {
    /// Build a record stamped with a fresh session id and the current time.
    pub fn new(
        workout_name: impl Into<String>,
        exercise: impl Into<String>,
        started_at: impl Into<String>,
        reps: RepBreakdown,
        form_issues: IssueTally,
        performance_score: u8,
        rep_log: Vec<RepSnapshot>,
    ) -> Self {
        Self {
            version: RESULTS_VERSION.to_string(),
            session_id: uuid::Uuid::new_v4().to_string(),
            workout_name: workout_name.into(),
            exercise: exercise.into(),
            started_at: started_at.into(),
            finished_at: chrono::Utc::now().to_rfc3339(),
            sets: 1,
            reps,
            form_issues,
            performance_score: performance_score.min(100),
            rep_log,
        }
    }

    /// Occurrences of `kind`; zero when untracked.
    pub fn issue_count(&self, kind: IssueKind) -> u32 {
        self.form_issues.get(&kind).copied().unwrap_or(0)
    }

    /// File stem used for exported results (`exercise_results_<id>`).
    pub fn export_file_stem(&self) -> String {
        format!("exercise_results_{}", self.session_id)
    }

    /// Plain-text summary for export.
    pub fn summary_text(&self) -> String {
        let when = chrono::DateTime::parse_from_rfc3339(&self.finished_at)
            .map(|t| t.format("%Y-%m-%d at %H:%M:%S").to_string())
            .unwrap_or_else(|_| self.finished_at.clone());

        let mut out = String::new();
        out.push_str("Exercise Results:\n");
        out.push_str("------------------------\n");
        out.push_str(&format!("Workout: {}\n", self.workout_name));
        out.push_str(&format!("Date: {when}\n"));
        out.push_str(&format!("Sets: {}\n", self.sets));
        out.push_str(&format!("Total Repetitions: {}\n", self.reps.total));
        out.push_str(&format!("Correct Repetitions: {}\n", self.reps.correct));
        out.push_str(&format!("Incorrect Repetitions: {}\n", self.reps.incorrect));
        out.push('\n');
        out.push_str(&format!("Performance Score: {}%\n", self.performance_score));
        out.push('\n');
        out.push_str("Form Issues:\n");
        out.push_str("------------------------\n");
        for (kind, count) in &self.form_issues {
            out.push_str(&format!("{}: {} times\n", kind.label(), count));
        }
        out
    }
}

/// The most recent session records, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ResultsRecord>", into = "Vec<ResultsRecord>")]
pub struct SessionHistory {
    records: VecDeque<ResultsRecord>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, evicting the oldest one past [`HISTORY_CAPACITY`].
    /// Returns the evicted record, if any.
    pub fn push(&mut self, record: ResultsRecord) -> Option<ResultsRecord> {
        self.records.push_back(record);
        if self.records.len() > HISTORY_CAPACITY {
            self.records.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recently added record.
    pub fn latest(&self) -> Option<&ResultsRecord> {
        self.records.back()
    }

    /// Records from oldest to newest.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, ResultsRecord> {
        self.records.iter()
    }

    /// Records from newest to oldest.
    pub fn newest_first(&self) -> impl Iterator<Item = &ResultsRecord> {
        self.records.iter().rev()
    }
}

impl From<Vec<ResultsRecord>> for SessionHistory {
    fn from(records: Vec<ResultsRecord>) -> Self {
        let skip = records.len().saturating_sub(HISTORY_CAPACITY);
        Self {
            records: records.into_iter().skip(skip).collect(),
        }
    }
}

impl From<SessionHistory> for Vec<ResultsRecord> {
    fn from(history: SessionHistory) -> Self {
        history.records.into()
    }
}
