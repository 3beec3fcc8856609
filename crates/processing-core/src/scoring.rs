//! Performance score for a finished session.

use repcoach_pose_model::results::{IssueTally, RepBreakdown};

use crate::profile::PenaltyPolicy;

/// Points deducted for the recorded form issues.
pub fn penalty(tally: &IssueTally, policy: PenaltyPolicy) -> f64 {
    match policy {
        PenaltyPolicy::TotalOccurrencesCapped { cap } => {
            let total: u64 = tally.values().map(|count| *count as u64).sum();
            total.min(cap as u64) as f64
        }
        PenaltyPolicy::PerDistinctIssue { points } => {
            let distinct = tally.values().filter(|count| **count > 0).count();
            (distinct as u64 * points as u64) as f64
        }
    }
}

/// `round(100 * correct / total - penalty)`, clamped to `[0, 100]`.
/// A session without reps scores 0 before the penalty.
pub fn performance_score(reps: &RepBreakdown, tally: &IssueTally, policy: PenaltyPolicy) -> u8 {
    let rep_score = if reps.total > 0 {
        100.0 * reps.correct as f64 / reps.total as f64
    } else {
        0.0
    };
    (rep_score - penalty(tally, policy)).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use repcoach_pose_model::results::IssueKind;

    fn reps(total: u32, correct: u32) -> RepBreakdown {
        RepBreakdown {
            total,
            correct,
            incorrect: total - correct,
        }
    }

    fn tally(entries: &[(IssueKind, u32)]) -> IssueTally {
        entries.iter().copied().collect()
    }

    const CAPPED: PenaltyPolicy = PenaltyPolicy::TotalOccurrencesCapped { cap: 25 };
    const DISTINCT: PenaltyPolicy = PenaltyPolicy::PerDistinctIssue { points: 5 };

    #[test]
    fn test_perfect_session() {
        let t = tally(&[(IssueKind::ElbowSwinging, 0), (IssueKind::BackTooTilted, 0)]);
        assert_eq!(performance_score(&reps(12, 12), &t, CAPPED), 100);
    }

    #[test]
    fn test_no_reps_scores_zero() {
        assert_eq!(performance_score(&reps(0, 0), &IssueTally::new(), CAPPED), 0);
    }

    #[test]
    fn test_capped_penalty() {
        let t = tally(&[(IssueKind::ElbowSwinging, 3), (IssueKind::BackTooStraight, 2)]);
        assert_eq!(penalty(&t, CAPPED), 5.0);
        // 100 * 9/12 = 75, minus 5
        assert_eq!(performance_score(&reps(12, 9), &t, CAPPED), 70);

        let t = tally(&[(IssueKind::ElbowSwinging, 40)]);
        assert_eq!(penalty(&t, CAPPED), 25.0);
    }

    #[test]
    fn test_distinct_penalty() {
        let t = tally(&[
            (IssueKind::KneesDrifting, 7),
            (IssueKind::NotDeepEnough, 1),
            (IssueKind::TorsoTooFarForward, 0),
        ]);
        assert_eq!(penalty(&t, DISTINCT), 10.0);
        assert_eq!(performance_score(&reps(10, 8), &t, DISTINCT), 70);
    }

    #[test]
    fn test_score_rounds_and_clamps() {
        // 100 * 2/3 = 66.67
        assert_eq!(performance_score(&reps(3, 2), &IssueTally::new(), CAPPED), 67);
        let t = tally(&[(IssueKind::ElbowSwinging, 25)]);
        assert_eq!(performance_score(&reps(4, 1), &t, CAPPED), 0);
    }
}
