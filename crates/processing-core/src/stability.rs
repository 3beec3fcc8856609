//! Rolling-window instability detection.
//!
//! Each frame contributes one horizontal offset between two joints (for
//! example elbow relative to shoulder). The per-frame range of the recent,
//! outlier-trimmed offsets is averaged over a second window to produce an
//! instability score in pixels. Steady joints score near zero; a swinging
//! joint scores roughly its peak-to-peak amplitude.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Window sizes and trimming for [`StabilityWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityWindowConfig {
    /// Raw offset samples kept.
    pub offset_window: usize,

    /// Per-frame range values averaged into the score.
    pub range_window: usize,

    /// Fraction trimmed from each end of the sorted offsets.
    pub trim_fraction: f64,

    /// Trimming only applies above this many samples.
    pub trim_min_samples: usize,
}

impl Default for StabilityWindowConfig {
    fn default() -> Self {
        Self {
            offset_window: 30,
            range_window: 20,
            trim_fraction: 0.1,
            trim_min_samples: 10,
        }
    }
}

/// Sliding windows of raw offsets and their trimmed ranges.
#[derive(Debug, Clone)]
pub struct StabilityWindow {
    config: StabilityWindowConfig,
    offsets: VecDeque<f64>,
    ranges: VecDeque<f64>,
}

impl StabilityWindow {
    pub fn new(config: StabilityWindowConfig) -> Self {
        Self {
            offsets: VecDeque::with_capacity(config.offset_window),
            ranges: VecDeque::with_capacity(config.range_window),
            config,
        }
    }

    /// Push an offset and return the current instability score.
    ///
    /// Returns 0 until three offsets have been seen.
    pub fn update(&mut self, offset: f64) -> f64 {
        push_bounded(&mut self.offsets, offset, self.config.offset_window);
        if self.offsets.len() < 3 {
            return 0.0;
        }

        let mut sorted: Vec<f64> = self.offsets.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let trim = if sorted.len() > self.config.trim_min_samples {
            (sorted.len() as f64 * self.config.trim_fraction).floor() as usize
        } else {
            0
        };
        let kept = &sorted[trim..sorted.len() - trim];
        let range = match (kept.first(), kept.last()) {
            (Some(min), Some(max)) => max - min,
            _ => 0.0,
        };

        push_bounded(&mut self.ranges, range, self.config.range_window);
        self.score()
    }

    /// Mean of the recent ranges; 0 when none have been recorded.
    pub fn score(&self) -> f64 {
        if self.ranges.is_empty() {
            0.0
        } else {
            self.ranges.iter().sum::<f64>() / self.ranges.len() as f64
        }
    }

    pub fn offset_len(&self) -> usize {
        self.offsets.len()
    }

    pub fn range_len(&self) -> usize {
        self.ranges.len()
    }

    pub fn reset(&mut self) {
        self.offsets.clear();
        self.ranges.clear();
    }
}

fn push_bounded(buffer: &mut VecDeque<f64>, value: f64, capacity: usize) {
    buffer.push_back(value);
    while buffer.len() > capacity.max(1) {
        buffer.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_needs_three_samples() {
        let mut w = StabilityWindow::new(StabilityWindowConfig::default());
        assert_eq!(w.update(0.0), 0.0);
        assert_eq!(w.update(100.0), 0.0);
        assert_eq!(w.range_len(), 0);
        assert_eq!(w.update(50.0), 100.0);
        assert_eq!(w.range_len(), 1);
    }

    #[test]
    fn test_constant_offset_scores_zero() {
        let mut w = StabilityWindow::new(StabilityWindowConfig::default());
        let mut score = f64::NAN;
        for _ in 0..25 {
            score = w.update(12.5);
        }
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_alternating_offset_scores_near_hundred() {
        let mut w = StabilityWindow::new(StabilityWindowConfig::default());
        let mut score = 0.0;
        for i in 0..60 {
            score = w.update(if i % 2 == 0 { 50.0 } else { -50.0 });
        }
        assert!((score - 100.0).abs() < 1e-9, "score = {score}");
    }

    #[test]
    fn test_trimming_rejects_lone_outlier() {
        let mut w = StabilityWindow::new(StabilityWindowConfig::default());
        for _ in 0..20 {
            w.update(0.0);
        }
        w.reset();
        for _ in 0..15 {
            w.update(0.0);
        }
        // 16 samples: one is trimmed from each end.
        let score = w.update(80.0);
        assert!(score < 1e-9, "score = {score}");
    }

    proptest! {
        #[test]
        fn prop_windows_never_exceed_capacity(
            offsets in proptest::collection::vec(-500.0f64..500.0, 0..120)
        ) {
            let mut w = StabilityWindow::new(StabilityWindowConfig::default());
            for offset in offsets {
                let score = w.update(offset);
                prop_assert!(score >= 0.0);
                prop_assert!(w.offset_len() <= 30);
                prop_assert!(w.range_len() <= 20);
            }
        }
    }
}
