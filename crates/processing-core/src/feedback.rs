//! Debounced, persisted feedback messages.
//!
//! Raw per-frame conditions are noisy. Each condition owns a hysteresis
//! counter: it activates only after `threshold` net true frames and
//! deactivates only once the counter has drained back to zero. Active
//! conditions keep their message on screen; once released the message fades
//! out over `persistence` frames (or disappears at once, depending on the
//! [`ReleasePolicy`]).
//!
//! Call [`FeedbackDebouncer::tick`] once per frame *before* that frame's
//! updates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use repcoach_pose_model::output::{FeedbackView, Severity};

/// Lowest opacity a fading message is drawn with.
pub const MIN_OPACITY: f64 = 0.3;

/// Headroom above the threshold the counter may climb to.
const COUNTER_HEADROOM: u32 = 5;

/// What happens to a message when its condition deactivates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleasePolicy {
    /// The message ages out over its remaining persistence.
    Decay,
    /// The message is removed on the deactivating frame.
    Immediate,
}

/// Debounce constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Net true frames needed to activate a condition.
    pub threshold: u32,
    /// Frames a message stays visible after last being refreshed.
    pub persistence: u32,
    pub release: ReleasePolicy,
}

#[derive(Debug, Clone, Copy, Default)]
struct ConditionState {
    counter: u32,
    active: bool,
}

#[derive(Debug, Clone)]
struct Entry<K> {
    message: String,
    severity: Severity,
    remaining: u32,
    owner: Option<K>,
}

/// Per-condition hysteresis plus the list of visible messages.
#[derive(Debug, Clone)]
pub struct FeedbackDebouncer<K> {
    config: DebounceConfig,
    conditions: BTreeMap<K, ConditionState>,
    entries: Vec<Entry<K>>,
}

impl<K: Ord + Clone> FeedbackDebouncer<K> {
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            conditions: BTreeMap::new(),
            entries: Vec::new(),
        }
    }

    /// Age every message by one frame and drop the expired ones.
    pub fn tick(&mut self) {
        for entry in &mut self.entries {
            entry.remaining = entry.remaining.saturating_sub(1);
        }
        self.entries.retain(|entry| entry.remaining > 0);
    }

    /// Feed this frame's value of a condition. Returns whether the condition
    /// is active afterwards.
    pub fn update(&mut self, key: K, condition: bool, message: &str, severity: Severity) -> bool {
        let threshold = self.config.threshold.max(1);
        let state = self.conditions.entry(key.clone()).or_default();

        if condition {
            state.counter = (state.counter + 1).min(threshold + COUNTER_HEADROOM);
            if state.counter >= threshold {
                state.active = true;
            }
            let active = state.active;
            if active {
                self.upsert(message, severity, Some(key));
            }
            active
        } else {
            state.counter = state.counter.saturating_sub(1);
            if state.counter == 0 && state.active {
                state.active = false;
                if self.config.release == ReleasePolicy::Immediate {
                    self.entries
                        .retain(|entry| entry.owner.as_ref() != Some(&key));
                }
            }
            state.active
        }
    }

    /// Show a message at full persistence without debouncing.
    pub fn push_notice(&mut self, message: &str, severity: Severity) {
        self.upsert(message, severity, None);
    }

    pub fn is_active(&self, key: &K) -> bool {
        self.conditions.get(key).is_some_and(|state| state.active)
    }

    /// Current hysteresis counter for `key`.
    pub fn counter(&self, key: &K) -> u32 {
        self.conditions.get(key).map_or(0, |state| state.counter)
    }

    /// Visible messages, oldest first.
    pub fn views(&self) -> Vec<FeedbackView> {
        let persistence = self.config.persistence.max(1) as f64;
        self.entries
            .iter()
            .map(|entry| FeedbackView {
                message: entry.message.clone(),
                severity: entry.severity,
                opacity: (entry.remaining as f64 / persistence).clamp(MIN_OPACITY, 1.0),
            })
            .collect()
    }

    /// Remaining persistence of the message with this text.
    pub fn remaining(&self, message: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.message == message)
            .map(|entry| entry.remaining)
    }

    pub fn reset(&mut self) {
        self.conditions.clear();
        self.entries.clear();
    }

    fn upsert(&mut self, message: &str, severity: Severity, owner: Option<K>) {
        let persistence = self.config.persistence.max(1);
        match self.entries.iter_mut().find(|entry| entry.message == message) {
            Some(entry) => {
                entry.remaining = persistence;
                entry.severity = severity;
                if owner.is_some() {
                    entry.owner = owner;
                }
            }
            None => self.entries.push(Entry {
                message: message.to_string(),
                severity,
                remaining: persistence,
                owner,
            }),
        }
    }
}
