use chrono::{DateTime, Local};
use std::collections::VecDeque;

use super::pomodoro::SESSION_HISTORY_LIMIT;

/// One finished work session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEntry {
    pub finished_at: DateTime<Local>,
    pub cycle: u32,
    pub duration_secs: u64,
}

impl SessionEntry {
    pub fn label(&self) -> String {
        format!(
            "[{}] Work session completed (#{}, {}m)",
            self.finished_at.format("%H:%M:%S"),
            self.cycle,
            self.duration_secs / 60
        )
    }
}

/// Most recent sessions, oldest first. Pushing past capacity drops the oldest.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    entries: VecDeque<SessionEntry>,
    capacity: usize,
}

impl SessionHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: SessionEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::with_capacity(SESSION_HISTORY_LIMIT)
    }
}
