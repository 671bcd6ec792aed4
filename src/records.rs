//! Mission records leaderboard
//!
//! Top 10 successful missions, ranked by time left on the clock. Stored by
//! `ProgressStore` as its own document.

use serde::{Deserialize, Serialize};

use crate::sim::Difficulty;

/// Maximum number of records to keep
pub const MAX_RECORDS: usize = 10;

/// A single successful mission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEntry {
    /// Seconds left when the last objective landed
    pub time_remaining: f32,
    pub objectives: u32,
    /// Detection level at the end
    pub detection: f32,
    pub difficulty: Difficulty,
    /// Unix timestamp (seconds) when achieved
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MissionRecords {
    pub entries: Vec<RecordEntry>,
}

impl MissionRecords {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a finishing time qualifies for the board
    pub fn qualifies(&self, time_remaining: f32) -> bool {
        if time_remaining <= 0.0 {
            return false;
        }
        if self.entries.len() < MAX_RECORDS {
            return true;
        }
        self.entries
            .last()
            .map(|e| time_remaining > e.time_remaining)
            .unwrap_or(true)
    }

    /// Rank a time would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, time_remaining: f32) -> Option<usize> {
        if !self.qualifies(time_remaining) {
            return None;
        }
        let rank = self
            .entries
            .iter()
            .position(|e| time_remaining > e.time_remaining);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a record if it qualifies. Returns the rank achieved (1-indexed).
    pub fn add(&mut self, entry: RecordEntry) -> Option<usize> {
        if !self.qualifies(entry.time_remaining) {
            return None;
        }

        // Sorted descending by time remaining; ties keep the older entry first
        let pos = self
            .entries
            .iter()
            .position(|e| entry.time_remaining > e.time_remaining);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_RECORDS);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best_time(&self) -> Option<f32> {
        self.entries.first().map(|e| e.time_remaining)
    }
}

/// Current Unix time in seconds (0 if the clock is before the epoch)
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Format a timestamp relative to `now` ("Just now", "3 mins ago", ...)
pub fn format_age(timestamp: u64, now: u64) -> String {
    let secs = now.saturating_sub(timestamp);
    let mins = secs / 60;
    let hours = mins / 60;
    let days = hours / 24;

    if days >= 1 {
        if days == 1 {
            "Yesterday".to_string()
        } else {
            format!("{} days ago", days)
        }
    } else if hours >= 1 {
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if mins >= 1 {
        if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", mins)
        }
    } else {
        "Just now".to_string()
    }
}
