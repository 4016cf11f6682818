use std::cmp::Ordering;

use crate::models::domain::LeaderboardEntry;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// A validated result count; anything unusable falls back to the default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeaderboardLimit(usize);

impl LeaderboardLimit {
    pub fn from_query(raw: Option<&str>) -> Self {
        let limit = raw
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|value| *value > 0)
            .map(|value| (value as u64).min(MAX_LIMIT as u64) as usize)
            .unwrap_or(DEFAULT_LIMIT);
        LeaderboardLimit(limit)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for LeaderboardLimit {
    fn default() -> Self {
        LeaderboardLimit(DEFAULT_LIMIT)
    }
}

fn compare_avg_time(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Accuracy desc, then volume desc, then fastest average first; untimed entries last on ties.
pub fn compare_entries(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.accuracy_rate
        .total_cmp(&a.accuracy_rate)
        .then_with(|| b.total_questions.cmp(&a.total_questions))
        .then_with(|| compare_avg_time(a.avg_answer_time_ms, b.avg_answer_time_ms))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

pub fn rank(mut entries: Vec<LeaderboardEntry>, limit: LeaderboardLimit) -> Vec<LeaderboardEntry> {
    entries.sort_by(compare_entries);
    entries.truncate(limit.get());
    entries
}
