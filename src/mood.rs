//! Mood insights: distribution, per-day counts and recent entries.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use crate::calendar::{DayBoundary, TimeRange};
use crate::model::{Mood, MoodEntry};

/// Number of entries returned in [`MoodInsights::recent`].
pub const RECENT_ENTRY_LIMIT: usize = 5;

/// Mood counts for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoodDay {
    pub date: NaiveDate,
    pub counts: BTreeMap<Mood, usize>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodInsights {
    pub timeframe: TimeRange,

    pub total_entries: usize,

    /// Count per mood in the window. Every mood is present, zeros included.
    pub distribution: BTreeMap<Mood, usize>,

    pub daily_series: Vec<MoodDay>,

    /// Newest entries regardless of the time range.
    pub recent: Vec<MoodEntry>,
}

fn zeroed() -> BTreeMap<Mood, usize> {
    Mood::ALL.into_iter().map(|mood| (mood, 0)).collect()
}

pub fn compute_insights(
    entries: &[MoodEntry],
    range: TimeRange,
    now: DateTime<Utc>,
    boundary: DayBoundary,
) -> MoodInsights {
    let window = range.window(now, boundary);

    let mut distribution = zeroed();
    let mut by_date: BTreeMap<NaiveDate, MoodDay> = BTreeMap::new();
    let mut total_entries = 0;

    for entry in entries.iter().filter(|e| window.contains(e.created_at)) {
        total_entries += 1;
        *distribution.entry(entry.mood).or_insert(0) += 1;

        let date = boundary.day_of(entry.created_at);
        let day = by_date.entry(date).or_insert_with(|| MoodDay {
            date,
            counts: zeroed(),
            total: 0,
        });
        *day.counts.entry(entry.mood).or_insert(0) += 1;
        day.total += 1;
    }

    let mut recent: Vec<MoodEntry> = entries.to_vec();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(RECENT_ENTRY_LIMIT);

    debug!(
        timeframe = %range,
        input = entries.len(),
        in_window = total_entries,
        "Mood insights computed"
    );

    MoodInsights {
        timeframe: range,
        total_entries,
        distribution,
        daily_series: by_date.into_values().collect(),
        recent,
    }
}
