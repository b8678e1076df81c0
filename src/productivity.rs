//! Productivity scoring and aggregation.
//!
//! Turns a user's tasks into a [`ProductivityReport`]: per-day weighted
//! completion scores, an overall score, the longest streak of good days, the
//! most productive day and a category breakdown.
//!
//! Everything here is a pure function of its inputs. `now` and the
//! [`DayBoundary`] are always passed in, so a report can be reproduced exactly.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use crate::calendar::{DayBoundary, TimeRange};
use crate::model::{Priority, Task};

/// Points for a high-priority task.
pub const HIGH_PRIORITY_WEIGHT: u64 = 45;

/// Points for a medium-priority task.
pub const MEDIUM_PRIORITY_WEIGHT: u64 = 35;

/// Points for a low-priority task.
pub const LOW_PRIORITY_WEIGHT: u64 = 20;

/// Minimum day score that extends a streak.
pub const STREAK_THRESHOLD: u8 = 50;

/// Scoring weight of a priority. Unrecognized priorities are worth nothing.
pub fn priority_weight(priority: &Priority) -> u64 {
    match priority {
        Priority::High => HIGH_PRIORITY_WEIGHT,
        Priority::Medium => MEDIUM_PRIORITY_WEIGHT,
        Priority::Low => LOW_PRIORITY_WEIGHT,
        Priority::Unrecognized(_) => 0,
    }
}

/// Task counts split by priority tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
    pub unrecognized: u32,
}

impl TierCounts {
    fn record(&mut self, priority: &Priority) {
        match priority {
            Priority::High => self.high += 1,
            Priority::Medium => self.medium += 1,
            Priority::Low => self.low += 1,
            Priority::Unrecognized(_) => self.unrecognized += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.high + self.medium + self.low + self.unrecognized
    }

    /// Sum of weights over every counted task.
    pub fn weighted(&self) -> u64 {
        u64::from(self.high) * HIGH_PRIORITY_WEIGHT
            + u64::from(self.medium) * MEDIUM_PRIORITY_WEIGHT
            + u64::from(self.low) * LOW_PRIORITY_WEIGHT
    }
}

/// Tasks created on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    pub date: NaiveDate,
    pub total: TierCounts,
    pub completed: TierCounts,
    pub productivity_score: u8,
}

impl DayBucket {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            total: TierCounts::default(),
            completed: TierCounts::default(),
            productivity_score: 0,
        }
    }

    fn record(&mut self, task: &Task) {
        self.total.record(&task.priority);
        if task.completed {
            self.completed.record(&task.priority);
        }
    }

    pub fn total_tasks(&self) -> u32 {
        self.total.total()
    }

    pub fn completed_tasks(&self) -> u32 {
        self.completed.total()
    }
}

/// One point of the charting series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub score: u8,
    pub total_tasks: u32,
    pub completed_tasks: u32,
}

/// Productivity analytics for one user over one time range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityReport {
    pub timeframe: TimeRange,

    /// Mean of the per-day scores, 0-100.
    #[serde(rename = "productivityScore")]
    pub overall_score: u8,

    pub total_tasks: usize,

    pub completed_tasks: usize,

    /// Unweighted completed / total as a percentage with two decimals.
    pub completion_rate: f64,

    /// Incomplete high-priority tasks across the whole input, ignoring the
    /// time range.
    pub high_priority_pending: usize,

    /// Earliest day with the highest score. `None` when no day scored above 0.
    pub most_productive_day: Option<NaiveDate>,

    /// Longest run of consecutive day buckets scoring at least
    /// [`STREAK_THRESHOLD`]. Days without tasks have no bucket and so do not
    /// interrupt a run.
    pub streak: usize,

    /// Task count per category in the window. Absent categories are omitted.
    pub category_breakdown: BTreeMap<String, usize>,

    /// Per-day scores and counts in ascending date order.
    pub daily_series: Vec<DailyPoint>,
}

/// Weighted completion score in 0-100.
///
/// `actual / potential * 100`, rounded half up and capped at 100. With no
/// potential, any completed task scores 100 and nothing scores 0.
pub fn score(potential: u64, actual: u64, completed_tasks: u32) -> u8 {
    if potential > 0 {
        let rounded = (actual * 200 + potential) / (potential * 2);
        rounded.min(100) as u8
    } else if completed_tasks > 0 {
        100
    } else {
        0
    }
}

/// Build the productivity report for `tasks` over `range` ending at `now`.
pub fn compute_report(
    tasks: &[Task],
    range: TimeRange,
    now: DateTime<Utc>,
    boundary: DayBoundary,
) -> ProductivityReport {
    let window = range.window(now, boundary);
    let filtered: Vec<&Task> = tasks
        .iter()
        .filter(|task| window.contains(task.created_at))
        .collect();

    let days = bucket_by_day(&filtered, boundary);

    let total_tasks = filtered.len();
    let completed_tasks = filtered.iter().filter(|task| task.completed).count();
    let completion_rate = if total_tasks > 0 {
        (completed_tasks as f64 / total_tasks as f64 * 10_000.0).round() / 100.0
    } else {
        0.0
    };

    let high_priority_pending = tasks
        .iter()
        .filter(|task| task.priority == Priority::High && !task.completed)
        .count();

    let mut category_breakdown = BTreeMap::new();
    for task in &filtered {
        *category_breakdown
            .entry(task.category.as_str().to_string())
            .or_insert(0) += 1;
    }

    let report = ProductivityReport {
        timeframe: range,
        overall_score: overall_score(&days, &filtered),
        total_tasks,
        completed_tasks,
        completion_rate,
        high_priority_pending,
        most_productive_day: most_productive_day(&days),
        streak: longest_streak(&days),
        category_breakdown,
        daily_series: days
            .iter()
            .map(|day| DailyPoint {
                date: day.date,
                score: day.productivity_score,
                total_tasks: day.total_tasks(),
                completed_tasks: day.completed_tasks(),
            })
            .collect(),
    };

    debug!(
        timeframe = %range,
        boundary = %boundary,
        input = tasks.len(),
        in_window = total_tasks,
        days = days.len(),
        score = report.overall_score,
        "Productivity report computed"
    );

    report
}

/// Group tasks by calendar day and score each day. Ascending by date.
pub fn bucket_by_day(tasks: &[&Task], boundary: DayBoundary) -> Vec<DayBucket> {
    let mut by_date: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();

    for task in tasks {
        let date = boundary.day_of(task.created_at);
        by_date
            .entry(date)
            .or_insert_with(|| DayBucket::new(date))
            .record(task);
    }

    by_date
        .into_values()
        .map(|mut day| {
            day.productivity_score = score(
                day.total.weighted(),
                day.completed.weighted(),
                day.completed_tasks(),
            );
            day
        })
        .collect()
}

/// Rounded mean of the day scores.
///
/// With no day buckets the score is computed directly over `tasks` with the
/// per-day formula.
pub(crate) fn overall_score(days: &[DayBucket], tasks: &[&Task]) -> u8 {
    if days.is_empty() {
        let mut total = TierCounts::default();
        let mut completed = TierCounts::default();
        for task in tasks {
            total.record(&task.priority);
            if task.completed {
                completed.record(&task.priority);
            }
        }
        return score(total.weighted(), completed.weighted(), completed.total());
    }

    let sum: u64 = days.iter().map(|day| u64::from(day.productivity_score)).sum();
    let count = days.len() as u64;
    ((sum * 2 + count) / (count * 2)).min(100) as u8
}

/// Longest run of consecutive buckets at or above [`STREAK_THRESHOLD`].
pub fn longest_streak(days: &[DayBucket]) -> usize {
    let mut best = 0;
    let mut current = 0;
    for day in days {
        if day.productivity_score >= STREAK_THRESHOLD {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

/// First bucket whose score beats every earlier one.
pub fn most_productive_day(days: &[DayBucket]) -> Option<NaiveDate> {
    let mut best_score = 0;
    let mut best_day = None;
    for day in days {
        if day.productivity_score > best_score {
            best_score = day.productivity_score;
            best_day = Some(day.date);
        }
    }
    best_day
}
