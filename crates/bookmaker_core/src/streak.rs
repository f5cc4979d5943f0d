//! crates/bookmaker_core/src/streak.rs
//!
//! Run-length scans over sorted, distinct calendar keys.

use crate::date::{CalendarDate, YearMonth};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Streak {
    /// Consecutive finishing days ending today; 0 if nothing was finished today.
    pub current: u64,
    /// Longest run of consecutive finishing days anywhere in the history.
    pub max: u64,
}

/// Longest run in `keys` where each key is the successor of the one before.
///
/// `keys` must be ascending and free of duplicates. Any gap resets the run to 1.
pub fn longest_run<K, I, F>(keys: I, successor: F) -> u64
where
    K: Copy + PartialEq,
    I: IntoIterator<Item = K>,
    F: Fn(K) -> Option<K>,
{
    let mut max = 0;
    let mut current = 0;
    let mut prev: Option<K> = None;
    for key in keys {
        current = match prev {
            Some(p) if successor(p) == Some(key) => current + 1,
            _ => 1,
        };
        max = max.max(current);
        prev = Some(key);
    }
    max
}

/// Day streaks over the set of days that have at least one finish.
pub fn day_streak(days: &BTreeSet<CalendarDate>, today: CalendarDate) -> Streak {
    let max = longest_run(days.iter().copied(), |d| d.next_day());

    let mut current = 0;
    let mut cursor = Some(today);
    while let Some(day) = cursor.filter(|d| days.contains(d)) {
        current += 1;
        cursor = day.prev_day();
    }

    Streak { current, max }
}

/// Longest run of consecutive months that each have at least one finish.
pub fn month_streak<'a, I>(months: I) -> u64
where
    I: IntoIterator<Item = &'a YearMonth>,
{
    longest_run(months.into_iter().copied(), |m| Some(m.next()))
}
