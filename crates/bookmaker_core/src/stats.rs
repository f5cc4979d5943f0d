//! crates/bookmaker_core/src/stats.rs
//!
//! Reading statistics shown on the dashboard, summarised from the derived indexes.

use crate::context::EvaluationContext;
use crate::streak::Streak;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingExtremes {
    pub has1: bool,
    pub has5: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingStats {
    pub total_reads: u64,
    pub by_day: BTreeMap<String, u64>,
    pub by_week: BTreeMap<String, u64>,
    pub by_month: BTreeMap<String, u64>,
    pub by_year: BTreeMap<String, u64>,
    pub by_author: BTreeMap<String, u64>,
    pub unique_authors: u64,
    pub streak: Streak,
    pub last_five_authors: Vec<String>,
    pub month_rating_extremes: BTreeMap<String, RatingExtremes>,
}

impl ReadingStats {
    pub fn from_context(ctx: &EvaluationContext<'_>) -> Self {
        fn keyed<K: ToString>(map: &BTreeMap<K, u64>) -> BTreeMap<String, u64> {
            map.iter().map(|(k, v)| (k.to_string(), *v)).collect()
        }

        let mut month_rating_extremes: BTreeMap<String, RatingExtremes> = BTreeMap::new();
        for entry in &ctx.finished_sorted {
            if let Some(rating) = entry.book.rating() {
                let extremes = month_rating_extremes
                    .entry(entry.on.year_month().to_string())
                    .or_default();
                extremes.has1 |= rating == 1;
                extremes.has5 |= rating == 5;
            }
        }

        let tail = ctx.finished_sorted.len().saturating_sub(5);
        let last_five_authors = ctx.finished_sorted[tail..]
            .iter()
            .map(|f| f.book.trimmed_author().to_string())
            .collect();

        Self {
            total_reads: ctx.total_finished(),
            by_day: keyed(&ctx.by_day),
            by_week: keyed(&ctx.by_week),
            by_month: keyed(&ctx.by_month),
            by_year: keyed(&ctx.by_year),
            by_author: keyed(&ctx.by_author),
            unique_authors: ctx.by_author.len() as u64,
            streak: ctx.streak,
            last_five_authors,
            month_rating_extremes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::fixtures::{book, date};

    #[test]
    fn summarises_the_context() {
        let mut books = vec![
            book("A", "Ann", "2024-02-28"),
            book("B", "Bo", "2024-02-29"),
            book("C", "Ann", "2024-03-01"),
            book("D", "", ""),
        ];
        books[0].rating = Some(1);
        books[2].rating = Some(5);

        let ctx = EvaluationContext::build(&books, date("2024-03-01"));
        let stats = ReadingStats::from_context(&ctx);

        assert_eq!(stats.total_reads, 3);
        assert_eq!(stats.by_month.get("2024-02"), Some(&2));
        assert_eq!(stats.by_year.get("2024"), Some(&3));
        assert_eq!(stats.by_day.get("2024-02-29"), Some(&1));
        assert_eq!(stats.unique_authors, 2);
        assert_eq!(stats.streak, Streak { current: 3, max: 3 });
        assert_eq!(stats.last_five_authors, vec!["Ann", "Bo", "Ann"]);
        assert_eq!(
            stats.month_rating_extremes.get("2024-02"),
            Some(&RatingExtremes { has1: true, has5: false })
        );
        assert!(stats.month_rating_extremes["2024-03"].has5);
    }
}
