//! crates/bookmaker_core/src/context.rs
//!
//! Secondary indexes over the book collection, rebuilt for every evaluation pass.
//!
//! Only finished books take part in the aggregates. The raw collection stays
//! reachable through [`EvaluationContext::books`] for rules that read text.

use crate::date::{CalendarDate, IsoWeek, YearMonth};
use crate::domain::Book;
use crate::streak::{self, Streak};
use std::collections::{BTreeMap, BTreeSet};

/// A finished book paired with its finish date.
#[derive(Debug, Clone, Copy)]
pub struct Finished<'a> {
    pub book: &'a Book,
    pub on: CalendarDate,
}

#[derive(Debug, Clone)]
pub struct EvaluationContext<'a> {
    pub books: &'a [Book],
    /// "Today" in the reference time zone, fixed for the whole pass.
    pub today: CalendarDate,
    /// Ascending by finish date; ties broken by creation time, then id.
    pub finished_sorted: Vec<Finished<'a>>,
    /// Trimmed title to its finishes, ascending. Untitled books are left out.
    pub by_title: BTreeMap<&'a str, Vec<Finished<'a>>>,
    pub by_day: BTreeMap<CalendarDate, u64>,
    pub by_week: BTreeMap<IsoWeek, u64>,
    pub by_month: BTreeMap<YearMonth, u64>,
    pub by_year: BTreeMap<i32, u64>,
    /// Trimmed author to finish count. Empty authors are left out.
    pub by_author: BTreeMap<&'a str, u64>,
    pub by_author_month: BTreeMap<(&'a str, YearMonth), u64>,
    pub by_author_day: BTreeMap<(&'a str, CalendarDate), u64>,
    pub days_by_month: BTreeMap<YearMonth, BTreeSet<CalendarDate>>,
    pub streak: Streak,
}

impl<'a> EvaluationContext<'a> {
    pub fn build(books: &'a [Book], today: CalendarDate) -> Self {
        let mut finished_sorted: Vec<Finished<'a>> = books
            .iter()
            .filter_map(|book| book.finished_at.map(|on| Finished { book, on }))
            .collect();
        finished_sorted.sort_by(|a, b| {
            a.on.cmp(&b.on)
                .then_with(|| a.book.created_at.cmp(&b.book.created_at))
                .then_with(|| a.book.id.cmp(&b.book.id))
        });

        let mut by_title: BTreeMap<&'a str, Vec<Finished<'a>>> = BTreeMap::new();
        let mut by_day = BTreeMap::new();
        let mut by_week = BTreeMap::new();
        let mut by_month = BTreeMap::new();
        let mut by_year = BTreeMap::new();
        let mut by_author = BTreeMap::new();
        let mut by_author_month = BTreeMap::new();
        let mut by_author_day = BTreeMap::new();
        let mut days_by_month: BTreeMap<YearMonth, BTreeSet<CalendarDate>> = BTreeMap::new();

        for entry in &finished_sorted {
            let on = entry.on;
            let month = on.year_month();

            let title = entry.book.trimmed_title();
            if !title.is_empty() {
                by_title.entry(title).or_default().push(*entry);
            }

            *by_day.entry(on).or_insert(0) += 1;
            *by_week.entry(on.iso_week()).or_insert(0) += 1;
            *by_month.entry(month).or_insert(0) += 1;
            *by_year.entry(on.year()).or_insert(0) += 1;
            days_by_month.entry(month).or_default().insert(on);

            let author = entry.book.trimmed_author();
            if !author.is_empty() {
                *by_author.entry(author).or_insert(0) += 1;
                *by_author_month.entry((author, month)).or_insert(0) += 1;
                *by_author_day.entry((author, on)).or_insert(0) += 1;
            }
        }

        let finish_days: BTreeSet<CalendarDate> = by_day.keys().copied().collect();
        let streak = streak::day_streak(&finish_days, today);

        Self {
            books,
            today,
            finished_sorted,
            by_title,
            by_day,
            by_week,
            by_month,
            by_year,
            by_author,
            by_author_month,
            by_author_day,
            days_by_month,
            streak,
        }
    }

    pub fn total_finished(&self) -> u64 {
        self.finished_sorted.len() as u64
    }

    pub fn current_month(&self) -> YearMonth {
        self.today.year_month()
    }

    pub fn reads_in_month(&self, month: YearMonth) -> u64 {
        self.by_month.get(&month).copied().unwrap_or(0)
    }

    /// Finishes in the current month and the `months - 1` months before it.
    pub fn reads_in_trailing_months(&self, months: usize) -> u64 {
        std::iter::successors(Some(self.current_month()), |m| Some(m.prev()))
            .take(months)
            .map(|m| self.reads_in_month(m))
            .sum()
    }

    /// Finishes whose date falls inside `month`.
    pub fn finished_in(&self, month: YearMonth) -> impl Iterator<Item = &Finished<'a>> + '_ {
        self.finished_sorted.iter().filter(move |f| month.contains(f.on))
    }

    pub fn max_month_streak(&self) -> u64 {
        streak::month_streak(self.by_month.keys())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{book, date};
    use super::*;

    #[test]
    fn unfinished_books_are_not_aggregated() {
        let books = vec![
            book("A", "X", "2024-01-02"),
            book("B", "Y", ""),
            book("C", "X", "2024-01-01"),
        ];
        let ctx = EvaluationContext::build(&books, date("2024-01-31"));
        assert_eq!(ctx.total_finished(), 2);
        let order: Vec<&str> = ctx.finished_sorted.iter().map(|f| f.book.title.as_str()).collect();
        assert_eq!(order, vec!["C", "A"]);
        assert_eq!(ctx.by_author.get("X"), Some(&2));
        assert!(!ctx.by_author.contains_key("Y"));
    }

    #[test]
    fn titles_group_by_trimmed_case_sensitive_text() {
        let books = vec![
            book(" Foo", "", "2024-01-10"),
            book("Foo ", "", "2024-01-01"),
            book("foo", "", "2024-01-05"),
            book("   ", "", "2024-01-05"),
        ];
        let ctx = EvaluationContext::build(&books, date("2024-01-31"));
        assert_eq!(ctx.by_title.len(), 2);
        let foo = &ctx.by_title["Foo"];
        assert_eq!(foo.len(), 2);
        assert_eq!(foo[0].on, date("2024-01-01"));
        assert_eq!(foo[1].on, date("2024-01-10"));
    }

    #[test]
    fn bucket_counts() {
        let books = vec![
            book("A", "X", "2024-03-04"),
            book("B", "X", "2024-03-04"),
            book("C", " Y ", "2024-03-10"),
            book("D", "", "2023-12-31"),
        ];
        let ctx = EvaluationContext::build(&books, date("2024-03-15"));
        assert_eq!(ctx.by_day[&date("2024-03-04")], 2);
        assert_eq!(ctx.by_week[&date("2024-03-04").iso_week()], 2);
        assert_eq!(ctx.by_week[&date("2024-03-10").iso_week()], 1);
        assert_eq!(ctx.reads_in_month(date("2024-03-01").year_month()), 3);
        assert_eq!(ctx.by_year[&2023], 1);
        assert_eq!(ctx.by_author_day[&("X", date("2024-03-04"))], 2);
        assert_eq!(ctx.by_author_month[&("Y", date("2024-03-01").year_month())], 1);
        assert_eq!(ctx.days_by_month[&date("2024-03-01").year_month()].len(), 2);
        assert_eq!(ctx.reads_in_trailing_months(3), 3);
        assert_eq!(ctx.reads_in_trailing_months(4), 4);
    }

    #[test]
    fn same_day_double_finish_counts_once_for_streaks() {
        let books = vec![
            book("A", "", "2024-01-01"),
            book("B", "", "2024-01-01"),
            book("C", "", "2024-01-02"),
        ];
        let ctx = EvaluationContext::build(&books, date("2024-01-02"));
        assert_eq!(ctx.streak.max, 2);
        assert_eq!(ctx.streak.current, 2);
    }
}
