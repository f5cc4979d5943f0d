//! crates/bookmaker_core/src/predicates.rs
//!
//! Maps every [`RuleKind`] onto its predicate.
//!
//! Predicates are pure: they read the derived context, the counters and the
//! optional triggering event, and never look at the clock themselves.

use crate::context::{EvaluationContext, Finished};
use crate::domain::{ActionCounters, Book, EventKind, LastEvent};
use crate::rule::{
    BookScope, ContainsAny, DatePattern, DayBounds, FastEntry, LastN, MonthSelector,
    OneLinerPattern, ReadSpeed, RereadCompare, Rule, RuleKind, TextBounds, TextComparison,
    TextField, UserAction,
};
use crate::date::YearMonth;
use chrono::Weekday;
use std::collections::{BTreeSet, HashSet};

const DEFAULT_MONTH_STREAK: u64 = 12;
const DEFAULT_MONTH_AUTHOR_SAME: u64 = 3;
const DEFAULT_SAME_DAY_FINISHES: u64 = 2;
const DEFAULT_LONG_AUTHOR_NAME: u64 = 10;
const DEFAULT_USER_ACTION: u64 = 1;
const DEFAULT_SAME_BOOK_EDITS: u64 = 3;

/// Everything a predicate may read.
pub struct Inputs<'c, 'a> {
    pub ctx: &'c EvaluationContext<'a>,
    pub counters: &'c ActionCounters,
    pub last_event: Option<&'c LastEvent>,
}

impl<'c, 'a> Inputs<'c, 'a> {
    fn event_book(&self) -> Option<&'c Book> {
        self.last_event.and_then(|e| e.book.as_ref())
    }

    /// The books a text-shape rule inspects under `scope`.
    fn scoped_books(&self, scope: BookScope) -> Vec<&'c Book> {
        match scope {
            BookScope::Any => self.ctx.books.iter().collect(),
            BookScope::Event => self.event_book().into_iter().collect(),
        }
    }
}

/// Evaluates one rule. Unrecognized rules never pass.
pub fn evaluate(rule: &Rule, inputs: &Inputs<'_, '_>) -> bool {
    match rule {
        Rule::Known(kind) => evaluate_kind(kind, inputs),
        Rule::Unrecognized(_) => false,
    }
}

pub fn evaluate_kind(kind: &RuleKind, inputs: &Inputs<'_, '_>) -> bool {
    let ctx = inputs.ctx;
    match kind {
        RuleKind::TotalReads(b) => b.admits(ctx.total_finished()),
        RuleKind::WeekReads(b) => {
            b.admits(ctx.by_week.get(&ctx.today.iso_week()).copied().unwrap_or(0))
        }
        RuleKind::MonthReads(b) => b.admits(ctx.reads_in_month(ctx.current_month())),
        RuleKind::QuarterReads(b) => b.admits(ctx.reads_in_trailing_months(3)),
        RuleKind::HalfYearReads(b) => b.admits(ctx.reads_in_trailing_months(6)),
        RuleKind::YearReads(b) => b.admits(ctx.by_year.get(&ctx.today.year()).copied().unwrap_or(0)),
        RuleKind::MonthReadsByMonth(sel) => month_reads_by_month(sel, ctx),
        RuleKind::SameDayFinishes(b) => ctx
            .by_day
            .values()
            .any(|&n| b.admits_or(n, Some(DEFAULT_SAME_DAY_FINISHES))),

        RuleKind::StreakDays(b) => b.admits(ctx.streak.max),
        RuleKind::MonthStreak(b) => b.admits_or(ctx.max_month_streak(), Some(DEFAULT_MONTH_STREAK)),
        RuleKind::MonthDistinctDays(b) => b.admits(
            ctx.days_by_month
                .get(&ctx.current_month())
                .map_or(0, |days| days.len() as u64),
        ),
        RuleKind::MonthEachWeekHasRead => month_each_week_has_read(ctx),

        RuleKind::ReviewChars(t) => review_chars(t, inputs),
        RuleKind::ReviewNewlines(t) => review_newlines(t, inputs),
        RuleKind::ReviewContains(c) => review_contains(c, inputs),
        RuleKind::OneLinerPattern(p) => inputs
            .scoped_books(p.scope)
            .into_iter()
            .any(|book| one_liner_matches(&book.one_liner, p)),

        RuleKind::RereadCount(b) => ctx.by_title.values().any(|group| b.admits(group.len() as u64)),
        RuleKind::RereadCompare(cmp) => reread_compare(cmp, ctx),
        RuleKind::RereadFromFirstDays(days) => reread_from_first_days(days, ctx),

        RuleKind::UniqueAuthors(b) => b.admits(ctx.by_author.len() as u64),
        RuleKind::SameAuthorStreak(b) => b.admits(same_author_streak(&ctx.finished_sorted)),
        RuleKind::LastNAuthorsAllDifferent(n) => last_n_authors_all_different(n, ctx),
        RuleKind::MonthAuthorSame(b) => {
            let month = ctx.current_month();
            ctx.by_author_month
                .iter()
                .filter(|((_, m), _)| *m == month)
                .any(|(_, &n)| b.admits_or(n, Some(DEFAULT_MONTH_AUTHOR_SAME)))
        }
        RuleKind::SameAuthorSameDay => ctx.by_author_day.values().any(|&n| n >= 2),
        RuleKind::MonthAllFirstAuthors => month_all_first_authors(ctx),
        RuleKind::LongAuthorName(b) => ctx
            .by_author
            .keys()
            .any(|name| b.admits_or(name.chars().count() as u64, Some(DEFAULT_LONG_AUTHOR_NAME))),

        RuleKind::DatePattern(p) => {
            !p.is_empty() && ctx.finished_sorted.iter().any(|f| date_pattern_matches(f, p))
        }
        RuleKind::ReadSpeed(s) => {
            !s.is_empty() && ctx.finished_sorted.iter().any(|f| read_speed_matches(f, s))
        }

        RuleKind::RatingSet => rating_set(inputs),
        RuleKind::MonthRatingBoth => month_rating_both(ctx),

        RuleKind::UserAction(action) => user_action(action, inputs.counters),
        RuleKind::EditSameBookGte(b) => inputs
            .counters
            .edit_counts
            .values()
            .any(|&n| b.admits_or(n, Some(DEFAULT_SAME_BOOK_EDITS))),
        RuleKind::FastEntry(fast) => fast_entry(fast, inputs.last_event),
    }
}

//=========================================================================================
// Volume and Month Shape
//=========================================================================================

fn month_reads_by_month(sel: &MonthSelector, ctx: &EvaluationContext<'_>) -> bool {
    let year = sel.year.unwrap_or_else(|| ctx.today.year());
    YearMonth::new(year, sel.month).map_or(false, |month| sel.bounds.admits(ctx.reads_in_month(month)))
}

/// Every ISO week that touches the current month has a finish inside the month.
fn month_each_week_has_read(ctx: &EvaluationContext<'_>) -> bool {
    let month = ctx.current_month();
    let weeks_in_month: BTreeSet<_> = month.days().iter().map(|d| d.iso_week()).collect();
    let weeks_with_reads: BTreeSet<_> = ctx
        .days_by_month
        .get(&month)
        .map(|days| days.iter().map(|d| d.iso_week()).collect())
        .unwrap_or_default();
    !weeks_in_month.is_empty() && weeks_in_month.is_subset(&weeks_with_reads)
}

//=========================================================================================
// Text Shape
//=========================================================================================

/// Text with surrounding whitespace removed; `None` when nothing is left.
fn content(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn char_len(text: &str) -> u64 {
    text.chars().count() as u64
}

fn review_chars(rule: &TextBounds, inputs: &Inputs<'_, '_>) -> bool {
    inputs
        .scoped_books(rule.scope)
        .into_iter()
        .filter_map(|book| content(&book.review_text))
        .any(|text| rule.bounds.within(char_len(text)))
}

fn review_newlines(rule: &TextBounds, inputs: &Inputs<'_, '_>) -> bool {
    inputs
        .scoped_books(rule.scope)
        .into_iter()
        .filter_map(|book| content(&book.review_text))
        .any(|text| rule.bounds.within(text.matches('\n').count() as u64))
}

fn review_contains(rule: &ContainsAny, inputs: &Inputs<'_, '_>) -> bool {
    let needles: Vec<&str> = rule.any_of.iter().map(String::as_str).filter(|w| !w.is_empty()).collect();
    if needles.is_empty() {
        return false;
    }
    inputs
        .scoped_books(rule.scope)
        .into_iter()
        .any(|book| needles.iter().any(|w| book.review_text.contains(w)))
}

const PERIODS: &[char] = &['.', '。', '．'];
const QUOTES: &[char] = &['"', '\'', '『', '』', '「', '」', '“', '”'];

/// A one-liner matches when every flag in the pattern holds. Apart from the
/// `empty` pattern itself, a blank one-liner never matches.
pub fn one_liner_matches(raw: &str, p: &OneLinerPattern) -> bool {
    if p.empty {
        return raw.trim().is_empty();
    }
    let Some(text) = content(raw) else {
        return false;
    };
    let len = char_len(text);
    if p.min_len.is_some_and(|min| len < min)
        || p.max_len.is_some_and(|max| len > max)
        || p.exact_len.is_some_and(|exact| len != exact)
    {
        return false;
    }
    if p.no_period && text.ends_with(PERIODS) {
        return false;
    }
    let checks = [
        (p.has_quotes, text.contains(QUOTES)),
        (p.has_question, text.contains(['?', '？'])),
        (p.has_exclamation, text.contains(['!', '！'])),
        (p.has_ellipsis, text.contains('…') || text.contains("...")),
        (
            p.has_digit,
            text.chars().any(|c| c.is_ascii_digit() || ('０'..='９').contains(&c)),
        ),
        (p.has_ascii, text.chars().any(|c| c.is_ascii_alphabetic())),
    ];
    checks.iter().all(|&(wanted, present)| !wanted || present)
}

//=========================================================================================
// Rereads
//=========================================================================================

fn text_of(book: &Book, field: TextField) -> &str {
    match field {
        TextField::ReviewText => book.review_text.trim(),
        TextField::OneLiner => book.one_liner.trim(),
    }
}

fn reread_compare(rule: &RereadCompare, ctx: &EvaluationContext<'_>) -> bool {
    ctx.by_title.values().any(|group| {
        let [.., prev, last] = group.as_slice() else {
            return false;
        };
        let before = text_of(prev.book, rule.field);
        let after = text_of(last.book, rule.field);
        match rule.cmp {
            TextComparison::Shorter => char_len(after) < char_len(before),
            TextComparison::Longer => char_len(after) > char_len(before),
            TextComparison::Different => after != before,
        }
    })
}

/// The interval is the inclusive span of calendar days from the first finish of a
/// title to its latest one, so finishes on the 1st and the 10th span 10 days.
fn reread_from_first_days(rule: &DayBounds, ctx: &EvaluationContext<'_>) -> bool {
    ctx.by_title.values().any(|group| match (group.first(), group.last()) {
        (Some(first), Some(last)) if group.len() >= 2 => {
            rule.admits(first.on.days_until(last.on) + 1)
        }
        _ => false,
    })
}

//=========================================================================================
// Authors
//=========================================================================================

/// Longest run of consecutive finishes (chronological) by one non-empty author.
fn same_author_streak(finished: &[Finished<'_>]) -> u64 {
    let mut max = 0;
    let mut current = 0;
    let mut prev: Option<&str> = None;
    for entry in finished {
        let author = entry.book.trimmed_author();
        current = match prev {
            Some(p) if !author.is_empty() && p == author => current + 1,
            _ => 1,
        };
        max = max.max(current);
        prev = Some(author);
    }
    max
}

/// The last `n` finishes have `n` distinct, non-empty authors.
fn last_n_authors_all_different(rule: &LastN, ctx: &EvaluationContext<'_>) -> bool {
    let n = rule.n;
    if n == 0 || ctx.finished_sorted.len() < n {
        return false;
    }
    let window = &ctx.finished_sorted[ctx.finished_sorted.len() - n..];
    let mut seen = HashSet::with_capacity(n);
    window.iter().all(|f| {
        let author = f.book.trimmed_author();
        !author.is_empty() && seen.insert(author)
    })
}

/// Every author finished this month is new relative to all earlier finishes.
fn month_all_first_authors(ctx: &EvaluationContext<'_>) -> bool {
    let month = ctx.current_month();
    let Some(month_start) = month.first_day() else {
        return false;
    };
    let earlier: HashSet<&str> = ctx
        .finished_sorted
        .iter()
        .take_while(|f| f.on < month_start)
        .map(|f| f.book.trimmed_author())
        .filter(|a| !a.is_empty())
        .collect();
    let mut this_month = ctx.finished_in(month).peekable();
    if this_month.peek().is_none() {
        return false;
    }
    this_month.all(|f| {
        let author = f.book.trimmed_author();
        !author.is_empty() && !earlier.contains(author)
    })
}

//=========================================================================================
// Calendar and Speed
//=========================================================================================

fn date_pattern_matches(entry: &Finished<'_>, p: &DatePattern) -> bool {
    let on = entry.on;
    p.weekday.as_ref().map_or(true, |set| set.contains(on.weekday()))
        && (!p.first_of_month || on.is_first_of_month())
        && (!p.last_of_month || on.is_last_of_month())
        && p.month_equals.map_or(true, |m| on.month() == m)
        && (!p.weekend || on.is_weekend())
}

/// Applies to finished books with a start date on or before the finish date.
fn read_speed_matches(entry: &Finished<'_>, s: &ReadSpeed) -> bool {
    let Some(started) = entry.book.started_at else {
        return false;
    };
    let days = started.days_until(entry.on);
    if days < 0 {
        return false;
    }
    (!s.same_day || days == 0)
        && s.lte_days.map_or(true, |lte| days <= lte)
        && s.gte_days.map_or(true, |gte| days >= gte)
        && (!s.weekend_cross
            || (started.weekday() == Weekday::Sat && entry.on.weekday() == Weekday::Sun && days == 1))
}

//=========================================================================================
// Ratings and Actions
//=========================================================================================

fn rating_set(inputs: &Inputs<'_, '_>) -> bool {
    let Some(event) = inputs.last_event else {
        return false;
    };
    event.rating_set
        && matches!(event.kind, EventKind::Save | EventKind::Edit)
        && event.book.as_ref().and_then(Book::rating).is_some()
}

fn month_rating_both(ctx: &EvaluationContext<'_>) -> bool {
    let ratings: HashSet<u8> = ctx
        .finished_in(ctx.current_month())
        .filter_map(|f| f.book.rating())
        .collect();
    ratings.contains(&1) && ratings.contains(&5)
}

fn user_action(rule: &UserAction, counters: &ActionCounters) -> bool {
    match rule.event.as_deref() {
        Some(name) if !name.is_empty() => {
            counters.get(name) >= rule.gte.unwrap_or(DEFAULT_USER_ACTION)
        }
        _ => false,
    }
}

fn fast_entry(rule: &FastEntry, last_event: Option<&LastEvent>) -> bool {
    match (rule.lte_sec, last_event) {
        (Some(limit), Some(event)) if event.kind == EventKind::Save => {
            event.duration_sec.is_some_and(|secs| secs <= limit)
        }
        _ => false,
    }
}
