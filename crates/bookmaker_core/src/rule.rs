//! crates/bookmaker_core/src/rule.rs
//!
//! The declarative rule vocabulary of the achievement catalog.
//!
//! Catalog JSON tags each rule with a `type` string. Known tags deserialize into
//! [`RuleKind`]; anything else, including a known tag with malformed parameters,
//! is preserved verbatim as [`Rule::Unrecognized`] and never passes.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// A catalog rule as loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rule {
    Known(RuleKind),
    Unrecognized(serde_json::Value),
}

impl Rule {
    /// The raw `type` tag, for logging.
    pub fn type_tag(&self) -> Option<String> {
        match self {
            Rule::Known(kind) => serde_json::to_value(kind)
                .ok()
                .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(str::to_string)),
            Rule::Unrecognized(raw) => raw.get("type").and_then(|t| t.as_str()).map(str::to_string),
        }
    }
}

impl From<RuleKind> for Rule {
    fn from(kind: RuleKind) -> Self {
        Rule::Known(kind)
    }
}

/// The closed set of predicate kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    // --- Volume ---
    TotalReads(Bounds),
    WeekReads(Bounds),
    MonthReads(Bounds),
    /// The current month and the two before it.
    QuarterReads(Bounds),
    /// The current month and the five before it.
    HalfYearReads(Bounds),
    YearReads(Bounds),
    MonthReadsByMonth(MonthSelector),
    SameDayFinishes(Bounds),

    // --- Streaks and month shape ---
    StreakDays(Bounds),
    MonthStreak(Bounds),
    MonthDistinctDays(Bounds),
    MonthEachWeekHasRead,

    // --- Text shape ---
    ReviewChars(TextBounds),
    ReviewNewlines(TextBounds),
    ReviewContains(ContainsAny),
    OneLinerPattern(OneLinerPattern),

    // --- Rereads ---
    RereadCount(Bounds),
    RereadCompare(RereadCompare),
    RereadFromFirstDays(DayBounds),

    // --- Authors ---
    UniqueAuthors(Bounds),
    SameAuthorStreak(Bounds),
    #[serde(alias = "LAST_5_ALL_DIFFERENT")]
    LastNAuthorsAllDifferent(LastN),
    #[serde(rename = "MONTH_AUTHOR_3_SAME")]
    MonthAuthorSame(Bounds),
    SameAuthorSameDay,
    MonthAllFirstAuthors,
    LongAuthorName(Bounds),

    // --- Calendar and speed ---
    DatePattern(DatePattern),
    ReadSpeed(ReadSpeed),

    // --- Ratings ---
    RatingSet,
    MonthRatingBoth,

    // --- Actions ---
    UserAction(UserAction),
    EditSameBookGte(Bounds),
    FastEntry(FastEntry),
}

//=========================================================================================
// Parameter Shapes
//=========================================================================================

/// A count threshold. `gte` is the required lower bound; `lte` optionally caps it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<u64>,
}

impl Bounds {
    pub fn at_least(gte: u64) -> Self {
        Self {
            gte: Some(gte),
            lte: None,
        }
    }

    /// Passes when `value >= gte` (and `<= lte` if given). No `gte`, no pass.
    pub fn admits(&self, value: u64) -> bool {
        self.admits_or(value, None)
    }

    /// Like [`Bounds::admits`], falling back to `default_gte` when `gte` is absent.
    pub fn admits_or(&self, value: u64, default_gte: Option<u64>) -> bool {
        match self.gte.or(default_gte) {
            Some(gte) => value >= gte && self.lte.map_or(true, |lte| value <= lte),
            None => false,
        }
    }

    /// Passes when `value` lies inside every bound given; at least one is required.
    pub fn within(&self, value: u64) -> bool {
        if self.gte.is_none() && self.lte.is_none() {
            return false;
        }
        self.gte.map_or(true, |gte| value >= gte) && self.lte.map_or(true, |lte| value <= lte)
    }
}

/// Which books a text-shape rule looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookScope {
    /// Any book in the collection.
    #[default]
    Any,
    /// Only the book touched by the triggering event.
    Event,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBounds {
    #[serde(flatten)]
    pub bounds: Bounds,
    #[serde(default)]
    pub scope: BookScope,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainsAny {
    #[serde(default)]
    pub any_of: Vec<String>,
    #[serde(default)]
    pub scope: BookScope,
}

/// Shape constraints on a one-liner. Every flag given must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OneLinerPattern {
    pub empty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_len: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_len: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact_len: Option<u64>,
    pub no_period: bool,
    pub has_quotes: bool,
    pub has_question: bool,
    pub has_exclamation: bool,
    pub has_ellipsis: bool,
    pub has_digit: bool,
    pub has_ascii: bool,
    pub scope: BookScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextField {
    ReviewText,
    OneLiner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextComparison {
    Shorter,
    Longer,
    Different,
}

/// Compares the two most recent finishes of the same title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RereadCompare {
    pub field: TextField,
    pub cmp: TextComparison,
}

/// An elapsed-days window. Every bound given must hold; at least one is required.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte_days: Option<i64>,
}

impl DayBounds {
    pub fn is_empty(&self) -> bool {
        self.lte_days.is_none() && self.gte_days.is_none()
    }

    pub fn admits(&self, days: i64) -> bool {
        !self.is_empty()
            && self.lte_days.map_or(true, |lte| days <= lte)
            && self.gte_days.map_or(true, |gte| days >= gte)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastN {
    #[serde(default = "LastN::default_n")]
    pub n: usize,
}

impl LastN {
    fn default_n() -> usize {
        5
    }
}

/// A month of the current year, or of `year` when given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSelector {
    pub month: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(flatten)]
    pub bounds: Bounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayName {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayName {
    pub fn weekday(&self) -> Weekday {
        match self {
            DayName::Mon => Weekday::Mon,
            DayName::Tue => Weekday::Tue,
            DayName::Wed => Weekday::Wed,
            DayName::Thu => Weekday::Thu,
            DayName::Fri => Weekday::Fri,
            DayName::Sat => Weekday::Sat,
            DayName::Sun => Weekday::Sun,
        }
    }
}

/// `"weekday": "fri"` or `"weekday": ["sat", "sun"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeekdaySet {
    One(DayName),
    Many(Vec<DayName>),
}

impl WeekdaySet {
    pub fn contains(&self, weekday: Weekday) -> bool {
        match self {
            WeekdaySet::One(day) => day.weekday() == weekday,
            WeekdaySet::Many(days) => days.iter().any(|d| d.weekday() == weekday),
        }
    }
}

/// Calendar shape of a finish date. Every constraint given must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatePattern {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekday: Option<WeekdaySet>,
    pub first_of_month: bool,
    pub last_of_month: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_equals: Option<u32>,
    pub weekend: bool,
}

impl DatePattern {
    pub fn is_empty(&self) -> bool {
        self.weekday.is_none()
            && !self.first_of_month
            && !self.last_of_month
            && self.month_equals.is_none()
            && !self.weekend
    }
}

/// Start-to-finish shape of a single book. Every constraint given must hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadSpeed {
    pub same_day: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte_days: Option<i64>,
    pub weekend_cross: bool,
}

impl ReadSpeed {
    pub fn is_empty(&self) -> bool {
        !self.same_day && self.lte_days.is_none() && self.gte_days.is_none() && !self.weekend_cross
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FastEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte_sec: Option<u64>,
}
