use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, Locale, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ─── Errors ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("Unparseable date: {0:?}")]
    Unparseable(String),
    #[error("Hour out of range: {0} (expected 0-23)")]
    HourOutOfRange(u32),
    #[error("{date} {hour:02}:00 does not exist in {zone}")]
    NonexistentLocalTime {
        date: NaiveDate,
        hour: u32,
        zone: String,
    },
}

// ─── Calendar day ───────────────────────────────────────────────────────────

/// A date without time of day.
///
/// Equality and ordering follow the wrapped UTC calendar date, so two days
/// compare the same way whether they came from a calendar click or from a
/// server timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    #[cfg(test)]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse a server-provided date.
    ///
    /// Accepts `YYYY-MM-DD`, RFC 3339 instants and offset-less
    /// `YYYY-MM-DDTHH:MM:SS[.fff]` instants. Instants are converted to UTC
    /// before the calendar date is taken; offset-less ones are read as UTC.
    pub fn parse(s: &str) -> Result<Self, DateError> {
        if let Ok(date) = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
            return Ok(Self(date));
        }
        parse_instant(s).map(|dt| Self(dt.date_naive()))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn date_string(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// Epoch milliseconds at UTC midnight.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn timestamp(&self) -> i64 {
        self.midnight_utc().timestamp_millis()
    }

    pub fn midnight_utc(&self) -> DateTime<Utc> {
        self.0.and_time(NaiveTime::MIN).and_utc()
    }

    /// Full month name in `locale`, e.g. "março" for `pt_BR`.
    pub fn month_name(&self, locale: Locale) -> String {
        self.midnight_utc().format_localized("%B", locale).to_string()
    }

    /// Full weekday name in `locale`.
    pub fn weekday_name(&self, locale: Locale) -> String {
        self.midnight_utc().format_localized("%A", locale).to_string()
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

const NAIVE_INSTANT_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an instant the way the trip API sends them.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, DateError> {
    let trimmed = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_INSTANT_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(DateError::Unparseable(s.to_string()))
}

// ─── Marked dates ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkedDate {
    pub selected: bool,
}

impl MarkedDate {
    pub const SELECTED: MarkedDate = MarkedDate { selected: true };
}

/// `YYYY-MM-DD` → marker, in date order.
pub type MarkedDates = BTreeMap<String, MarkedDate>;

/// Every day from `start` to `end`, both inclusive. Empty when `end < start`.
pub fn interval_dates(start: &CalendarDay, end: &CalendarDay) -> MarkedDates {
    start
        .0
        .iter_days()
        .take_while(|d| *d <= end.0)
        .map(|d| (CalendarDay(d).date_string(), MarkedDate::SELECTED))
        .collect()
}

/// Human-readable label for an ordered range.
///
/// "5 a 9 de março" when both days share a month, otherwise
/// "29 de março a 2 de abril".
pub fn format_dates_in_text(start: &CalendarDay, end: &CalendarDay, locale: Locale) -> String {
    if start.year() == end.year() && start.month() == end.month() {
        format!("{} a {} de {}", start.day(), end.day(), start.month_name(locale))
    } else {
        format!(
            "{} de {} a {} de {}",
            start.day(),
            start.month_name(locale),
            end.day(),
            end.month_name(locale)
        )
    }
}

// ─── Range selection ────────────────────────────────────────────────────────

/// Start/end pair picked with sequential clicks on a calendar.
///
/// `starts_at` is only absent when `ends_at` is absent, `starts_at <= ends_at`
/// when both are set, and `marked_dates` always holds exactly the selected
/// days. Values are rebuilt on each click rather than mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DateRangeSelection {
    starts_at: Option<CalendarDay>,
    ends_at: Option<CalendarDay>,
    marked_dates: MarkedDates,
    label: String,
}

impl DateRangeSelection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A completed range from two known days (e.g. a trip loaded from the
    /// server). The pair is ordered if given reversed.
    pub fn from_bounds(a: CalendarDay, b: CalendarDay, locale: Locale) -> Self {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Self::range(start, end, locale)
    }

    fn single(day: CalendarDay) -> Self {
        Self {
            starts_at: Some(day),
            ends_at: None,
            marked_dates: interval_dates(&day, &day),
            label: String::new(),
        }
    }

    fn range(start: CalendarDay, end: CalendarDay, locale: Locale) -> Self {
        Self {
            starts_at: Some(start),
            ends_at: Some(end),
            marked_dates: interval_dates(&start, &end),
            label: format_dates_in_text(&start, &end, locale),
        }
    }

    /// Apply a click on `clicked`.
    ///
    /// With nothing selected, or a full range already selected, the click
    /// starts a new range. With only a start selected, the click closes the
    /// range; a click on or before the start becomes the new start.
    pub fn select_day(&self, clicked: CalendarDay, locale: Locale) -> Self {
        match (self.starts_at, self.ends_at) {
            (Some(start), None) if clicked <= start => Self::range(clicked, start, locale),
            (Some(start), None) => Self::range(start, clicked, locale),
            _ => Self::single(clicked),
        }
    }

    pub fn starts_at(&self) -> Option<CalendarDay> {
        self.starts_at
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn ends_at(&self) -> Option<CalendarDay> {
        self.ends_at
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn marked_dates(&self) -> &MarkedDates {
        &self.marked_dates
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_marked(&self, day: &CalendarDay) -> bool {
        self.marked_dates.contains_key(&day.date_string())
    }

    pub fn is_complete(&self) -> bool {
        self.starts_at.is_some() && self.ends_at.is_some()
    }

    pub fn bounds(&self) -> Option<(CalendarDay, CalendarDay)> {
        self.starts_at.zip(self.ends_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;
    use proptest::prelude::*;

    const PT: Locale = Locale::pt_BR;

    fn day(y: i32, m: u32, d: u32) -> CalendarDay {
        CalendarDay::from_ymd(y, m, d).unwrap()
    }

    fn arb_day() -> impl Strategy<Value = CalendarDay> {
        (0u64..20_000).prop_map(|n| CalendarDay::new(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + Days::new(n)))
    }

    #[test]
    fn derived_fields() {
        let d = day(2024, 3, 5);
        assert_eq!(d.year(), 2024);
        assert_eq!(d.month(), 3);
        assert_eq!(d.day(), 5);
        assert_eq!(d.date_string(), "2024-03-05");
        assert_eq!(d.timestamp(), 1_709_596_800_000);
        assert_eq!(d.to_string(), "2024-03-05");
    }

    #[test]
    fn parse_accepts_server_formats() {
        assert_eq!(CalendarDay::parse("2024-03-05").unwrap(), day(2024, 3, 5));
        assert_eq!(CalendarDay::parse("2024-03-05T23:30:00Z").unwrap(), day(2024, 3, 5));
        assert_eq!(CalendarDay::parse("2024-03-05T00:00:00").unwrap(), day(2024, 3, 5));
        assert_eq!(CalendarDay::parse("2024-03-05T10:00:00.123").unwrap(), day(2024, 3, 5));
    }

    #[test]
    fn parse_uses_utc_date_at_year_boundary() {
        // 21:00 in São Paulo on New Year's Eve is already January 1st in UTC.
        assert_eq!(
            CalendarDay::parse("2023-12-31T21:00:00-03:00").unwrap(),
            day(2024, 1, 1)
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            CalendarDay::parse("amanhã"),
            Err(DateError::Unparseable("amanhã".into()))
        );
        assert!(CalendarDay::parse("2024-02-30").is_err());
    }

    #[test]
    fn same_month_label() {
        assert_eq!(format_dates_in_text(&day(2024, 3, 5), &day(2024, 3, 9), PT), "5 a 9 de março");
    }

    #[test]
    fn cross_month_label() {
        assert_eq!(
            format_dates_in_text(&day(2024, 3, 29), &day(2024, 4, 2), PT),
            "29 de março a 2 de abril"
        );
    }

    #[test]
    fn same_month_of_different_years_is_cross_month() {
        assert_eq!(
            format_dates_in_text(&day(2024, 1, 30), &day(2025, 1, 2), PT),
            "30 de janeiro a 2 de janeiro"
        );
    }

    #[test]
    fn interval_of_one_day() {
        let d = day(2024, 2, 29);
        let marked = interval_dates(&d, &d);
        assert_eq!(marked.len(), 1);
        assert_eq!(marked.get("2024-02-29"), Some(&MarkedDate::SELECTED));
    }

    #[test]
    fn interval_crosses_year_boundary() {
        let marked = interval_dates(&day(2023, 12, 30), &day(2024, 1, 2));
        let keys: Vec<_> = marked.keys().cloned().collect();
        assert_eq!(keys, ["2023-12-30", "2023-12-31", "2024-01-01", "2024-01-02"]);
    }

    #[test]
    fn reversed_interval_is_empty() {
        assert!(interval_dates(&day(2024, 1, 2), &day(2024, 1, 1)).is_empty());
    }

    #[test]
    fn first_click_starts_range() {
        let d = day(2024, 3, 5);
        let sel = DateRangeSelection::empty().select_day(d, PT);
        assert_eq!(sel.starts_at(), Some(d));
        assert_eq!(sel.ends_at(), None);
        assert_eq!(sel.label(), "");
        assert_eq!(sel.marked_dates().len(), 1);
        assert!(sel.is_marked(&d));
        assert!(!sel.is_complete());
    }

    #[test]
    fn second_click_after_start_extends() {
        let sel = DateRangeSelection::empty()
            .select_day(day(2024, 3, 5), PT)
            .select_day(day(2024, 3, 9), PT);
        assert_eq!(sel.bounds(), Some((day(2024, 3, 5), day(2024, 3, 9))));
        assert_eq!(sel.label(), "5 a 9 de março");
        assert_eq!(sel.marked_dates().len(), 5);
    }

    #[test]
    fn second_click_before_start_swaps() {
        let sel = DateRangeSelection::empty()
            .select_day(day(2024, 4, 2), PT)
            .select_day(day(2024, 3, 29), PT);
        assert_eq!(sel.bounds(), Some((day(2024, 3, 29), day(2024, 4, 2))));
        assert_eq!(sel.label(), "29 de março a 2 de abril");
    }

    #[test]
    fn clicking_start_twice_gives_one_day_range() {
        let d = day(2024, 3, 5);
        let sel = DateRangeSelection::empty().select_day(d, PT).select_day(d, PT);
        assert_eq!(sel.bounds(), Some((d, d)));
        assert_eq!(sel.label(), "5 a 5 de março");
        assert_eq!(sel.marked_dates().len(), 1);
    }

    #[test]
    fn third_click_resets() {
        let sel = DateRangeSelection::empty()
            .select_day(day(2024, 3, 5), PT)
            .select_day(day(2024, 3, 9), PT)
            .select_day(day(2024, 3, 7), PT);
        assert_eq!(sel.starts_at(), Some(day(2024, 3, 7)));
        assert_eq!(sel.ends_at(), None);
        assert_eq!(sel.label(), "");
        assert_eq!(sel.marked_dates().len(), 1);
    }

    #[test]
    fn from_bounds_orders_pair() {
        let sel = DateRangeSelection::from_bounds(day(2024, 3, 9), day(2024, 3, 5), PT);
        assert_eq!(sel.bounds(), Some((day(2024, 3, 5), day(2024, 3, 9))));
        assert_eq!(sel.label(), "5 a 9 de março");
    }

    proptest! {
        #[test]
        fn two_clicks_yield_ordered_range(d1 in arb_day(), d2 in arb_day()) {
            let sel = DateRangeSelection::empty().select_day(d1, PT).select_day(d2, PT);
            let expected = if d2 <= d1 { (d2, d1) } else { (d1, d2) };
            prop_assert_eq!(sel.bounds(), Some(expected));
        }

        #[test]
        fn third_click_always_resets(d1 in arb_day(), d2 in arb_day(), d3 in arb_day()) {
            let sel = DateRangeSelection::empty()
                .select_day(d1, PT)
                .select_day(d2, PT)
                .select_day(d3, PT);
            prop_assert_eq!(sel.starts_at(), Some(d3));
            prop_assert_eq!(sel.ends_at(), None);
        }

        #[test]
        fn interval_length_matches_day_span(a in arb_day(), span in 0u64..400) {
            let b = CalendarDay::new(a.date() + Days::new(span));
            let marked = interval_dates(&a, &b);
            prop_assert_eq!(marked.len() as u64, span + 1);
            for key in marked.keys() {
                let d = CalendarDay::parse(key).unwrap();
                prop_assert!(a <= d && d <= b);
            }
        }

        #[test]
        fn select_day_is_pure(d1 in arb_day(), d2 in arb_day()) {
            let base = DateRangeSelection::empty().select_day(d1, PT);
            prop_assert_eq!(base.select_day(d2, PT), base.select_day(d2, PT));
        }

        #[test]
        fn marked_dates_match_bounds(d1 in arb_day(), span in 0u64..60) {
            let d2 = CalendarDay::new(d1.date() + Days::new(span));
            let sel = DateRangeSelection::empty().select_day(d2, PT).select_day(d1, PT);
            let (start, end) = sel.bounds().unwrap();
            prop_assert_eq!(sel.marked_dates(), &interval_dates(&start, &end));
        }
    }
}
