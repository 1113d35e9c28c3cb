use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Locale, TimeZone, Utc};

use crate::calendar::{CalendarDay, DateError};
use crate::models::Activity;

// ─── Grouping ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityDayGroup {
    pub date: CalendarDay,
    pub activities: Vec<Activity>,
}

/// Calendar day of `instant` as seen in `zone`.
pub fn local_day<Z: TimeZone>(instant: &DateTime<Utc>, zone: &Z) -> CalendarDay {
    CalendarDay::new(instant.with_timezone(zone).date_naive())
}

/// Group activities by their local day in `zone`, earliest day first.
///
/// Activities inside a group keep the order they had in `activities`; they
/// are not re-sorted by time of day. Empty input gives no groups.
pub fn group_by_day<Z: TimeZone>(activities: &[Activity], zone: &Z) -> Vec<ActivityDayGroup> {
    let mut by_day: BTreeMap<CalendarDay, Vec<Activity>> = BTreeMap::new();
    for activity in activities {
        by_day
            .entry(local_day(&activity.date, zone))
            .or_default()
            .push(activity.clone());
    }
    by_day
        .into_iter()
        .map(|(date, activities)| ActivityDayGroup { date, activities })
        .collect()
}

// ─── Display ────────────────────────────────────────────────────────────────

/// 12-hour clock label such as "09:00h".
pub fn display_hour<Z>(instant: &DateTime<Utc>, zone: &Z) -> String
where
    Z: TimeZone,
    Z::Offset: fmt::Display,
{
    instant.with_timezone(zone).format("%I:%Mh").to_string().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledActivity {
    pub activity: Activity,
    pub hour: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySection {
    pub day: CalendarDay,
    pub title: String,
    pub activities: Vec<ScheduledActivity>,
}

/// "Dia 6 - quarta". The "-feira" suffix of Portuguese weekdays is dropped.
pub fn day_title(day: &CalendarDay, locale: Locale) -> String {
    let weekday = day.weekday_name(locale).replace("-feira", "");
    format!("Dia {} - {}", day.day(), weekday)
}

/// Render-ready sections: one titled section per day, each activity
/// annotated with its display hour.
pub fn day_sections<Z>(groups: Vec<ActivityDayGroup>, zone: &Z, locale: Locale) -> Vec<DaySection>
where
    Z: TimeZone,
    Z::Offset: fmt::Display,
{
    groups
        .into_iter()
        .map(|group| DaySection {
            day: group.date,
            title: day_title(&group.date, locale),
            activities: group
                .activities
                .into_iter()
                .map(|activity| ScheduledActivity {
                    hour: display_hour(&activity.date, zone),
                    activity,
                })
                .collect(),
        })
        .collect()
}

// ─── New activity instant ───────────────────────────────────────────────────

/// The UTC instant of `hour`:00 on `day` in `zone`.
///
/// Ambiguous local times (DST fall-back) resolve to the earlier instant.
pub fn activity_instant<Z>(day: &CalendarDay, hour: u32, zone: &Z) -> Result<DateTime<Utc>, DateError>
where
    Z: TimeZone + fmt::Debug,
{
    let naive = day
        .date()
        .and_hms_opt(hour, 0, 0)
        .ok_or(DateError::HourOutOfRange(hour))?;
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| DateError::NonexistentLocalTime {
            date: day.date(),
            hour,
            zone: format!("{zone:?}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Sao_Paulo;

    fn activity(id: &str, rfc3339: &str) -> Activity {
        Activity {
            id: id.into(),
            name: format!("activity {id}"),
            date: DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc),
            completed: false,
        }
    }

    fn ids(group: &ActivityDayGroup) -> Vec<&str> {
        group.activities.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn groups_by_utc_day_in_order() {
        let input = vec![
            activity("a", "2024-05-01T09:00:00Z"),
            activity("b", "2024-05-01T15:00:00Z"),
            activity("c", "2024-05-02T08:00:00Z"),
        ];
        let groups = group_by_day(&input, &Utc);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date.date_string(), "2024-05-01");
        assert_eq!(groups[1].date.date_string(), "2024-05-02");
        assert_eq!(ids(&groups[0]), ["a", "b"]);
        assert_eq!(ids(&groups[1]), ["c"]);
    }

    #[test]
    fn groups_sorted_even_when_input_is_not() {
        let input = vec![
            activity("late", "2024-05-03T10:00:00Z"),
            activity("early", "2024-05-01T10:00:00Z"),
            activity("mid", "2024-05-02T10:00:00Z"),
        ];
        let days: Vec<String> = group_by_day(&input, &Utc)
            .iter()
            .map(|g| g.date.date_string())
            .collect();
        assert_eq!(days, ["2024-05-01", "2024-05-02", "2024-05-03"]);
    }

    #[test]
    fn within_day_order_follows_input_not_hour() {
        let input = vec![
            activity("evening", "2024-05-01T20:00:00Z"),
            activity("morning", "2024-05-01T07:00:00Z"),
        ];
        let groups = group_by_day(&input, &Utc);
        assert_eq!(ids(&groups[0]), ["evening", "morning"]);
    }

    #[test]
    fn zone_moves_late_utc_activities_to_previous_day() {
        // 01:00 UTC is 22:00 of the previous day in São Paulo.
        let input = vec![
            activity("a", "2024-05-02T01:00:00Z"),
            activity("b", "2024-05-01T12:00:00Z"),
        ];
        let groups = group_by_day(&input, &Sao_Paulo);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].date.date_string(), "2024-05-01");
        assert_eq!(ids(&groups[0]), ["a", "b"]);
    }

    #[test]
    fn empty_input_gives_no_groups() {
        assert!(group_by_day::<Utc>(&[], &Utc).is_empty());
    }

    #[test]
    fn grouping_does_not_touch_input() {
        let input = vec![
            activity("b", "2024-05-02T10:00:00Z"),
            activity("a", "2024-05-01T10:00:00Z"),
        ];
        let before = input.clone();
        let first = group_by_day(&input, &Utc);
        let second = group_by_day(&input, &Utc);
        assert_eq!(input, before);
        assert_eq!(first, second);
    }

    #[test]
    fn hour_uses_twelve_hour_clock() {
        let a = activity("a", "2024-05-01T15:30:00Z");
        assert_eq!(display_hour(&a.date, &Utc), "03:30h");
        assert_eq!(display_hour(&a.date, &Sao_Paulo), "12:30h");
    }

    #[test]
    fn section_titles_drop_feira() {
        let day = CalendarDay::from_ymd(2024, 3, 6).unwrap();
        assert_eq!(day_title(&day, Locale::pt_BR), "Dia 6 - quarta");
    }

    #[test]
    fn sections_carry_hours() {
        let input = vec![activity("a", "2024-03-06T09:00:00Z")];
        let sections = day_sections(group_by_day(&input, &Utc), &Utc, Locale::pt_BR);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Dia 6 - quarta");
        assert_eq!(sections[0].activities[0].hour, "09:00h");
    }

    #[test]
    fn activity_instant_converts_local_hour_to_utc() {
        let day = CalendarDay::from_ymd(2024, 5, 1).unwrap();
        let instant = activity_instant(&day, 9, &Sao_Paulo).unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-05-01T12:00:00+00:00");
    }

    #[test]
    fn activity_instant_rejects_bad_hour() {
        let day = CalendarDay::from_ymd(2024, 5, 1).unwrap();
        assert_eq!(activity_instant(&day, 24, &Utc), Err(DateError::HourOutOfRange(24)));
    }

    #[test]
    fn activity_instant_rejects_skipped_local_hour() {
        // São Paulo jumped from 00:00 to 01:00 on 2018-11-04.
        let day = CalendarDay::from_ymd(2018, 11, 4).unwrap();
        assert!(matches!(
            activity_instant(&day, 0, &Sao_Paulo),
            Err(DateError::NonexistentLocalTime { .. })
        ));
        let one_am = activity_instant(&day, 1, &Sao_Paulo).unwrap();
        assert_eq!(one_am.to_rfc3339(), "2018-11-04T03:00:00+00:00");
    }
}
