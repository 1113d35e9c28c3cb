use chrono::{Datelike, Locale, Months, NaiveDate, TimeDelta};

use crate::calendar::CalendarDay;

/// One calendar row, Sunday first. `None` pads days outside the month.
pub type Week = [Option<CalendarDay>; 7];

/// Keyboard-driven month calendar. The cursor never leaves `[min, max]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePicker {
    cursor: CalendarDay,
    min: Option<CalendarDay>,
    max: Option<CalendarDay>,
}

impl DatePicker {
    pub fn new(initial: CalendarDay, min: Option<CalendarDay>, max: Option<CalendarDay>) -> Self {
        let mut picker = Self {
            cursor: initial,
            min,
            max,
        };
        picker.cursor = picker.clamp(initial.date());
        picker
    }

    pub fn cursor(&self) -> CalendarDay {
        self.cursor
    }

    fn clamp(&self, date: NaiveDate) -> CalendarDay {
        let mut day = CalendarDay::new(date);
        if let Some(min) = self.min {
            day = day.max(min);
        }
        if let Some(max) = self.max {
            day = day.min(max);
        }
        day
    }

    pub fn move_days(&mut self, delta: i64) {
        if let Some(date) = self.cursor.date().checked_add_signed(TimeDelta::days(delta)) {
            self.cursor = self.clamp(date);
        }
    }

    pub fn move_months(&mut self, delta: i32) {
        let months = Months::new(delta.unsigned_abs());
        let moved = if delta >= 0 {
            self.cursor.date().checked_add_months(months)
        } else {
            self.cursor.date().checked_sub_months(months)
        };
        if let Some(date) = moved {
            self.cursor = self.clamp(date);
        }
    }

    pub fn is_selectable(&self, day: &CalendarDay) -> bool {
        self.min.map_or(true, |min| *day >= min) && self.max.map_or(true, |max| *day <= max)
    }

    /// Weeks of the cursor's month.
    pub fn weeks(&self) -> Vec<Week> {
        let date = self.cursor.date();
        let Some(first) = NaiveDate::from_ymd_opt(date.year(), date.month(), 1) else {
            return Vec::new();
        };

        let mut weeks = Vec::new();
        let mut week: Week = [None; 7];
        let mut col = first.weekday().num_days_from_sunday() as usize;
        for day in first.iter_days().take_while(|d| d.month() == first.month()) {
            week[col] = Some(CalendarDay::new(day));
            col += 1;
            if col == 7 {
                weeks.push(week);
                week = [None; 7];
                col = 0;
            }
        }
        if col > 0 {
            weeks.push(week);
        }
        weeks
    }

    /// "março 2024".
    pub fn title(&self, locale: Locale) -> String {
        format!("{} {}", self.cursor.month_name(locale), self.cursor.year())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> CalendarDay {
        CalendarDay::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn march_2024_layout() {
        let picker = DatePicker::new(day(2024, 3, 15), None, None);
        let weeks = picker.weeks();
        assert_eq!(weeks.len(), 6);
        // March 1st 2024 is a Friday.
        assert_eq!(weeks[0][4], None);
        assert_eq!(weeks[0][5], Some(day(2024, 3, 1)));
        assert_eq!(weeks[5][0], Some(day(2024, 3, 31)));
        assert_eq!(weeks[5][1], None);
    }

    #[test]
    fn cursor_is_clamped_to_bounds() {
        let min = day(2024, 3, 5);
        let max = day(2024, 3, 9);
        let mut picker = DatePicker::new(day(2024, 3, 1), Some(min), Some(max));
        assert_eq!(picker.cursor(), min);

        picker.move_days(-7);
        assert_eq!(picker.cursor(), min);
        picker.move_days(3);
        assert_eq!(picker.cursor(), day(2024, 3, 8));
        picker.move_months(1);
        assert_eq!(picker.cursor(), max);

        assert!(picker.is_selectable(&day(2024, 3, 7)));
        assert!(!picker.is_selectable(&day(2024, 3, 10)));
    }

    #[test]
    fn month_moves_keep_day_when_possible() {
        let mut picker = DatePicker::new(day(2024, 1, 31), None, None);
        picker.move_months(1);
        assert_eq!(picker.cursor(), day(2024, 2, 29));
        picker.move_months(-2);
        assert_eq!(picker.cursor(), day(2023, 12, 29));
    }

    #[test]
    fn title_is_localized() {
        let picker = DatePicker::new(day(2024, 3, 15), None, None);
        assert_eq!(picker.title(Locale::pt_BR), "março 2024");
    }
}
