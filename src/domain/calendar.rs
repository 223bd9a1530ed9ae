use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// One seeded week of the term. Weeks are non-overlapping and ordered; each
/// covers Sunday through Thursday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarWeek {
    pub week_number: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Number of study weeks in the term.
pub const TERM_WEEKS: i32 = 19;

/// Builds the full term partition: `TERM_WEEKS` contiguous five-weekday
/// windows starting at `term_start` (a Sunday).
pub fn term_weeks(term_start: NaiveDate) -> Vec<CalendarWeek> {
    (1..=TERM_WEEKS)
        .map(|week_number| {
            let start_date = term_start + Duration::weeks(i64::from(week_number - 1));
            CalendarWeek {
                week_number,
                start_date,
                end_date: start_date + Duration::days(4),
            }
        })
        .collect()
}

/// Resolves a date to its week number. Total: dates outside every seeded
/// window resolve to week 1 rather than erroring.
pub fn week_for(weeks: &[CalendarWeek], date: NaiveDate) -> i32 {
    weeks
        .iter()
        .find(|week| week.start_date <= date && date <= week.end_date)
        .map(|week| week.week_number)
        .unwrap_or(1)
}

pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Sun => "الأحد",
        Weekday::Mon => "الاثنين",
        Weekday::Tue => "الثلاثاء",
        Weekday::Wed => "الأربعاء",
        Weekday::Thu => "الخميس",
        Weekday::Fri => "الجمعة",
        Weekday::Sat => "السبت",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term_start() -> NaiveDate {
        // Sunday, first day of the seeded term
        NaiveDate::from_ymd_opt(2026, 1, 18).unwrap()
    }

    #[test]
    fn test_term_partition_shape() {
        let weeks = term_weeks(term_start());
        assert_eq!(weeks.len(), 19);
        assert_eq!(weeks[0].start_date, term_start());
        for week in &weeks {
            assert_eq!(week.start_date.weekday(), Weekday::Sun);
            assert_eq!(week.end_date.weekday(), Weekday::Thu);
            assert_eq!((week.end_date - week.start_date).num_days(), 4);
        }
        for pair in weeks.windows(2) {
            assert_eq!(pair[1].week_number, pair[0].week_number + 1);
            assert_eq!((pair[1].start_date - pair[0].start_date).num_days(), 7);
        }
    }

    #[test]
    fn test_week_for_matches_exactly_one_window() {
        let weeks = term_weeks(term_start());
        let mut date = term_start();
        let term_end = weeks.last().unwrap().end_date;
        while date <= term_end {
            let hits = weeks
                .iter()
                .filter(|w| w.start_date <= date && date <= w.end_date)
                .count();
            if hits == 1 {
                let expected = weeks
                    .iter()
                    .find(|w| w.start_date <= date && date <= w.end_date)
                    .unwrap()
                    .week_number;
                assert_eq!(week_for(&weeks, date), expected);
            } else {
                // Friday/Saturday fall between windows
                assert_eq!(hits, 0);
            }
            date = date + Duration::days(1);
        }
    }

    #[test]
    fn test_week_for_fallback_is_week_one() {
        let weeks = term_weeks(term_start());
        let before = term_start() - Duration::days(30);
        let after = weeks.last().unwrap().end_date + Duration::days(30);
        assert_eq!(week_for(&weeks, before), 1);
        assert_eq!(week_for(&weeks, after), 1);
        assert_eq!(week_for(&[], term_start()), 1);
    }

    #[test]
    fn test_week_boundaries_inclusive() {
        let weeks = term_weeks(term_start());
        assert_eq!(week_for(&weeks, weeks[2].start_date), 3);
        assert_eq!(week_for(&weeks, weeks[2].end_date), 3);
    }

    #[test]
    fn test_weekday_names() {
        // 2026-01-18 is a Sunday
        assert_eq!(weekday_name(term_start()), "الأحد");
        assert_eq!(weekday_name(term_start() + Duration::days(4)), "الخميس");
        assert_eq!(weekday_name(term_start() + Duration::days(5)), "الجمعة");
    }
}
