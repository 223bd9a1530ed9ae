use chrono::NaiveDate;

/// Daily attendance outcome for a student or a teacher. Arabic strings are
/// the stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Excused,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "حاضر",
            AttendanceStatus::Absent => "غائب",
            AttendanceStatus::Excused => "مستأذن",
            AttendanceStatus::Late => "متأخر",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "حاضر" => Some(AttendanceStatus::Present),
            "غائب" => Some(AttendanceStatus::Absent),
            "مستأذن" => Some(AttendanceStatus::Excused),
            "متأخر" => Some(AttendanceStatus::Late),
            _ => None,
        }
    }
}

/// Absences at or above this count put a student on the preparer's risk list.
pub const ABSENCE_RISK_THRESHOLD: i64 = 5;

/// Counts absence dates after the reset baseline. A missing baseline counts
/// all history; the baseline day itself is excluded (strictly greater).
pub fn counted_absences(absence_dates: &[NaiveDate], baseline: Option<NaiveDate>) -> i64 {
    absence_dates
        .iter()
        .filter(|date| baseline.map_or(true, |b| **date > b))
        .count() as i64
}

pub fn is_at_risk(absence_count: i64) -> bool {
    absence_count >= ABSENCE_RISK_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap() + Duration::days(offset)
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
            AttendanceStatus::Excused,
            AttendanceStatus::Late,
        ] {
            assert_eq!(AttendanceStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AttendanceStatus::parse("present"), None);
        assert_eq!(AttendanceStatus::parse(""), None);
    }

    #[test]
    fn test_counts_all_history_without_baseline() {
        let dates = vec![day(0), day(1), day(2)];
        assert_eq!(counted_absences(&dates, None), 3);
    }

    #[test]
    fn test_baseline_day_excluded() {
        let dates = vec![day(0), day(1), day(2)];
        assert_eq!(counted_absences(&dates, Some(day(1))), 1);
        assert_eq!(counted_absences(&dates, Some(day(2))), 0);
    }

    #[test]
    fn test_risk_threshold_boundary() {
        let five: Vec<NaiveDate> = (0..5).map(day).collect();
        let four: Vec<NaiveDate> = (0..4).map(day).collect();
        assert!(is_at_risk(counted_absences(&five, None)));
        assert!(!is_at_risk(counted_absences(&four, None)));
    }

    #[test]
    fn test_reset_restarts_the_window() {
        // five absences, reset after the second: only three count
        let dates: Vec<NaiveDate> = (0..5).map(day).collect();
        let count = counted_absences(&dates, Some(day(1)));
        assert_eq!(count, 3);
        assert!(!is_at_risk(count));
    }
}
