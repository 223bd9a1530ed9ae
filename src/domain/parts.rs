/// Testing milestones through the Quran, in exam order. "0" means the student
/// has not been tested yet; "30" is the full Quran.
pub const PART_SEQUENCE: [&str; 12] = [
    "0", "1", "2", "3", "5", "8", "10", "13", "15", "20", "25", "30",
];

pub const UNTESTED: &str = "0";

/// The milestone a student should be examined on next.
///
/// At the end of the sequence this stays at "30"; an unrecognized current
/// value falls back to "1". The two fallbacks differ on purpose — this matches
/// the behavior teachers already rely on.
pub fn next_part(current: &str) -> &'static str {
    match PART_SEQUENCE.iter().position(|p| *p == current.trim()) {
        Some(idx) if idx < PART_SEQUENCE.len() - 1 => PART_SEQUENCE[idx + 1],
        Some(_) => "30",
        None => "1",
    }
}

/// Coerces free-form input to a member of the sequence, defaulting to
/// untested. Used at registration, where legacy data carried prose values.
pub fn normalize_part(raw: &str) -> &'static str {
    PART_SEQUENCE
        .iter()
        .find(|p| **p == raw.trim())
        .copied()
        .unwrap_or(UNTESTED)
}

pub fn part_label(code: &str) -> String {
    match code.trim() {
        "0" => "لم يتم الاختبار".to_string(),
        "30" => "جزء 30 (القرآن كاملاً)".to_string(),
        other => format!("جزء {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_part_advances() {
        assert_eq!(next_part("0"), "1");
        assert_eq!(next_part("3"), "5");
        assert_eq!(next_part("25"), "30");
    }

    #[test]
    fn test_next_part_saturates_at_end() {
        assert_eq!(next_part("30"), "30");
    }

    #[test]
    fn test_next_part_unknown_falls_back_to_one() {
        assert_eq!(next_part("4"), "1");
        assert_eq!(next_part("لم يتم الاختبار من قبل"), "1");
        assert_eq!(next_part(""), "1");
    }

    #[test]
    fn test_normalize_part() {
        assert_eq!(normalize_part("15"), "15");
        assert_eq!(normalize_part(" 30 "), "30");
        assert_eq!(normalize_part("junk"), "0");
        assert_eq!(normalize_part(""), "0");
    }

    #[test]
    fn test_part_labels() {
        assert_eq!(part_label("0"), "لم يتم الاختبار");
        assert_eq!(part_label("5"), "جزء 5");
        assert_eq!(part_label("30"), "جزء 30 (القرآن كاملاً)");
    }
}
