/// Grade codes accepted on the registration form: six primary years, three
/// intermediate, three secondary, and university.
pub const GRADE_CODES: [&str; 13] = [
    "1_pri", "2_pri", "3_pri", "4_pri", "5_pri", "6_pri", "1_med", "2_med", "3_med", "1_sec",
    "2_sec", "3_sec", "uni",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EducationalStage {
    Early,
    UpperPrimary,
    Intermediate,
    Secondary,
    University,
}

impl EducationalStage {
    /// Canonical stored value. The Arabic labels are the wire and database
    /// vocabulary, so stage comparisons happen on these strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            EducationalStage::Early => "مبكرة",
            EducationalStage::UpperPrimary => "عليا",
            EducationalStage::Intermediate => "متوسط",
            EducationalStage::Secondary => "ثانوي",
            EducationalStage::University => "جامعي",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "مبكرة" => Some(EducationalStage::Early),
            "عليا" => Some(EducationalStage::UpperPrimary),
            "متوسط" => Some(EducationalStage::Intermediate),
            "ثانوي" => Some(EducationalStage::Secondary),
            "جامعي" => Some(EducationalStage::University),
            _ => None,
        }
    }
}

pub fn is_valid_grade(code: &str) -> bool {
    GRADE_CODES.contains(&code.trim())
}

/// Derives the educational stage from a grade code. Total: any code outside
/// the school grades maps to university, matching the registration flow where
/// adults pick "uni".
pub fn stage_for_code(grade: &str) -> EducationalStage {
    match grade.trim() {
        "1_pri" | "2_pri" | "3_pri" => EducationalStage::Early,
        "4_pri" | "5_pri" | "6_pri" => EducationalStage::UpperPrimary,
        "1_med" | "2_med" | "3_med" => EducationalStage::Intermediate,
        "1_sec" | "2_sec" | "3_sec" => EducationalStage::Secondary,
        _ => EducationalStage::University,
    }
}

pub fn grade_label(code: &str) -> &'static str {
    match code.trim() {
        "1_pri" => "أول ابتدائي",
        "2_pri" => "ثاني ابتدائي",
        "3_pri" => "ثالث ابتدائي",
        "4_pri" => "رابع ابتدائي",
        "5_pri" => "خامس ابتدائي",
        "6_pri" => "سادس ابتدائي",
        "1_med" => "أول متوسط",
        "2_med" => "ثاني متوسط",
        "3_med" => "ثالث متوسط",
        "1_sec" => "أول ثانوي",
        "2_sec" => "ثاني ثانوي",
        "3_sec" => "ثالث ثانوي",
        "uni" => "جامعي",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_mapping_table() {
        let expected = [
            ("1_pri", "مبكرة"),
            ("2_pri", "مبكرة"),
            ("3_pri", "مبكرة"),
            ("4_pri", "عليا"),
            ("5_pri", "عليا"),
            ("6_pri", "عليا"),
            ("1_med", "متوسط"),
            ("2_med", "متوسط"),
            ("3_med", "متوسط"),
            ("1_sec", "ثانوي"),
            ("2_sec", "ثانوي"),
            ("3_sec", "ثانوي"),
            ("uni", "جامعي"),
        ];
        for (grade, stage) in expected {
            assert_eq!(stage_for_code(grade).as_str(), stage, "grade {grade}");
        }
    }

    #[test]
    fn test_unknown_grade_maps_to_university() {
        assert_eq!(stage_for_code(""), EducationalStage::University);
        assert_eq!(stage_for_code("7_pri"), EducationalStage::University);
    }

    #[test]
    fn test_grade_validation() {
        for code in GRADE_CODES {
            assert!(is_valid_grade(code));
        }
        assert!(!is_valid_grade("4_sec"));
        assert!(!is_valid_grade(""));
    }

    #[test]
    fn test_stage_parse_roundtrip() {
        for stage in [
            EducationalStage::Early,
            EducationalStage::UpperPrimary,
            EducationalStage::Intermediate,
            EducationalStage::Secondary,
            EducationalStage::University,
        ] {
            assert_eq!(EducationalStage::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(EducationalStage::parse("primary"), None);
    }
}
