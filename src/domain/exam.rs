/// Minimum grade on both the teacher assessment and the internal exam for a
/// nomination to pass the internal stage.
pub const PASS_MARK: f64 = 85.0;

/// The internal stage passes only when both grades are recorded and both meet
/// the pass mark.
pub fn internal_passed(teacher_grade: Option<f64>, internal_grade: Option<f64>) -> bool {
    matches!(
        (teacher_grade, internal_grade),
        (Some(teacher), Some(internal)) if teacher >= PASS_MARK && internal >= PASS_MARK
    )
}

/// A nomination moves to the association stage only after passing the
/// internal exam and before an association grade is recorded.
pub fn association_eligible(passed_internal: bool, association_tested: bool) -> bool {
    passed_internal && !association_tested
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_pass_truth_table() {
        assert!(!internal_passed(Some(84.0), Some(90.0)));
        assert!(!internal_passed(Some(90.0), Some(84.0)));
        assert!(internal_passed(Some(85.0), Some(85.0)));
        assert!(!internal_passed(Some(84.0), Some(84.0)));
        assert!(internal_passed(Some(100.0), Some(92.5)));
    }

    #[test]
    fn test_missing_grade_never_passes() {
        assert!(!internal_passed(None, Some(95.0)));
        assert!(!internal_passed(Some(95.0), None));
        assert!(!internal_passed(None, None));
    }

    #[test]
    fn test_association_eligibility() {
        assert!(association_eligible(true, false));
        assert!(!association_eligible(true, true));
        assert!(!association_eligible(false, false));
        assert!(!association_eligible(false, true));
    }
}
