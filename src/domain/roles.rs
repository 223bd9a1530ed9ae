use serde::{Deserialize, Serialize};

/// Membership labels a user can hold. Fixed set, seeded once; a user may
/// carry any combination of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleCode {
    Preparer,
    Examiner,
    Finance,
    Supervisor,
    Manager,
}

impl RoleCode {
    pub const ALL: [RoleCode; 5] = [
        RoleCode::Preparer,
        RoleCode::Examiner,
        RoleCode::Finance,
        RoleCode::Supervisor,
        RoleCode::Manager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleCode::Preparer => "preparer",
            RoleCode::Examiner => "examiner",
            RoleCode::Finance => "finance",
            RoleCode::Supervisor => "supervisor",
            RoleCode::Manager => "manager",
        }
    }

    /// Display name stored alongside the code in the roles table.
    pub fn label(&self) -> &'static str {
        match self {
            RoleCode::Preparer => "المُحضّر",
            RoleCode::Examiner => "المُختبر",
            RoleCode::Finance => "المالي",
            RoleCode::Supervisor => "المشرف",
            RoleCode::Manager => "المدير",
        }
    }
}

impl TryFrom<&str> for RoleCode {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "preparer" => Ok(RoleCode::Preparer),
            "examiner" => Ok(RoleCode::Examiner),
            "finance" => Ok(RoleCode::Finance),
            "supervisor" => Ok(RoleCode::Supervisor),
            "manager" => Ok(RoleCode::Manager),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for role in RoleCode::ALL {
            assert_eq!(RoleCode::try_from(role.as_str()), Ok(role));
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert!(RoleCode::try_from("teacher").is_err());
        assert!(RoleCode::try_from("").is_err());
    }

    #[test]
    fn test_labels() {
        assert_eq!(RoleCode::Supervisor.label(), "المشرف");
        assert_eq!(RoleCode::Preparer.label(), "المُحضّر");
    }
}
