use serde::Serialize;

/// Normalized payment outcome every provider status code maps into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaidStatus {
    Paid,
    PaidFail,
    PaidProcessing,
    /// The provider sent a status this crate does not recognize.
    #[default]
    PaidUnknown,
}

impl PaidStatus {
    pub fn code(self) -> i32 {
        match self {
            Self::Paid => 1,
            Self::PaidFail => 2,
            Self::PaidProcessing => 3,
            Self::PaidUnknown => -1,
        }
    }

    /// Whether this outcome is final and must be written to the settlement ledger.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Paid | Self::PaidFail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(PaidStatus::default(), PaidStatus::PaidUnknown);
        assert_eq!(PaidStatus::default().code(), -1);
    }

    #[test]
    fn test_only_paid_and_fail_are_terminal() {
        assert!(PaidStatus::Paid.is_terminal());
        assert!(PaidStatus::PaidFail.is_terminal());
        assert!(!PaidStatus::PaidProcessing.is_terminal());
        assert!(!PaidStatus::PaidUnknown.is_terminal());
    }
}
