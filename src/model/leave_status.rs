use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Lifecycle status of a leave record. A rejected record keeps its
/// `Pending` status and is closed through the separate `rejected` flag,
/// so `Approved` here always means the leave was granted.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum LeaveStatus {
    Pending,
    Approved,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_exact_variant_names() {
        assert_eq!(LeaveStatus::from_str("Pending").unwrap(), LeaveStatus::Pending);
        assert_eq!(LeaveStatus::from_str("Approved").unwrap(), LeaveStatus::Approved);
    }

    #[test]
    fn rejects_unknown_status() {
        assert!(LeaveStatus::from_str("Rejected").is_err());
        assert!(LeaveStatus::from_str("pending").is_err());
    }

    #[test]
    fn round_trips_through_display() {
        assert_eq!(LeaveStatus::Pending.to_string(), "Pending");
        assert_eq!(
            LeaveStatus::from_str(&LeaveStatus::Approved.to_string()).unwrap(),
            LeaveStatus::Approved
        );
    }
}
