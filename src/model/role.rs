use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Closed set of roles a session can carry. Unknown role strings fail
/// at parse time instead of silently granting nothing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_known_roles() {
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("employee").unwrap(), Role::Employee);
    }

    #[test]
    fn rejects_unknown_role() {
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }
}
