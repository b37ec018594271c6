use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::leave_status::LeaveStatus;

/// A single leave request as the ledger stores it. One record per
/// (email, leave_date); rejected records persist forever and block any
/// new request for the same date.
#[derive(Debug, Clone, Serialize)]
pub struct LeaveRecord {
    pub email: String,
    pub leave_date: NaiveDate,
    pub status: LeaveStatus,
    pub rejected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approve_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_link: Option<String>,
}

impl LeaveRecord {
    pub fn pending(email: &str, leave_date: NaiveDate) -> Self {
        Self {
            email: email.to_string(),
            leave_date,
            status: LeaveStatus::Pending,
            rejected: false,
            approve_link: None,
            reject_link: None,
        }
    }
}

/// Redacted projection for listing endpoints: capability tokens never
/// leave the ledger through these.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveView {
    #[schema(example = "alice@x.com", format = "email")]
    pub email: String,
    #[schema(example = "2025-12-01", format = "date", value_type = String)]
    pub leave_date: NaiveDate,
    #[schema(example = "Pending", value_type = String)]
    pub status: LeaveStatus,
    #[schema(example = false)]
    pub rejected: bool,
}

impl From<&LeaveRecord> for LeaveView {
    fn from(record: &LeaveRecord) -> Self {
        Self {
            email: record.email.clone(),
            leave_date: record.leave_date,
            status: record.status,
            rejected: record.rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_links() -> LeaveRecord {
        LeaveRecord {
            approve_link: Some("http://host/approve".to_string()),
            reject_link: Some("http://host/reject".to_string()),
            ..LeaveRecord::pending("alice@x.com", NaiveDate::from_ymd_opt(2025, 12, 1).unwrap())
        }
    }

    #[test]
    fn view_redacts_capability_links() {
        let view = LeaveView::from(&record_with_links());
        let wire = serde_json::to_value(&view).unwrap();
        assert!(wire.get("approve_link").is_none());
        assert!(wire.get("reject_link").is_none());
        assert_eq!(wire["email"], "alice@x.com");
        assert_eq!(wire["status"], "Pending");
    }

    #[test]
    fn enriched_record_serializes_links() {
        let wire = serde_json::to_value(record_with_links()).unwrap();
        assert_eq!(wire["approve_link"], "http://host/approve");
        assert_eq!(wire["reject_link"], "http://host/reject");
    }

    #[test]
    fn bare_record_omits_absent_links() {
        let record = LeaveRecord::pending("bob@x.com", NaiveDate::from_ymd_opt(2025, 12, 2).unwrap());
        let wire = serde_json::to_value(record).unwrap();
        assert!(wire.get("approve_link").is_none());
        assert!(wire.get("reject_link").is_none());
    }
}
