use actix_web::http::StatusCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Commands the coordinator can send to the leave ledger. Serialized as
/// `{"cmd": "<name>", "payload": {..}}` so the wire shape stays a named
/// command plus a structured payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "payload", rename_all = "camelCase")]
pub enum LedgerCommand {
    ApplyLeave {
        email: String,
        #[serde(rename = "leaveDate")]
        leave_date: NaiveDate,
    },
    CheckEmployeeLeave {},
    ViewOwnLeave {
        email: String,
    },
    ViewEmployeePendingLeaveByEmail {
        email: String,
    },
    ViewEmployeePendingLeave {
        status: String,
    },
    ApproveEmployeeLeaves {
        email: String,
        #[serde(rename = "date")]
        leave_date: NaiveDate,
    },
    RejectEmployeeLeaves {
        email: String,
        #[serde(rename = "date")]
        leave_date: NaiveDate,
    },
}

/// Reply envelope for every ledger command. `status` is an HTTP status
/// code the coordinator passes through verbatim on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerReply {
    pub status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl LedgerReply {
    fn bare(status: StatusCode, message: String) -> Self {
        Self {
            status: status.as_u16(),
            message,
            result: None,
        }
    }

    pub fn ok(message: String) -> Self {
        Self::bare(StatusCode::OK, message)
    }

    pub fn created(message: String) -> Self {
        Self::bare(StatusCode::CREATED, message)
    }

    pub fn with_result(message: String, result: Value) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message,
            result: Some(result),
        }
    }

    pub fn failure(status: StatusCode, message: String) -> Self {
        Self::bare(status, message)
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn is(&self, expected: StatusCode) -> bool {
        self.status == expected.as_u16()
    }
}
