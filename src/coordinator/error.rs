use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::db::StoreError;
use crate::rpc::client::RpcError;
use crate::rpc::contract::LedgerReply;

/// Coordinator-side error taxonomy. `Upstream` preserves a ledger reply's
/// status and message verbatim; everything else originates here.
#[derive(Debug, Display)]
pub enum WorkflowError {
    #[display(fmt = "{}", _0)]
    Unauthorized(String),
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "{}", _0)]
    BadRequest(String),
    #[display(fmt = "{}", _0)]
    NotAcceptable(String),
    #[display(fmt = "{}", _0)]
    Gone(String),
    #[display(fmt = "{}", message)]
    Upstream { status: StatusCode, message: String },
    #[display(fmt = "Leave ledger unavailable")]
    LedgerUnavailable(RpcError),
    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl ResponseError for WorkflowError {
    fn status_code(&self) -> StatusCode {
        match self {
            WorkflowError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            WorkflowError::Forbidden(_) => StatusCode::FORBIDDEN,
            WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkflowError::Conflict(_) => StatusCode::CONFLICT,
            WorkflowError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WorkflowError::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            WorkflowError::Gone(_) => StatusCode::GONE,
            WorkflowError::Upstream { status, .. } => *status,
            WorkflowError::LedgerUnavailable(RpcError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            WorkflowError::LedgerUnavailable(_) => StatusCode::BAD_GATEWAY,
            WorkflowError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

impl From<RpcError> for WorkflowError {
    fn from(e: RpcError) -> Self {
        WorkflowError::LedgerUnavailable(e)
    }
}

impl From<StoreError> for WorkflowError {
    fn from(e: StoreError) -> Self {
        tracing::error!(error = %e, "balance storage failure");
        WorkflowError::Internal
    }
}

/// Status-code passthrough: a reply that is not the expected success
/// code is re-raised to the caller with the ledger's status and message
/// untouched.
pub fn expect_reply(reply: LedgerReply, expected: StatusCode) -> Result<LedgerReply, WorkflowError> {
    if reply.is(expected) {
        Ok(reply)
    } else {
        Err(WorkflowError::Upstream {
            status: reply.status_code(),
            message: reply.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_preserves_status_and_message() {
        let reply = LedgerReply::failure(StatusCode::GONE, "Link expired".to_string());
        let err = expect_reply(reply, StatusCode::OK).unwrap_err();
        match err {
            WorkflowError::Upstream { status, message } => {
                assert_eq!(status, StatusCode::GONE);
                assert_eq!(message, "Link expired");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn expected_reply_passes_through() {
        let reply = LedgerReply::created("done".to_string());
        assert!(expect_reply(reply, StatusCode::CREATED).is_ok());
    }

    #[test]
    fn taxonomy_maps_to_http_codes() {
        assert_eq!(
            WorkflowError::NotAcceptable(String::new()).status_code(),
            StatusCode::NOT_ACCEPTABLE
        );
        assert_eq!(
            WorkflowError::Gone(String::new()).status_code(),
            StatusCode::GONE
        );
        assert_eq!(
            WorkflowError::LedgerUnavailable(RpcError::Timeout).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
