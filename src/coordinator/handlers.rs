use actix_web::{HttpResponse, http::StatusCode, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::ledger::capability::DATE_FORMAT;
use crate::rpc::client::LedgerClient;
use crate::rpc::contract::LedgerCommand;

use super::balance::{BalanceAuthority, DebitOutcome};
use super::error::{WorkflowError, expect_reply};

#[derive(Deserialize, ToSchema)]
pub struct ApplyLeave {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub leave_date: String,
}

#[derive(Deserialize, IntoParams)]
pub struct DecisionQuery {
    /// Leave date the capability link was issued for
    #[serde(rename = "leaveDate")]
    #[param(example = "2026-01-01", value_type = String)]
    pub leave_date: NaiveDate,
    /// Employee the capability link was issued for
    #[param(example = "alice@x.com")]
    pub email: String,
}

#[derive(serde::Serialize, ToSchema)]
pub struct EmployeeDetails {
    #[schema(example = "alice@x.com")]
    pub email: String,
    #[schema(example = "Alice")]
    pub name: String,
    #[schema(example = 10)]
    pub available_leaves: u32,
}

fn parse_leave_date(raw: &str) -> Result<NaiveDate, WorkflowError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
        WorkflowError::BadRequest("`leave_date` must be in the format yyyy-mm-dd".to_string())
    })
}

/// Admission rules for a new leave request: strictly-future date and at
/// least one leave left. One combined rejection, matching the ledger's
/// external contract.
fn validate_application(
    date: NaiveDate,
    today: NaiveDate,
    available: u32,
) -> Result<(), WorkflowError> {
    if date <= today || available < 1 {
        return Err(WorkflowError::NotAcceptable(
            "Cannot apply leave for past dates or no leaves available".to_string(),
        ));
    }
    Ok(())
}

/* =========================
Apply leave
========================= */
/// Swagger doc for apply_leave endpoint
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = ApplyLeave,
        description = "Leave application payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave applied", body = Object, example = json!({
            "message": "Successfully applied leave for date 2026-01-01"
        })),
        (status = 400, description = "Malformed leave date"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No employee record for the caller"),
        (status = 406, description = "Past date or no leaves available"),
        (status = 409, description = "Leave already exists or was rejected for that date")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn apply_leave(
    auth: AuthUser,
    ledger: web::Data<LedgerClient>,
    balance: web::Data<dyn BalanceAuthority>,
    payload: web::Json<ApplyLeave>,
) -> Result<HttpResponse, WorkflowError> {
    // 1️⃣ validate the date string
    let date = parse_leave_date(&payload.leave_date)?;

    // 2️⃣ admission rules against the balance authority
    let available = balance
        .available_leaves(&auth.email)
        .await?
        .ok_or_else(|| WorkflowError::NotFound(format!("No employee record for {}", auth.email)))?;
    validate_application(date, Utc::now().date_naive(), available)?;

    // 3️⃣ hand over to the ledger
    let reply = ledger
        .call(&LedgerCommand::ApplyLeave {
            email: auth.email.clone(),
            leave_date: date,
        })
        .await?;
    let reply = expect_reply(reply, StatusCode::CREATED)?;

    Ok(HttpResponse::Created().json(json!({ "message": reply.message })))
}

/* =========================
List all leaves (Admin)
========================= */
/// Swagger doc for list_leaves endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    responses(
        (status = 200, description = "All leave records, capability links redacted", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn list_leaves(
    auth: AuthUser,
    ledger: web::Data<LedgerClient>,
) -> Result<HttpResponse, WorkflowError> {
    auth.require_admin()?;

    let reply = ledger.call(&LedgerCommand::CheckEmployeeLeave {}).await?;
    let reply = expect_reply(reply, StatusCode::OK)?;

    Ok(HttpResponse::Ok().json(json!({ "message": reply.message, "result": reply.result })))
}

/* =========================
Own leave history
========================= */
/// Swagger doc for own_leaves endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/own",
    responses(
        (status = 200, description = "Caller's leave records", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Caller has not applied for any leave")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn own_leaves(
    auth: AuthUser,
    ledger: web::Data<LedgerClient>,
) -> Result<HttpResponse, WorkflowError> {
    let reply = ledger
        .call(&LedgerCommand::ViewOwnLeave {
            email: auth.email.clone(),
        })
        .await?;
    let reply = expect_reply(reply, StatusCode::OK)?;

    Ok(HttpResponse::Ok().json(json!({ "message": reply.message, "result": reply.result })))
}

/* =========================
Pending leaves by employee (Admin)
========================= */
/// Swagger doc for pending_by_email endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/employee/{email}",
    params(
        ("email" = String, Path, description = "Employee email to inspect")
    ),
    responses(
        (status = 200, description = "Employee's leave records", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No pending leaves or invalid email")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn pending_by_email(
    auth: AuthUser,
    ledger: web::Data<LedgerClient>,
    path: web::Path<String>,
) -> Result<HttpResponse, WorkflowError> {
    auth.require_admin()?;

    let email = path.into_inner();
    let reply = ledger
        .call(&LedgerCommand::ViewEmployeePendingLeaveByEmail { email })
        .await?;
    let reply = expect_reply(reply, StatusCode::OK)?;

    Ok(HttpResponse::Ok().json(json!({ "message": reply.message, "result": reply.result })))
}

/* =========================
Pending leaves by status (Admin): issues capability links
========================= */
/// Swagger doc for pending_by_status endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/status/{status}",
    params(
        ("status" = String, Path, description = "Leave status filter, `Pending` or `Approved`")
    ),
    responses(
        (status = 200, description = "Matching records; Pending ones carry freshly issued approve/reject links", body = Object),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn pending_by_status(
    auth: AuthUser,
    ledger: web::Data<LedgerClient>,
    path: web::Path<String>,
) -> Result<HttpResponse, WorkflowError> {
    auth.require_admin()?;

    let status = path.into_inner();
    let reply = ledger
        .call(&LedgerCommand::ViewEmployeePendingLeave { status })
        .await?;
    let reply = expect_reply(reply, StatusCode::OK)?;

    Ok(HttpResponse::Ok().json(json!({ "message": reply.message, "result": reply.result })))
}

/* =========================
Approve leave (Admin, via capability link)
========================= */
/// Swagger doc for approve_leave endpoint
#[utoipa::path(
    patch,
    path = "/api/v1/leave/approve",
    params(DecisionQuery),
    responses(
        (status = 200, description = "Leave approved and balance debited", body = Object, example = json!({
            "message": "Leave approved successfully for date 2026-01-01"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 410, description = "Capability link missing or already consumed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    ledger: web::Data<LedgerClient>,
    balance: web::Data<dyn BalanceAuthority>,
    query: web::Query<DecisionQuery>,
) -> Result<HttpResponse, WorkflowError> {
    auth.require_admin()?;

    let reply = ledger
        .call(&LedgerCommand::ApproveEmployeeLeaves {
            email: query.email.clone(),
            leave_date: query.leave_date,
        })
        .await?;
    let reply = expect_reply(reply, StatusCode::OK)?;

    // The ledger has committed; the debit happens outside that
    // transaction. The (email, date) idempotency key keeps a replay from
    // charging twice, and a missed debit is logged, not papered over.
    match balance.debit_once(&query.email, query.leave_date).await? {
        DebitOutcome::Debited => {}
        DebitOutcome::Already => {
            warn!(email = %query.email, date = %query.leave_date, "balance already debited for this leave");
        }
        DebitOutcome::Unavailable => {
            warn!(email = %query.email, date = %query.leave_date, "approved leave could not be debited");
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "message": reply.message })))
}

/* =========================
Reject leave (Admin, via capability link)
========================= */
/// Swagger doc for reject_leave endpoint
#[utoipa::path(
    patch,
    path = "/api/v1/leave/reject",
    params(DecisionQuery),
    responses(
        (status = 200, description = "Leave rejected; date stays blocked for the employee", body = Object, example = json!({
            "message": "Leave rejected successfully for date 2026-01-01"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 410, description = "Capability link missing or already consumed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    ledger: web::Data<LedgerClient>,
    query: web::Query<DecisionQuery>,
) -> Result<HttpResponse, WorkflowError> {
    auth.require_admin()?;

    let reply = ledger
        .call(&LedgerCommand::RejectEmployeeLeaves {
            email: query.email.clone(),
            leave_date: query.leave_date,
        })
        .await?;
    let reply = expect_reply(reply, StatusCode::OK)?;

    Ok(HttpResponse::Ok().json(json!({ "message": reply.message })))
}

/* =========================
Own employee details
========================= */
/// Swagger doc for own_details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/employee/me",
    responses(
        (status = 200, description = "Caller's identity and remaining balance", body = EmployeeDetails),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No employee record for the caller")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Employee"
)]
pub async fn own_details(
    auth: AuthUser,
    balance: web::Data<dyn BalanceAuthority>,
) -> Result<HttpResponse, WorkflowError> {
    let available = balance
        .available_leaves(&auth.email)
        .await?
        .ok_or_else(|| WorkflowError::NotFound(format!("No employee record for {}", auth.email)))?;

    Ok(HttpResponse::Ok().json(EmployeeDetails {
        email: auth.email,
        name: auth.name,
        available_leaves: available,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn malformed_date_is_a_bad_request() {
        assert!(matches!(
            parse_leave_date("01-12-2025"),
            Err(WorkflowError::BadRequest(_))
        ));
        assert!(matches!(
            parse_leave_date("2025-13-40"),
            Err(WorkflowError::BadRequest(_))
        ));
        assert_eq!(parse_leave_date("2025-12-01").unwrap(), date(2025, 12, 1));
    }

    #[test]
    fn past_and_same_day_dates_are_not_acceptable() {
        let today = date(2025, 6, 15);
        assert!(matches!(
            validate_application(date(2025, 1, 1), today, 10),
            Err(WorkflowError::NotAcceptable(_))
        ));
        assert!(matches!(
            validate_application(today, today, 10),
            Err(WorkflowError::NotAcceptable(_))
        ));
        assert!(validate_application(date(2025, 6, 16), today, 10).is_ok());
    }

    #[test]
    fn exhausted_balance_is_not_acceptable() {
        let today = date(2025, 6, 15);
        assert!(matches!(
            validate_application(date(2025, 12, 1), today, 0),
            Err(WorkflowError::NotAcceptable(_))
        ));
        assert!(validate_application(date(2025, 12, 1), today, 1).is_ok());
    }
}
