use actix_web::{HttpResponse, http::StatusCode, web};
use tracing::error;

use crate::db::StoreError;
use crate::rpc::contract::{LedgerCommand, LedgerReply};

use super::service::LedgerService;
use super::store::{LeaveStore, MySqlLeaveStore};

pub type MySqlLedgerService = LedgerService<MySqlLeaveStore>;

/// Single RPC endpoint: named command in, reply envelope out. The
/// transport answer is always 200; the envelope's own status carries the
/// outcome, and storage failures collapse to an opaque 500 envelope.
pub async fn dispatch(
    service: web::Data<MySqlLedgerService>,
    cmd: web::Json<LedgerCommand>,
) -> HttpResponse {
    let reply = match route_command(service.get_ref(), cmd.into_inner()).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(error = %e, "ledger command failed");
            LedgerReply::failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            )
        }
    };
    HttpResponse::Ok().json(reply)
}

pub async fn route_command<S: LeaveStore>(
    service: &LedgerService<S>,
    cmd: LedgerCommand,
) -> Result<LedgerReply, StoreError> {
    match cmd {
        LedgerCommand::ApplyLeave { email, leave_date } => {
            service.apply_leave(&email, leave_date).await
        }
        LedgerCommand::CheckEmployeeLeave {} => service.check_all().await,
        LedgerCommand::ViewOwnLeave { email } => service.view_own(&email).await,
        LedgerCommand::ViewEmployeePendingLeaveByEmail { email } => {
            service.pending_by_email(&email).await
        }
        LedgerCommand::ViewEmployeePendingLeave { status } => {
            service.pending_by_status(&status).await
        }
        LedgerCommand::ApproveEmployeeLeaves { email, leave_date } => {
            service.approve(&email, leave_date).await
        }
        LedgerCommand::RejectEmployeeLeaves { email, leave_date } => {
            service.reject(&email, leave_date).await
        }
    }
}
