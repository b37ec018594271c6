use std::str::FromStr;

use actix_web::http::StatusCode;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::info;

use crate::db::StoreError;
use crate::model::leave_status::LeaveStatus;
use crate::rpc::contract::LedgerReply;

use super::capability;
use super::record::{LeaveRecord, LeaveView};
use super::store::LeaveStore;

/// The leave state machine. Every operation ends in a reply envelope;
/// only storage failures escape as errors.
pub struct LedgerService<S> {
    store: S,
    link_base: String,
}

impl<S: LeaveStore> LedgerService<S> {
    pub fn new(store: S, link_base: &str) -> Self {
        Self {
            store,
            link_base: link_base.to_string(),
        }
    }

    pub async fn apply_leave(&self, email: &str, date: NaiveDate) -> Result<LedgerReply, StoreError> {
        if let Some(existing) = self.store.find(email, date).await? {
            return Ok(conflict_for(&existing));
        }

        match self.store.insert_pending(email, date).await {
            Ok(()) => {}
            // Lost a concurrent apply race to the unique key; same outcome
            // as having found the record up front.
            Err(StoreError::Duplicate) => {
                return Ok(LedgerReply::failure(
                    StatusCode::CONFLICT,
                    format!(
                        "Leave already exists for date {}",
                        capability::canonical_date(date)
                    ),
                ));
            }
            Err(e) => return Err(e),
        }

        info!(email = %email, date = %date, "leave applied");
        Ok(LedgerReply::created(format!(
            "Successfully applied leave for date {}",
            capability::canonical_date(date)
        )))
    }

    pub async fn check_all(&self) -> Result<LedgerReply, StoreError> {
        let records = self.store.all().await?;
        Ok(LedgerReply::with_result(
            "Leave details".to_string(),
            views_of(&records)?,
        ))
    }

    pub async fn view_own(&self, email: &str) -> Result<LedgerReply, StoreError> {
        let records = self.store.by_email(email).await?;
        if records.is_empty() {
            return Ok(LedgerReply::failure(
                StatusCode::NOT_FOUND,
                format!("User with email {email} has not applied any leaves"),
            ));
        }
        Ok(LedgerReply::with_result(
            format!("Leave details for {email}"),
            views_of(&records)?,
        ))
    }

    pub async fn pending_by_email(&self, email: &str) -> Result<LedgerReply, StoreError> {
        let records = self.store.by_email(email).await?;
        if records.is_empty() {
            return Ok(LedgerReply::failure(
                StatusCode::NOT_FOUND,
                "No pending leaves or invalid email".to_string(),
            ));
        }
        Ok(LedgerReply::with_result(
            format!("Leave details for {email}"),
            views_of(&records)?,
        ))
    }

    /// Listing pending leaves issues capabilities: every Pending record
    /// returned here gets its approve/reject links derived, persisted and
    /// included in the result. This is the only issuance point.
    pub async fn pending_by_status(&self, filter: &str) -> Result<LedgerReply, StoreError> {
        let status = match LeaveStatus::from_str(filter) {
            Ok(s) => s,
            Err(_) => {
                return Ok(LedgerReply::failure(
                    StatusCode::BAD_REQUEST,
                    format!("Unknown leave status '{filter}'"),
                ));
            }
        };

        let mut records = self.store.active_by_status(status).await?;

        if status == LeaveStatus::Pending {
            for record in &mut records {
                let approve =
                    capability::approve_link(&self.link_base, &record.email, record.leave_date);
                let reject =
                    capability::reject_link(&self.link_base, &record.email, record.leave_date);
                self.store
                    .store_links(&record.email, record.leave_date, &approve, &reject)
                    .await?;
                record.approve_link = Some(approve);
                record.reject_link = Some(reject);
            }
            info!(count = records.len(), "capability links issued");
        }

        let result = serde_json::to_value(&records)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(LedgerReply::with_result(
            format!("Leave details with status {status}"),
            result,
        ))
    }

    pub async fn approve(&self, email: &str, date: NaiveDate) -> Result<LedgerReply, StoreError> {
        let link = capability::approve_link(&self.link_base, email, date);
        if self.store.approve_if_link_matches(email, date, &link).await? {
            info!(email = %email, date = %date, "leave approved");
            Ok(LedgerReply::ok(format!(
                "Leave approved successfully for date {}",
                capability::canonical_date(date)
            )))
        } else {
            Ok(link_expired())
        }
    }

    pub async fn reject(&self, email: &str, date: NaiveDate) -> Result<LedgerReply, StoreError> {
        let link = capability::reject_link(&self.link_base, email, date);
        if self.store.reject_if_link_matches(email, date, &link).await? {
            info!(email = %email, date = %date, "leave rejected");
            Ok(LedgerReply::ok(format!(
                "Leave rejected successfully for date {}",
                capability::canonical_date(date)
            )))
        } else {
            Ok(link_expired())
        }
    }
}

fn conflict_for(existing: &LeaveRecord) -> LedgerReply {
    let date = capability::canonical_date(existing.leave_date);
    let message = if existing.rejected {
        format!("Leave is rejected for date {date}")
    } else {
        format!("Leave already exists for date {date}")
    };
    LedgerReply::failure(StatusCode::CONFLICT, message)
}

fn link_expired() -> LedgerReply {
    LedgerReply::failure(StatusCode::GONE, "Link expired".to_string())
}

fn views_of(records: &[LeaveRecord]) -> Result<Value, StoreError> {
    let views: Vec<LeaveView> = records.iter().map(LeaveView::from).collect();
    serde_json::to_value(views).map_err(|e| StoreError::Corrupt(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::store::InMemoryLeaveStore;

    const BASE: &str = "http://localhost:8080/api/v1";
    const ALICE: &str = "alice@x.com";

    fn service() -> LedgerService<InMemoryLeaveStore> {
        LedgerService::new(InMemoryLeaveStore::new(), BASE)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn issue_links<S: LeaveStore>(svc: &LedgerService<S>) {
        let reply = svc.pending_by_status("Pending").await.unwrap();
        assert_eq!(reply.status, 200);
    }

    #[actix_web::test]
    async fn apply_creates_pending_record_without_links() {
        let svc = service();
        let reply = svc.apply_leave(ALICE, date(2025, 12, 1)).await.unwrap();

        assert_eq!(reply.status, 201);
        assert_eq!(reply.message, "Successfully applied leave for date 2025-12-01");

        let record = svc.store.find(ALICE, date(2025, 12, 1)).await.unwrap().unwrap();
        assert_eq!(record.status, LeaveStatus::Pending);
        assert!(!record.rejected);
        assert!(record.approve_link.is_none());
        assert!(record.reject_link.is_none());
    }

    #[actix_web::test]
    async fn duplicate_apply_conflicts() {
        let svc = service();
        svc.apply_leave(ALICE, date(2025, 12, 1)).await.unwrap();

        let reply = svc.apply_leave(ALICE, date(2025, 12, 1)).await.unwrap();
        assert_eq!(reply.status, 409);
        assert_eq!(reply.message, "Leave already exists for date 2025-12-01");

        // other dates and other employees are unaffected
        assert_eq!(svc.apply_leave(ALICE, date(2025, 12, 2)).await.unwrap().status, 201);
        assert_eq!(svc.apply_leave("bob@x.com", date(2025, 12, 1)).await.unwrap().status, 201);
    }

    #[actix_web::test]
    async fn rejected_date_blocks_reapplication_with_distinct_message() {
        let svc = service();
        svc.apply_leave("carol@x.com", date(2025, 12, 10)).await.unwrap();
        issue_links(&svc).await;

        let reply = svc.reject("carol@x.com", date(2025, 12, 10)).await.unwrap();
        assert_eq!(reply.status, 200);

        let reply = svc.apply_leave("carol@x.com", date(2025, 12, 10)).await.unwrap();
        assert_eq!(reply.status, 409);
        assert_eq!(reply.message, "Leave is rejected for date 2025-12-10");
    }

    #[actix_web::test]
    async fn pending_listing_issues_and_returns_capabilities() {
        let svc = service();
        svc.apply_leave(ALICE, date(2025, 12, 1)).await.unwrap();

        let reply = svc.pending_by_status("Pending").await.unwrap();
        assert_eq!(reply.status, 200);

        let result = reply.result.unwrap();
        let entries = result.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        let approve = entries[0]["approve_link"].as_str().unwrap();
        assert!(approve.contains("leaveDate=2025-12-01"));
        assert!(approve.contains("email=alice@x.com"));
        assert!(entries[0]["reject_link"].as_str().unwrap().contains("/leave/reject"));

        // links are persisted, not just decorated onto the response
        let record = svc.store.find(ALICE, date(2025, 12, 1)).await.unwrap().unwrap();
        assert!(record.approve_link.is_some());
        assert!(record.reject_link.is_some());
    }

    #[actix_web::test]
    async fn non_pending_listing_issues_nothing() {
        let svc = service();
        svc.apply_leave(ALICE, date(2025, 12, 1)).await.unwrap();

        let reply = svc.pending_by_status("Approved").await.unwrap();
        assert_eq!(reply.status, 200);
        assert!(reply.result.unwrap().as_array().unwrap().is_empty());

        let record = svc.store.find(ALICE, date(2025, 12, 1)).await.unwrap().unwrap();
        assert!(record.approve_link.is_none());
    }

    #[actix_web::test]
    async fn unknown_status_filter_is_a_bad_request() {
        let svc = service();
        let reply = svc.pending_by_status("Rejected").await.unwrap();
        assert_eq!(reply.status, 400);
        assert_eq!(reply.message, "Unknown leave status 'Rejected'");
    }

    #[actix_web::test]
    async fn approve_transitions_once_then_link_is_gone() {
        let svc = service();
        svc.apply_leave(ALICE, date(2025, 12, 1)).await.unwrap();
        issue_links(&svc).await;

        let reply = svc.approve(ALICE, date(2025, 12, 1)).await.unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(reply.message, "Leave approved successfully for date 2025-12-01");

        let record = svc.store.find(ALICE, date(2025, 12, 1)).await.unwrap().unwrap();
        assert_eq!(record.status, LeaveStatus::Approved);
        assert!(record.approve_link.is_none());
        assert!(record.reject_link.is_none());

        // the stale link no longer matches anything
        let replay = svc.approve(ALICE, date(2025, 12, 1)).await.unwrap();
        assert_eq!(replay.status, 410);
        assert_eq!(replay.message, "Link expired");
    }

    #[actix_web::test]
    async fn reject_clears_links_but_keeps_pending_status() {
        let svc = service();
        svc.apply_leave(ALICE, date(2025, 12, 1)).await.unwrap();
        issue_links(&svc).await;

        let reply = svc.reject(ALICE, date(2025, 12, 1)).await.unwrap();
        assert_eq!(reply.status, 200);

        let record = svc.store.find(ALICE, date(2025, 12, 1)).await.unwrap().unwrap();
        assert!(record.rejected);
        assert_eq!(record.status, LeaveStatus::Pending);
        assert!(record.approve_link.is_none());
        assert!(record.reject_link.is_none());

        // neither decision works after the record is closed
        assert_eq!(svc.approve(ALICE, date(2025, 12, 1)).await.unwrap().status, 410);
        assert_eq!(svc.reject(ALICE, date(2025, 12, 1)).await.unwrap().status, 410);
    }

    #[actix_web::test]
    async fn approve_before_issuance_finds_no_capability() {
        let svc = service();
        svc.apply_leave(ALICE, date(2025, 12, 1)).await.unwrap();

        let reply = svc.approve(ALICE, date(2025, 12, 1)).await.unwrap();
        assert_eq!(reply.status, 410);
    }

    #[actix_web::test]
    async fn capabilities_are_scoped_to_their_record() {
        let svc = service();
        svc.apply_leave(ALICE, date(2025, 12, 1)).await.unwrap();
        issue_links(&svc).await;

        // same employee, different date; different employee, same date
        assert_eq!(svc.approve(ALICE, date(2025, 12, 2)).await.unwrap().status, 410);
        assert_eq!(svc.approve("bob@x.com", date(2025, 12, 1)).await.unwrap().status, 410);

        // the intended record is still approvable
        assert_eq!(svc.approve(ALICE, date(2025, 12, 1)).await.unwrap().status, 200);
    }

    #[actix_web::test]
    async fn concurrent_decisions_have_exactly_one_winner() {
        let svc = service();
        svc.apply_leave(ALICE, date(2025, 12, 1)).await.unwrap();
        issue_links(&svc).await;

        let (a, b) = futures::join!(
            svc.approve(ALICE, date(2025, 12, 1)),
            svc.approve(ALICE, date(2025, 12, 1))
        );
        let statuses = [a.unwrap().status, b.unwrap().status];
        assert!(statuses.contains(&200));
        assert!(statuses.contains(&410));
    }

    #[actix_web::test]
    async fn listings_are_redacted_even_after_issuance() {
        let svc = service();
        svc.apply_leave(ALICE, date(2025, 12, 1)).await.unwrap();
        issue_links(&svc).await;

        for reply in [
            svc.check_all().await.unwrap(),
            svc.view_own(ALICE).await.unwrap(),
            svc.pending_by_email(ALICE).await.unwrap(),
        ] {
            assert_eq!(reply.status, 200);
            let result = reply.result.unwrap();
            let entry = &result.as_array().unwrap()[0];
            assert!(entry.get("approve_link").is_none());
            assert!(entry.get("reject_link").is_none());
        }
    }

    #[actix_web::test]
    async fn view_own_without_records_is_not_found() {
        let svc = service();
        let reply = svc.view_own("ghost@x.com").await.unwrap();
        assert_eq!(reply.status, 404);
        assert_eq!(
            reply.message,
            "User with email ghost@x.com has not applied any leaves"
        );
    }

    #[actix_web::test]
    async fn pending_by_email_without_records_is_not_found() {
        let svc = service();
        let reply = svc.pending_by_email("ghost@x.com").await.unwrap();
        assert_eq!(reply.status, 404);
        assert_eq!(reply.message, "No pending leaves or invalid email");
    }

    #[actix_web::test]
    async fn rejected_records_never_reappear_in_status_listings() {
        let svc = service();
        svc.apply_leave(ALICE, date(2025, 12, 1)).await.unwrap();
        issue_links(&svc).await;
        svc.reject(ALICE, date(2025, 12, 1)).await.unwrap();

        // still Pending by status field, but closed by the rejected flag
        let reply = svc.pending_by_status("Pending").await.unwrap();
        assert!(reply.result.unwrap().as_array().unwrap().is_empty());
    }
}
