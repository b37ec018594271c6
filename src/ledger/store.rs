use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::MySqlPool;
use sqlx::prelude::FromRow;

use crate::db::StoreError;
use crate::model::leave_status::LeaveStatus;

use super::record::LeaveRecord;

/// Storage seam for the leave ledger. The two *_if_link_matches methods
/// are the concurrency-critical ones: each must check the capability and
/// perform the transition in one atomic step, never as a separate read
/// followed by a write.
#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn find(&self, email: &str, date: NaiveDate) -> Result<Option<LeaveRecord>, StoreError>;

    /// Creates a Pending record with no capabilities. Fails with
    /// `StoreError::Duplicate` if any record already exists for the pair.
    async fn insert_pending(&self, email: &str, date: NaiveDate) -> Result<(), StoreError>;

    async fn all(&self) -> Result<Vec<LeaveRecord>, StoreError>;

    async fn by_email(&self, email: &str) -> Result<Vec<LeaveRecord>, StoreError>;

    /// Records with the given status among those not rejected.
    async fn active_by_status(&self, status: LeaveStatus) -> Result<Vec<LeaveRecord>, StoreError>;

    /// Persists issued links on a record still awaiting a decision. A
    /// record decided since it was listed is left untouched, keeping
    /// links exclusive to Pending, non-rejected records.
    async fn store_links(
        &self,
        email: &str,
        date: NaiveDate,
        approve_link: &str,
        reject_link: &str,
    ) -> Result<(), StoreError>;

    /// Atomically: if the record is still Pending, not rejected, and its
    /// stored approve link equals `approve_link`, mark it Approved and
    /// clear both links. Returns whether the transition happened.
    async fn approve_if_link_matches(
        &self,
        email: &str,
        date: NaiveDate,
        approve_link: &str,
    ) -> Result<bool, StoreError>;

    /// Atomically: same match against the stored reject link; on match,
    /// set `rejected` and clear both links. The status itself stays
    /// Pending.
    async fn reject_if_link_matches(
        &self,
        email: &str,
        date: NaiveDate,
        reject_link: &str,
    ) -> Result<bool, StoreError>;
}

const SELECT_RECORD: &str = "SELECT email, leave_date, status, rejected, approve_link, reject_link \
     FROM leave_records";

#[derive(FromRow)]
struct LeaveRow {
    email: String,
    leave_date: NaiveDate,
    status: String,
    rejected: bool,
    approve_link: Option<String>,
    reject_link: Option<String>,
}

impl TryFrom<LeaveRow> for LeaveRecord {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> Result<Self, StoreError> {
        let status = LeaveStatus::from_str(&row.status)
            .map_err(|_| StoreError::Corrupt(format!("unknown leave status '{}'", row.status)))?;
        Ok(LeaveRecord {
            email: row.email,
            leave_date: row.leave_date,
            status,
            rejected: row.rejected,
            approve_link: row.approve_link,
            reject_link: row.reject_link,
        })
    }
}

fn rows_to_records(rows: Vec<LeaveRow>) -> Result<Vec<LeaveRecord>, StoreError> {
    rows.into_iter().map(LeaveRecord::try_from).collect()
}

pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn find(&self, email: &str, date: NaiveDate) -> Result<Option<LeaveRecord>, StoreError> {
        let row = sqlx::query_as::<_, LeaveRow>(&format!(
            "{SELECT_RECORD} WHERE email = ? AND leave_date = ?"
        ))
        .bind(email)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        row.map(LeaveRecord::try_from).transpose()
    }

    async fn insert_pending(&self, email: &str, date: NaiveDate) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO leave_records (email, leave_date, status, rejected) VALUES (?, ?, ?, FALSE)",
        )
        .bind(email)
        .bind(date)
        .bind(LeaveStatus::Pending.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn all(&self) -> Result<Vec<LeaveRecord>, StoreError> {
        let rows = sqlx::query_as::<_, LeaveRow>(&format!(
            "{SELECT_RECORD} ORDER BY leave_date, email"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows_to_records(rows)
    }

    async fn by_email(&self, email: &str) -> Result<Vec<LeaveRecord>, StoreError> {
        let rows = sqlx::query_as::<_, LeaveRow>(&format!(
            "{SELECT_RECORD} WHERE email = ? ORDER BY leave_date"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        rows_to_records(rows)
    }

    async fn active_by_status(&self, status: LeaveStatus) -> Result<Vec<LeaveRecord>, StoreError> {
        let rows = sqlx::query_as::<_, LeaveRow>(&format!(
            "{SELECT_RECORD} WHERE status = ? AND rejected = FALSE ORDER BY leave_date, email"
        ))
        .bind(status.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows_to_records(rows)
    }

    async fn store_links(
        &self,
        email: &str,
        date: NaiveDate,
        approve_link: &str,
        reject_link: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE leave_records SET approve_link = ?, reject_link = ? \
             WHERE email = ? AND leave_date = ? AND status = ? AND rejected = FALSE",
        )
        .bind(approve_link)
        .bind(reject_link)
        .bind(email)
        .bind(date)
        .bind(LeaveStatus::Pending.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn approve_if_link_matches(
        &self,
        email: &str,
        date: NaiveDate,
        approve_link: &str,
    ) -> Result<bool, StoreError> {
        // Single conditional UPDATE: of two racing approvals only one can
        // match the still-present link, the other sees zero rows.
        let result = sqlx::query(
            "UPDATE leave_records \
             SET status = ?, approve_link = NULL, reject_link = NULL \
             WHERE email = ? AND leave_date = ? AND status = ? AND rejected = FALSE \
             AND approve_link = ?",
        )
        .bind(LeaveStatus::Approved.to_string())
        .bind(email)
        .bind(date)
        .bind(LeaveStatus::Pending.to_string())
        .bind(approve_link)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn reject_if_link_matches(
        &self,
        email: &str,
        date: NaiveDate,
        reject_link: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE leave_records \
             SET rejected = TRUE, approve_link = NULL, reject_link = NULL \
             WHERE email = ? AND leave_date = ? AND status = ? AND rejected = FALSE \
             AND reject_link = ?",
        )
        .bind(email)
        .bind(date)
        .bind(LeaveStatus::Pending.to_string())
        .bind(reject_link)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// In-memory ledger storage for tests and local runs. The write lock is
/// the atomicity boundary for the conditional transitions.
#[derive(Default, Clone)]
pub struct InMemoryLeaveStore {
    records: Arc<RwLock<BTreeMap<(String, NaiveDate), LeaveRecord>>>,
}

impl InMemoryLeaveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaveStore for InMemoryLeaveStore {
    async fn find(&self, email: &str, date: NaiveDate) -> Result<Option<LeaveRecord>, StoreError> {
        let records = self.records.read().expect("leave store lock poisoned");
        Ok(records.get(&(email.to_string(), date)).cloned())
    }

    async fn insert_pending(&self, email: &str, date: NaiveDate) -> Result<(), StoreError> {
        let mut records = self.records.write().expect("leave store lock poisoned");
        let key = (email.to_string(), date);
        if records.contains_key(&key) {
            return Err(StoreError::Duplicate);
        }
        records.insert(key, LeaveRecord::pending(email, date));
        Ok(())
    }

    async fn all(&self) -> Result<Vec<LeaveRecord>, StoreError> {
        let records = self.records.read().expect("leave store lock poisoned");
        Ok(records.values().cloned().collect())
    }

    async fn by_email(&self, email: &str) -> Result<Vec<LeaveRecord>, StoreError> {
        let records = self.records.read().expect("leave store lock poisoned");
        Ok(records
            .values()
            .filter(|r| r.email == email)
            .cloned()
            .collect())
    }

    async fn active_by_status(&self, status: LeaveStatus) -> Result<Vec<LeaveRecord>, StoreError> {
        let records = self.records.read().expect("leave store lock poisoned");
        Ok(records
            .values()
            .filter(|r| r.status == status && !r.rejected)
            .cloned()
            .collect())
    }

    async fn store_links(
        &self,
        email: &str,
        date: NaiveDate,
        approve_link: &str,
        reject_link: &str,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().expect("leave store lock poisoned");
        if let Some(record) = records.get_mut(&(email.to_string(), date)) {
            if record.status == LeaveStatus::Pending && !record.rejected {
                record.approve_link = Some(approve_link.to_string());
                record.reject_link = Some(reject_link.to_string());
            }
        }
        Ok(())
    }

    async fn approve_if_link_matches(
        &self,
        email: &str,
        date: NaiveDate,
        approve_link: &str,
    ) -> Result<bool, StoreError> {
        let mut records = self.records.write().expect("leave store lock poisoned");
        if let Some(record) = records.get_mut(&(email.to_string(), date)) {
            if record.status == LeaveStatus::Pending
                && !record.rejected
                && record.approve_link.as_deref() == Some(approve_link)
            {
                record.status = LeaveStatus::Approved;
                record.approve_link = None;
                record.reject_link = None;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn reject_if_link_matches(
        &self,
        email: &str,
        date: NaiveDate,
        reject_link: &str,
    ) -> Result<bool, StoreError> {
        let mut records = self.records.write().expect("leave store lock poisoned");
        if let Some(record) = records.get_mut(&(email.to_string(), date)) {
            if record.status == LeaveStatus::Pending
                && !record.rejected
                && record.reject_link.as_deref() == Some(reject_link)
            {
                record.rejected = true;
                record.approve_link = None;
                record.reject_link = None;
                return Ok(true);
            }
        }
        Ok(false)
    }
}
