use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::MySqlPool;
use tracing::info;

use crate::db::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    /// Counter decremented for this approval
    Debited,
    /// A debit for this (email, date) already happened; retried approval
    Already,
    /// No employee row, or the counter is exhausted. The approval stands
    /// in the ledger either way; callers log this mismatch.
    Unavailable,
}

/// Per-employee leave-balance counters, co-located with identity. The
/// debit is keyed on `(email, leave_date)` so a replayed approval can
/// never charge twice.
#[async_trait]
pub trait BalanceAuthority: Send + Sync {
    async fn available_leaves(&self, email: &str) -> Result<Option<u32>, StoreError>;
    async fn debit_once(&self, email: &str, date: NaiveDate) -> Result<DebitOutcome, StoreError>;
}

pub struct MySqlBalanceAuthority {
    pool: MySqlPool,
}

impl MySqlBalanceAuthority {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BalanceAuthority for MySqlBalanceAuthority {
    async fn available_leaves(&self, email: &str) -> Result<Option<u32>, StoreError> {
        let available = sqlx::query_scalar::<_, u32>(
            "SELECT available_leaves FROM employees WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(available)
    }

    async fn debit_once(&self, email: &str, date: NaiveDate) -> Result<DebitOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Idempotency key: the unique (email, leave_date) row. A retry
        // hits the duplicate key and skips the decrement.
        let inserted = sqlx::query("INSERT INTO leave_debits (email, leave_date) VALUES (?, ?)")
            .bind(email)
            .bind(date)
            .execute(&mut *tx)
            .await;

        if let Err(e) = inserted {
            return match StoreError::from(e) {
                StoreError::Duplicate => Ok(DebitOutcome::Already),
                other => Err(other),
            };
        }

        let updated = sqlx::query(
            "UPDATE employees SET available_leaves = available_leaves - 1 \
             WHERE email = ? AND available_leaves >= 1",
        )
        .bind(email)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(DebitOutcome::Unavailable);
        }

        tx.commit().await?;
        info!(email = %email, date = %date, "leave balance debited");
        Ok(DebitOutcome::Debited)
    }
}

/// In-memory balance counters for tests and local runs.
#[derive(Default)]
pub struct InMemoryBalanceAuthority {
    inner: RwLock<BalanceState>,
}

#[derive(Default)]
struct BalanceState {
    balances: HashMap<String, u32>,
    debits: HashSet<(String, NaiveDate)>,
}

impl InMemoryBalanceAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(self, email: &str, available: u32) -> Self {
        self.inner
            .write()
            .expect("balance lock poisoned")
            .balances
            .insert(email.to_string(), available);
        self
    }
}

#[async_trait]
impl BalanceAuthority for InMemoryBalanceAuthority {
    async fn available_leaves(&self, email: &str) -> Result<Option<u32>, StoreError> {
        let state = self.inner.read().expect("balance lock poisoned");
        Ok(state.balances.get(email).copied())
    }

    async fn debit_once(&self, email: &str, date: NaiveDate) -> Result<DebitOutcome, StoreError> {
        let mut state = self.inner.write().expect("balance lock poisoned");
        if !state.debits.insert((email.to_string(), date)) {
            return Ok(DebitOutcome::Already);
        }
        match state.balances.get_mut(email) {
            Some(available) if *available >= 1 => {
                *available -= 1;
                Ok(DebitOutcome::Debited)
            }
            _ => {
                state.debits.remove(&(email.to_string(), date));
                Ok(DebitOutcome::Unavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[actix_web::test]
    async fn debits_exactly_once_per_leave() {
        let balance = InMemoryBalanceAuthority::new().with_balance("alice@x.com", 10);

        let first = balance.debit_once("alice@x.com", date(2025, 12, 1)).await.unwrap();
        assert_eq!(first, DebitOutcome::Debited);

        // retried approval for the same leave
        let second = balance.debit_once("alice@x.com", date(2025, 12, 1)).await.unwrap();
        assert_eq!(second, DebitOutcome::Already);

        assert_eq!(
            balance.available_leaves("alice@x.com").await.unwrap(),
            Some(9)
        );
    }

    #[actix_web::test]
    async fn separate_dates_debit_separately() {
        let balance = InMemoryBalanceAuthority::new().with_balance("alice@x.com", 10);

        balance.debit_once("alice@x.com", date(2025, 12, 1)).await.unwrap();
        balance.debit_once("alice@x.com", date(2025, 12, 2)).await.unwrap();

        assert_eq!(
            balance.available_leaves("alice@x.com").await.unwrap(),
            Some(8)
        );
    }

    #[actix_web::test]
    async fn exhausted_balance_reports_unavailable() {
        let balance = InMemoryBalanceAuthority::new().with_balance("bob@x.com", 0);

        let outcome = balance.debit_once("bob@x.com", date(2025, 12, 1)).await.unwrap();
        assert_eq!(outcome, DebitOutcome::Unavailable);
        assert_eq!(balance.available_leaves("bob@x.com").await.unwrap(), Some(0));
    }

    #[actix_web::test]
    async fn unknown_employee_reports_unavailable() {
        let balance = InMemoryBalanceAuthority::new();
        let outcome = balance.debit_once("ghost@x.com", date(2025, 12, 1)).await.unwrap();
        assert_eq!(outcome, DebitOutcome::Unavailable);
        assert_eq!(balance.available_leaves("ghost@x.com").await.unwrap(), None);
    }
}
