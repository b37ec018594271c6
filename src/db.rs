use derive_more::Display;
use sqlx::MySqlPool;

pub async fn init_db(database_url: &str) -> MySqlPool {
    MySqlPool::connect(database_url)
        .await
        .expect("Failed to connect to database")
}

/// Failures surfaced by the storage backends. `Duplicate` carries the
/// unique-key violation out of an insert so callers can turn a lost
/// apply race into a Conflict instead of a 500.
#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
    #[display(fmt = "duplicate record")]
    Duplicate,
    #[display(fmt = "corrupt record: {}", _0)]
    Corrupt(String),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code() == Some("23000".into()) {
                return StoreError::Duplicate;
            }
        }
        StoreError::Database(e)
    }
}
