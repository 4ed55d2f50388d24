// shopflow_server/src/db/mod.rs

//! PostgreSQL persistence for the engine's store traits.

mod pg_store;
mod rows;
pub mod seed;

pub use pg_store::PgStore;

use shopflow::CommerceError;
use sqlx::PgPool;
use tracing::{error, info, warn};

const SCHEMA: &str = include_str!("../../migrations/schema.sql");

pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
  let pool = PgPool::connect(database_url).await?;
  info!("Successfully connected to the database.");
  Ok(pool)
}

pub async fn apply_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
  sqlx::raw_sql(SCHEMA).execute(pool).await?;
  info!("Database schema is up to date.");
  Ok(())
}

/// Unique violations become a field-specific `Duplicate`; anything else is
/// logged and reported as internal.
pub(crate) fn map_db_error(err: sqlx::Error, field: &str, value: &str) -> CommerceError {
  if let sqlx::Error::Database(db_err) = &err {
    if db_err.is_unique_violation() {
      return CommerceError::Duplicate {
        field: field.to_string(),
        value: value.to_string(),
      };
    }
  }
  db_error(err)
}

/// 40P01 deadlock_detected, 40001 serialization_failure. Postgres rolled the
/// transaction back; the caller may retry.
fn is_retryable_sqlstate(code: &str) -> bool {
  matches!(code, "40P01" | "40001")
}

pub(crate) fn db_error(err: sqlx::Error) -> CommerceError {
  if let sqlx::Error::Database(db_err) = &err {
    if db_err.code().is_some_and(|code| is_retryable_sqlstate(&code)) {
      warn!(error = %err, "Transaction aborted by the database; retryable.");
      return CommerceError::Conflict("Concurrent update, please retry".to_string());
    }
  }
  error!(error = %err, "Database operation failed.");
  CommerceError::Internal(format!("database error: {err}"))
}
