//! Classification of Diesel failures shared by the repositories.
//!
//! Each repository maps a [`StoreFailure`] onto its own port error. Only the
//! classification leaves this module; driver messages are logged at debug
//! level and never reach the port error text.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// Coarse failure classes the ports distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StoreFailure {
    /// A unique constraint rejected the write.
    UniqueViolation,
    /// The connection was lost.
    Connection(&'static str),
    /// Anything else.
    Query(&'static str),
}

/// Classify a Diesel error, logging the driver detail.
pub(crate) fn classify(error: &DieselError) -> StoreFailure {
    match error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
            match kind {
                DatabaseErrorKind::UniqueViolation => StoreFailure::UniqueViolation,
                DatabaseErrorKind::ClosedConnection => {
                    StoreFailure::Connection("database connection error")
                }
                _ => StoreFailure::Query("database error"),
            }
        }
        DieselError::NotFound => {
            debug!("diesel operation found no record");
            StoreFailure::Query("record not found")
        }
        DieselError::QueryBuilderError(_) => {
            debug!("diesel query builder failed");
            StoreFailure::Query("database query error")
        }
        other => {
            debug!(
                error_type = %std::any::type_name_of_val(other),
                "diesel operation failed"
            );
            StoreFailure::Query("database error")
        }
    }
}
