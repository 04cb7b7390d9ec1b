//! Shared Diesel error mapping for the persistence adapters.

use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into an adapter's connection error constructor.
pub(crate) fn map_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map Diesel execution errors into conflict/query/connection constructors.
///
/// Unique violations map to `conflict`: the stores lean on database
/// constraints for duplicate document codes, duplicate usernames, and the
/// single-pending-derivation rule.
pub(crate) fn map_diesel_error<E, K, Q, C>(
    error: diesel::result::Error,
    conflict: K,
    query: Q,
    connection: C,
) -> E
where
    K: FnOnce(String) -> E,
    Q: FnOnce(&'static str) -> E,
    C: FnOnce(&'static str) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            conflict(info.message().to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        _ => query("database error"),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::DocumentStoreError;

    fn map(error: DieselError) -> DocumentStoreError {
        map_diesel_error(
            error,
            DocumentStoreError::conflict,
            DocumentStoreError::query,
            DocumentStoreError::connection,
        )
    }

    #[rstest]
    fn unique_violations_become_conflicts() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_owned()),
        );

        let mapped = map(error);

        assert!(matches!(mapped, DocumentStoreError::Conflict { .. }));
    }

    #[rstest]
    fn closed_connections_become_connection_errors() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection unexpectedly".to_owned()),
        );

        let mapped = map(error);

        assert!(matches!(mapped, DocumentStoreError::Connection { .. }));
    }

    #[rstest]
    fn other_failures_become_query_errors() {
        let mapped = map(DieselError::NotFound);

        assert!(matches!(mapped, DocumentStoreError::Query { .. }));
    }

    #[rstest]
    fn pool_failures_become_connection_errors() {
        let mapped = map_pool_error(
            PoolError::checkout("pool exhausted"),
            DocumentStoreError::connection,
        );

        assert!(matches!(mapped, DocumentStoreError::Connection { .. }));
    }
}
