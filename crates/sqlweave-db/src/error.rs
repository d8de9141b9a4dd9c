//! Error types for database access.

/// Errors that can occur while talking to a database.
///
/// Driver messages are carried verbatim; [`DbError::kind`] exposes the
/// category so callers can branch without matching payloads.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The pool could not hand out or open a connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid data source definition or configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No data source matches the requested database type and name.
    #[error("Data source not found: {0}")]
    DataSourceNotFound(String),

    /// The database product or type has no dialect.
    #[error("Unsupported database dialect: {0}")]
    DialectUnsupported(String),

    /// The driver rejected the statement text.
    #[error("SQL syntax error: {message}")]
    SqlSyntax {
        /// Driver message.
        message: String,
        /// SQLSTATE or vendor code, when reported.
        code: Option<String>,
    },

    /// The driver failed to execute the statement.
    #[error("SQL execution error: {message}")]
    SqlExecution {
        /// Driver message.
        message: String,
        /// SQLSTATE or vendor code, when reported.
        code: Option<String>,
    },

    /// The statement, result set or its connection has been closed.
    #[error("Statement is closed: {0}")]
    StatementClosed(String),

    /// No column or parameter with that name or index.
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// A value could not be read as the requested type.
    #[error("Type mismatch on '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// Column or parameter identifier.
        column: String,
        /// Requested type.
        expected: String,
        /// Stored type or value.
        actual: String,
    },

    /// The sequence does not exist.
    #[error("Sequence not found: {0}")]
    SequenceNotFound(String),

    /// Invalid entity definition handed to a DAO.
    #[error("Invalid DAO configuration: {0}")]
    DaoConfig(String),

    /// Table lifecycle conflict (already exists, missing).
    #[error("Schema error: {0}")]
    Schema(String),

    /// An argument does not satisfy the expected shape.
    #[error("Validation error: {0}")]
    Validation(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error category of a [`DbError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    Config,
    DataSourceNotFound,
    DialectUnsupported,
    SqlSyntax,
    SqlExecution,
    StatementClosed,
    ColumnNotFound,
    TypeMismatch,
    SequenceNotFound,
    DaoConfig,
    Schema,
    Validation,
    Json,
}

impl DbError {
    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) => ErrorKind::Connection,
            Self::Config(_) => ErrorKind::Config,
            Self::DataSourceNotFound(_) => ErrorKind::DataSourceNotFound,
            Self::DialectUnsupported(_) => ErrorKind::DialectUnsupported,
            Self::SqlSyntax { .. } => ErrorKind::SqlSyntax,
            Self::SqlExecution { .. } => ErrorKind::SqlExecution,
            Self::StatementClosed(_) => ErrorKind::StatementClosed,
            Self::ColumnNotFound(_) => ErrorKind::ColumnNotFound,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::SequenceNotFound(_) => ErrorKind::SequenceNotFound,
            Self::DaoConfig(_) => ErrorKind::DaoConfig,
            Self::Schema(_) => ErrorKind::Schema,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Json(_) => ErrorKind::Json,
        }
    }

    /// Creates an execution error that did not come from the driver.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::SqlExecution {
            message: message.into(),
            code: None,
        }
    }

    /// Creates a type mismatch error.
    pub fn mismatch(
        column: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            column: column.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Returns the SQLSTATE or vendor code reported by the driver.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::SqlSyntax { code, .. } | Self::SqlExecution { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Returns whether the driver reported a missing table, view or sequence.
    #[must_use]
    pub fn is_missing_object(&self) -> bool {
        let Self::SqlExecution { message, code } = self else {
            return false;
        };
        // 42P01: PostgreSQL undefined_table, 42S02: MySQL table doesn't exist
        matches!(code.as_deref(), Some("42P01" | "42S02")) || message.contains("no such table")
    }

    /// Returns whether the driver reported that the object already exists.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        if self.is_unique_violation() {
            return true;
        }
        let Self::SqlExecution { message, code } = self else {
            return false;
        };
        // 42P07: PostgreSQL duplicate_table, 42S01: MySQL table exists
        matches!(code.as_deref(), Some("42P07" | "42S01"))
            || message.contains("already exists")
            || message.contains("already an object named")
    }

    /// Returns whether the driver reported a duplicate key.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        let Self::SqlExecution { message, code } = self else {
            return false;
        };
        // 23505: PostgreSQL unique_violation, 23000: MySQL integrity constraint
        matches!(code.as_deref(), Some("23505" | "23000" | "2067" | "1555"))
            || message.contains("UNIQUE constraint failed")
            || message.contains("Duplicate entry")
    }
}

fn is_syntax_error(code: Option<&str>, message: &str) -> bool {
    match code {
        Some("42601") => true,
        Some("42000") => message.contains("syntax"),
        _ => message.contains("syntax error"),
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                let message = db_err.message().to_string();
                if is_syntax_error(code.as_deref(), &message) {
                    Self::SqlSyntax { message, code }
                } else {
                    Self::SqlExecution { message, code }
                }
            }
            sqlx::Error::Configuration(source) => Self::Config(source.to_string()),
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::WorkerCrashed => Self::Connection(err.to_string()),
            sqlx::Error::ColumnNotFound(name) => Self::ColumnNotFound(name),
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::ColumnNotFound(format!("index {index} out of {len} columns"))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                Self::mismatch(index, "a decodable value", source.to_string())
            }
            other => Self::execution(other.to_string()),
        }
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        assert_eq!(
            DbError::DataSourceNotFound(String::from("x")).kind(),
            ErrorKind::DataSourceNotFound
        );
        assert_eq!(DbError::execution("boom").kind(), ErrorKind::SqlExecution);
    }

    #[test]
    fn test_pool_errors_are_connection_errors() {
        assert_eq!(
            DbError::from(sqlx::Error::PoolTimedOut).kind(),
            ErrorKind::Connection
        );
        assert_eq!(
            DbError::from(sqlx::Error::PoolClosed).kind(),
            ErrorKind::Connection
        );
    }

    #[test]
    fn test_syntax_classification() {
        assert!(is_syntax_error(Some("42601"), "syntax error at or near \"SELEC\""));
        assert!(is_syntax_error(Some("42000"), "You have an error in your SQL syntax"));
        assert!(!is_syntax_error(Some("42000"), "Access denied"));
        assert!(is_syntax_error(Some("1"), "near \"SELEC\": syntax error"));
        assert!(!is_syntax_error(Some("1"), "no such table: T"));
    }

    #[test]
    fn test_missing_object_detection() {
        let pg = DbError::SqlExecution {
            message: String::from("relation \"s\" does not exist"),
            code: Some(String::from("42P01")),
        };
        assert!(pg.is_missing_object());
        assert!(DbError::execution("no such table: SQLWEAVE_SEQUENCES").is_missing_object());
        assert!(!DbError::Config(String::from("does not exist")).is_missing_object());
    }

    #[test]
    fn test_already_exists_detection() {
        assert!(DbError::execution("table SQLWEAVE_SEQUENCES already exists").is_already_exists());
        assert!(DbError::execution(
            "There is already an object named 'SQLWEAVE_SEQUENCES' in the database."
        )
        .is_already_exists());
        assert!(DbError::execution("UNIQUE constraint failed: AUTHORS.NAME").is_already_exists());
        assert!(!DbError::execution("no such table: T").is_already_exists());
    }

    #[test]
    fn test_error_display_keeps_driver_message() {
        let err = DbError::SqlSyntax {
            message: String::from("near \"FORM\": syntax error"),
            code: None,
        };
        assert_eq!(err.to_string(), "SQL syntax error: near \"FORM\": syntax error");
    }
}
