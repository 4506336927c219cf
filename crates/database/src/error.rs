use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    #[error("Database query failed: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Referenced row does not exist: {0}")]
    MissingReference(String),

    #[error("Stored row is inconsistent: {0}")]
    Inconsistent(String),

    #[error(transparent)]
    Invalid(#[from] CoreError),
}

impl DbError {
    /// Classifies a failed write. Unique and check violations become
    /// `ConstraintViolation`, foreign key violations become `MissingReference`.
    pub(crate) fn from_write(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation | sqlx::error::ErrorKind::CheckViolation => {
                    return DbError::ConstraintViolation(constraint);
                }
                sqlx::error::ErrorKind::ForeignKeyViolation => {
                    return DbError::MissingReference(constraint);
                }
                _ => {}
            }
        }
        DbError::ConnectionError(e)
    }
}
