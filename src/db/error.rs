#[derive(thiserror::Error, Debug)]
pub enum DatabaseError {
    #[error("Database error")]
    DatabaseError(sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),
    /// The referenced row is gone, e.g. a recipe deleted mid-request.
    #[error("Foreign key violated: {0}")]
    ForeignKeyViolation(String),
}

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        let violation = error.as_database_error().and_then(|e| {
            let constraint = e.constraint().unwrap_or_default().to_string();
            match e.code().as_deref() {
                Some(UNIQUE_VIOLATION) => Some(Self::UniqueViolation(constraint)),
                Some(FOREIGN_KEY_VIOLATION) => Some(Self::ForeignKeyViolation(constraint)),
                _ => None,
            }
        });

        violation.unwrap_or(Self::DatabaseError(error))
    }
}
