use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::ValidationErrors;

use crate::{auth::error::AuthError, db::error::DatabaseError, media::MediaError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Database error")]
    Database(DatabaseError),

    #[error("Auth error")]
    Auth(AuthError),

    #[error("Validation error")]
    Validation(ValidationErrors),

    /// A request that is well-formed but breaks a business rule,
    /// e.g. favoriting the same recipe twice.
    #[error("{0}")]
    BadRequest(String),

    #[error("Media error")]
    Media(MediaError),

    #[error("Invalid JSON body: {0}")]
    JsonBody(JsonRejection),

    #[error("Other error: {0}")]
    Other(anyhow::Error),
}

impl From<DatabaseError> for Error {
    fn from(value: DatabaseError) -> Self {
        Self::Database(value)
    }
}

impl From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        Self::Database(value.into())
    }
}

impl From<AuthError> for Error {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<JsonRejection> for Error {
    fn from(value: JsonRejection) -> Self {
        Self::JsonBody(value)
    }
}

impl From<MediaError> for Error {
    fn from(value: MediaError) -> Self {
        Self::Media(value)
    }
}

fn detail(status: StatusCode, message: impl ToString) -> axum::response::Response {
    (status, Json(json!({ "detail": message.to_string() }))).into_response()
}

fn errors(message: impl ToString) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "errors": message.to_string() })),
    )
        .into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        match self {
            Error::Database(database_error) => match database_error {
                DatabaseError::DatabaseError(error) => {
                    tracing::error!(err.msg = %error, err.details=?error, "Database Error");

                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
                DatabaseError::NotFound => detail(StatusCode::NOT_FOUND, "Not found."),
                DatabaseError::UniqueViolation(constraint) => {
                    tracing::warn!(constraint, "Unique constraint violated");

                    errors("Record already exists.")
                }
                DatabaseError::ForeignKeyViolation(constraint) => {
                    tracing::warn!(constraint, "Foreign key constraint violated");

                    detail(StatusCode::NOT_FOUND, "Not found.")
                }
            },
            Error::Auth(auth_error) => match auth_error {
                AuthError::JwtError(error) => {
                    tracing::error!(err.msg = %error, err.details=?error, "JWT Error");

                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
                AuthError::PasswordError(error) => {
                    tracing::error!(err.msg = %error, err.details=?error, "Password Hash Error");

                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
                AuthError::Unauthenticated => detail(StatusCode::UNAUTHORIZED, auth_error),
                AuthError::Forbidden => detail(StatusCode::FORBIDDEN, auth_error),
                AuthError::IncorrectCredential => errors(auth_error),
            },
            Error::Validation(validation_error) => {
                tracing::info!(err.msg = %validation_error, "Validation Error");

                (StatusCode::BAD_REQUEST, Json(validation_error)).into_response()
            }
            Error::BadRequest(message) => errors(message),
            Error::Media(media_error) => match media_error {
                MediaError::Io(error) => {
                    tracing::error!(err.msg = %error, err.details=?error, "Media Storage Error");

                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
                invalid => {
                    let mut validation = ValidationErrors::new();
                    validation.add(
                        "image",
                        validator::ValidationError::new("image_invalid")
                            .with_message(invalid.to_string().into()),
                    );

                    (StatusCode::BAD_REQUEST, Json(validation)).into_response()
                }
            },
            Error::JsonBody(rejection) => match rejection {
                JsonRejection::MissingJsonContentType(_) => {
                    detail(StatusCode::UNSUPPORTED_MEDIA_TYPE, rejection.body_text())
                }
                rejection => {
                    tracing::info!(err.msg = %rejection.body_text(), "Invalid JSON body");

                    errors(rejection.body_text())
                }
            },
            Error::Other(error) => {
                tracing::error!(err.msg = %error, err.details=?error, "Other Error");

                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
