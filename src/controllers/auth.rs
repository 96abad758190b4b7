use std::{borrow::Cow, sync::Arc};

use axum::{Extension, Json, extract::State, http::StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail, ValidateLength, ValidationError, ValidationErrors};

use crate::{
    auth::{encode_jwt, error::AuthError, verify_password},
    db::user::{get_user_by_email, revoke_user_tokens},
    error::Error,
    model::User,
    state::SharedAppState,
};

use super::JsonBody;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.email.validate_email() {
            errors.add(
                "email",
                ValidationError::new("email_email")
                    .with_message(Cow::from("Enter a valid email address.")),
            );
        }

        let password = self.password.expose_secret();
        if !password.validate_length(Some(1), None, None) {
            errors.add(
                "password",
                ValidationError::new("password_length")
                    .with_message(Cow::from("This field may not be blank.")),
            );
        }

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
pub struct TokenResponse {
    pub auth_token: String,
}

#[tracing::instrument(name = "[POST] auth/token/login", skip_all)]
pub async fn login(
    State(app_state): State<SharedAppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>, Error> {
    request.validate().map_err(Error::Validation)?;

    let (user, hashed_password) = get_user_by_email(&app_state.pool, &request.email)
        .await?
        .ok_or(Error::Auth(AuthError::IncorrectCredential))?;

    verify_password(hashed_password, request.password).await?;

    let token = encode_jwt(&user, &app_state.config.jwt)?;

    Ok(Json(TokenResponse { auth_token: token }))
}

/// Revokes every token of the user, not only the one used for this request.
#[tracing::instrument(name = "[POST] auth/token/logout", skip_all, fields(user_id = user.id))]
pub async fn logout(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
) -> Result<StatusCode, Error> {
    revoke_user_tokens(&app_state.pool, user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}
