use std::{borrow::Cow, sync::Arc};

use axum::{
    Extension, Json,
    extract::{OriginalUri, Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use validator::{Validate, ValidateEmail, ValidateLength, ValidationError, ValidationErrors};

use crate::{
    auth::{error::AuthError, hash_password, verify_password},
    db::{
        error::DatabaseError,
        user::{
            NewUser, create_user, get_user_password_hash, get_user_profile,
            get_user_profiles_with_pagination, update_user_password,
        },
    },
    error::Error,
    middlewares::Viewer,
    model::{User, UserProfile},
    pagination::{Page, Pagination},
    state::SharedAppState,
};

use super::{JsonBody, UrlPath, request_host};

pub const USER_NAME_MAX_LENGTH: u64 = 150;
pub const EMAIL_MAX_LENGTH: u64 = 254;
pub const PASSWORD_MIN_LENGTH: u64 = 8;
pub const PASSWORD_MAX_LENGTH: u64 = 128;

/// Characters outside `[\w.@+-]`, deduplicated in order of appearance.
pub fn invalid_username_symbols(username: &str) -> String {
    let mut invalid = String::new();
    for c in username.chars() {
        let allowed = c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-');
        if !allowed && !invalid.contains(c) {
            invalid.push(c);
        }
    }
    invalid
}

fn validate_password(errors: &mut ValidationErrors, field: &'static str, password: &SecretString) {
    if !password.expose_secret().validate_length(
        Some(PASSWORD_MIN_LENGTH),
        Some(PASSWORD_MAX_LENGTH),
        None,
    ) {
        errors.add(
            field,
            ValidationError::new("password_length").with_message(Cow::from(format!(
                "Password length must be between {} and {}.",
                PASSWORD_MIN_LENGTH, PASSWORD_MAX_LENGTH
            ))),
        );
    }
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: SecretString,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.email.validate_email() {
            errors.add(
                "email",
                ValidationError::new("email_email")
                    .with_message(Cow::from("Enter a valid email address.")),
            );
        }
        if !self
            .email
            .validate_length(Some(1), Some(EMAIL_MAX_LENGTH), None)
        {
            errors.add(
                "email",
                ValidationError::new("email_length")
                    .with_message(Cow::from("Email length must be between 1 and 254.")),
            );
        }

        for (field, value) in [
            ("username", &self.username),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ] {
            if !value.validate_length(Some(1), Some(USER_NAME_MAX_LENGTH), None) {
                errors.add(
                    field,
                    ValidationError::new("length").with_message(Cow::from(format!(
                        "Length must be between 1 and {}.",
                        USER_NAME_MAX_LENGTH
                    ))),
                );
            }
        }

        let invalid_symbols = invalid_username_symbols(&self.username);
        if !invalid_symbols.is_empty() {
            errors.add(
                "username",
                ValidationError::new("username_symbols").with_message(Cow::from(format!(
                    "Username contains invalid symbols: {}.",
                    invalid_symbols
                ))),
            );
        }

        validate_password(&mut errors, "password", &self.password);

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(())
    }
}

#[derive(Deserialize)]
pub struct SetPasswordRequest {
    pub current_password: SecretString,
    pub new_password: SecretString,
}

impl Validate for SetPasswordRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        validate_password(&mut errors, "new_password", &self.new_password);

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(())
    }
}

fn own_profile(user: &User) -> UserProfile {
    UserProfile {
        id: user.id,
        email: user.email.clone(),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_subscribed: false,
    }
}

fn duplicate_field_error(constraint: &str) -> Error {
    let field = if constraint.contains("username") {
        "username"
    } else {
        "email"
    };

    let mut errors = ValidationErrors::new();
    errors.add(
        field,
        ValidationError::new("unique").with_message(Cow::from(format!(
            "A user with that {} already exists.",
            field
        ))),
    );
    Error::Validation(errors)
}

#[tracing::instrument(name = "[POST] users", skip_all)]
pub async fn store(
    State(app_state): State<SharedAppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), Error> {
    if !app_state.config.application.allow_registration {
        return Err(Error::Auth(AuthError::Forbidden));
    }

    request.validate().map_err(Error::Validation)?;

    let password_hash = hash_password(request.password).await?;

    let user = create_user(
        &app_state.pool,
        NewUser {
            email: request.email,
            username: request.username,
            first_name: request.first_name,
            last_name: request.last_name,
            password_hash,
        },
    )
    .await
    .map_err(|e| match e {
        Error::Database(DatabaseError::UniqueViolation(constraint)) => {
            duplicate_field_error(&constraint)
        }
        other => other,
    })?;

    Ok((StatusCode::CREATED, Json(own_profile(&user))))
}

#[tracing::instrument(name = "[GET] users", skip_all)]
pub async fn index(
    Extension(viewer): Extension<Viewer>,
    State(app_state): State<SharedAppState>,
    Query(pagination): Query<Pagination>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Json<Page<UserProfile>>, Error> {
    let page_request = pagination.resolve(app_state.config.application.page_size)?;

    let (profiles, count) = get_user_profiles_with_pagination(
        &app_state.pool,
        viewer.id(),
        page_request.limit,
        page_request.skip(),
    )
    .await?;

    let page = Page::new(profiles, count, page_request, &uri, request_host(&headers))?;

    Ok(Json(page))
}

#[tracing::instrument(name = "[GET] users/{id}", skip_all, fields(path.id))]
pub async fn show(
    Extension(viewer): Extension<Viewer>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<Json<UserProfile>, Error> {
    let profile = get_user_profile(&app_state.pool, path.id, viewer.id()).await?;

    Ok(Json(profile))
}

#[tracing::instrument(name = "[GET] users/me", skip_all)]
pub async fn me(Extension(user): Extension<Arc<User>>) -> Result<Json<UserProfile>, Error> {
    Ok(Json(own_profile(&user)))
}

/// Changing the password revokes every issued token.
#[tracing::instrument(name = "[POST] users/set_password", skip_all, fields(user_id = user.id))]
pub async fn set_password(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    JsonBody(request): JsonBody<SetPasswordRequest>,
) -> Result<StatusCode, Error> {
    request.validate().map_err(Error::Validation)?;

    let hashed_password = get_user_password_hash(&app_state.pool, user.id).await?;

    verify_password(hashed_password, request.current_password)
        .await
        .map_err(|e| match e {
            Error::Auth(AuthError::IncorrectCredential) => {
                let mut errors = ValidationErrors::new();
                errors.add(
                    "current_password",
                    ValidationError::new("invalid_password")
                        .with_message(Cow::from("Invalid password.")),
                );
                Error::Validation(errors)
            }
            other => other,
        })?;

    let password_hash = hash_password(request.new_password).await?;

    update_user_password(&app_state.pool, user.id, password_hash).await?;

    Ok(StatusCode::NO_CONTENT)
}
