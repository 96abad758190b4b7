#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Jwt error")]
    JwtError(jsonwebtoken::errors::Error),
    #[error("Password error")]
    PasswordError(argon2::password_hash::Error),
    #[error("Authentication credentials were not provided")]
    Unauthenticated,
    #[error("You do not have permission to perform this action")]
    Forbidden,
    #[error("Unable to log in with provided credentials")]
    IncorrectCredential,
}
