use anyhow::Context;
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{self, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};

use crate::{error::Error, telemetry::spawn_blocking_with_tracing};

use super::error::AuthError;

const MEMORY_COST_KIB: u32 = 15000;
const ITERATIONS: u32 = 2;
const PARALLELISM: u32 = 1;

fn hasher() -> Result<Argon2<'static>, Error> {
    let params = Params::new(MEMORY_COST_KIB, ITERATIONS, PARALLELISM, None)
        .map_err(|e| Error::Auth(AuthError::PasswordError(e.into())))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn compute_hash(password: &SecretString) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);

    Ok(hasher()?
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map_err(|e| Error::Auth(AuthError::PasswordError(e)))?
        .to_string())
}

/// A mismatch is an incorrect credential; a malformed stored hash is not.
fn verify_hash(password_hash: &str, password: &SecretString) -> Result<(), Error> {
    let expected = PasswordHash::new(password_hash)
        .map_err(|e| Error::Auth(AuthError::PasswordError(e)))?;

    hasher()?
        .verify_password(password.expose_secret().as_bytes(), &expected)
        .map_err(|e| match e {
            password_hash::Error::Password => Error::Auth(AuthError::IncorrectCredential),
            other => Error::Auth(AuthError::PasswordError(other)),
        })
}

#[tracing::instrument(name = "hash password", skip_all)]
pub async fn hash_password(password: SecretString) -> Result<String, Error> {
    spawn_blocking_with_tracing(move || compute_hash(&password))
        .await
        .context("hash password task")
        .map_err(Error::Other)?
}

#[tracing::instrument(name = "verify password", skip_all)]
pub async fn verify_password(password_hash: String, password: SecretString) -> Result<(), Error> {
    spawn_blocking_with_tracing(move || verify_hash(&password_hash, &password))
        .await
        .context("verify password task")
        .map_err(Error::Other)?
}
