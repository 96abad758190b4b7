use sqlx::PgPool;

use crate::{
    error::Error,
    model::{User, UserProfile},
};

use super::error::DatabaseError;

pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

#[tracing::instrument(name = "create user", skip_all, fields(email = %new_user.email))]
pub async fn create_user(pool: &PgPool, new_user: NewUser) -> Result<User, Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users
            (email, username, first_name, last_name, password)
        VALUES
            ($1, $2, $3, $4, $5)
        RETURNING
            id, email, username, first_name, last_name, token_version;
    "#,
    )
    .bind(&new_user.email)
    .bind(&new_user.username)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(&new_user.password_hash)
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::from)?;

    Ok(user)
}

#[derive(sqlx::FromRow)]
struct UserWithPassword {
    #[sqlx(flatten)]
    user: User,
    password: String,
}

/// Returns the user together with the stored password hash.
#[tracing::instrument(name = "get user by email", skip_all)]
pub async fn get_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<(User, String)>, Error> {
    let row = sqlx::query_as::<_, UserWithPassword>(
        r#"
        SELECT
            id, email, username, first_name, last_name, token_version, password
        FROM
            users
        WHERE
            lower(email) = lower($1);
    "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(row.map(|row| (row.user, row.password)))
}

#[tracing::instrument(name = "get user by id", skip_all, fields(user_id))]
pub async fn get_user_by_id_optional(pool: &PgPool, user_id: i64) -> Result<Option<User>, Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT
            id, email, username, first_name, last_name, token_version
        FROM
            users
        WHERE
            id = $1;
    "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::Database(DatabaseError::DatabaseError(e)))
}

#[tracing::instrument(name = "get user password hash", skip_all, fields(user_id))]
pub async fn get_user_password_hash(pool: &PgPool, user_id: i64) -> Result<String, Error> {
    sqlx::query_scalar::<_, String>("SELECT password FROM users WHERE id = $1;")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(DatabaseError::DatabaseError)?
        .ok_or(Error::Database(DatabaseError::NotFound))
}

/// Stores a new password hash and revokes every token issued so far.
#[tracing::instrument(name = "update user password", skip_all, fields(user_id))]
pub async fn update_user_password(
    pool: &PgPool,
    user_id: i64,
    password_hash: String,
) -> Result<(), Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET
            password = $1,
            token_version = token_version + 1
        WHERE
            id = $2;
    "#,
    )
    .bind(password_hash)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(())
}

#[tracing::instrument(name = "revoke user tokens", skip_all, fields(user_id))]
pub async fn revoke_user_tokens(pool: &PgPool, user_id: i64) -> Result<(), Error> {
    sqlx::query("UPDATE users SET token_version = token_version + 1 WHERE id = $1;")
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(DatabaseError::DatabaseError)?;

    Ok(())
}

#[tracing::instrument(name = "get user profile", skip_all, fields(user_id, viewer_id))]
pub async fn get_user_profile(
    pool: &PgPool,
    user_id: i64,
    viewer_id: Option<i64>,
) -> Result<UserProfile, Error> {
    sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT
            users.id, users.email, users.username, users.first_name, users.last_name,
            EXISTS (
                SELECT 1 FROM subscriptions
                WHERE subscriptions.user_id = $2 AND subscriptions.author_id = users.id
            ) AS is_subscribed
        FROM
            users
        WHERE
            users.id = $1;
    "#,
    )
    .bind(user_id)
    .bind(viewer_id)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?
    .ok_or(Error::Database(DatabaseError::NotFound))
}

#[tracing::instrument(name = "get user profiles with pagination", skip_all)]
pub async fn get_user_profiles_with_pagination(
    pool: &PgPool,
    viewer_id: Option<i64>,
    limit: i64,
    skip: i64,
) -> Result<(Vec<UserProfile>, i64), Error> {
    let count = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM users;")
        .fetch_one(pool)
        .await
        .map_err(DatabaseError::DatabaseError)?;

    let profiles = sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT
            users.id, users.email, users.username, users.first_name, users.last_name,
            EXISTS (
                SELECT 1 FROM subscriptions
                WHERE subscriptions.user_id = $1 AND subscriptions.author_id = users.id
            ) AS is_subscribed
        FROM
            users
        ORDER BY users.username
        LIMIT $2
        OFFSET $3;
    "#,
    )
    .bind(viewer_id)
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok((profiles, count))
}
