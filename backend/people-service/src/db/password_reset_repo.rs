//! Password reset token repository
//!
//! Tokens are stored hashed (SHA-256); the raw token only ever appears in
//! the reset email.

use crate::models::PasswordReset;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<PasswordReset, sqlx::Error> {
    sqlx::query_as::<_, PasswordReset>(
        "INSERT INTO password_resets (user_id, token_hash, expires_at) \
         VALUES ($1, $2, $3) \
         RETURNING id, user_id, token_hash, expires_at, is_used, created_at",
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .fetch_one(pool)
    .await
}

/// An unused, unexpired reset entry for the hash, if one exists.
pub async fn find_valid_by_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<PasswordReset>, sqlx::Error> {
    sqlx::query_as::<_, PasswordReset>(
        "SELECT id, user_id, token_hash, expires_at, is_used, created_at \
         FROM password_resets \
         WHERE token_hash = $1 AND is_used = FALSE AND expires_at > NOW()",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}

pub async fn mark_used(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE password_resets SET is_used = TRUE WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
