//! User repository

use crate::error::{AppError, Result};
use crate::models::User;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, \
     is_active, is_admin, created_at, updated_at";

pub async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    first_name: &str,
    last_name: &str,
) -> Result<User> {
    let query = format!(
        "INSERT INTO users (username, email, password_hash, first_name, last_name) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {USER_COLUMNS}"
    );
    sqlx::query_as::<_, User>(&query)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                if db_err.message().contains("email") {
                    AppError::Validation("email: a user with this email already exists".to_string())
                } else {
                    AppError::Validation("username: this username is taken".to_string())
                }
            }
            _ => e.into(),
        })
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    Ok(sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
    Ok(sqlx::query_as::<_, User>(&query)
        .bind(username)
        .fetch_optional(pool)
        .await?)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    Ok(sqlx::query_as::<_, User>(&query)
        .bind(email)
        .fetch_optional(pool)
        .await?)
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool> {
    let row: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}

/// Profile edit touches first/last name only; username and email are
/// read-only through every surface.
pub async fn update_profile_names(
    pool: &PgPool,
    id: Uuid,
    first_name: &str,
    last_name: &str,
) -> Result<User> {
    let query = format!(
        "UPDATE users SET first_name = $2, last_name = $3, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {USER_COLUMNS}"
    );
    Ok(sqlx::query_as::<_, User>(&query)
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(pool)
        .await?)
}

pub async fn update_password(pool: &PgPool, id: Uuid, password_hash: &str) -> Result<()> {
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Active users whose address belongs to the given domain; recipients of
/// the daily greeting broadcast.
pub async fn list_active_by_email_domain(pool: &PgPool, domain: &str) -> Result<Vec<User>> {
    let query = format!(
        "SELECT {USER_COLUMNS} FROM users \
         WHERE is_active = TRUE AND email ILIKE '%@' || $1 \
         ORDER BY username ASC"
    );
    Ok(sqlx::query_as::<_, User>(&query)
        .bind(domain)
        .fetch_all(pool)
        .await?)
}
