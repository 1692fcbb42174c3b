//! Contact message repository

use crate::models::ContactMessage;
use sqlx::PgPool;

pub async fn insert(
    pool: &PgPool,
    full_name: &str,
    email: &str,
    phone: Option<&str>,
    message: &str,
) -> Result<ContactMessage, sqlx::Error> {
    sqlx::query_as::<_, ContactMessage>(
        "INSERT INTO contact_messages (full_name, email, phone, message) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, full_name, email, phone, message, created_at",
    )
    .bind(full_name)
    .bind(email)
    .bind(phone)
    .bind(message)
    .fetch_one(pool)
    .await
}
