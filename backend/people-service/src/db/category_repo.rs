//! Category repository

use crate::models::Category;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn list_all(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories ORDER BY name ASC")
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
}

pub async fn insert(pool: &PgPool, name: &str, slug: &str) -> Result<Category, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
    )
    .bind(name)
    .bind(slug)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    slug: &str,
) -> Result<Category, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        "UPDATE categories SET name = $2, slug = $3 WHERE id = $1 RETURNING id, name, slug",
    )
    .bind(id)
    .bind(name)
    .bind(slug)
    .fetch_one(pool)
    .await
}

/// Deletion fails with a foreign-key violation while any person references
/// the category; the caller maps that to a conflict response.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
