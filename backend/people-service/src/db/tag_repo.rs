//! Tag repository

use crate::models::Tag;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

pub async fn list_all(pool: &PgPool) -> Result<Vec<Tag>, sqlx::Error> {
    sqlx::query_as::<_, Tag>("SELECT id, label, slug FROM tag_posts ORDER BY label ASC")
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Tag>, sqlx::Error> {
    sqlx::query_as::<_, Tag>("SELECT id, label, slug FROM tag_posts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Tag>, sqlx::Error> {
    sqlx::query_as::<_, Tag>("SELECT id, label, slug FROM tag_posts WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
}

pub async fn insert(pool: &PgPool, label: &str, slug: &str) -> Result<Tag, sqlx::Error> {
    sqlx::query_as::<_, Tag>(
        "INSERT INTO tag_posts (label, slug) VALUES ($1, $2) RETURNING id, label, slug",
    )
    .bind(label)
    .bind(slug)
    .fetch_one(pool)
    .await
}

pub async fn update(pool: &PgPool, id: Uuid, label: &str, slug: &str) -> Result<Tag, sqlx::Error> {
    sqlx::query_as::<_, Tag>(
        "UPDATE tag_posts SET label = $2, slug = $3 WHERE id = $1 RETURNING id, label, slug",
    )
    .bind(id)
    .bind(label)
    .bind(slug)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tag_posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Tags attached to one person.
pub async fn tags_for_person(pool: &PgPool, person_id: Uuid) -> Result<Vec<Tag>, sqlx::Error> {
    sqlx::query_as::<_, Tag>(
        "SELECT t.id, t.label, t.slug FROM tag_posts t \
         JOIN person_tags pt ON pt.tag_id = t.id \
         WHERE pt.person_id = $1 \
         ORDER BY t.label ASC",
    )
    .bind(person_id)
    .fetch_all(pool)
    .await
}

/// Replace a person's tag set inside the caller's transaction.
pub async fn replace_person_tags(
    tx: &mut Transaction<'_, Postgres>,
    person_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM person_tags WHERE person_id = $1")
        .bind(person_id)
        .execute(&mut **tx)
        .await?;

    if !tag_ids.is_empty() {
        sqlx::query(
            "INSERT INTO person_tags (person_id, tag_id) \
             SELECT $1, unnest($2::uuid[])",
        )
        .bind(person_id)
        .bind(tag_ids)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}
