//! Person repository
//!
//! Two read paths exist over the same table: the published-only path backs
//! every public-facing view, the unrestricted path backs the REST API read
//! surface, autocomplete and the admin console.

use crate::models::{Gender, Person, Status};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

const PERSON_COLUMNS: &str = "id, title, slug, content, photo, status, gender, \
     companion_id, category_id, author_id, created_at, updated_at";

// ============================================
// Published-only read path
// ============================================

pub async fn list_published(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Person>, sqlx::Error> {
    let query = format!(
        "SELECT {PERSON_COLUMNS} FROM persons \
         WHERE status = 'published' \
         ORDER BY created_at DESC \
         LIMIT $1 OFFSET $2"
    );
    sqlx::query_as::<_, Person>(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn count_published(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM persons WHERE status = 'published'")
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count"))
}

pub async fn list_published_by_gender(
    pool: &PgPool,
    gender: Gender,
    limit: i64,
    offset: i64,
) -> Result<Vec<Person>, sqlx::Error> {
    let query = format!(
        "SELECT {PERSON_COLUMNS} FROM persons \
         WHERE status = 'published' AND gender = $1 \
         ORDER BY created_at DESC \
         LIMIT $2 OFFSET $3"
    );
    sqlx::query_as::<_, Person>(&query)
        .bind(gender)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn count_published_by_gender(
    pool: &PgPool,
    gender: Gender,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        "SELECT COUNT(*) as count FROM persons WHERE status = 'published' AND gender = $1",
    )
    .bind(gender)
    .fetch_one(pool)
    .await?;
    Ok(row.get::<i64, _>("count"))
}

pub async fn list_published_by_category_slug(
    pool: &PgPool,
    cat_slug: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Person>, sqlx::Error> {
    let query = format!(
        "SELECT p.{} FROM persons p \
         JOIN categories c ON p.category_id = c.id \
         WHERE p.status = 'published' AND c.slug = $1 \
         ORDER BY p.created_at DESC \
         LIMIT $2 OFFSET $3",
        PERSON_COLUMNS.replace(", ", ", p.")
    );
    sqlx::query_as::<_, Person>(&query)
        .bind(cat_slug)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn count_published_by_category_slug(
    pool: &PgPool,
    cat_slug: &str,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        "SELECT COUNT(*) as count FROM persons p \
         JOIN categories c ON p.category_id = c.id \
         WHERE p.status = 'published' AND c.slug = $1",
    )
    .bind(cat_slug)
    .fetch_one(pool)
    .await?;
    Ok(row.get::<i64, _>("count"))
}

pub async fn list_published_by_tag_slug(
    pool: &PgPool,
    tag_slug: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Person>, sqlx::Error> {
    let query = format!(
        "SELECT p.{} FROM persons p \
         JOIN person_tags pt ON pt.person_id = p.id \
         JOIN tag_posts t ON t.id = pt.tag_id \
         WHERE p.status = 'published' AND t.slug = $1 \
         ORDER BY p.created_at DESC \
         LIMIT $2 OFFSET $3",
        PERSON_COLUMNS.replace(", ", ", p.")
    );
    sqlx::query_as::<_, Person>(&query)
        .bind(tag_slug)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn count_published_by_tag_slug(
    pool: &PgPool,
    tag_slug: &str,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        "SELECT COUNT(*) as count FROM persons p \
         JOIN person_tags pt ON pt.person_id = p.id \
         JOIN tag_posts t ON t.id = pt.tag_id \
         WHERE p.status = 'published' AND t.slug = $1",
    )
    .bind(tag_slug)
    .fetch_one(pool)
    .await?;
    Ok(row.get::<i64, _>("count"))
}

/// Published detail lookup. Drafts are indistinguishable from absent rows.
pub async fn find_published_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<Person>, sqlx::Error> {
    let query = format!(
        "SELECT {PERSON_COLUMNS} FROM persons WHERE status = 'published' AND slug = $1"
    );
    sqlx::query_as::<_, Person>(&query)
        .bind(slug)
        .fetch_optional(pool)
        .await
}

/// One random published person, used by the daily greeting job.
pub async fn random_published(pool: &PgPool) -> Result<Option<Person>, sqlx::Error> {
    let query = format!(
        "SELECT {PERSON_COLUMNS} FROM persons WHERE status = 'published' \
         ORDER BY random() LIMIT 1"
    );
    sqlx::query_as::<_, Person>(&query).fetch_optional(pool).await
}

// ============================================
// Unrestricted read path
// ============================================

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Person>, sqlx::Error> {
    let query = format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = $1");
    sqlx::query_as::<_, Person>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Person>, sqlx::Error> {
    let query = format!("SELECT {PERSON_COLUMNS} FROM persons WHERE slug = $1");
    sqlx::query_as::<_, Person>(&query)
        .bind(slug)
        .fetch_optional(pool)
        .await
}

/// Full table scan for the API collection view; the serialized result is
/// cached, not paginated.
pub async fn list_all(pool: &PgPool) -> Result<Vec<Person>, sqlx::Error> {
    let query = format!("SELECT {PERSON_COLUMNS} FROM persons ORDER BY created_at DESC");
    sqlx::query_as::<_, Person>(&query).fetch_all(pool).await
}

/// Title substring search for the relationship typeahead.
pub async fn search_by_title(
    pool: &PgPool,
    needle: &str,
    limit: i64,
) -> Result<Vec<Person>, sqlx::Error> {
    let query = format!(
        "SELECT {PERSON_COLUMNS} FROM persons \
         WHERE title ILIKE '%' || $1 || '%' \
         ORDER BY title ASC \
         LIMIT $2"
    );
    sqlx::query_as::<_, Person>(&query)
        .bind(needle)
        .bind(limit)
        .fetch_all(pool)
        .await
}

/// Admin listing with the console's filters. `None` filters are skipped.
pub async fn list_admin(
    pool: &PgPool,
    status: Option<Status>,
    has_companion: Option<bool>,
    category_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Person>, sqlx::Error> {
    let query = format!(
        "SELECT {PERSON_COLUMNS} FROM persons \
         WHERE ($1::text IS NULL OR status = $1) \
           AND ($2::boolean IS NULL OR (companion_id IS NOT NULL) = $2) \
           AND ($3::uuid IS NULL OR category_id = $3) \
         ORDER BY created_at DESC, title ASC \
         LIMIT $4 OFFSET $5"
    );
    sqlx::query_as::<_, Person>(&query)
        .bind(status.map(|s| s.as_str()))
        .bind(has_companion)
        .bind(category_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

// ============================================
// Writes
// ============================================

pub struct NewPerson<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub content: &'a str,
    pub photo: Option<&'a str>,
    pub status: Status,
    pub gender: Gender,
    pub category_id: Uuid,
    pub author_id: Option<Uuid>,
}

pub async fn insert_person(
    tx: &mut Transaction<'_, Postgres>,
    new: &NewPerson<'_>,
) -> Result<Person, sqlx::Error> {
    let query = format!(
        "INSERT INTO persons (title, slug, content, photo, status, gender, category_id, author_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {PERSON_COLUMNS}"
    );
    sqlx::query_as::<_, Person>(&query)
        .bind(new.title)
        .bind(new.slug)
        .bind(new.content)
        .bind(new.photo)
        .bind(new.status)
        .bind(new.gender)
        .bind(new.category_id)
        .bind(new.author_id)
        .fetch_one(&mut **tx)
        .await
}

/// Page-flow update: title, slug and gender are immutable here.
pub async fn update_person_page(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    content: &str,
    photo: Option<&str>,
    status: Status,
    category_id: Uuid,
) -> Result<Person, sqlx::Error> {
    let query = format!(
        "UPDATE persons \
         SET content = $2, photo = $3, status = $4, category_id = $5, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {PERSON_COLUMNS}"
    );
    sqlx::query_as::<_, Person>(&query)
        .bind(id)
        .bind(content)
        .bind(photo)
        .bind(status)
        .bind(category_id)
        .fetch_one(&mut **tx)
        .await
}

/// API update; `None` fields keep their current value (partial update).
pub async fn update_person_api(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    title: Option<&str>,
    slug: Option<&str>,
    content: Option<&str>,
    gender: Option<Gender>,
    category_id: Option<Uuid>,
) -> Result<Person, sqlx::Error> {
    let query = format!(
        "UPDATE persons \
         SET title = COALESCE($2, title), \
             slug = COALESCE($3, slug), \
             content = COALESCE($4, content), \
             gender = COALESCE($5, gender), \
             category_id = COALESCE($6, category_id), \
             updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {PERSON_COLUMNS}"
    );
    sqlx::query_as::<_, Person>(&query)
        .bind(id)
        .bind(title)
        .bind(slug)
        .bind(content)
        .bind(gender)
        .bind(category_id)
        .fetch_one(&mut **tx)
        .await
}

/// Admin update: every column settable.
pub async fn update_person_full(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    new: &NewPerson<'_>,
) -> Result<Person, sqlx::Error> {
    let query = format!(
        "UPDATE persons \
         SET title = $2, slug = $3, content = $4, photo = $5, status = $6, \
             gender = $7, category_id = $8, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {PERSON_COLUMNS}"
    );
    sqlx::query_as::<_, Person>(&query)
        .bind(id)
        .bind(new.title)
        .bind(new.slug)
        .bind(new.content)
        .bind(new.photo)
        .bind(new.status)
        .bind(new.gender)
        .bind(new.category_id)
        .fetch_one(&mut **tx)
        .await
}

/// Bulk status flip used by the admin publish/unpublish actions.
pub async fn set_status_bulk(
    pool: &PgPool,
    ids: &[Uuid],
    status: Status,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE persons SET status = $1, updated_at = NOW() WHERE id = ANY($2)",
    )
    .bind(status)
    .bind(ids)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_person(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM persons WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
