//! Person service - orchestrates person writes across every surface
//!
//! All writes route companion changes through the symmetry maintainer
//! inside the same transaction as the person row update, and fire cache
//! invalidation after commit.

use crate::cache::ApiCache;
use crate::db::{category_repo, person_repo, tag_repo};
use crate::error::{AppError, Result};
use crate::models::{Gender, Person, Status};
use crate::services::companion;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub struct CreatePersonInput {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub photo: Option<String>,
    pub status: Status,
    pub gender: Gender,
    pub category_id: Uuid,
    pub author_id: Option<Uuid>,
    pub companion_id: Option<Uuid>,
    pub tag_ids: Vec<Uuid>,
}

/// Page-flow edit: title, slug, gender and status stay as they are.
pub struct UpdatePageInput {
    pub content: String,
    pub photo: Option<String>,
    pub category_id: Uuid,
    pub companion_id: Option<Uuid>,
    pub tag_ids: Vec<Uuid>,
}

/// API update; `None` fields are left unchanged.
#[derive(Default)]
pub struct UpdateApiInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub gender: Option<Gender>,
    pub category_id: Option<Uuid>,
}

/// A companion id that resolves to no row is a form error on the
/// companion field, not a missing-resource outcome.
fn companion_field_error(e: AppError) -> AppError {
    match e {
        AppError::NotFound(_) => {
            AppError::Validation("companion: unknown person".to_string())
        }
        other => other,
    }
}

pub struct PersonService {
    pool: PgPool,
    cache: Option<Arc<ApiCache>>,
}

impl PersonService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, cache: None }
    }

    pub fn with_cache(pool: PgPool, cache: Arc<ApiCache>) -> Self {
        Self {
            pool,
            cache: Some(cache),
        }
    }

    async fn invalidate(&self, ids: &[Uuid]) {
        if let Some(cache) = &self.cache {
            cache.invalidate_persons(ids).await;
        }
    }

    async fn ensure_category(&self, category_id: Uuid) -> Result<()> {
        match category_repo::find_by_id(&self.pool, category_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::Validation(
                "category: unknown category".to_string(),
            )),
        }
    }

    /// Create a person, optionally linking a companion, in one transaction.
    pub async fn create(&self, input: CreatePersonInput) -> Result<Person> {
        self.ensure_category(input.category_id).await?;

        let mut tx = self.pool.begin().await?;

        let person = person_repo::insert_person(
            &mut tx,
            &person_repo::NewPerson {
                title: &input.title,
                slug: &input.slug,
                content: &input.content,
                photo: input.photo.as_deref(),
                status: input.status,
                gender: input.gender,
                category_id: input.category_id,
                author_id: input.author_id,
            },
        )
        .await?;

        let mut touched = vec![person.id];
        if let Some(companion_id) = input.companion_id {
            touched = companion::set_companion(&mut tx, person.id, companion_id)
                .await
                .map_err(companion_field_error)?;
        }

        tag_repo::replace_person_tags(&mut tx, person.id, &input.tag_ids).await?;

        tx.commit().await?;
        self.invalidate(&touched).await;

        debug!(person_id = %person.id, slug = %person.slug, "person created");

        // Re-read so the returned row reflects the companion link.
        person_repo::find_by_id(&self.pool, person.id)
            .await?
            .ok_or_else(|| AppError::Internal("person vanished after create".to_string()))
    }

    /// Page-flow edit by slug. Any authenticated identity may edit any
    /// person; ownership is intentionally not checked.
    pub async fn update_page(&self, slug: &str, input: UpdatePageInput) -> Result<Person> {
        let existing = person_repo::find_by_slug(&self.pool, slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("person '{}' not found", slug)))?;

        self.ensure_category(input.category_id).await?;

        let mut tx = self.pool.begin().await?;

        person_repo::update_person_page(
            &mut tx,
            existing.id,
            &input.content,
            input.photo.as_deref(),
            existing.status,
            input.category_id,
        )
        .await?;

        let touched = match input.companion_id {
            Some(companion_id) => companion::set_companion(&mut tx, existing.id, companion_id)
                .await
                .map_err(companion_field_error)?,
            None => companion::clear_companion(&mut tx, existing.id).await?,
        };

        tag_repo::replace_person_tags(&mut tx, existing.id, &input.tag_ids).await?;

        tx.commit().await?;
        self.invalidate(&touched).await;

        person_repo::find_by_id(&self.pool, existing.id)
            .await?
            .ok_or_else(|| AppError::Internal("person vanished after update".to_string()))
    }

    /// API update (PUT or PATCH). The serializer surface does not carry the
    /// companion field, but a gender change must still respect an existing
    /// pairing.
    pub async fn update_api(&self, id: Uuid, input: UpdateApiInput) -> Result<Person> {
        let existing = person_repo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("person {} not found", id)))?;

        if let Some(category_id) = input.category_id {
            self.ensure_category(category_id).await?;
        }

        let effective_gender = input.gender.unwrap_or(existing.gender);
        if let Some(companion_id) = existing.companion_id {
            let companion = person_repo::find_by_id(&self.pool, companion_id)
                .await?
                .ok_or_else(|| AppError::Internal("companion row missing".to_string()))?;
            if companion.gender == effective_gender {
                return Err(AppError::Validation(
                    "gender: change would pair two persons of the same gender".to_string(),
                ));
            }
        }

        let mut tx = self.pool.begin().await?;
        let person = person_repo::update_person_api(
            &mut tx,
            id,
            input.title.as_deref(),
            input.slug.as_deref(),
            input.content.as_deref(),
            input.gender,
            input.category_id,
        )
        .await?;
        tx.commit().await?;

        self.invalidate(&[id]).await;

        Ok(person)
    }

    /// Full admin update, every field settable.
    pub async fn update_admin(
        &self,
        id: Uuid,
        create_shape: CreatePersonInput,
    ) -> Result<Person> {
        let existing = person_repo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("person {} not found", id)))?;

        self.ensure_category(create_shape.category_id).await?;

        let mut tx = self.pool.begin().await?;

        person_repo::update_person_full(
            &mut tx,
            id,
            &person_repo::NewPerson {
                title: &create_shape.title,
                slug: &create_shape.slug,
                content: &create_shape.content,
                photo: create_shape.photo.as_deref(),
                status: create_shape.status,
                gender: create_shape.gender,
                category_id: create_shape.category_id,
                author_id: existing.author_id,
            },
        )
        .await?;

        let touched = match create_shape.companion_id {
            Some(companion_id) => companion::set_companion(&mut tx, id, companion_id)
                .await
                .map_err(companion_field_error)?,
            None => companion::clear_companion(&mut tx, id).await?,
        };

        tag_repo::replace_person_tags(&mut tx, id, &create_shape.tag_ids).await?;

        tx.commit().await?;
        self.invalidate(&touched).await;

        debug!(person_id = %existing.id, "person updated by admin");

        person_repo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::Internal("person vanished after update".to_string()))
    }

    /// Admin delete. The partner's back-pointer is dropped by the schema's
    /// SET NULL, but the cache still needs the hint.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let partner = person_repo::find_by_id(&self.pool, id)
            .await?
            .and_then(|p| p.companion_id);

        let deleted = person_repo::delete_person(&self.pool, id).await?;
        if deleted {
            let mut touched = vec![id];
            touched.extend(partner);
            self.invalidate(&touched).await;
        }
        Ok(deleted)
    }

    /// Bulk publish/unpublish for the admin console.
    pub async fn set_status_bulk(&self, ids: &[Uuid], status: Status) -> Result<u64> {
        let count = person_repo::set_status_bulk(&self.pool, ids, status).await?;
        self.invalidate(ids).await;
        Ok(count)
    }
}
