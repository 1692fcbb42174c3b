//! Administrative console: full CRUD over persons, categories and tags,
//! bulk publish/unpublish, and the console's list filters.
//!
//! Every route here requires the admin capability.

use crate::cache::ApiCache;
use crate::db::{category_repo, person_repo, tag_repo};
use crate::error::{AppError, Result};
use crate::handlers::api::CategoryRequest;
use crate::middleware::AdminUser;
use crate::models::{Gender, Status, validate_slug};
use crate::services::people::{CreatePersonInput, PersonService};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const ADMIN_PAGE_SIZE: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub status: Option<Status>,
    /// "have_companion" or "single"
    pub companion: Option<String>,
    pub category_id: Option<Uuid>,
    pub page: Option<i64>,
}

/// Unrestricted person listing with the console filters.
pub async fn list_persons(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    query: web::Query<AdminListQuery>,
) -> Result<HttpResponse> {
    let has_companion = match query.companion.as_deref() {
        Some("have_companion") => Some(true),
        Some("single") => Some(false),
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "unknown companion filter '{}'",
                other
            )))
        }
        None => None,
    };

    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * ADMIN_PAGE_SIZE;

    let persons = person_repo::list_admin(
        &pool,
        query.status,
        has_companion,
        query.category_id,
        ADMIN_PAGE_SIZE,
        offset,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "persons": persons,
        "page": page,
        "page_size": ADMIN_PAGE_SIZE,
    })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminPersonRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(custom(function = "validate_slug"))]
    pub slug: String,

    #[serde(default)]
    pub content: String,

    pub photo: Option<String>,

    pub status: Status,

    pub gender: Gender,

    pub category_id: Uuid,

    pub companion_id: Option<Uuid>,

    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

impl AdminPersonRequest {
    fn into_input(self) -> CreatePersonInput {
        CreatePersonInput {
            title: self.title,
            slug: self.slug,
            content: self.content,
            photo: self.photo,
            status: self.status,
            gender: self.gender,
            category_id: self.category_id,
            author_id: None,
            companion_id: self.companion_id,
            tag_ids: self.tag_ids,
        }
    }
}

pub async fn create_person(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ApiCache>>,
    _admin: AdminUser,
    req: web::Json<AdminPersonRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let service = PersonService::with_cache((**pool).clone(), cache.get_ref().clone());
    let person = service.create(req.into_inner().into_input()).await?;

    Ok(HttpResponse::Created().json(person))
}

pub async fn update_person(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ApiCache>>,
    _admin: AdminUser,
    person_id: web::Path<Uuid>,
    req: web::Json<AdminPersonRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let service = PersonService::with_cache((**pool).clone(), cache.get_ref().clone());
    let person = service
        .update_admin(*person_id, req.into_inner().into_input())
        .await?;

    Ok(HttpResponse::Ok().json(person))
}

pub async fn delete_person(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ApiCache>>,
    _admin: AdminUser,
    person_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = PersonService::with_cache((**pool).clone(), cache.get_ref().clone());
    if service.delete(*person_id).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(AppError::NotFound(format!(
            "person {} not found",
            person_id
        )))
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkStatusRequest {
    pub ids: Vec<Uuid>,
}

/// Bulk publish selected records.
pub async fn publish_persons(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ApiCache>>,
    _admin: AdminUser,
    req: web::Json<BulkStatusRequest>,
) -> Result<HttpResponse> {
    let service = PersonService::with_cache((**pool).clone(), cache.get_ref().clone());
    let count = service
        .set_status_bulk(&req.ids, Status::Published)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "updated": count,
        "message": format!("{} records were published", count),
    })))
}

/// Bulk unpublish selected records.
pub async fn unpublish_persons(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ApiCache>>,
    _admin: AdminUser,
    req: web::Json<BulkStatusRequest>,
) -> Result<HttpResponse> {
    let service = PersonService::with_cache((**pool).clone(), cache.get_ref().clone());
    let count = service.set_status_bulk(&req.ids, Status::Draft).await?;

    Ok(HttpResponse::Ok().json(json!({
        "updated": count,
        "message": format!("{} records were unpublished", count),
    })))
}

// Category management

pub async fn list_categories(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
) -> Result<HttpResponse> {
    let categories = category_repo::list_all(&pool).await?;
    Ok(HttpResponse::Ok().json(categories))
}

pub async fn create_category(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    req: web::Json<CategoryRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let category = category_repo::insert(&pool, &req.name, &req.slug).await?;
    Ok(HttpResponse::Created().json(category))
}

pub async fn update_category(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    category_id: web::Path<Uuid>,
    req: web::Json<CategoryRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let category = category_repo::update(&pool, *category_id, &req.name, &req.slug).await?;
    Ok(HttpResponse::Ok().json(category))
}

/// Deletion is blocked with a conflict while persons reference the row.
pub async fn delete_category(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    category_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    if category_repo::delete(&pool, *category_id).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(AppError::NotFound(format!(
            "category {} not found",
            category_id
        )))
    }
}

// Tag management

#[derive(Debug, Deserialize, Validate)]
pub struct TagRequest {
    #[validate(length(min = 1, max = 100))]
    pub label: String,

    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
}

pub async fn list_tags(pool: web::Data<PgPool>, _admin: AdminUser) -> Result<HttpResponse> {
    let tags = tag_repo::list_all(&pool).await?;
    Ok(HttpResponse::Ok().json(tags))
}

pub async fn create_tag(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    req: web::Json<TagRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let tag = tag_repo::insert(&pool, &req.label, &req.slug).await?;
    Ok(HttpResponse::Created().json(tag))
}

pub async fn update_tag(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    tag_id: web::Path<Uuid>,
    req: web::Json<TagRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let tag = tag_repo::update(&pool, *tag_id, &req.label, &req.slug).await?;
    Ok(HttpResponse::Ok().json(tag))
}

pub async fn delete_tag(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    tag_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    if tag_repo::delete(&pool, *tag_id).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(AppError::NotFound(format!("tag {} not found", tag_id)))
    }
}
