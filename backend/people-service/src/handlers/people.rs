//! Public person pages: listings, detail, and the authenticated page flow
//! for creating and editing a profile.

use crate::db::{category_repo, person_repo, tag_repo};
use crate::error::{AppError, Result};
use crate::handlers::pages::page_context;
use crate::middleware::AuthUser;
use crate::models::{Gender, Person, Status, validate_slug};
use crate::services::people::{CreatePersonInput, PersonService, UpdatePageInput};
use crate::cache::ApiCache;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Page size of the all-persons listing
const ALL_PAGE_SIZE: i64 = 5;
/// Page size of the gender/category/tag listings
const FILTERED_PAGE_SIZE: i64 = 3;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
struct Pagination {
    page: i64,
    page_size: i64,
    total: i64,
    total_pages: i64,
}

fn paginate(page: Option<i64>, page_size: i64, total: i64) -> (i64, Pagination) {
    let page = page.unwrap_or(1).max(1);
    let total_pages = if total == 0 {
        0
    } else {
        (total + page_size - 1) / page_size
    };
    let offset = (page - 1) * page_size;
    (
        offset,
        Pagination {
            page,
            page_size,
            total,
            total_pages,
        },
    )
}

/// All published persons. An out-of-range page is simply empty.
pub async fn list_persons(
    pool: web::Data<PgPool>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let total = person_repo::count_published(&pool).await?;
    let (offset, pagination) = paginate(query.page, ALL_PAGE_SIZE, total);
    let posts = person_repo::list_published(&pool, ALL_PAGE_SIZE, offset).await?;

    Ok(HttpResponse::Ok().json(page_context(
        "All persons",
        vec![
            ("cat_selected", json!(0)),
            ("posts", json!(posts)),
            ("pagination", json!(pagination)),
        ],
    )))
}

async fn list_by_gender(
    pool: &PgPool,
    gender: Gender,
    title: &str,
    page: Option<i64>,
) -> Result<HttpResponse> {
    let total = person_repo::count_published_by_gender(pool, gender).await?;
    let (offset, pagination) = paginate(page, FILTERED_PAGE_SIZE, total);
    let posts = person_repo::list_published_by_gender(pool, gender, FILTERED_PAGE_SIZE, offset)
        .await?;

    // Empty listings on the filtered views are a not-found outcome.
    if posts.is_empty() {
        return Err(AppError::NotFound("no persons on this page".to_string()));
    }

    Ok(HttpResponse::Ok().json(page_context(
        title,
        vec![
            ("cat_selected", json!(0)),
            ("posts", json!(posts)),
            ("pagination", json!(pagination)),
        ],
    )))
}

pub async fn list_men(
    pool: web::Data<PgPool>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    list_by_gender(&pool, Gender::Male, "Men", query.page).await
}

pub async fn list_women(
    pool: web::Data<PgPool>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    list_by_gender(&pool, Gender::Female, "Women", query.page).await
}

/// Published persons in one category.
pub async fn list_by_category(
    pool: web::Data<PgPool>,
    cat_slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let category = category_repo::find_by_slug(&pool, &cat_slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category '{}' not found", cat_slug)))?;

    let total = person_repo::count_published_by_category_slug(&pool, &cat_slug).await?;
    let (offset, pagination) = paginate(query.page, FILTERED_PAGE_SIZE, total);
    let posts =
        person_repo::list_published_by_category_slug(&pool, &cat_slug, FILTERED_PAGE_SIZE, offset)
            .await?;

    if posts.is_empty() {
        return Err(AppError::NotFound("no persons on this page".to_string()));
    }

    Ok(HttpResponse::Ok().json(page_context(
        &format!("Category - {}", category.name),
        vec![
            ("cat_selected", json!(category.id)),
            ("posts", json!(posts)),
            ("pagination", json!(pagination)),
        ],
    )))
}

/// Published persons carrying one tag.
pub async fn list_by_tag(
    pool: web::Data<PgPool>,
    tag_slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let tag = tag_repo::find_by_slug(&pool, &tag_slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tag '{}' not found", tag_slug)))?;

    let total = person_repo::count_published_by_tag_slug(&pool, &tag_slug).await?;
    let (offset, pagination) = paginate(query.page, FILTERED_PAGE_SIZE, total);
    let posts =
        person_repo::list_published_by_tag_slug(&pool, &tag_slug, FILTERED_PAGE_SIZE, offset)
            .await?;

    if posts.is_empty() {
        return Err(AppError::NotFound("no persons on this page".to_string()));
    }

    Ok(HttpResponse::Ok().json(page_context(
        &format!("Tag: {}", tag.label),
        vec![("posts", json!(posts)), ("pagination", json!(pagination))],
    )))
}

#[derive(Debug, Serialize)]
struct CompanionSummary {
    id: Uuid,
    title: String,
    slug: String,
}

/// Published person detail by slug. Drafts report not-found.
pub async fn get_person(
    pool: web::Data<PgPool>,
    slug: web::Path<String>,
) -> Result<HttpResponse> {
    let person = person_repo::find_published_by_slug(&pool, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("person '{}' not found", slug)))?;

    let tags = tag_repo::tags_for_person(&pool, person.id).await?;

    let companion = match person.companion_id {
        Some(companion_id) => person_repo::find_by_id(&pool, companion_id)
            .await?
            .map(|c| CompanionSummary {
                id: c.id,
                title: c.title,
                slug: c.slug,
            }),
        None => None,
    };

    let title = person.title.clone();
    Ok(HttpResponse::Ok().json(page_context(
        &title,
        vec![
            ("post", json!(person)),
            ("tags", json!(tags)),
            ("companion", json!(companion)),
        ],
    )))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePageRequest {
    #[validate(length(min = 1, max = 50, message = "must be at most 50 characters"))]
    pub title: String,

    #[validate(custom(function = "validate_slug"))]
    pub slug: String,

    #[serde(default)]
    pub content: String,

    pub photo: Option<String>,

    pub gender: Gender,

    pub status: Option<Status>,

    pub category_id: Uuid,

    pub companion_id: Option<Uuid>,

    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

fn detail_path(person: &Person) -> String {
    format!("/api/v1/persons/{}", person.slug)
}

/// Authenticated profile creation; the caller becomes the author.
pub async fn create_person_page(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ApiCache>>,
    user: AuthUser,
    req: web::Json<CreatePageRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let service = PersonService::with_cache((**pool).clone(), cache.get_ref().clone());
    let input = req.into_inner();
    let person = service
        .create(CreatePersonInput {
            title: input.title,
            slug: input.slug,
            content: input.content,
            photo: input.photo,
            status: input.status.unwrap_or(Status::Published),
            gender: input.gender,
            category_id: input.category_id,
            author_id: Some(user.id),
            companion_id: input.companion_id,
            tag_ids: input.tag_ids,
        })
        .await?;

    // Published profiles point at their page, drafts back at the listing.
    let location = match person.status {
        Status::Published => detail_path(&person),
        Status::Draft => "/api/v1/persons".to_string(),
    };

    Ok(HttpResponse::Created().json(json!({
        "person": person,
        "location": location,
    })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePageRequest {
    #[serde(default)]
    pub content: String,

    pub photo: Option<String>,

    pub category_id: Uuid,

    pub companion_id: Option<Uuid>,

    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

/// Authenticated page edit. Ownership is not checked; any authenticated
/// identity may edit any profile.
pub async fn update_person_page(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ApiCache>>,
    _user: AuthUser,
    slug: web::Path<String>,
    req: web::Json<UpdatePageRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let service = PersonService::with_cache((**pool).clone(), cache.get_ref().clone());
    let input = req.into_inner();
    let person = service
        .update_page(
            &slug,
            UpdatePageInput {
                content: input.content,
                photo: input.photo,
                category_id: input.category_id,
                companion_id: input.companion_id,
                tag_ids: input.tag_ids,
            },
        )
        .await?;

    let location = detail_path(&person);
    Ok(HttpResponse::Ok().json(json!({
        "person": person,
        "location": location,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_first_page() {
        let (offset, p) = paginate(None, 5, 12);
        assert_eq!(offset, 0);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 3);
    }

    #[test]
    fn test_paginate_later_page() {
        let (offset, p) = paginate(Some(3), 3, 7);
        assert_eq!(offset, 6);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.page, 3);
    }

    #[test]
    fn test_paginate_clamps_below_one() {
        let (offset, p) = paginate(Some(0), 5, 10);
        assert_eq!(offset, 0);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn test_paginate_empty_total() {
        let (_, p) = paginate(None, 5, 0);
        assert_eq!(p.total_pages, 0);
    }
}
