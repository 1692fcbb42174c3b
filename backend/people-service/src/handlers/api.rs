//! REST API surface over persons and categories
//!
//! Reads are unrestricted (drafts included) and cached; writes require an
//! authenticated identity, deletes an administrative one. The collection
//! and detail representations are cached with fixed TTLs and invalidated
//! by every write path.

use crate::cache::{ApiCache, DETAIL_TTL, LIST_TTL, person_key, person_list_key};
use crate::db::{category_repo, person_repo};
use crate::error::{AppError, Result};
use crate::middleware::{AdminUser, AuthUser};
use crate::models::{Gender, Person, Status, validate_slug};
use crate::services::people::{CreatePersonInput, PersonService, UpdateApiInput};
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Serialized person shape of the API surface.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiPerson {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub gender: Gender,
    pub category_id: Uuid,
}

impl From<Person> for ApiPerson {
    fn from(p: Person) -> Self {
        ApiPerson {
            id: p.id,
            title: p.title,
            slug: p.slug,
            content: p.content,
            gender: p.gender,
            category_id: p.category_id,
        }
    }
}

/// Cached collection view.
pub async fn list_persons(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ApiCache>>,
) -> Result<HttpResponse> {
    let data = cache
        .get_or_set(&person_list_key(), LIST_TTL, || async {
            let persons = person_repo::list_all(&pool).await?;
            Ok(persons.into_iter().map(ApiPerson::from).collect::<Vec<_>>())
        })
        .await?;

    Ok(HttpResponse::Ok().json(data))
}

/// Cached detail view.
pub async fn retrieve_person(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ApiCache>>,
    person_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let id = *person_id;
    let data = cache
        .get_or_set(&person_key(id), DETAIL_TTL, || async {
            let person = person_repo::find_by_id(&pool, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("person {} not found", id)))?;
            Ok(ApiPerson::from(person))
        })
        .await?;

    Ok(HttpResponse::Ok().json(data))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApiPersonCreateRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(custom(function = "validate_slug"))]
    pub slug: String,

    #[serde(default)]
    pub content: String,

    pub gender: Gender,

    pub category_id: Uuid,
}

/// Create through the API; the caller becomes the author.
pub async fn create_person(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ApiCache>>,
    user: AuthUser,
    req: web::Json<ApiPersonCreateRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let service = PersonService::with_cache((**pool).clone(), cache.get_ref().clone());
    let input = req.into_inner();
    let person = service
        .create(CreatePersonInput {
            title: input.title,
            slug: input.slug,
            content: input.content,
            photo: None,
            status: Status::Published,
            gender: input.gender,
            category_id: input.category_id,
            author_id: Some(user.id),
            companion_id: None,
            tag_ids: Vec::new(),
        })
        .await?;

    Ok(HttpResponse::Created().json(ApiPerson::from(person)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApiPersonUpdateRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(custom(function = "validate_slug"))]
    pub slug: String,

    #[serde(default)]
    pub content: String,

    pub gender: Gender,

    pub category_id: Uuid,
}

/// Full update (PUT). Any authenticated identity may update any person.
pub async fn update_person(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ApiCache>>,
    _user: AuthUser,
    person_id: web::Path<Uuid>,
    req: web::Json<ApiPersonUpdateRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let service = PersonService::with_cache((**pool).clone(), cache.get_ref().clone());
    let input = req.into_inner();
    let person = service
        .update_api(
            *person_id,
            UpdateApiInput {
                title: Some(input.title),
                slug: Some(input.slug),
                content: Some(input.content),
                gender: Some(input.gender),
                category_id: Some(input.category_id),
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(ApiPerson::from(person)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApiPersonPatchRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,

    pub content: Option<String>,

    pub gender: Option<Gender>,

    pub category_id: Option<Uuid>,
}

/// Partial update (PATCH); absent fields keep their value.
pub async fn partial_update_person(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ApiCache>>,
    _user: AuthUser,
    person_id: web::Path<Uuid>,
    req: web::Json<ApiPersonPatchRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let service = PersonService::with_cache((**pool).clone(), cache.get_ref().clone());
    let input = req.into_inner();
    let person = service
        .update_api(
            *person_id,
            UpdateApiInput {
                title: input.title,
                slug: input.slug,
                content: input.content,
                gender: input.gender,
                category_id: input.category_id,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(ApiPerson::from(person)))
}

async fn person_with_category(
    pool: &PgPool,
    person_id: Uuid,
) -> Result<(Person, crate::models::Category)> {
    let person = person_repo::find_by_id(pool, person_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("person {} not found", person_id)))?;
    let category = category_repo::find_by_id(pool, person.category_id)
        .await?
        .ok_or_else(|| AppError::Internal("category row missing".to_string()))?;
    Ok((person, category))
}

/// Category of one person.
pub async fn get_person_category(
    pool: web::Data<PgPool>,
    person_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let (_, category) = person_with_category(&pool, *person_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "category": category.name })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
}

/// Update the category row a person points at. Every person sharing the
/// category sees the change.
pub async fn update_person_category(
    pool: web::Data<PgPool>,
    _user: AuthUser,
    person_id: web::Path<Uuid>,
    req: web::Json<CategoryRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let (_, category) = person_with_category(&pool, *person_id).await?;
    let updated = category_repo::update(&pool, category.id, &req.name, &req.slug).await?;

    Ok(HttpResponse::Ok().json(json!({ "name": updated.name, "slug": updated.slug })))
}

/// Names of every category.
pub async fn list_categories(pool: web::Data<PgPool>) -> Result<HttpResponse> {
    let categories = category_repo::list_all(&pool).await?;
    let names: Vec<String> = categories.into_iter().map(|c| c.name).collect();
    Ok(HttpResponse::Ok().json(json!({ "categories": names })))
}

pub async fn create_category(
    pool: web::Data<PgPool>,
    _user: AuthUser,
    req: web::Json<CategoryRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let category = category_repo::insert(&pool, &req.name, &req.slug).await?;
    Ok(HttpResponse::Created().json(json!({ "name": category.name, "slug": category.slug })))
}

/// Retrieve half of the retrieve/destroy endpoint: open to anyone.
pub async fn retrieve_category(
    pool: web::Data<PgPool>,
    category_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let category = category_repo::find_by_id(&pool, *category_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {} not found", category_id)))?;

    Ok(HttpResponse::Ok().json(json!({ "name": category.name, "slug": category.slug })))
}

/// Destroy half: administrative identities only. A category still
/// referenced by persons survives with a conflict response.
pub async fn destroy_category(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    category_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let deleted = category_repo::delete(&pool, *category_id).await?;
    if deleted {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(AppError::NotFound(format!(
            "category {} not found",
            category_id
        )))
    }
}

#[derive(Debug, Deserialize)]
pub struct AutocompleteQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
struct AutocompleteEntry {
    id: Uuid,
    text: String,
}

const AUTOCOMPLETE_LIMIT: i64 = 20;

/// Typeahead over all persons by title substring, for relationship
/// selection in administrative forms.
pub async fn person_autocomplete(
    pool: web::Data<PgPool>,
    query: web::Query<AutocompleteQuery>,
) -> Result<HttpResponse> {
    let needle = query.q.as_deref().unwrap_or("");
    let persons = person_repo::search_by_title(&pool, needle, AUTOCOMPLETE_LIMIT).await?;

    let results: Vec<AutocompleteEntry> = persons
        .into_iter()
        .map(|p| AutocompleteEntry {
            id: p.id,
            text: format!("{} ({})", p.title, p.gender.display()),
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({ "results": results })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_api_person_from_row() {
        let person = Person {
            id: Uuid::new_v4(),
            title: "Marie Curie".to_string(),
            slug: "marie-curie".to_string(),
            content: "Physicist and chemist".to_string(),
            photo: None,
            status: Status::Published,
            gender: Gender::Female,
            companion_id: None,
            category_id: Uuid::new_v4(),
            author_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let api: ApiPerson = person.clone().into();
        assert_eq!(api.title, person.title);
        assert_eq!(api.category_id, person.category_id);
    }

    #[test]
    fn test_autocomplete_label_format() {
        let text = format!("{} ({})", "Pierre Curie", Gender::Male.display());
        assert_eq!(text, "Pierre Curie (Male)");
    }
}
