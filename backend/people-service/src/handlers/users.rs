//! Profile handlers
//!
//! Username and email are read-only through this surface; only first and
//! last name can change.

use crate::db::user_repo;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{validate_personal_name, User};
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for ProfileResponse {
    fn from(u: User) -> Self {
        ProfileResponse {
            username: u.username,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
        }
    }
}

pub async fn get_profile(pool: web::Data<PgPool>, user: AuthUser) -> Result<HttpResponse> {
    let db_user = user_repo::find_by_id(&pool, user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("unknown user".to_string()))?;

    Ok(HttpResponse::Ok().json(ProfileResponse::from(db_user)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(custom(function = "validate_personal_name"), length(max = 50))]
    pub first_name: String,

    #[validate(custom(function = "validate_personal_name"), length(max = 150))]
    pub last_name: String,
}

pub async fn update_profile(
    pool: web::Data<PgPool>,
    user: AuthUser,
    payload: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let updated =
        user_repo::update_profile_names(&pool, user.id, &payload.first_name, &payload.last_name)
            .await?;

    Ok(HttpResponse::Ok().json(ProfileResponse::from(updated)))
}
