//! Authentication handlers: registration, login, password management
//!
//! Registration and password-reset mail goes through the background email
//! queue; the request path never waits on SMTP.

use crate::config::SmtpConfig;
use crate::db::{password_reset_repo, user_repo};
use crate::error::{AppError, Result};
use crate::jobs::{EmailJob, EmailQueue};
use crate::middleware::AuthUser;
use crate::models::validate_personal_name;
use crate::security::{hash_password, jwt, verify_password};
use actix_web::{web, HttpResponse};
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const RESET_TOKEN_EXPIRY_HOURS: i64 = 1;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 150))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8))]
    pub password: String,

    #[validate(custom(function = "validate_personal_name"), length(max = 50))]
    pub first_name: String,

    #[validate(custom(function = "validate_personal_name"), length(max = 150))]
    pub last_name: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn register(
    pool: web::Data<PgPool>,
    queue: web::Data<EmailQueue>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    // Duplicate email is an inline field error, like the original form.
    if user_repo::email_exists(&pool, &payload.email).await? {
        return Err(AppError::Validation(
            "email: a user with this email already exists".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = user_repo::create_user(
        &pool,
        &payload.username,
        &payload.email,
        &password_hash,
        &payload.first_name,
        &payload.last_name,
    )
    .await?;

    queue.enqueue(EmailJob::Registration {
        email: user.email.clone(),
        username: user.username.clone(),
    });

    let tokens = jwt::generate_token_pair(user.id, &user.username, &user.email, user.is_admin)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        user_id: user.id,
        username: user.username,
        email: user.email,
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

pub async fn login(
    pool: web::Data<PgPool>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let user = user_repo::find_by_username(&pool, &payload.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid credentials".to_string()))?;

    if !user.is_active {
        return Err(AppError::Unauthorized("account is disabled".to_string()));
    }

    verify_password(&payload.password, &user.password_hash)?;

    let tokens = jwt::generate_token_pair(user.id, &user.username, &user.email, user.is_admin)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        user_id: user.id,
        username: user.username,
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
    }))
}

/// Stateless logout; the client discards its tokens.
pub async fn logout(_user: AuthUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Logged out successfully"
    })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub old_password: String,

    #[validate(length(min = 8))]
    pub new_password: String,
}

pub async fn change_password(
    pool: web::Data<PgPool>,
    user: AuthUser,
    payload: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let db_user = user_repo::find_by_id(&pool, user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("unknown user".to_string()))?;

    verify_password(&payload.old_password, &db_user.password_hash)
        .map_err(|_| AppError::Validation("old_password: password is incorrect".to_string()))?;

    let new_hash = hash_password(&payload.new_password)?;
    user_repo::update_password(&pool, user.id, &new_hash).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(email)]
    pub email: String,
}

fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Request a reset link. Responds 202 whether or not the address is known,
/// so addresses cannot be probed.
pub async fn request_password_reset(
    pool: web::Data<PgPool>,
    queue: web::Data<EmailQueue>,
    smtp: web::Data<SmtpConfig>,
    payload: web::Json<PasswordResetRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    if let Some(user) = user_repo::find_by_email(&pool, &payload.email).await? {
        let mut token_bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut token_bytes);
        let token = hex::encode(token_bytes);

        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_EXPIRY_HOURS);
        password_reset_repo::create(&pool, user.id, &hash_reset_token(&token), expires_at)
            .await?;

        let reset_url = format!("{}/auth/reset-password?token={}", smtp.frontend_url, token);
        let subject = "Password reset".to_string();
        let message = format!(
            "Hi {},\n\n\
             We received a request to reset your password. Follow this link \
             to choose a new one:\n\n{}\n\n\
             The link expires in {} hour(s). If you did not request a reset, \
             ignore this message.",
            user.username, reset_url, RESET_TOKEN_EXPIRY_HOURS
        );

        queue.enqueue(EmailJob::PasswordReset {
            email: user.email,
            subject,
            message,
        });
    }

    Ok(HttpResponse::Accepted().finish())
}

#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetConfirmRequest {
    #[validate(length(min = 1))]
    pub token: String,

    #[validate(length(min = 8))]
    pub new_password: String,
}

pub async fn confirm_password_reset(
    pool: web::Data<PgPool>,
    payload: web::Json<PasswordResetConfirmRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let reset = password_reset_repo::find_valid_by_hash(&pool, &hash_reset_token(&payload.token))
        .await?
        .ok_or_else(|| AppError::BadRequest("invalid or expired reset token".to_string()))?;

    let new_hash = hash_password(&payload.new_password)?;
    user_repo::update_password(&pool, reset.user_id, &new_hash).await?;
    password_reset_repo::mark_used(&pool, reset.id).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_token_hash_is_stable_hex() {
        let h1 = hash_reset_token("abc");
        let h2 = hash_reset_token("abc");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert_ne!(h1, hash_reset_token("abd"));
    }

    #[test]
    fn test_register_request_validation() {
        let req = RegisterRequest {
            username: "anna".to_string(),
            email: "anna@example.com".to_string(),
            password: "SecurePass123".to_string(),
            first_name: "Anna".to_string(),
            last_name: "Karenina".to_string(),
        };
        assert!(req.validate().is_ok());

        let bad = RegisterRequest {
            first_name: "Anna99".to_string(),
            ..req
        };
        assert!(bad.validate().is_err());
    }
}
