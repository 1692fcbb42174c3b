//! Static page handlers and the page-context builder
//!
//! Every page-like payload is assembled by `page_context`, an explicit
//! builder taking the title and extra key-values, composed by each handler.

use crate::db::contact_repo;
use crate::error::Result;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use validator::Validate;

#[derive(Debug, Clone, Serialize)]
pub struct MenuItem {
    pub title: &'static str,
    pub path: &'static str,
}

/// Site-wide navigation menu.
pub fn site_menu() -> Vec<MenuItem> {
    vec![
        MenuItem {
            title: "All",
            path: "/api/v1/persons",
        },
        MenuItem {
            title: "Men",
            path: "/api/v1/persons/men",
        },
        MenuItem {
            title: "Women",
            path: "/api/v1/persons/women",
        },
        MenuItem {
            title: "Feedback",
            path: "/api/v1/contact",
        },
        MenuItem {
            title: "About",
            path: "/api/v1/pages/about",
        },
    ]
}

/// Build a page payload: title, menu and any extra key-values.
pub fn page_context(title: &str, extra: Vec<(&str, Value)>) -> Value {
    let mut map = serde_json::Map::new();
    map.insert("title".to_string(), json!(title));
    map.insert("menu".to_string(), json!(site_menu()));
    map.insert("cat_selected".to_string(), Value::Null);
    for (key, value) in extra {
        map.insert(key.to_string(), value);
    }
    Value::Object(map)
}

pub async fn home() -> HttpResponse {
    HttpResponse::Ok().json(page_context("Home", vec![]))
}

pub async fn about() -> HttpResponse {
    HttpResponse::Ok().json(page_context("About us", vec![]))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(max = 12))]
    pub phone: Option<String>,

    #[validate(length(min = 1))]
    pub message: String,
}

/// Accept a contact submission: validate, log, persist.
pub async fn contact(
    pool: web::Data<PgPool>,
    req: web::Json<ContactRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    tracing::info!(
        full_name = %req.full_name,
        email = %req.email,
        "contact form submission received"
    );

    let message = contact_repo::insert(
        &pool,
        &req.full_name,
        &req.email,
        req.phone.as_deref(),
        &req.message,
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "id": message.id,
        "status": "accepted",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_entries() {
        let menu = site_menu();
        assert_eq!(menu.len(), 5);
        assert_eq!(menu[0].title, "All");
    }

    #[test]
    fn test_page_context_merges_extras() {
        let ctx = page_context("Home", vec![("posts", json!([1, 2, 3]))]);
        assert_eq!(ctx["title"], "Home");
        assert_eq!(ctx["cat_selected"], Value::Null);
        assert_eq!(ctx["posts"].as_array().map(|a| a.len()), Some(3));
        assert!(ctx["menu"].is_array());
    }

    #[test]
    fn test_extras_override_defaults() {
        let ctx = page_context("X", vec![("cat_selected", json!("abc"))]);
        assert_eq!(ctx["cat_selected"], "abc");
    }
}
