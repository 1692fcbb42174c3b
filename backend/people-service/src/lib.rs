//! People Service Library
//!
//! Publishes profiles of notable people organized by category, gender and
//! tags, with user registration, authoring, a REST API over the same data,
//! and queued email delivery.
//!
//! # Modules
//!
//! - `handlers`: HTTP request handlers
//! - `models`: Row types and domain enums
//! - `services`: Business logic (companion maintainer, person writes, mail)
//! - `db`: Database access layer and repositories
//! - `cache`: Read-through cache over the API surface
//! - `middleware`: JWT authentication
//! - `security`: Password hashing and token management
//! - `jobs`: Email queue and the daily greeting task
//! - `error`: Error types and handling
//! - `config`: Configuration management

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
