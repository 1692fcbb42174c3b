//! Database access layer
//!
//! Repository functions over `sqlx::PgPool`. Each entity gets its own
//! module; writes that must compose with other row updates take a
//! transaction instead of the pool.

pub mod category_repo;
pub mod contact_repo;
pub mod password_reset_repo;
pub mod person_repo;
pub mod tag_repo;
pub mod user_repo;
