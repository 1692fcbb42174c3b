//! Business logic layer

pub mod companion;
pub mod email_service;
pub mod people;

pub use email_service::EmailService;
pub use people::PersonService;
