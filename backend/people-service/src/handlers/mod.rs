//! HTTP request handlers

pub mod admin;
pub mod api;
pub mod auth;
pub mod pages;
pub mod people;
pub mod users;
