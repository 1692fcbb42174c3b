//! Route configuration
//!
//! Centralized route setup. Public routes carry no middleware; handlers
//! that need a caller resolve it through the extractors. The admin scope
//! is wrapped in the JWT middleware so unauthenticated requests are
//! rejected before any handler runs.

use crate::handlers::{admin, api, auth, pages, people, users};
use crate::middleware::JwtAuthMiddleware;
use actix_web::web;

/// Configure all routes for the application
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            // Static pages and contact form
            .route("/pages/home", web::get().to(pages::home))
            .route("/pages/about", web::get().to(pages::about))
            .route("/contact", web::post().to(pages::contact))
            // Public person pages and the authenticated page flow
            .service(
                web::scope("/persons")
                    .route("", web::get().to(people::list_persons))
                    .route("", web::post().to(people::create_person_page))
                    .route("/men", web::get().to(people::list_men))
                    .route("/women", web::get().to(people::list_women))
                    .route("/category/{cat_slug}", web::get().to(people::list_by_category))
                    .route("/tag/{tag_slug}", web::get().to(people::list_by_tag))
                    .route("/{slug}", web::get().to(people::get_person))
                    .route("/{slug}/edit", web::put().to(people::update_person_page)),
            )
            // REST API surface
            .service(
                web::scope("/person")
                    .route("", web::get().to(api::list_persons))
                    .route("", web::post().to(api::create_person))
                    .route("/categories", web::get().to(api::list_categories))
                    .route("/categories", web::post().to(api::create_category))
                    .service(
                        web::resource("/{person_id}")
                            .route(web::get().to(api::retrieve_person))
                            .route(web::put().to(api::update_person))
                            .route(web::patch().to(api::partial_update_person)),
                    )
                    .service(
                        web::resource("/{person_id}/category")
                            .route(web::get().to(api::get_person_category))
                            .route(web::put().to(api::update_person_category)),
                    ),
            )
            .service(
                web::resource("/category-delete/{category_id}")
                    .route(web::get().to(api::retrieve_category))
                    .route(web::delete().to(api::destroy_category)),
            )
            .route(
                "/person-autocomplete",
                web::get().to(api::person_autocomplete),
            )
            // Accounts
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/logout", web::post().to(auth::logout))
                    .route("/change-password", web::post().to(auth::change_password))
                    .route(
                        "/password-reset/request",
                        web::post().to(auth::request_password_reset),
                    )
                    .route(
                        "/password-reset/confirm",
                        web::post().to(auth::confirm_password_reset),
                    ),
            )
            .service(
                web::resource("/users/me")
                    .route(web::get().to(users::get_profile))
                    .route(web::patch().to(users::update_profile)),
            )
            // Admin console
            .service(
                web::scope("/admin")
                    .wrap(JwtAuthMiddleware)
                    .service(
                        web::scope("/persons")
                            .route("", web::get().to(admin::list_persons))
                            .route("", web::post().to(admin::create_person))
                            .route("/publish", web::post().to(admin::publish_persons))
                            .route("/unpublish", web::post().to(admin::unpublish_persons))
                            .service(
                                web::resource("/{person_id}")
                                    .route(web::put().to(admin::update_person))
                                    .route(web::delete().to(admin::delete_person)),
                            ),
                    )
                    .service(
                        web::scope("/categories")
                            .route("", web::get().to(admin::list_categories))
                            .route("", web::post().to(admin::create_category))
                            .service(
                                web::resource("/{category_id}")
                                    .route(web::put().to(admin::update_category))
                                    .route(web::delete().to(admin::delete_category)),
                            ),
                    )
                    .service(
                        web::scope("/tags")
                            .route("", web::get().to(admin::list_tags))
                            .route("", web::post().to(admin::create_tag))
                            .service(
                                web::resource("/{tag_id}")
                                    .route(web::put().to(admin::update_tag))
                                    .route(web::delete().to(admin::delete_tag)),
                            ),
                    ),
            ),
    );
}
