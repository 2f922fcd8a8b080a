//! HTTP handlers and route configuration.

mod auth;
mod categories;
mod comments;
mod health;
mod posts;
mod profiles;

use actix_web::{HttpResponse, http::header, web};
use serde::{Deserialize, Serialize};

use blogicum_core::pagination::PageRequest;
use blogicum_shared::ApiResponse;

/// `?page=` on listing endpoints. Kept as text: anything unparsable means
/// the first page.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::parse(self.page.as_deref())
    }
}

/// `303 See Other` to `location`, with the affected resource in the body.
pub(crate) fn see_other<T: Serialize>(
    location: impl std::fmt::Display,
    message: &str,
    data: T,
) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.to_string()))
        .json(ApiResponse::ok_with_message(data, message))
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .route("/", web::get().to(posts::index))
        // Before `/posts/{id}/`, which would otherwise capture it.
        .route("/posts/create/", web::post().to(posts::create))
        .route("/posts/{id}/", web::get().to(posts::detail))
        .service(
            web::resource("/posts/{id}/edit/")
                .route(web::get().to(posts::edit_form))
                .route(web::post().to(posts::edit)),
        )
        .service(
            web::resource("/posts/{id}/delete/")
                .route(web::get().to(posts::delete_form))
                .route(web::post().to(posts::delete)),
        )
        .route("/posts/{id}/comment/", web::post().to(comments::add))
        .service(
            web::resource("/posts/{post_id}/edit_comment/{id}/")
                .route(web::get().to(comments::edit_form))
                .route(web::post().to(comments::edit)),
        )
        .service(
            web::resource("/posts/{post_id}/delete_comment/{id}/")
                .route(web::get().to(comments::delete_form))
                .route(web::post().to(comments::delete)),
        )
        .route("/category/{slug}/", web::get().to(categories::category_posts))
        .route("/profile/{username}/", web::get().to(profiles::profile))
        .service(
            web::resource("/profile/{username}/edit/")
                .route(web::get().to(profiles::edit_form))
                .route(web::post().to(profiles::edit)),
        )
        .service(
            web::scope("/auth")
                .route("/register/", web::post().to(auth::register))
                .route("/login/", web::post().to(auth::login)),
        );
}
