//! # Blogicum API Server
//!
//! Actix-web application: routes, extractors, error mapping and wiring.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod state;
pub mod telemetry;

use actix_web::web;

use middleware::error::{json_config, path_config};
use state::AppState;

/// Register state, extractor configuration and every route.
pub fn configure_app(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(state))
            .app_data(json_config())
            .app_data(path_config())
            .configure(handlers::configure_routes);
    }
}
