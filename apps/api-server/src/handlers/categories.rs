//! Category pages.

use actix_web::{HttpResponse, web};

use blogicum_shared::dto::CategoryPageResponse;

use super::PageQuery;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /category/{slug}/
pub async fn category_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let listing = state
        .blog
        .category_posts(&path.into_inner(), query.request())
        .await?;
    Ok(HttpResponse::Ok().json(CategoryPageResponse::from(listing)))
}
