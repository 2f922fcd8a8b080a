//! Index, post detail and the author's post management.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blogicum_core::forms::PostForm;
use blogicum_core::policy::RedirectTarget;
use blogicum_shared::dto::{PageResponse, PostDetailResponse, PostRecord, PostResponse};

use super::{PageQuery, see_other};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state.blog.index(query.request()).await?;
    Ok(HttpResponse::Ok().json(PageResponse::<PostResponse>::from(page)))
}

/// GET /posts/{id}/
pub async fn detail(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let viewer = identity.viewer();
    let detail = state
        .blog
        .post_detail(viewer.as_ref(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(PostDetailResponse::from(detail)))
}

/// POST /posts/create/
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    let post = state
        .blog
        .create_post(&identity.viewer(), body.into_inner())
        .await?;

    Ok(see_other(
        RedirectTarget::Profile(identity.username),
        "Post created",
        PostRecord::from(post),
    ))
}

/// GET /posts/{id}/edit/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .blog
        .post_for_edit(&identity.viewer(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(PostRecord::from(post)))
}

/// POST /posts/{id}/edit/
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    let post = state
        .blog
        .update_post(&identity.viewer(), path.into_inner(), body.into_inner())
        .await?;

    Ok(see_other(
        RedirectTarget::PostDetail(post.id),
        "Post updated",
        PostRecord::from(post),
    ))
}

/// GET /posts/{id}/delete/
pub async fn delete_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    edit_form(state, identity, path).await
}

/// POST /posts/{id}/delete/
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .blog
        .delete_post(&identity.viewer(), path.into_inner())
        .await?;

    Ok(see_other(
        RedirectTarget::Index,
        "Post deleted",
        PostRecord::from(post),
    ))
}
