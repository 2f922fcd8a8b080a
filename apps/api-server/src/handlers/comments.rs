//! Comments on posts.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blogicum_core::forms::CommentForm;
use blogicum_core::policy::RedirectTarget;
use blogicum_shared::dto::{AuthorRef, CommentResponse};

use super::see_other;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn author(identity: &Identity) -> AuthorRef {
    AuthorRef {
        id: identity.user_id,
        username: identity.username.clone(),
    }
}

/// POST /posts/{id}/comment/
pub async fn add(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CommentForm>,
) -> AppResult<HttpResponse> {
    let comment = state
        .blog
        .add_comment(&identity.viewer(), path.into_inner(), body.into_inner())
        .await?;

    Ok(see_other(
        RedirectTarget::PostDetail(comment.post_id),
        "Comment added",
        CommentResponse::new(comment, author(&identity)),
    ))
}

/// GET /posts/{post_id}/edit_comment/{id}/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = state
        .blog
        .comment_for_edit(&identity.viewer(), post_id, comment_id)
        .await?;
    Ok(HttpResponse::Ok().json(CommentResponse::new(comment, author(&identity))))
}

/// POST /posts/{post_id}/edit_comment/{id}/
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<CommentForm>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = state
        .blog
        .update_comment(&identity.viewer(), post_id, comment_id, body.into_inner())
        .await?;

    Ok(see_other(
        RedirectTarget::PostDetail(post_id),
        "Comment updated",
        CommentResponse::new(comment, author(&identity)),
    ))
}

/// GET /posts/{post_id}/delete_comment/{id}/
pub async fn delete_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    edit_form(state, identity, path).await
}

/// POST /posts/{post_id}/delete_comment/{id}/
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = state
        .blog
        .delete_comment(&identity.viewer(), post_id, comment_id)
        .await?;

    Ok(see_other(
        RedirectTarget::PostDetail(post_id),
        "Comment deleted",
        CommentResponse::new(comment, author(&identity)),
    ))
}
