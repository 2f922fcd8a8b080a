//! User profiles.

use actix_web::{HttpResponse, web};

use blogicum_core::forms::ProfileForm;
use blogicum_core::policy::RedirectTarget;
use blogicum_shared::dto::{ProfilePageResponse, ProfileResponse};

use super::{PageQuery, see_other};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let viewer = identity.viewer();
    let listing = state
        .blog
        .profile(viewer.as_ref(), &path.into_inner(), query.request())
        .await?;
    Ok(HttpResponse::Ok().json(ProfilePageResponse::from(listing)))
}

/// GET /profile/{username}/edit/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user = state
        .blog
        .profile_for_edit(&identity.viewer(), &path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from_user(&user, true)))
}

/// POST /profile/{username}/edit/
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<ProfileForm>,
) -> AppResult<HttpResponse> {
    let user = state
        .blog
        .update_profile(&identity.viewer(), &path.into_inner(), body.into_inner())
        .await?;

    Ok(see_other(
        RedirectTarget::Profile(user.username.clone()),
        "Profile updated",
        ProfileResponse::from_user(&user, true),
    ))
}
