//! Authentication extractors.

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, http::header, web};
use std::future::{Ready, ready};

use blogicum_core::policy::Viewer;
use blogicum_core::ports::{AuthError, TokenClaims};
use blogicum_shared::ErrorResponse;

use crate::config::DEFAULT_LOGIN_URL;
use crate::middleware::error::with_request_id;
use crate::state::AppState;

/// Authenticated user identity extractor.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
/// Anonymous requests are redirected to the login page.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub username: String,
}

impl Identity {
    pub fn viewer(&self) -> Viewer {
        Viewer::new(self.user_id, self.username.clone())
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// Authentication failure. Answers with a redirect to the login page that
/// carries the requested path in `next`.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct AuthenticationError {
    pub source: AuthError,
    pub login_redirect: String,
    pub path: String,
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        let error = match &self.source {
            AuthError::TokenExpired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your authentication token has expired. Please login again."),
            AuthError::InvalidToken(msg) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(msg.clone())
            }
            _ => ErrorResponse::new(401, "Authentication Required")
                .with_detail("Please provide a valid Bearer token in the Authorization header."),
        }
        .with_instance(self.path.clone());

        HttpResponse::Found()
            .insert_header((header::LOCATION, self.login_redirect.as_str()))
            .json(with_request_id(error))
    }
}

/// `LOGIN_URL?next=<requested path>`.
fn login_redirect(login_url: &str, req: &HttpRequest) -> String {
    let next = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.path());
    format!("{}?next={}", login_url, urlencoding::encode(next))
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AuthenticationError> {
    let state = req.app_data::<web::Data<AppState>>();
    let fail = |source: AuthError| {
        let login_url = state.map_or(DEFAULT_LOGIN_URL, |s| s.login_url.as_str());
        AuthenticationError {
            source,
            login_redirect: login_redirect(login_url, req),
            path: req.path().to_string(),
        }
    };

    let Some(state) = state else {
        tracing::error!("AppState not found in app data");
        return Err(fail(AuthError::InvalidToken(
            "Server configuration error".to_string(),
        )));
    };

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| fail(AuthError::MissingAuth))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| fail(AuthError::InvalidToken("Invalid authorization header".to_string())))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| fail(AuthError::InvalidToken("Expected Bearer token".to_string())))?;

    state
        .tokens
        .validate_token(token)
        .map(Identity::from)
        .map_err(fail)
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = authenticate(req);
        if let Err(e) = &result {
            tracing::debug!(path = %req.path(), error = %e.source, "Authentication required");
        }
        ready(result)
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn viewer(&self) -> Option<Viewer> {
        self.0.as_ref().map(Identity::viewer)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalIdentity(authenticate(req).ok())))
    }
}
