//! HTTP-level behaviour of the blog over the in-memory store.

use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Value, json};

use api_server::config::AppConfig;
use api_server::configure_app;
use api_server::observability::RequestIdMiddleware;
use api_server::state::AppState;
use blogicum_core::domain::{Category, Post, PostFields, User};
use blogicum_core::services::Repositories;
use blogicum_infra::{Argon2PasswordService, FixedClock, InMemoryStore};

macro_rules! app {
    ($env:expr) => {
        test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .configure(configure_app($env.state.clone())),
        )
        .await
    };
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

struct TestEnv {
    repos: Repositories,
    state: AppState,
}

impl TestEnv {
    fn new() -> Self {
        let store = InMemoryStore::new();
        let mut state =
            AppState::in_memory(&store, Arc::new(FixedClock(now())), &AppConfig::default());
        // Minimum Argon2 costs keep sign-up tests fast.
        state.passwords = Arc::new(Argon2PasswordService::with_params(8, 1, 1).unwrap());
        Self {
            repos: store.repositories(),
            state,
        }
    }

    /// A stored user and a bearer header for them.
    async fn user(&self, username: &str) -> (User, (header::HeaderName, String)) {
        let user = self
            .repos
            .users
            .save(User::new(
                username.into(),
                format!("{username}@example.com"),
                "unused".into(),
            ))
            .await
            .unwrap();
        let token = self.state.tokens.generate_token(user.id, &user.username).unwrap();
        (user, (header::AUTHORIZATION, format!("Bearer {token}")))
    }

    async fn post(&self, author: &User, fields: PostFields) -> Post {
        self.repos
            .posts
            .save(Post::new(author.id, fields))
            .await
            .unwrap()
    }
}

fn fields(title: &str) -> PostFields {
    PostFields {
        title: title.into(),
        text: "Body".into(),
        pub_date: now() - Duration::hours(1),
        is_published: true,
        category_id: None,
        location_id: None,
        image: None,
    }
}

fn location(resp: &actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[actix_web::test]
async fn test_health() {
    let env = TestEnv::new();
    let app = app!(env);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_register_then_login() {
    let env = TestEnv::new();
    let app = app!(env);
    let credentials = json!({
        "username": "leo",
        "email": "leo@example.com",
        "password": "war-and-peace"
    });

    let req = test::TestRequest::post()
        .uri("/auth/register/")
        .set_json(&credentials)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["username"], "leo");

    let req = test::TestRequest::post()
        .uri("/auth/register/")
        .set_json(&credentials)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_json(json!({"username": "leo", "password": "wrong-password"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_json(json!({"username": "leo", "password": "war-and-peace"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let token = body["access_token"].as_str().unwrap();
    assert!(env.state.tokens.validate_token(token).is_ok());
}

#[actix_web::test]
async fn test_register_validation() {
    let env = TestEnv::new();
    let app = app!(env);

    let req = test::TestRequest::post()
        .uri("/auth/register/")
        .set_json(json!({"username": "bad name", "password": "short"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn test_register_rejects_non_ascii_username() {
    let env = TestEnv::new();
    let app = app!(env);

    let req = test::TestRequest::post()
        .uri("/auth/register/")
        .set_json(json!({"username": "жора", "password": "long-enough"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(
        body["errors"][0]
            .as_str()
            .unwrap()
            .starts_with("username:")
    );
}

#[actix_web::test]
async fn test_anonymous_mutation_redirects_to_login() {
    let env = TestEnv::new();
    let app = app!(env);

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .set_json(json!({"title": "Hi", "text": "There", "pub_date": "2024-01-01T00:00:00Z"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=%2Fposts%2Fcreate%2F");
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 401);
}

#[actix_web::test]
async fn test_create_post_and_see_it_listed() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, auth) = env.user("leo").await;

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header(auth)
        .set_json(json!({
            "title": "  First  ",
            "text": "Hello world",
            "pub_date": "2024-05-01T10:00:00Z"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/profile/leo/");
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["title"], "First");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total_items"], 1);
    assert_eq!(body["items"][0]["author"]["username"], "leo");
    assert_eq!(body["items"][0]["comment_count"], 0);
}

#[actix_web::test]
async fn test_scheduled_post_visible_only_to_author() {
    let env = TestEnv::new();
    let app = app!(env);
    let (author, author_auth) = env.user("leo").await;
    let (_, reader_auth) = env.user("anna").await;
    let post = env
        .post(
            &author,
            PostFields {
                pub_date: now() + Duration::hours(1),
                ..fields("Tomorrow")
            },
        )
        .await;
    let uri = format!("/posts/{}/", post.id);

    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(reader_auth)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(author_auth)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["post"]["title"], "Tomorrow");
    assert_eq!(body["post"]["text"], "Body");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total_items"], 0);
}

#[actix_web::test]
async fn test_foreign_post_edit_redirects_without_change() {
    let env = TestEnv::new();
    let app = app!(env);
    let (author, _) = env.user("leo").await;
    let (_, reader_auth) = env.user("anna").await;
    let post = env.post(&author, fields("Original")).await;

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header(reader_auth.clone())
        .set_json(json!({"title": "Hijacked", "text": "x", "pub_date": "2024-01-01T00:00:00Z"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete/", post.id))
        .insert_header(reader_auth)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FOUND);

    let stored = env.repos.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Original");
}

#[actix_web::test]
async fn test_comment_lifecycle_and_ownership() {
    let env = TestEnv::new();
    let app = app!(env);
    let (author, author_auth) = env.user("leo").await;
    let (_, reader_auth) = env.user("anna").await;
    let post = env.post(&author, fields("Open for comments")).await;

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .insert_header(reader_auth.clone())
        .set_json(json!({"text": "Great read"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    let body: Value = test::read_body_json(resp).await;
    let comment_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["author"]["username"], "anna");

    let edit_uri = format!("/posts/{}/edit_comment/{}/", post.id, comment_id);
    let req = test::TestRequest::post()
        .uri(&edit_uri)
        .insert_header(author_auth.clone())
        .set_json(json!({"text": "Rewritten by someone else"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", post.id))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["comments"][0]["text"], "Great read");
    assert_eq!(body["post"]["comment_count"], 1);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete_comment/{}/", post.id, comment_id))
        .insert_header(reader_auth)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(env.repos.comments.list_for_post(post.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_invalid_comment_is_rejected() {
    let env = TestEnv::new();
    let app = app!(env);
    let (author, auth) = env.user("leo").await;
    let post = env.post(&author, fields("Post")).await;

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .insert_header(auth.clone())
        .insert_header(("X-Request-ID", "req-42"))
        .set_json(json!({"text": "   "}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "req-42");
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["request_id"], "req-42");
    assert!(body["errors"][0].as_str().unwrap().starts_with("text:"));

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .insert_header(auth)
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    assert!(env.repos.comments.list_for_post(post.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_category_page() {
    let env = TestEnv::new();
    let app = app!(env);
    let (author, _) = env.user("leo").await;
    let travel = env
        .repos
        .categories
        .save(Category::new("Travel".into(), "Trips".into(), "travel".into()))
        .await
        .unwrap();
    env.repos
        .categories
        .save(Category::new("Hidden".into(), String::new(), "hidden".into()).unpublished())
        .await
        .unwrap();
    env.post(
        &author,
        PostFields {
            category_id: Some(travel.id),
            ..fields("Abroad")
        },
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/category/travel/").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["category"]["title"], "Travel");
    assert_eq!(body["posts"]["items"][0]["category"]["slug"], "travel");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/category/hidden/").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_profile_listing_and_pagination() {
    let env = TestEnv::new();
    let app = app!(env);
    let (author, auth) = env.user("leo").await;
    for i in 0..12 {
        env.post(
            &author,
            PostFields {
                pub_date: now() - Duration::minutes(i),
                ..fields(&format!("Post {i}"))
            },
        )
        .await;
    }
    env.post(
        &author,
        PostFields {
            is_published: false,
            ..fields("Draft")
        },
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/profile/leo/?page=2")
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["is_owner"], false);
    assert!(body["profile"].get("email").is_none());
    assert_eq!(body["posts"]["total_items"], 12);
    assert_eq!(body["posts"]["page"], 2);
    assert_eq!(body["posts"]["items"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get()
        .uri("/profile/leo/?page=abc")
        .insert_header(auth)
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["is_owner"], true);
    assert_eq!(body["profile"]["email"], "leo@example.com");
    assert_eq!(body["posts"]["total_items"], 13);
    assert_eq!(body["posts"]["page"], 1);

    let req = test::TestRequest::get().uri("/?page=99").to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["page"], 2);
    assert_eq!(body["has_next"], false);
}

#[actix_web::test]
async fn test_profile_edit_is_owner_only() {
    let env = TestEnv::new();
    let app = app!(env);
    env.user("leo").await;
    let (_, reader_auth) = env.user("anna").await;

    let req = test::TestRequest::post()
        .uri("/profile/leo/edit/")
        .insert_header(reader_auth.clone())
        .set_json(json!({"first_name": "Not", "last_name": "Leo"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/leo/");

    let req = test::TestRequest::post()
        .uri("/profile/anna/edit/")
        .insert_header(reader_auth)
        .set_json(json!({"first_name": "Anna", "last_name": "Karenina", "email": ""}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/profile/anna/");
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["full_name"], "Anna Karenina");
}

#[actix_web::test]
async fn test_malformed_id_is_not_found() {
    let env = TestEnv::new();
    let app = app!(env);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/posts/not-a-uuid/").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
