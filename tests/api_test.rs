//! Integration tests for the REST surface: auth, content CRUD, health.

use actix_web::{http::StatusCode, test, web, App};
use gatitu_backend::chat::ChatClient;
use gatitu_backend::cloudinary::CloudinaryClient;
use gatitu_backend::routes;
use serde_json::{json, Value};
use tempfile::TempDir;

mod common;

macro_rules! init_app {
    ($config:expr, $pool:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($config.clone()))
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(ChatClient::new(&$config)))
                .app_data(web::Data::new(CloudinaryClient::new(&$config)))
                .configure(routes::config_api),
        )
        .await
    };
}

macro_rules! login {
    ($app:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"username": "admin", "password": "admin123"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        body["token"]
            .as_str()
            .expect("login should return a token")
            .to_string()
    }};
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

#[actix_web::test]
async fn health_reports_connected_database() {
    let temp = TempDir::new().unwrap();
    let config = common::test_config(&temp);
    let pool = common::setup_pool(&temp);
    let app = init_app!(config, pool);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[actix_web::test]
async fn login_returns_token_and_public_user() {
    let temp = TempDir::new().unwrap();
    let config = common::test_config(&temp);
    let pool = common::setup_pool(&temp);
    let app = init_app!(config, pool);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"username": "admin", "password": "admin123"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["username"], "admin");
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"].get("password_hash").is_none());
}

#[actix_web::test]
async fn login_with_bad_credentials_is_rejected() {
    let temp = TempDir::new().unwrap();
    let config = common::test_config(&temp);
    let pool = common::setup_pool(&temp);
    let app = init_app!(config, pool);

    for payload in [
        json!({"username": "admin", "password": "wrong"}),
        json!({"username": "nobody", "password": "admin123"}),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}

#[actix_web::test]
async fn verify_accepts_valid_token_and_rejects_the_rest() {
    let temp = TempDir::new().unwrap();
    let config = common::test_config(&temp);
    let pool = common::setup_pool(&temp);
    let app = init_app!(config, pool);
    let token = login!(app);

    let req = test::TestRequest::get()
        .uri("/api/auth/verify")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["valid"], true);

    let req = test::TestRequest::get().uri("/api/auth/verify").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/auth/verify")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn create_then_fetch_by_slug_counts_views() {
    let temp = TempDir::new().unwrap();
    let config = common::test_config(&temp);
    let pool = common::setup_pool(&temp);
    let app = init_app!(config, pool);
    let token = login!(app);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(&token))
        .set_json(json!({
            "title": "Hello World",
            "content": "The first post.",
            "category": "Backend",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["slug"], "hello-world");
    assert_eq!(created["views"], 0);

    let req = test::TestRequest::get()
        .uri("/api/posts/hello-world")
        .to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["title"], "Hello World");
    assert_eq!(fetched["views"], 1);

    // Each fetch bumps the counter by exactly one.
    let req = test::TestRequest::get()
        .uri("/api/posts/hello-world")
        .to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["views"], 2);
}

#[actix_web::test]
async fn fetching_unknown_slug_is_not_found() {
    let temp = TempDir::new().unwrap();
    let config = common::test_config(&temp);
    let pool = common::setup_pool(&temp);
    let app = init_app!(config, pool);

    let req = test::TestRequest::get().uri("/api/posts/missing").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn unpublished_posts_never_appear_in_listings() {
    let temp = TempDir::new().unwrap();
    let config = common::test_config(&temp);
    let pool = common::setup_pool(&temp);
    let app = init_app!(config, pool);
    let token = login!(app);

    for (title, published) in [("Visible", true), ("Draft", false)] {
        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(&token))
            .set_json(json!({
                "title": title,
                "content": "text",
                "category": "Backend",
                "tags": "rust,web",
                "published": published,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    for uri in [
        "/api/posts",
        "/api/posts?category=Backend",
        "/api/posts?tag=rust",
        "/api/posts?category=Backend&tag=web",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let posts: Value = test::call_and_read_body_json(&app, req).await;
        let posts = posts.as_array().unwrap();
        assert_eq!(posts.len(), 1, "unexpected listing for {}", uri);
        assert_eq!(posts[0]["slug"], "visible");
    }

    // The admin listing sees drafts too.
    let req = test::TestRequest::get()
        .uri("/api/posts/admin/all")
        .insert_header(bearer(&token))
        .to_request();
    let posts: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(posts.as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn list_filters_select_matching_posts() {
    let temp = TempDir::new().unwrap();
    let config = common::test_config(&temp);
    let pool = common::setup_pool(&temp);
    let app = init_app!(config, pool);
    let token = login!(app);

    let posts = [
        ("Rust Tricks", "Backend", "rust,tips"),
        ("CSS Grids", "Frontend", "css,layout"),
    ];
    for (title, category, tags) in posts {
        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(&token))
            .set_json(json!({
                "title": title,
                "content": "text",
                "category": category,
                "tags": tags,
                "published": true,
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri("/api/posts?category=Frontend")
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["slug"], "css-grids");

    let req = test::TestRequest::get().uri("/api/posts?tag=rust").to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["slug"], "rust-tricks");

    let req = test::TestRequest::get().uri("/api/categories").to_request();
    let categories: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(categories, json!(["Backend", "Frontend"]));
}

#[actix_web::test]
async fn duplicate_slug_is_a_client_error() {
    let temp = TempDir::new().unwrap();
    let config = common::test_config(&temp);
    let pool = common::setup_pool(&temp);
    let app = init_app!(config, pool);
    let token = login!(app);

    // Two titles that normalize to the same slug.
    for (title, expected) in [("Hello World", StatusCode::CREATED), ("Hello, World!", StatusCode::BAD_REQUEST)] {
        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(&token))
            .set_json(json!({
                "title": title,
                "content": "text",
                "category": "Backend",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected, "title {:?}", title);
    }
}

#[actix_web::test]
async fn write_endpoints_reject_missing_token_without_side_effects() {
    let temp = TempDir::new().unwrap();
    let config = common::test_config(&temp);
    let pool = common::setup_pool(&temp);
    let app = init_app!(config, pool);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .set_json(json!({
            "title": "Sneaky",
            "content": "text",
            "category": "Backend",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/posts/admin/all")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::delete().uri("/api/posts/1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // The rejected create left nothing behind.
    let token = login!(app);
    let req = test::TestRequest::get()
        .uri("/api/posts/admin/all")
        .insert_header(bearer(&token))
        .to_request();
    let posts: Value = test::call_and_read_body_json(&app, req).await;
    assert!(posts.as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn update_replaces_every_field() {
    let temp = TempDir::new().unwrap();
    let config = common::test_config(&temp);
    let pool = common::setup_pool(&temp);
    let app = init_app!(config, pool);
    let token = login!(app);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(&token))
        .set_json(json!({
            "title": "Old Title",
            "content": "old",
            "category": "Backend",
            "published": false,
        }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/posts/{}", id))
        .insert_header(bearer(&token))
        .set_json(json!({
            "title": "New Title",
            "content": "new body",
            "excerpt": "short",
            "category": "Frontend",
            "tags": "a,b",
            "published": true,
        }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["title"], "New Title");
    assert_eq!(updated["slug"], "new-title");
    assert_eq!(updated["category"], "Frontend");
    assert_eq!(updated["published"], true);

    // Unknown ids are a 404, not a silent no-op.
    let req = test::TestRequest::put()
        .uri("/api/posts/9999")
        .insert_header(bearer(&token))
        .set_json(json!({
            "title": "Ghost",
            "content": "x",
            "category": "Backend",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn delete_is_a_hard_delete() {
    let temp = TempDir::new().unwrap();
    let config = common::test_config(&temp);
    let pool = common::setup_pool(&temp);
    let app = init_app!(config, pool);
    let token = login!(app);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(&token))
        .set_json(json!({
            "title": "Doomed",
            "content": "x",
            "category": "Backend",
        }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{}", id))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/posts/doomed").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{}", id))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn validation_errors_are_client_errors() {
    let temp = TempDir::new().unwrap();
    let config = common::test_config(&temp);
    let pool = common::setup_pool(&temp);
    let app = init_app!(config, pool);
    let token = login!(app);

    for payload in [
        json!({"title": "", "content": "x", "category": "Backend"}),
        json!({"title": "Ok", "content": "", "category": "Backend"}),
        json!({"title": "Ok", "content": "x", "category": ""}),
        json!({"title": "???", "content": "x", "category": "Backend"}),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(&token))
            .set_json(payload.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {}", payload);
    }
}
