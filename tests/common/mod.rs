//! Shared scaffolding for the integration suites: a scratch database with
//! the seeded admin account and a config pointing at it.

use gatitu_backend::config::{Config, WebConfig};
use gatitu_backend::models::db_operations::users_db_operations;
use gatitu_backend::setup::db_setup;
use gatitu_backend::DbPool;
use r2d2_sqlite::SqliteConnectionManager;
use tempfile::TempDir;

pub fn test_config(temp_dir: &TempDir) -> Config {
    Config {
        web: WebConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database_path: temp_dir.path().display().to_string(),
        static_dir: temp_dir.path().display().to_string(),
        allowed_origins: "*".to_string(),
        log_level: "warn".to_string(),
        jwt_secret: "test-secret-test-secret-test-secret!".to_string(),
        cloudinary_api_base: "http://127.0.0.1:9".to_string(),
        cloudinary_cloud_name: "demo".to_string(),
        cloudinary_upload_preset: "unsigned".to_string(),
        chat_api_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
        chat_api_key: "test-key".to_string(),
        chat_model: "meta-llama/llama-4-scout-17b-16e-instruct".to_string(),
        chat_stream_timeout_secs: 30,
    }
}

pub fn setup_pool(temp_dir: &TempDir) -> DbPool {
    let manager = SqliteConnectionManager::file(temp_dir.path().join("gatitu.db"));
    let pool = r2d2::Pool::builder()
        .max_size(2)
        .build(manager)
        .expect("Failed to create test pool");

    let mut conn = pool.get().expect("Failed to get test connection");
    db_setup::setup_blog_db(&mut conn).expect("Failed to set up test schema");
    users_db_operations::seed_admin_if_absent(&conn, "admin", "admin123")
        .expect("Failed to seed test admin");

    pool
}
