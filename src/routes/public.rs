use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::helper::public_helpers;
use crate::DbPool;

#[derive(Deserialize)]
pub struct PostFilterQuery {
    category: Option<String>,
    tag: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/posts", web::get().to(get_posts))
        .route("/posts/{slug}", web::get().to(get_post_by_slug))
        .route("/categories", web::get().to(get_categories));
}

async fn health(pool: web::Data<DbPool>) -> impl Responder {
    match public_helpers::check_database(&pool) {
        Ok(()) => HttpResponse::Ok().json(json!({
            "status": "ok",
            "database": "connected",
        })),
        Err(e) => {
            log::error!("Health check failed: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "database": "disconnected",
            }))
        }
    }
}

async fn get_posts(
    pool: web::Data<DbPool>,
    query: web::Query<PostFilterQuery>,
) -> Result<HttpResponse, ApiError> {
    let posts = public_helpers::fetch_published_posts(
        &pool,
        query.category.as_deref(),
        query.tag.as_deref(),
    )?;
    Ok(HttpResponse::Ok().json(posts))
}

async fn get_post_by_slug(
    pool: web::Data<DbPool>,
    slug: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let post = public_helpers::fetch_post_by_slug(&pool, &slug)?;
    Ok(HttpResponse::Ok().json(post))
}

async fn get_categories(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let categories = public_helpers::fetch_categories(&pool)?;
    Ok(HttpResponse::Ok().json(categories))
}
