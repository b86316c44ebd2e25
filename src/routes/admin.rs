use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::error::ApiError;
use crate::helper::admin_helpers;
use crate::middleware::AuthenticatedUser;
use crate::models::PostInput;
use crate::DbPool;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/posts/admin/all", web::get().to(get_all_posts))
        .route("/posts", web::post().to(create_post))
        .route("/posts/{id}", web::put().to(update_post))
        .route("/posts/{id}", web::delete().to(delete_post));
}

async fn get_all_posts(
    _user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let posts = admin_helpers::fetch_all_posts(&pool)?;
    Ok(HttpResponse::Ok().json(posts))
}

async fn create_post(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    body: web::Json<PostInput>,
) -> Result<HttpResponse, ApiError> {
    let post = admin_helpers::create_post(&pool, &body)?;
    log::info!("Post '{}' created by {}", post.slug, user.username);
    Ok(HttpResponse::Created().json(post))
}

async fn update_post(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
    body: web::Json<PostInput>,
) -> Result<HttpResponse, ApiError> {
    let post = admin_helpers::update_post(&pool, id.into_inner(), &body)?;
    log::info!("Post '{}' updated by {}", post.slug, user.username);
    Ok(HttpResponse::Ok().json(post))
}

async fn delete_post(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    admin_helpers::delete_post(&pool, id)?;
    log::info!("Post {} deleted by {}", id, user.username);
    Ok(HttpResponse::Ok().json(json!({ "message": "Post deleted" })))
}
