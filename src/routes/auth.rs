use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::error::ApiError;
use crate::middleware::{issue_token, AuthenticatedUser};
use crate::models::db_operations::users_db_operations;
use crate::models::PublicUser;
use crate::DbPool;

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/login", web::post().to(login))
        .route("/auth/verify", web::get().to(verify));
}

async fn login(
    config: web::Data<Config>,
    pool: web::Data<DbPool>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let conn = pool.get()?;

    let user = users_db_operations::verify_credentials(&conn, &body.username, &body.password)
        .ok_or(ApiError::Unauthorized)?;

    let token = issue_token(&config.jwt_secret, &user)?;

    Ok(HttpResponse::Ok().json(json!({
        "token": token,
        "user": PublicUser::from(&user),
    })))
}

/// Token validity is established entirely by the extractor; reaching the
/// handler body means the bearer token checked out.
async fn verify(_user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(json!({ "valid": true }))
}
