use actix_web::{dev, error::ErrorUnauthorized, web, FromRequest, HttpRequest};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::config::Config;
use crate::models::User;

/// Bearer tokens expire one hour after issuance; there is no refresh.
const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub role: String,
    pub exp: usize,
}

pub fn issue_token(secret: &str, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::seconds(TOKEN_TTL_SECS))
        .expect("clock overflow computing token expiry")
        .timestamp() as usize;

    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        role: user.role.clone(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// The verified identity attached to a protected request. Extraction runs
/// before the handler body, so a missing or invalid token short-circuits
/// with 401 and no handler side effect can occur first.
#[derive(Debug, Serialize, Clone)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub username: String,
    pub role: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let config = match req.app_data::<web::Data<Config>>() {
            Some(config) => config,
            None => {
                log::error!("Config is not registered in app data; rejecting protected request.");
                return ready(Err(ErrorUnauthorized("Unauthorized")));
            }
        };

        let token = req
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "));

        match token.map(|t| verify_token(&config.jwt_secret, t)) {
            Some(Ok(claims)) => ready(Ok(AuthenticatedUser {
                id: claims.sub,
                username: claims.username,
                role: claims.role,
            })),
            _ => ready(Err(ErrorUnauthorized("Unauthorized"))),
        }
    }
}
