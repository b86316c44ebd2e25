use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Unified error type for the REST surface. Variants map one-to-one onto the
/// HTTP statuses the handlers return; everything store- or transport-shaped
/// collapses to a 500 with a generic message.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid credentials")]
    Unauthorized,

    #[error("Slug already exists")]
    DuplicateSlug,

    #[error("{0}")]
    Validation(String),

    #[error("Not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::DuplicateSlug | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Database(_)
            | ApiError::Pool(_)
            | ApiError::Upstream(_)
            | ApiError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            // Internal detail stays in the log, not in the response body.
            ApiError::Database(e) => {
                log::error!("Database error: {}", e);
                "Server error".to_string()
            }
            ApiError::Pool(e) => {
                log::error!("Connection pool error: {}", e);
                "Server error".to_string()
            }
            ApiError::Upstream(e) => {
                log::error!("Upstream request failed: {}", e);
                "Server error".to_string()
            }
            ApiError::Token(e) => {
                log::error!("Token error: {}", e);
                "Server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}

/// Maps a rusqlite error to the domain error it represents, using the
/// driver's structured result codes rather than matching on message text.
/// A UNIQUE violation on an insert/update of a post means the slug is taken.
pub fn classify_sqlite_error(e: rusqlite::Error) -> ApiError {
    if let rusqlite::Error::SqliteFailure(inner, _) = &e {
        if inner.code == rusqlite::ErrorCode::ConstraintViolation {
            return ApiError::DuplicateSlug;
        }
    }
    ApiError::Database(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_violation_becomes_duplicate_slug() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (slug TEXT UNIQUE)", []).unwrap();
        conn.execute("INSERT INTO t (slug) VALUES ('a')", []).unwrap();
        let err = conn
            .execute("INSERT INTO t (slug) VALUES ('a')", [])
            .unwrap_err();
        assert!(matches!(classify_sqlite_error(err), ApiError::DuplicateSlug));
    }

    #[test]
    fn other_sqlite_errors_stay_database_errors() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = conn.execute("SELECT * FROM missing", []).unwrap_err();
        assert!(matches!(classify_sqlite_error(err), ApiError::Database(_)));
    }

    #[test]
    fn statuses_follow_the_error_taxonomy() {
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::DuplicateSlug.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Upstream("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
