use actix_web::web;

pub mod admin;
pub mod auth;
pub mod chat;
pub mod public;
pub mod upload;

/// Registers the whole `/api` surface. Protected handlers declare the
/// `AuthenticatedUser` extractor individually, so public and admin routes
/// can share the scope.
pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(public::config)
            .configure(auth::config)
            .configure(admin::config)
            .configure(upload::config)
            .configure(chat::config),
    );
}
