use actix_cors::Cors;
use actix_web::{
    middleware::{DefaultHeaders, Logger},
    web, App, HttpServer,
};
use clap::Parser;
use gatitu_backend::{
    chat::ChatClient,
    cloudinary::CloudinaryClient,
    config::Config,
    models::db_operations::users_db_operations,
    routes,
    setup::db_setup,
};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::fs;
use std::path::PathBuf;

const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Parser, Debug)]
#[command(name = "gatitu_server", author, version, about = "Starts the Gatitu blog server.")]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    fs::create_dir_all(&config.database_path)
        .expect("Failed to create database directory");

    let manager = SqliteConnectionManager::file(config.db_path());
    let pool = Pool::builder()
        .build(manager)
        .expect("FATAL: Failed to create SQLite connection pool.");

    // Failure to reach the store at boot is fatal.
    {
        let mut conn = pool
            .get()
            .expect("FATAL: Failed to open the blog database.");
        db_setup::setup_blog_db(&mut conn)
            .expect("FATAL: Failed to prepare the blog schema.");

        match users_db_operations::seed_admin_if_absent(
            &conn,
            DEFAULT_ADMIN_USERNAME,
            DEFAULT_ADMIN_PASSWORD,
        ) {
            Ok(true) => log::info!("Admin user created"),
            Ok(false) => {}
            Err(e) => panic!("FATAL: Failed to seed the admin user: {}", e),
        }
    }

    let chat_client = ChatClient::new(&config);
    let cloudinary_client = CloudinaryClient::new(&config);

    let server_address = format!("{}:{}", config.web.host, config.web.port);
    log::info!("Server starting at http://{}", server_address);

    HttpServer::new(move || {
        let cors = {
            let allowed_origins_str = &config.allowed_origins;
            if allowed_origins_str.trim() == "*" {
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600)
            } else {
                let mut cors = Cors::default();
                let origins: Vec<&str> = allowed_origins_str
                    .split(',')
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .collect();
                for origin in origins {
                    cors = cors.allowed_origin(origin);
                }
                cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600)
            }
        };

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY")),
            )
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(chat_client.clone()))
            .app_data(web::Data::new(cloudinary_client.clone()))
            .configure(routes::config_api)
            .service(
                actix_files::Files::new("/", &config.static_dir).index_file("index.html"),
            )
    })
    .bind(server_address)?
    .run()
    .await
}
