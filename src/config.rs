use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use config;

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    pub database_path: String,
    pub static_dir: String,
    pub allowed_origins: String,
    pub log_level: String,
    pub jwt_secret: String,
    pub cloudinary_api_base: String,
    pub cloudinary_cloud_name: String,
    pub cloudinary_upload_preset: String,
    pub chat_api_url: String,
    pub chat_api_key: String,
    pub chat_model: String,
    pub chat_stream_timeout_secs: u64,
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        dotenvy::from_path(env_path).map_err(|e| {
            config::ConfigError::Message(format!(
                "FATAL: Failed to load .env file from '{}'. Error: {}",
                env_path.display(),
                e
            ))
        })?;

        let database_path = env::var("DATABASE_PATH").map_err(|_| {
            config::ConfigError::Message(
                "FATAL: Environment variable 'DATABASE_PATH' is not set in your .env file."
                    .to_string(),
            )
        })?;

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| {
            config::ConfigError::Message(
                "FATAL: Environment variable 'JWT_SECRET' is not set in your .env file."
                    .to_string(),
            )
        })?;

        // Validate the secret length. It must be at least 32 characters.
        if jwt_secret.len() < 32 {
            return Err(config::ConfigError::Message(
                "FATAL: 'JWT_SECRET' must be at least 32 characters long.".to_string(),
            ));
        }

        if Path::new(&database_path).is_relative() {
            return Err(config::ConfigError::Message(format!(
                "FATAL: The 'DATABASE_PATH' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
                database_path
            )));
        }

        let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| "./dist".to_string());
        let allowed_origins = env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let cloudinary_api_base = env::var("CLOUDINARY_API_BASE")
            .unwrap_or_else(|_| "https://api.cloudinary.com".to_string());
        let cloudinary_cloud_name = env::var("CLOUDINARY_CLOUD_NAME").map_err(|_| {
            config::ConfigError::Message(
                "FATAL: Environment variable 'CLOUDINARY_CLOUD_NAME' is not set in your .env file."
                    .to_string(),
            )
        })?;
        let cloudinary_upload_preset = env::var("CLOUDINARY_UPLOAD_PRESET").map_err(|_| {
            config::ConfigError::Message(
                "FATAL: Environment variable 'CLOUDINARY_UPLOAD_PRESET' is not set in your .env file."
                    .to_string(),
            )
        })?;

        let chat_api_url = env::var("CHAT_API_URL")
            .unwrap_or_else(|_| "https://api.groq.com/openai/v1/chat/completions".to_string());
        let chat_api_key = env::var("CHAT_API_KEY").map_err(|_| {
            config::ConfigError::Message(
                "FATAL: Environment variable 'CHAT_API_KEY' is not set in your .env file."
                    .to_string(),
            )
        })?;
        let chat_model = env::var("CHAT_MODEL")
            .unwrap_or_else(|_| "meta-llama/llama-4-scout-17b-16e-instruct".to_string());
        let chat_stream_timeout_secs = env::var("CHAT_STREAM_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".to_string())
            .parse::<u64>()
            .unwrap_or(120);

        let builder = config::Config::builder()
            .add_source(config::File::new("config/default.toml", config::FileFormat::Toml))
            .set_override("database_path", database_path)?
            .set_override("static_dir", static_dir)?
            .set_override("allowed_origins", allowed_origins)?
            .set_override("log_level", log_level)?
            .set_override("jwt_secret", jwt_secret)?
            .set_override("cloudinary_api_base", cloudinary_api_base)?
            .set_override("cloudinary_cloud_name", cloudinary_cloud_name)?
            .set_override("cloudinary_upload_preset", cloudinary_upload_preset)?
            .set_override("chat_api_url", chat_api_url)?
            .set_override("chat_api_key", chat_api_key)?
            .set_override("chat_model", chat_model)?
            .set_override("chat_stream_timeout_secs", chat_stream_timeout_secs.to_string())?
            .build()?;

        builder.try_deserialize()
    }

    /// Returns the full path to the blog database file inside the data directory.
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.database_path).join("gatitu.db")
    }
}
