//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible value containing
//! runtime configuration loaded from `.env` and environment variables. Every
//! field has a usable default so the pipeline can run in development without
//! any environment at all (the Gemini key defaults to empty, which makes the
//! narrative generator fall back to templated feedback).

use std::env;
use std::sync::OnceLock;

/// Maps the opaque subject identifiers found in exam records to display
/// names. Both the record normalizer and the chapter-index builder consult
/// this table; identifiers missing from it resolve to "Unknown".
///
/// Changing the set of recognized subjects is a configuration change, not a
/// pipeline change, which is why the table lives here.
pub const SUBJECT_IDS: [(&str, &str); 3] = [
    ("607018ee404ae53194e73d92", "Physics"),
    ("607018ee404ae53194e73d90", "Chemistry"),
    ("607018ee404ae53194e73d91", "Mathematics"),
];

/// Looks up the display name for an opaque subject identifier.
pub fn subject_name_for_id(id: &str) -> Option<&'static str> {
    SUBJECT_IDS
        .iter()
        .find(|(oid, _)| *oid == id)
        .map(|(_, name)| *name)
}

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub host: String,
    pub port: u16,
    pub gemini_api_key: String,
    pub gemini_model: String,
}

static CONFIG_INSTANCE: OnceLock<AppConfig> = OnceLock::new();

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "scorelens".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "true".into()) == "true",
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".into()),
        }
    }

    /// Returns a reference to the global configuration, loading it on first
    /// access.
    pub fn global() -> &'static AppConfig {
        CONFIG_INSTANCE.get_or_init(AppConfig::from_env)
    }
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn gemini_api_key() -> String {
    AppConfig::global().gemini_api_key.clone()
}

pub fn gemini_model() -> String {
    AppConfig::global().gemini_model.clone()
}
