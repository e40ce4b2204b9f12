use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "doctriage";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default log filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}

/// Process configuration, constructed once at startup and passed into each
/// component. Nothing in the pipeline reads the environment directly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Chat-completions endpoint of the generative collaborator.
    pub api_url: String,
    /// Bearer token for the generative collaborator. May be empty; the
    /// client refuses to send requests without one.
    pub api_key: String,
    /// Model identifier sent with every completion request.
    pub model: String,
    /// Per-request timeout for generative calls.
    pub request_timeout_secs: u64,
    /// SQLite database location.
    pub db_path: PathBuf,
}

impl AppConfig {
    /// Load configuration from the environment, falling back to the
    /// service defaults for anything unset.
    pub fn from_env() -> Self {
        let api_url = std::env::var("OPENROUTER_API_URL")
            .unwrap_or_else(|_| "https://openrouter.ai/api/v1/chat/completions".into());
        let api_key = std::env::var("OPENROUTER_API_KEY").unwrap_or_default();
        let model = std::env::var("DEFAULT_MODEL")
            .unwrap_or_else(|_| "mistralai/mistral-7b-instruct:free".into());
        let db_path = std::env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_db_path());

        Self {
            api_url,
            api_key,
            model,
            request_timeout_secs: 120,
            db_path,
        }
    }
}

/// Get the application data directory: ~/.doctriage/
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(".doctriage")
}

/// Default database location under the app data directory.
pub fn default_db_path() -> PathBuf {
    app_data_dir().join("triage.db")
}
