use std::env;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 5000;

/// Process configuration, read once at startup. Everything comes from the
/// environment; there is no config file layer.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub store_id: String,
    pub port: u16,
    pub debug: bool,
    pub frontend_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Settings {
    /// Missing credentials are not an error here. The engine validates them
    /// when it is constructed, and the server stays up in a degraded state
    /// so `/api/health` can report what is wrong.
    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
        let store_id = env::var("STORE_ID").unwrap_or_default();
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let debug = env::var("DEBUG")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let frontend_dir = env::var("FRONTEND_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("frontend"));
        let log_dir = env::var("LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("logs"));

        Settings {
            api_key,
            store_id,
            port,
            debug,
            frontend_dir,
            log_dir,
        }
    }
}
