//! Server configuration from command-line flags and environment variables.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "infravision-server", version, about = "InfraVision complaint API server")]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "INFRAVISION_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Directory holding the bundled script fonts
    #[arg(long, env = "INFRAVISION_FONT_DIR", default_value = "assets/fonts")]
    pub font_dir: PathBuf,

    /// Gemini API key; generation routes fail without it
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.0-flash")]
    pub gemini_model: String,

    #[arg(
        long,
        env = "GEMINI_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com"
    )]
    pub gemini_base_url: String,

    /// Per-request timeout for Gemini calls, in seconds
    #[arg(long, env = "GEMINI_TIMEOUT_SECS", default_value_t = 60)]
    pub gemini_timeout_secs: u64,

    /// Allowed CORS origins (comma separated)
    #[arg(
        long = "cors-origin",
        env = "INFRAVISION_CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:5173"
    )]
    pub cors_origins: Vec<String>,

    /// Maximum JSON body size in bytes
    #[arg(long, env = "INFRAVISION_BODY_LIMIT", default_value_t = 10 * 1024 * 1024)]
    pub body_limit: usize,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn gemini_timeout(&self) -> Duration {
        Duration::from_secs(self.gemini_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let config = ServerConfig::parse_from([
            "infravision-server",
            "--port",
            "8080",
            "--cors-origin",
            "http://a.test,http://b.test",
            "--gemini-timeout-secs",
            "5",
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.gemini_timeout(), Duration::from_secs(5));
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }
}
