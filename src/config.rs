/// Service configuration
///
/// Every field can be overridden through the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | DATABASE_PATH | ./data.sled | sled database directory |
/// | HTTP_HOST | 0.0.0.0 | bind address |
/// | HTTP_PORT | 8080 | listen port |
/// | LOG_LEVEL | info | filter used when RUST_LOG is unset |
/// | LOG_JSON | false | emit JSON log lines |
/// | FLUSH_EVERY_WRITES | 0 | flush after this many mutations, 0 disables |
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub http_host: String,
    pub http_port: u16,
    pub log_level: String,
    pub log_json: bool,
    pub flush_every: u32,
}

impl Config {
    /// Read the configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_path: std::env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
            http_host: std::env::var("HTTP_HOST").unwrap_or(defaults.http_host),
            http_port: parse_env("HTTP_PORT").unwrap_or(defaults.http_port),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: parse_env("LOG_JSON").unwrap_or(defaults.log_json),
            flush_every: parse_env("FLUSH_EVERY_WRITES").unwrap_or(defaults.flush_every),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "./data.sled".into(),
            http_host: "0.0.0.0".into(),
            http_port: 8080,
            log_level: "info".into(),
            log_json: false,
            flush_every: 0,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
