// Application configuration, loaded from environment variables.

/// Process-wide configuration, immutable after startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to bind the HTTP server to.
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// - `PORT` - HTTP server port (default: 8080)
    pub fn load() -> Self {
        let port = std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080);
        Config { port }
    }
}
