use std::env;

/// Which post store the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => Err(format!(
                "STORE_BACKEND must be 'mongo' or 'memory', got '{}'",
                other
            )),
        }
    }
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub mongodb_uri: String,
    pub mongodb_database: String,
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to local defaults
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(p) => p
                .trim()
                .parse()
                .map_err(|_| format!("PORT must be a valid port number, got '{}'", p))?,
            None => 8000,
        };

        let store_backend = match lookup("STORE_BACKEND") {
            Some(b) => StoreBackend::parse(&b)?,
            None => StoreBackend::Mongo,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "localhost".to_string()),
            port,
            store_backend,
            mongodb_uri: lookup("MONGODB_URI")
                .unwrap_or_else(|| "mongodb://localhost:27017".to_string()),
            mongodb_database: lookup("MONGODB_DATABASE")
                .unwrap_or_else(|| "rust_blogdb".to_string()),
        })
    }
}
