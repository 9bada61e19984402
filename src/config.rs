use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;

// 10 MB in bytes
const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub max_file_size: usize,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        let max_file_size = match std::env::var("MAX_FILE_SIZE") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid MAX_FILE_SIZE: {}", e))?,
            Err(_) => DEFAULT_MAX_FILE_SIZE,
        };

        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid PORT: {}", e))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Config {
            max_file_size,
            port,
        })
    }
}
