//! Environment-sourced settings

use std::env;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_ENGINE_DEPTH: u8 = 12;
pub const DEFAULT_ANALYSIS_DEPTH: u8 = 8;

#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the engine/coach/history backend, without trailing slash
    pub api_base_url: String,
    pub engine_depth: u8,
    pub analysis_depth: u8,
    pub request_timeout_secs: u64,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("CHESS_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            engine_depth: env::var("ENGINE_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ENGINE_DEPTH),
            analysis_depth: env::var("ANALYSIS_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ANALYSIS_DEPTH),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            engine_depth: DEFAULT_ENGINE_DEPTH,
            analysis_depth: DEFAULT_ANALYSIS_DEPTH,
            request_timeout_secs: 30,
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}
