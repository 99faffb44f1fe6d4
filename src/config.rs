use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub storage_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub session_refresh_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let supabase_url = env_any(&["SUPABASE_URL", "EXPO_PUBLIC_SUPABASE_URL"])
            .ok_or_else(|| AppError::Config("SUPABASE_URL is not set".to_string()))?;
        let supabase_anon_key = env_any(&["SUPABASE_ANON_KEY", "EXPO_PUBLIC_SUPABASE_ANON_KEY"])
            .ok_or_else(|| AppError::Config("SUPABASE_ANON_KEY is not set".to_string()))?;

        Ok(Config {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_anon_key,
            storage_dir: std::env::var("PLANNER_STORAGE_DIR")
                .unwrap_or_else(|_| "./.planner".to_string())
                .into(),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid REQUEST_TIMEOUT_SECS: {}", e)))?,
            session_refresh_interval_secs: std::env::var("SESSION_REFRESH_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|e| {
                    AppError::Config(format!("Invalid SESSION_REFRESH_INTERVAL_SECS: {}", e))
                })?,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.supabase_url, path)
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.supabase_url, path)
    }
}

fn env_any(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}
