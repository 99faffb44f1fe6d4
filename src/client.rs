//! Shared HTTP plumbing for the hosted backend's REST and auth endpoints.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;

use crate::config::Config;
use crate::error::AppError;

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: Config,
}

/// Error body shapes returned by the backend services. PostgREST uses
/// `message`/`code`; the auth service uses `msg`, `error_description` or `error`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    code: Option<serde_json::Value>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Request against `url` carrying the public key and, when given, the
    /// caller's access token. Without a token the public key is the bearer.
    pub fn request(&self, method: Method, url: String, token: Option<&str>) -> RequestBuilder {
        let bearer = token.unwrap_or(&self.config.supabase_anon_key);
        self.http
            .request(method, url)
            .header("apikey", &self.config.supabase_anon_key)
            .bearer_auth(bearer)
    }

    /// Passes successful responses through and turns everything else into a
    /// gateway error carrying the server's own message.
    pub async fn check(response: Response) -> Result<Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let message = body
            .message
            .or(body.msg)
            .or(body.error_description)
            .or(body.error)
            .unwrap_or_else(|| {
                if text.trim().is_empty() {
                    format!("Request failed with status {status}")
                } else {
                    text.clone()
                }
            });
        let code = body.code.map(|code| match code {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });
        tracing::debug!(%status, ?code, "backend request failed: {}", message);
        Err(AppError::Gateway { message, code })
    }
}
