//! HTTP utilities for Cloudflare REST API calls

use super::auth::Credentials;
use super::error::ApiError;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and drops control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// One `{code, message}` entry of an envelope's `errors` array
#[derive(Debug, Clone, Deserialize)]
pub struct EnvelopeMessage {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

/// Pagination metadata
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultInfo {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    /// Next-page cursor of cursor-paginated endpoints (R2)
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub cursors: Option<Cursors>,
}

/// `result_info.cursors` as returned by list item endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Cursors {
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub after: Option<String>,
}

/// Standard Cloudflare v4 response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<EnvelopeMessage>,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub result_info: Option<ResultInfo>,
}

fn default_success() -> bool {
    true
}

impl Envelope {
    /// Server-reported page count, 1 when the endpoint is not paginated
    pub fn total_pages(&self) -> u32 {
        self.result_info
            .as_ref()
            .and_then(|info| info.total_pages)
            .unwrap_or(1)
    }

    /// Cursor for the next page, `None` on the last page or when the
    /// endpoint is page-numbered
    pub fn next_cursor(&self) -> Option<&str> {
        let info = self.result_info.as_ref()?;
        info.cursor
            .as_deref()
            .or_else(|| info.cursors.as_ref().and_then(|c| c.after.as_deref()))
            .filter(|cursor| !cursor.is_empty())
    }

    fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return "no error details".to_string();
        }
        self.errors
            .iter()
            .map(|e| match e.code {
                Some(code) => format!("{} ({})", e.message, code),
                None => e.message.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// HTTP client wrapper for Cloudflare API calls
#[derive(Clone, Debug)]
pub struct CfHttpClient {
    client: Client,
}

impl CfHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(format!("cf2tf/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// GET a URL and unpack the response envelope
    pub async fn get(&self, url: &Url, credentials: &Credentials) -> Result<Envelope, ApiError> {
        tracing::debug!("GET {}", url);

        let response = credentials
            .apply(self.client.get(url.clone()))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            tracing::debug!("Not found: {}", url.path());
            return Err(ApiError::NotFound {
                path: url.path().to_string(),
            });
        }

        if !status.is_success() {
            // Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            let message = serde_json::from_str::<Envelope>(&body)
                .map(|env| env.error_summary())
                .unwrap_or_default();
            return Err(ApiError::Status { status, message });
        }

        let envelope: Envelope = serde_json::from_str(&body)?;
        if !envelope.success {
            tracing::error!("API rejected request: {}", sanitize_for_log(&body));
            return Err(ApiError::Rejected(envelope.error_summary()));
        }

        Ok(envelope)
    }
}

/// Format an API error for display
/// Maps status classes to short hints instead of echoing raw API responses
pub fn format_api_error(error: &anyhow::Error) -> String {
    let Some(api_error) = error.chain().find_map(|e| e.downcast_ref::<ApiError>()) else {
        return format!("{:#}", error);
    };

    match api_error.status().map(|s| s.as_u16()) {
        Some(401) => "Authentication failed. Check CLOUDFLARE_API_TOKEN or --email/--key.".to_string(),
        Some(403) => "Permission denied. The token lacks read access to this resource.".to_string(),
        Some(404) => "Resource not found.".to_string(),
        Some(429) => "Rate limit exceeded. Please try again later.".to_string(),
        Some(400) => format!("Invalid request: {}", api_error_detail(api_error)),
        Some(code) if code >= 500 => {
            "Cloudflare API temporarily unavailable. Please try again.".to_string()
        }
        _ => format!("{:#}", error),
    }
}

fn api_error_detail(error: &ApiError) -> String {
    match error {
        ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
        other => other.to_string(),
    }
}
