use crate::errors::RelayError;
use serde_json::Value;
use tracing::{error, warn};

/// Maps HTTP-level failures from a completion provider into `RelayError`.
pub struct ProviderErrorHandler;

impl ProviderErrorHandler {
    /// Parse an API error body into a typed error. 5xx responses are retryable.
    pub fn parse_api_error(status: u16, error_text: &str) -> RelayError {
        let retryable = (500..600).contains(&status);

        if let Ok(error_json) = serde_json::from_str::<Value>(error_text)
            && let Some(err) = error_json.get("error")
        {
            let error_type = err
                .get("type")
                .or_else(|| err.get("code"))
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            let error_msg = err
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown error");

            if error_type == "insufficient_quota" {
                return RelayError::Provider {
                    message: format!("quota exhausted: {}", error_msg),
                    retryable: false,
                };
            }

            return RelayError::Provider {
                message: format!("API error ({}): {}", error_type, error_msg),
                retryable,
            };
        }

        RelayError::Provider {
            message: format!("API error ({}): {}", status, error_text),
            retryable,
        }
    }

    pub fn handle_rate_limit(status: u16, retry_after: Option<u64>) -> RelayError {
        if let Some(seconds) = retry_after {
            warn!("Rate limit hit. Retry after {} seconds", seconds);
        } else {
            warn!("Rate limit hit (status: {})", status);
        }
        RelayError::RateLimit { retry_after }
    }

    pub fn handle_auth_error(status: u16, error_text: &str) -> RelayError {
        warn!("Authentication error (status: {})", status);
        RelayError::Auth(format!(
            "Authentication failed. Please check your API key. Error: {}",
            error_text
        ))
    }

    /// Classify a transport-level failure (no HTTP response).
    pub fn from_transport(err: &reqwest::Error, provider: &str, timeout_secs: u64) -> RelayError {
        if err.is_timeout() {
            return RelayError::Timeout(timeout_secs);
        }
        if err.is_decode() {
            return RelayError::Parse(format!("{} response body: {}", provider, err));
        }
        RelayError::Transport(format!("{} request failed: {}", provider, error_chain(err)))
    }

    /// Check an HTTP response for errors (rate limit, auth, generic API errors).
    /// Returns the response body as JSON on success.
    pub async fn check_response(
        resp: reqwest::Response,
        provider: &str,
        timeout_secs: u64,
    ) -> Result<Value, RelayError> {
        let status = resp.status();

        if !status.is_success() {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());
            let error_text = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());

            error!("{} provider returned HTTP {}", provider, status.as_u16());
            return Err(match status.as_u16() {
                // Quota exhaustion is reported as 429 but never clears on retry
                429 if error_text.contains("insufficient_quota") => {
                    Self::parse_api_error(429, &error_text)
                }
                429 => Self::handle_rate_limit(429, retry_after),
                401 | 403 => Self::handle_auth_error(status.as_u16(), &error_text),
                code => Self::parse_api_error(code, &error_text),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Self::from_transport(&e, provider, timeout_secs))?;
        let json: Value = serde_json::from_str(&body)
            .map_err(|e| RelayError::Parse(format!("{} returned invalid JSON: {}", provider, e)))?;

        if let Some(error_val) = json.get("error")
            && !error_val.is_null()
        {
            let error_text =
                serde_json::to_string(&json).unwrap_or_else(|_| "Unknown error".to_string());
            error!("{} provider returned an error object with HTTP 200", provider);
            return Err(Self::parse_api_error(status.as_u16(), &error_text));
        }

        Ok(json)
    }
}

/// Render an error with its sources, e.g. "error sending request: connection reset by peer".
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests;
