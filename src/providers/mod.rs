pub mod base;
pub mod errors;
pub mod openai;

use reqwest::Client;
use std::time::Duration;

/// Connect timeout for completion provider HTTP clients (seconds).
pub(crate) const PROVIDER_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Build a `reqwest::Client` with the standard connect timeout and the
/// configured overall request timeout.
pub(crate) fn provider_http_client(request_timeout: Duration) -> Client {
    let connect = Duration::from_secs(PROVIDER_CONNECT_TIMEOUT_SECS).min(request_timeout);
    Client::builder()
        .connect_timeout(connect)
        .timeout(request_timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}
