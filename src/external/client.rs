use std::time::Duration;

/// Build the HTTP client used to talk to the push backend.
///
/// - Request timeout from configuration, 10s connect timeout
/// - Connection pooling with idle eviction
/// - HTTP/2 keep-alive and gzip
/// - Rustls for TLS (no OpenSSL dependency)
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10).min(timeout))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .http2_adaptive_window(true)
        .http2_keep_alive_interval(Duration::from_secs(10))
        .http2_keep_alive_timeout(Duration::from_secs(20))
        .gzip(true)
        .user_agent(user_agent())
        .build()
}

fn user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), crate::pkg_version())
}
