// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Security headers middleware.

use crate::config::Config;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

const STRICT_CSP: &str = "default-src 'none'; frame-ancestors 'none'";
const PERMISSIONS_POLICY: &str = "accelerometer=(), camera=(), geolocation=(self), gyroscope=(), magnetometer=(), microphone=(), payment=(), usb=()";

/// CSP that only admits images from the map tile host.
///
/// Subdomain placeholders such as `{s}` become a wildcard.
pub fn content_security_policy(config: &Config) -> String {
    let host = config.tile_host().replace("{s}", "*");
    format!(
        "default-src 'none'; img-src 'self' https://{}; frame-ancestors 'none'",
        host
    )
}

/// Add security headers to all responses.
pub async fn add_security_headers(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Strict-Transport-Security",
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    let csp = HeaderValue::from_str(&content_security_policy(&state.config))
        .unwrap_or_else(|_| HeaderValue::from_static(STRICT_CSP));
    headers.insert("Content-Security-Policy", csp);
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));
    headers.insert(
        "Permissions-Policy",
        HeaderValue::from_static(PERMISSIONS_POLICY),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_admits_tile_host() {
        let config = Config::test_default();
        assert_eq!(
            content_security_policy(&config),
            "default-src 'none'; img-src 'self' https://*.tile.openstreetmap.org; frame-ancestors 'none'"
        );
    }

    #[test]
    fn test_csp_custom_tile_host() {
        let mut config = Config::test_default();
        config.tile_url = "https://tiles.example.com/{z}/{x}/{y}.png".to_string();
        assert!(content_security_policy(&config).contains("img-src 'self' https://tiles.example.com;"));
    }
}
