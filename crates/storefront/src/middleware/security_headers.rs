//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Adds restrictive security headers to all responses. Start locked down and
//! loosen only when specific functionality requires it; the only loosening
//! here is for the hosted payment widget.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::middleware::CspNonce;
use crate::state::AppState;

/// CDN serving the pinned htmx build.
pub const HTMX_ORIGIN: &str = "https://unpkg.com";

/// Origins the payment widget frames and calls once its script is loaded.
const PAYMENT_FRAME_ORIGINS: &str = "https://api.razorpay.com https://checkout.razorpay.com";
const PAYMENT_CONNECT_ORIGINS: &str = "https://api.razorpay.com https://lumberjack.razorpay.com";

/// Build the Content-Security-Policy value.
///
/// ```text
/// default-src 'none';
/// script-src 'self' 'nonce-<n>' <htmx cdn> <payment script origin>;
/// style-src 'self' 'unsafe-inline';
/// font-src 'self';
/// img-src 'self' data: https:;
/// connect-src 'self' <payment api>;
/// frame-src <payment frames>;
/// object-src 'none';
/// base-uri 'self';
/// form-action 'self';
/// frame-ancestors 'none';
/// ```
///
/// Product images arrive as base64 data URIs, hence `data:`. The widget
/// injects inline styles into its own overlay.
#[must_use]
pub fn content_security_policy(nonce: &str, payment_origin: &str, https: bool) -> String {
    let mut policy = format!(
        "default-src 'none'; \
         script-src 'self' 'nonce-{nonce}' {HTMX_ORIGIN} {payment_origin}; \
         style-src 'self' 'unsafe-inline'; \
         font-src 'self'; \
         img-src 'self' data: https:; \
         connect-src 'self' {PAYMENT_CONNECT_ORIGINS}; \
         frame-src {PAYMENT_FRAME_ORIGINS}; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    );
    if https {
        policy.push_str("; upgrade-insecure-requests");
    }
    policy
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: no-referrer` - Zero referrer leakage
/// - `Content-Security-Policy` - see [`content_security_policy`]
/// - `Permissions-Policy` - Deny sensitive features except payment for the gateway
/// - `Cache-Control: no-store, max-age=0` - Pages carry cart and order data
/// - `Cross-Origin-Opener-Policy: same-origin-allow-popups` - Bank and UPI popups
/// - `Cross-Origin-Resource-Policy: same-origin` - Resource isolation
/// - `X-DNS-Prefetch-Control: off` - Prevent DNS prefetch leakage
///
/// Must run inside `csp_nonce_middleware` so the nonce is available.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let nonce = request
        .extensions()
        .get::<CspNonce>()
        .map(|n| n.value().to_string())
        .unwrap_or_default();
    let config = state.config();
    let csp = content_security_policy(&nonce, &config.payment.script_origin(), config.is_https());

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

    match HeaderValue::from_str(&csp) {
        Ok(value) => {
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }
        Err(e) => tracing::error!(error = %e, "Invalid CSP header value"),
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             autoplay=(), \
             browsing-topics=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             interest-cohort=(), \
             magnetometer=(), \
             microphone=(), \
             payment=(self \"https://api.razorpay.com\"), \
             usb=(), \
             xr-spatial-tracking=()",
        ),
    );

    // Keep a Cache-Control chosen by the handler
    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin-allow-popups"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}
