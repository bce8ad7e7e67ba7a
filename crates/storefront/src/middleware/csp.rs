//! Per-request CSP nonce.
//!
//! The payment hand-off page opens the hosted widget from an inline script.
//! That tag carries `nonce="{{ nonce }}"` and `security_headers` puts the
//! same value in `script-src`.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

/// Random bytes per nonce.
const NONCE_BYTES: usize = 16;

/// Base64 nonce shared by the CSP header and the page's inline scripts.
#[derive(Clone, Debug)]
pub struct CspNonce(pub String);

impl CspNonce {
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Store a fresh [`CspNonce`] in the request extensions.
///
/// Runs outside `security_headers_middleware`, which reads the nonce back.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(CspNonce::generate());
    next.run(request).await
}

/// Handlers rendering inline scripts take the nonce as an extractor.
impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!("No CSP nonce on request; inline scripts will be blocked");
            Self(String::new())
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_decodes_to_random_bytes() {
        let nonce = CspNonce::generate();
        assert_eq!(STANDARD.decode(nonce.value()).unwrap().len(), NONCE_BYTES);
    }

    #[test]
    fn test_nonces_differ() {
        assert_ne!(CspNonce::generate().0, CspNonce::generate().0);
    }
}
