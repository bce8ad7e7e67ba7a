//! Backend session cookies held on the user's behalf.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Cookies issued by the backend, kept in the storefront session.
///
/// The browser never sees these; the storefront forwards them as a `Cookie`
/// header on every backend call.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendCredentials {
    cookies: Vec<(String, String)>,
}

impl BackendCredentials {
    /// No cookies (anonymous calls).
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            cookies: Vec::new(),
        }
    }

    /// Build credentials from raw `Set-Cookie` header values.
    #[must_use]
    pub fn from_set_cookie<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut credentials = Self::anonymous();
        credentials.absorb(headers);
        credentials
    }

    /// Build credentials from a request `Cookie` header, skipping `exclude`.
    ///
    /// Used when the backend's cookies arrive with the browser's own request
    /// (after an OAuth redirect on a shared parent domain).
    #[must_use]
    pub fn from_cookie_header(header: &str, exclude: &str) -> Self {
        let cookies = header
            .split(';')
            .filter_map(split_pair)
            .filter(|(name, _)| name != exclude)
            .collect();
        Self { cookies }
    }

    /// Merge `Set-Cookie` values into the jar.
    ///
    /// A cookie with an empty value or `Max-Age=0` is removed.
    pub fn absorb<'a>(&mut self, headers: impl IntoIterator<Item = &'a str>) {
        for header in headers {
            let mut parts = header.split(';');
            let Some((name, value)) = parts.next().and_then(split_pair) else {
                continue;
            };
            let expired = parts.any(|attr| attr.trim().eq_ignore_ascii_case("max-age=0"));

            self.cookies.retain(|(existing, _)| *existing != name);
            if !expired && !value.is_empty() {
                self.cookies.push((name, value));
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Value of the cookie called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// `Cookie` header value, or `None` when there is nothing to send.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

fn split_pair(raw: &str) -> Option<(String, String)> {
    let (name, value) = raw.trim().split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().trim_matches('"').to_string()))
}

// Cookie values are bearer secrets.
impl fmt::Debug for BackendCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.cookies.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("BackendCredentials")
            .field("cookies", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_set_cookie_drops_attributes() {
        let creds = BackendCredentials::from_set_cookie([
            "JSESSIONID=abc123; Path=/; HttpOnly; SameSite=None; Secure",
            "role=SELLER; Path=/",
        ]);
        assert_eq!(creds.get("JSESSIONID"), Some("abc123"));
        assert_eq!(creds.get("role"), Some("SELLER"));
        assert_eq!(
            creds.cookie_header().as_deref(),
            Some("JSESSIONID=abc123; role=SELLER")
        );
    }

    #[test]
    fn test_absorb_replaces_and_expires() {
        let mut creds = BackendCredentials::from_set_cookie(["token=old", "role=USER"]);
        creds.absorb(["token=new; Path=/", "role=; Max-Age=0"]);
        assert_eq!(creds.get("token"), Some("new"));
        assert_eq!(creds.get("role"), None);
    }

    #[test]
    fn test_anonymous_sends_no_cookie_header() {
        let creds = BackendCredentials::anonymous();
        assert!(creds.is_empty());
        assert_eq!(creds.cookie_header(), None);
    }

    #[test]
    fn test_from_cookie_header_skips_own_session() {
        let creds = BackendCredentials::from_cookie_header("o2_session=xyz; token=t1; bad", "o2_session");
        assert_eq!(creds.get("o2_session"), None);
        assert_eq!(creds.get("token"), Some("t1"));
    }

    #[test]
    fn test_debug_hides_values() {
        let creds = BackendCredentials::from_set_cookie(["token=secret-value"]);
        let debug = format!("{creds:?}");
        assert!(debug.contains("token"));
        assert!(!debug.contains("secret-value"));
    }
}
