//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Turns a stored image into something an `<img src>` accepts.
///
/// The backend keeps images as base64 text, sometimes already wrapped in a
/// data URI. Bare PNG payloads start with `iVBOR`; everything else is
/// assumed to be JPEG.
///
/// Usage in templates: `{{ product.primary_image()|data_uri }}`
#[askama::filter_fn]
pub fn data_uri(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(to_data_uri(&value.to_string()))
}

pub(crate) fn to_data_uri(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "/static/images/placeholder.svg".to_string();
    }
    if raw.starts_with("data:") || raw.starts_with("http://") || raw.starts_with("https://") {
        return raw.to_string();
    }
    let mime = if raw.starts_with("iVBOR") {
        "image/png"
    } else {
        "image/jpeg"
    };
    format!("data:{mime};base64,{raw}")
}

/// Formats an amount as rupees with two decimals.
///
/// Values that are already formatted, or not numbers, pass through.
///
/// Usage in templates: `{{ cart.total()|rupees }}`
#[askama::filter_fn]
pub fn rupees(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(to_rupees(&value.to_string()))
}

pub(crate) fn to_rupees(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with('₹') {
        return raw.to_string();
    }
    raw.parse::<rust_decimal::Decimal>().map_or_else(
        |_| raw.to_string(),
        |amount| format!("₹{:.2}", amount.round_dp(2)),
    )
}

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

#[cfg(test)]
mod tests {
    use super::{to_data_uri, to_rupees};

    #[test]
    fn test_rupees() {
        assert_eq!(to_rupees("1299"), "₹1299.00");
        assert_eq!(to_rupees("49.5"), "₹49.50");
        assert_eq!(to_rupees("₹10.00"), "₹10.00");
        assert_eq!(to_rupees("n/a"), "n/a");
    }

    #[test]
    fn test_png_payload() {
        assert_eq!(to_data_uri("iVBORw0K"), "data:image/png;base64,iVBORw0K");
    }

    #[test]
    fn test_other_payload_is_jpeg() {
        assert_eq!(to_data_uri("/9j/4AAQ"), "data:image/jpeg;base64,/9j/4AAQ");
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(to_data_uri("data:image/webp;base64,UklG"), "data:image/webp;base64,UklG");
        assert_eq!(to_data_uri("https://cdn.test/a.png"), "https://cdn.test/a.png");
    }

    #[test]
    fn test_empty_uses_placeholder() {
        assert_eq!(to_data_uri("  "), "/static/images/placeholder.svg");
    }
}
