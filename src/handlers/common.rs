use axum::http::{header, HeaderMap, HeaderValue};
use validator::Validate;

use crate::errors::ServiceError;
use crate::services::pincode::{PINCODE_COOKIE, PINCODE_COOKIE_MAX_AGE_SECS};

/// Header carrying the storefront's logical session id.
pub const SESSION_HEADER: &str = "x-session-id";
const ANONYMOUS_SESSION: &str = "anonymous";

/// Validate request input, mapping field errors into the service taxonomy.
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input
        .validate()
        .map_err(|e| ServiceError::ValidationError(format!("validation failed: {e}")))
}

/// Logical session id for cart and pincode-cache keying. Requests without
/// the header share the anonymous session.
pub fn session_id(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| ANONYMOUS_SESSION.to_string())
}

/// Read a single cookie from the request's Cookie header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|part| {
            let (key, value) = part.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
}

/// Durable pincode cookie: 30-day expiry, path `/`.
pub fn pincode_set_cookie(value: &str) -> Result<HeaderValue, ServiceError> {
    HeaderValue::from_str(&format!(
        "{PINCODE_COOKIE}={value}; Max-Age={PINCODE_COOKIE_MAX_AGE_SECS}; Path=/; SameSite=Lax"
    ))
    .map_err(|_| ServiceError::ValidationError("pincode contains invalid characters".to_string()))
}

/// Session-scoped cookie with no explicit expiry.
pub fn session_set_cookie(name: &str, value: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax"))
        .expect("cookie name and value are valid header characters")
}

/// Expire a cookie immediately.
pub fn expire_cookie(name: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("{name}=; Max-Age=0; Path=/"))
        .expect("cookie name is valid header characters")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_value_parses_multi_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("a=1; user_pincode=560001; b=2"),
        );
        assert_eq!(
            cookie_value(&headers, "user_pincode").as_deref(),
            Some("560001")
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn session_id_defaults_to_anonymous() {
        let headers = HeaderMap::new();
        assert_eq!(session_id(&headers), "anonymous");

        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static("tab-42"));
        assert_eq!(session_id(&headers), "tab-42");
    }

    #[test]
    fn pincode_cookie_carries_thirty_day_expiry() {
        let header = pincode_set_cookie("560001").unwrap();
        let value = header.to_str().unwrap();
        assert!(value.starts_with("user_pincode=560001"));
        assert!(value.contains("Max-Age=2592000"));
        assert!(value.contains("Path=/"));
    }

    #[test]
    fn pincode_cookie_rejects_header_injection() {
        assert!(pincode_set_cookie("560001\r\nSet-Cookie: x=1").is_err());
    }
}
