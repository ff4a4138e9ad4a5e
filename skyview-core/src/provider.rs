use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::FetchError;

pub mod openweather;

/// Error body shape shared by the provider's endpoints, e.g.
/// `{"cod":"404","message":"city not found"}`.
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Classify an unsuccessful provider response.
///
/// 401 and 429 are classified by status alone. Anything else becomes
/// [`FetchError::Provider`] carrying the body's `message` when it has one,
/// otherwise `default_message`.
pub fn classify_failure(status: StatusCode, body: &str, default_message: String) -> FetchError {
    match status {
        StatusCode::UNAUTHORIZED => FetchError::InvalidCredential,
        StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited,
        _ => {
            let message = serde_json::from_str::<ProviderErrorBody>(body)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.trim().is_empty());

            FetchError::Provider(message.unwrap_or(default_message))
        }
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback() -> String {
        "Weather data not found for Atlantis".to_string()
    }

    #[test]
    fn unauthorized_ignores_body() {
        let err = classify_failure(
            StatusCode::UNAUTHORIZED,
            r#"{"cod":401,"message":"Invalid API key. Please see https://openweathermap.org/faq#error401"}"#,
            fallback(),
        );
        assert_eq!(err, FetchError::InvalidCredential);

        let err = classify_failure(StatusCode::UNAUTHORIZED, "", fallback());
        assert_eq!(err, FetchError::InvalidCredential);
    }

    #[test]
    fn too_many_requests_is_rate_limited() {
        let err = classify_failure(StatusCode::TOO_MANY_REQUESTS, r#"{"message":"slow down"}"#, fallback());
        assert_eq!(err, FetchError::RateLimited);
    }

    #[test]
    fn provider_message_is_preferred() {
        let err = classify_failure(
            StatusCode::NOT_FOUND,
            r#"{"cod":"404","message":"city not found"}"#,
            fallback(),
        );
        assert_eq!(err, FetchError::Provider("city not found".into()));
    }

    #[test]
    fn default_message_when_body_is_unusable() {
        for body in ["", "<html>bad gateway</html>", r#"{"cod":"500"}"#, r#"{"message":""}"#] {
            let err = classify_failure(StatusCode::BAD_GATEWAY, body, fallback());
            assert_eq!(err, FetchError::Provider(fallback()), "body: {body}");
        }
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
