use std::fmt;

use crate::error::FetchError;

/// Fallback key baked in at build time, e.g.
/// `SKYVIEW_DEMO_API_KEY=... cargo build`.
pub const BUNDLED_DEMO_KEY: Option<&str> = option_env!("SKYVIEW_DEMO_API_KEY");

/// Which credential source is active. Advisory only, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    User,
    Demo,
    None,
}

impl CredentialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialStatus::User => "user",
            CredentialStatus::Demo => "demo",
            CredentialStatus::None => "none",
        }
    }
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The provider API key, resolved once and immutable afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredential {
    value: Option<String>,
    status: CredentialStatus,
}

impl ApiCredential {
    /// A non-blank user value wins over the fallback.
    pub fn resolve(user: Option<String>, fallback: Option<&str>) -> Self {
        let user = user.filter(|k| !k.trim().is_empty());
        let fallback = fallback.filter(|k| !k.trim().is_empty());

        match (user, fallback) {
            (Some(key), _) => Self { value: Some(key), status: CredentialStatus::User },
            (None, Some(key)) => Self { value: Some(key.to_string()), status: CredentialStatus::Demo },
            (None, None) => Self { value: None, status: CredentialStatus::None },
        }
    }

    /// Resolve against [`BUNDLED_DEMO_KEY`].
    pub fn with_bundled_fallback(user: Option<String>) -> Self {
        Self::resolve(user, BUNDLED_DEMO_KEY)
    }

    pub fn user(key: impl Into<String>) -> Self {
        Self::resolve(Some(key.into()), None)
    }

    pub fn none() -> Self {
        Self::resolve(None, None)
    }

    pub fn active(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn status(&self) -> CredentialStatus {
        self.status
    }

    pub fn is_demo(&self) -> bool {
        self.status == CredentialStatus::Demo
    }

    /// Checked before every provider call; nothing goes on the wire without a key.
    pub fn require(&self) -> Result<&str, FetchError> {
        let key = self.active().ok_or(FetchError::MissingCredential)?;

        if self.is_demo() {
            tracing::warn!(
                "Using demo API key (1,000 calls/day limit). For unlimited usage, add your own API key."
            );
        }

        Ok(key)
    }
}

// Keeps the key out of logs and panic messages.
impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_key_takes_precedence() {
        let cred = ApiCredential::resolve(Some("USER".into()), Some("DEMO"));
        assert_eq!(cred.active(), Some("USER"));
        assert_eq!(cred.status(), CredentialStatus::User);
        assert!(!cred.is_demo());
    }

    #[test]
    fn falls_back_to_demo_key() {
        let cred = ApiCredential::resolve(None, Some("DEMO"));
        assert_eq!(cred.active(), Some("DEMO"));
        assert_eq!(cred.status(), CredentialStatus::Demo);
        assert!(cred.is_demo());
    }

    #[test]
    fn blank_user_key_is_ignored() {
        let cred = ApiCredential::resolve(Some("   ".into()), Some("DEMO"));
        assert_eq!(cred.status(), CredentialStatus::Demo);
    }

    #[test]
    fn no_key_at_all() {
        let cred = ApiCredential::none();
        assert_eq!(cred.status().as_str(), "none");
        assert_eq!(cred.require(), Err(FetchError::MissingCredential));
    }

    #[test]
    fn debug_output_hides_the_key() {
        let cred = ApiCredential::user("SECRET");
        assert!(!format!("{cred:?}").contains("SECRET"));
    }
}
