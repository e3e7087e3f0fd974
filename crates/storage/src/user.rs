use std::env;

/// Identity sent with every quiz API call when no usable token is present.
pub const FALLBACK_USER_ID: &str = "dev-fallback-user";

/// Who is taking the quiz.
///
/// Passed explicitly into collaborator calls rather than read from ambient
/// state, so tests can run several identities side by side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: Option<String>,
    pub access_token: Option<String>,
}

/// Credential header chosen for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthHeader {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// `x-user-id: <id>`
    UserId(String),
}

impl UserContext {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = non_blank(user_id.into());
        self
    }

    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = non_blank(token.into());
        self
    }

    /// Reads `STUDYMATE_USER_ID` and `STUDYMATE_ACCESS_TOKEN`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            user_id: lookup("STUDYMATE_USER_ID").and_then(non_blank),
            access_token: lookup("STUDYMATE_ACCESS_TOKEN").and_then(non_blank),
        }
    }

    /// Picks the credential header for outbound requests.
    ///
    /// A token is only forwarded when it has the three dot-separated segments
    /// of a JWT; anything else falls back to the user id header.
    #[must_use]
    pub fn auth_header(&self) -> AuthHeader {
        if let Some(token) = self.access_token.as_deref() {
            if looks_like_jwt(token) {
                return AuthHeader::Bearer(token.to_string());
            }
            tracing::warn!("ignoring malformed access token");
        }
        AuthHeader::UserId(
            self.user_id
                .clone()
                .unwrap_or_else(|| FALLBACK_USER_ID.to_string()),
        )
    }
}

fn looks_like_jwt(token: &str) -> bool {
    let parts: Vec<&str> = token.split('.').collect();
    parts.len() == 3 && parts.iter().all(|part| !part.is_empty())
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
