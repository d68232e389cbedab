use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Query parameter that carries the user token in share links.
pub const USER_ID_QUERY_PARAM: &str = "uid";

/// Length of generated user tokens, in hex characters.
pub const USER_ID_LEN: usize = 12;

/// Stable identifier of a question: its index in the bank.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(usize);

impl QuestionId {
    /// Creates a new `QuestionId`
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the bank index
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for QuestionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<usize>()
            .map(QuestionId::new)
            .map_err(|_| ParseIdError {
                kind: "QuestionId".to_string(),
            })
    }
}

// ─── User Identity ─────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserIdError {
    #[error("user id cannot be empty")]
    Empty,

    #[error("user id contains whitespace")]
    Whitespace,
}

/// Anonymous token that keys a user's persisted progress.
///
/// It is not a credential: anyone holding the token (for example through a
/// shared link) resumes the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Wraps an existing token.
    ///
    /// # Errors
    ///
    /// Returns `UserIdError` if the token is empty or contains whitespace.
    pub fn parse(raw: impl Into<String>) -> Result<Self, UserIdError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(UserIdError::Empty);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(UserIdError::Whitespace);
        }
        Ok(Self(raw))
    }

    /// Mints a fresh random token of `USER_ID_LEN` lowercase hex characters.
    #[must_use]
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(simple[..USER_ID_LEN].to_owned())
    }

    /// Extracts the token from the `uid` query parameter of a share link.
    #[must_use]
    pub fn from_share_url(url: &Url) -> Option<Self> {
        url.query_pairs()
            .find(|(key, _)| key == USER_ID_QUERY_PARAM)
            .and_then(|(_, value)| Self::parse(value.into_owned()).ok())
    }

    /// Returns `base` with the `uid` parameter set to this token, replacing any
    /// previous value and keeping the other parameters.
    #[must_use]
    pub fn share_url(&self, base: &Url) -> Url {
        let kept: Vec<(String, String)> = base
            .query_pairs()
            .filter(|(key, _)| key != USER_ID_QUERY_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut url = base.clone();
        url.set_query(None);
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &kept {
                pairs.append_pair(key, value);
            }
            pairs.append_pair(USER_ID_QUERY_PARAM, &self.0);
        }
        url
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = UserIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
