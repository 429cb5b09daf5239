use std::fmt;

use serde_json::Value;

/// Store-key prefix for user-wide invalidations
pub const SUBJECT_PREFIX: &str = "user::";

/// Store-key prefix for client-wide invalidations
pub const CLIENT_PREFIX: &str = "client::";

/// A caller-supplied user or client identifier.
///
/// String identifiers are used verbatim as store keys; anything else is
/// serialized to its compact JSON form. Two identifiers that resolve to the
/// same canonical key address the same invalidation record, regardless of
/// how they were constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum Identifier {
    Raw(String),
    Structured(Value),
}

impl Identifier {
    /// Builds a structured identifier from any serializable value
    pub fn structured<T: serde::Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::Structured(serde_json::to_value(value)?))
    }

    /// Resolves the identifier to its canonical store-key form.
    ///
    /// Strings pass through untouched (never JSON-quoted); numbers serialize
    /// to their plain decimal form; objects and arrays to compact JSON.
    pub fn canonical_key(&self) -> String {
        match self {
            Self::Raw(raw) => raw.clone(),
            Self::Structured(Value::String(raw)) => raw.clone(),
            Self::Structured(value) => value.to_string(),
        }
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::Raw(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self::Raw(value)
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Self::Structured(Value::from(value))
    }
}

impl From<u64> for Identifier {
    fn from(value: u64) -> Self {
        Self::Structured(Value::from(value))
    }
}

impl From<Value> for Identifier {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

/// What an invalidation (or a reversal) applies to
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    /// A single token, addressed by its raw string
    Token(String),
    /// Every token issued for a user
    Subject(Identifier),
    /// Every token issued for a client application
    Client(Identifier),
    /// Every token issued for a user through a specific client
    SubjectClient(Identifier, Identifier),
}

impl Scope {
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    pub fn subject(user: impl Into<Identifier>) -> Self {
        Self::Subject(user.into())
    }

    pub fn client(client: impl Into<Identifier>) -> Self {
        Self::Client(client.into())
    }

    pub fn subject_client(user: impl Into<Identifier>, client: impl Into<Identifier>) -> Self {
        Self::SubjectClient(user.into(), client.into())
    }

    /// Canonical store key for this scope. Pure, no I/O.
    pub fn storage_key(&self) -> String {
        match self {
            Self::Token(token) => token.clone(),
            Self::Subject(user) => format!("{SUBJECT_PREFIX}{}", user.canonical_key()),
            Self::Client(client) => format!("{CLIENT_PREFIX}{}", client.canonical_key()),
            Self::SubjectClient(user, client) => format!(
                "{SUBJECT_PREFIX}{}::{CLIENT_PREFIX}{}",
                user.canonical_key(),
                client.canonical_key()
            ),
        }
    }

    /// The rejection category reported when this scope matches
    pub fn invalidation_type(&self) -> InvalidationType {
        match self {
            Self::Token(_) => InvalidationType::Token,
            Self::Subject(_) => InvalidationType::User,
            Self::Client(_) => InvalidationType::Client,
            Self::SubjectClient(_, _) => InvalidationType::UserClient,
        }
    }
}

impl From<&str> for Scope {
    fn from(token: &str) -> Self {
        Self::Token(token.to_string())
    }
}

impl From<String> for Scope {
    fn from(token: String) -> Self {
        Self::Token(token)
    }
}

/// Which scope caused a token to be rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationType {
    Token,
    User,
    Client,
    UserClient,
}

impl InvalidationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::User => "user",
            Self::Client => "client",
            Self::UserClient => "user-client",
        }
    }
}

impl fmt::Display for InvalidationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
