//! 统一错误类型
//!
//! 区分三类失败：失效拒绝（本库的业务信号）、令牌编解码错误（jsonwebtoken
//! 原样透传）、存储访问错误（默认按 fail-open 策略吞掉，见 ledger 模块）

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::scope::InvalidationType;

/// Raised when a structurally valid token is rejected because a matching
/// invalidation record postdates its issued-at.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("token was invalidated ({invalidation_type}) at {invalidated_at}")]
pub struct InvalidatedTokenError {
    /// Which scope matched: token / user / client / user-client
    pub invalidation_type: InvalidationType,
    /// Unix seconds at which the matching invalidation was recorded
    pub invalidated_at: f64,
}

impl InvalidatedTokenError {
    pub(crate) fn new(invalidation_type: InvalidationType, invalidated_at: f64) -> Self {
        Self {
            invalidation_type,
            invalidated_at,
        }
    }

    pub fn invalidated_at_datetime(&self) -> DateTime<Utc> {
        let secs = self.invalidated_at.trunc() as i64;
        let nanos = (self.invalidated_at.fract() * 1_000_000_000.0) as u32;
        DateTime::<Utc>::from_timestamp(secs, nanos).unwrap_or_else(Utc::now)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// The token matched an invalidation record
    #[error(transparent)]
    Invalidated(#[from] InvalidatedTokenError),

    /// Signature, structure or expiry failure from the token codec
    #[error("token codec error: {0}")]
    Codec(#[from] jsonwebtoken::errors::Error),

    /// Payload could not be serialized into / deserialized out of the claims
    #[error("payload serialization error: {0}")]
    Payload(#[from] serde_json::Error),

    /// Invalidation store access failed and suppression is disabled
    #[error("invalidation store error: {0}")]
    Store(#[source] anyhow::Error),
}

impl Error {
    /// Returns the invalidation details when the error is a revocation rejection
    pub fn invalidation(&self) -> Option<&InvalidatedTokenError> {
        match self {
            Self::Invalidated(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn is_invalidated(&self) -> bool {
        matches!(self, Self::Invalidated(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
