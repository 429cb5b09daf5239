//! JWT Invalidation Core Library
//!
//! Adds a revocation layer on top of stateless JWTs: tokens can be invalidated
//! individually, or in bulk per user, per client, or per user+client pair,
//! without keeping a registry of issued tokens. Invalidations are single
//! timestamp records in a shared key-value store (Redis in production) and are
//! checked at verification time against the token's issued-at.

pub mod config;
pub mod error;
pub mod ledger;
pub mod scope;
pub mod store;
pub mod token;

// Re-exports
pub use config::{ConfigureOptions, ErrorLogHook, Internals, LogHook};
pub use error::{Error, InvalidatedTokenError, Result};
pub use ledger::InvalidationLedger;
pub use scope::{CLIENT_PREFIX, Identifier, InvalidationType, SUBJECT_PREFIX, Scope};
pub use store::{InvalidationStore, MemoryInvalidationStore, RedisInvalidationStore};
pub use token::{SignOptions, TokenService};
