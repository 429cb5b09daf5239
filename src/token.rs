use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{ConfigureOptions, Internals};
use crate::error::{Error, InvalidatedTokenError, Result};
use crate::ledger::{InvalidationLedger, unix_now};
use crate::scope::{Identifier, InvalidationType, Scope};
use crate::store::InvalidationStore;

/// Claim carrying the invalidation metadata inside the signed envelope
const REVOCATION_CLAIM: &str = "rvk";

/// Claim holding the caller's payload
const PAYLOAD_CLAIM: &str = "data";

/// Invalidation-aware signing options
#[derive(Debug, Clone, Default)]
pub struct SignOptions {
    /// Marks the token as belonging to this user
    pub user: Option<Identifier>,
    /// Marks the token as issued through this client application
    pub client: Option<Identifier>,
    /// Embed a float issued-at with sub-second precision. The standard `iat`
    /// claim truncates to whole seconds, which makes a token and an
    /// invalidation within the same second indistinguishable.
    pub precise: bool,
    /// Optional expiry, stamped into the `exp` claim
    pub expires_in: Option<Duration>,
}

impl SignOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, user: impl Into<Identifier>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn client(mut self, client: impl Into<Identifier>) -> Self {
        self.client = Some(client.into());
        self
    }

    pub fn precise(mut self, precise: bool) -> Self {
        self.precise = precise;
        self
    }

    pub fn expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }
}

/// Invalidation metadata embedded at sign time. Identifiers are stored in
/// canonical key form, resolved once at the API boundary.
#[derive(Debug, Serialize, Deserialize)]
struct RevocationTag {
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    client: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    iat: Option<f64>,
}

impl RevocationTag {
    fn is_empty(&self) -> bool {
        self.user.is_none() && self.client.is_none() && self.iat.is_none()
    }
}

/// Stateless token service backed by HMAC (HS256) with a revocation check
/// against the invalidation ledger.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ledger: InvalidationLedger,
}

impl TokenService {
    /// Creates a service signing with the given secret and consulting the
    /// given store for invalidations
    pub fn new(secret: impl AsRef<[u8]>, store: Arc<dyn InvalidationStore>) -> Self {
        let secret = secret.as_ref();
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is validated when present but tokens are not required to carry one
        validation.set_required_spec_claims::<&str>(&[]);
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ledger: InvalidationLedger::new(store),
        }
    }

    /// Applies configuration at construction time
    pub fn with_options(mut self, options: ConfigureOptions) -> Self {
        self.configure(options);
        self
    }

    /// Merge-updates the runtime internals (error suppression, logging hooks)
    pub fn configure(&mut self, options: ConfigureOptions) {
        self.ledger.configure(options);
    }

    pub fn internals(&self) -> &Internals {
        self.ledger.internals()
    }

    pub fn ledger(&self) -> &InvalidationLedger {
        &self.ledger
    }

    /// Issues a signed token carrying the caller's payload under the `data`
    /// claim, plus the invalidation metadata when the options ask for it.
    ///
    /// A float issued-at is embedded when `precise` is set, and always when
    /// the payload is not a JSON object (such payloads have no claim set of
    /// their own, so sub-second precision costs nothing).
    pub fn sign<T: Serialize>(&self, payload: &T, options: &SignOptions) -> Result<String> {
        let payload_value = serde_json::to_value(payload)?;
        let now = unix_now();
        let precise_iat = (options.precise || !payload_value.is_object()).then_some(now);

        let tag = RevocationTag {
            user: options.user.as_ref().map(Identifier::canonical_key),
            client: options.client.as_ref().map(Identifier::canonical_key),
            iat: precise_iat,
        };

        let mut claims = Map::new();
        claims.insert(PAYLOAD_CLAIM.to_string(), payload_value);
        claims.insert("iat".to_string(), Value::from(now as u64));
        if let Some(expires_in) = options.expires_in {
            claims.insert(
                "exp".to_string(),
                Value::from(now as u64 + expires_in.as_secs()),
            );
        }
        if !tag.is_empty() {
            claims.insert(REVOCATION_CLAIM.to_string(), serde_json::to_value(&tag)?);
        }

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Marks the scope as invalidated from now on: previously issued matching
    /// tokens are rejected by [`TokenService::verify`], tokens issued later
    /// pass (subject to issued-at precision, see [`SignOptions::precise`]).
    pub async fn invalidate(&self, scope: impl Into<Scope>) -> Result<()> {
        self.ledger.record_invalidation(&scope.into()).await
    }

    /// Undoes an invalidation for exactly the given scope.
    ///
    /// A combined user+client reversal clears only the combined record; any
    /// standalone user or client invalidation stays in force. Returns `true`
    /// iff a record was found and removed.
    pub async fn revert(&self, scope: impl Into<Scope>) -> Result<bool> {
        self.ledger.revert(&scope.into()).await
    }

    /// Verifies the token's signature and claims, then checks it against the
    /// invalidation ledger. On acceptance returns the payload stored under
    /// the `data` claim; tokens signed elsewhere yield their whole claim set.
    pub async fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T> {
        let decoded = decode::<Value>(token, &self.decoding_key, &self.validation)?;
        let claims = decoded.claims;

        let tag = claims
            .get(REVOCATION_CLAIM)
            .and_then(|value| serde_json::from_value::<RevocationTag>(value.clone()).ok());

        match &tag {
            None => self.check_untagged(token, &claims).await?,
            Some(tag) => self.check_tagged(token, &claims, tag).await?,
        }

        let payload = match claims {
            Value::Object(mut map) => map
                .remove(PAYLOAD_CLAIM)
                .unwrap_or_else(|| Value::Object(map)),
            other => other,
        };
        serde_json::from_value(payload).map_err(Error::Payload)
    }

    /// Fallback for tokens signed without invalidation metadata: only the
    /// token-scope record applies. With a numeric issued-at the record rejects
    /// tokens issued after it; without one, its mere presence rejects - a
    /// token that cannot be ordered against the sweep is assumed covered.
    async fn check_untagged(&self, token: &str, claims: &Value) -> Result<()> {
        let scope = Scope::token(token);
        let Some(invalidated_at) = self.ledger.invalidation_time(&scope).await? else {
            return Ok(());
        };
        let rejected = match claims.get("iat").and_then(Value::as_f64) {
            Some(issued_at) => issued_at > invalidated_at,
            None => true,
        };
        if rejected {
            return Err(InvalidatedTokenError::new(InvalidationType::Token, invalidated_at).into());
        }
        Ok(())
    }

    /// Scope checks in fixed order - user+client, user, client, then the bare
    /// token - raising on the first record that postdates the issued-at. The
    /// order determines which invalidation type is reported when several
    /// scopes would match.
    async fn check_tagged(&self, token: &str, claims: &Value, tag: &RevocationTag) -> Result<()> {
        let issued_at = tag
            .iat
            .or_else(|| claims.get("iat").and_then(Value::as_f64));
        // without a numeric issued-at the token cannot be checked against
        // timestamped invalidations and is accepted as-is
        let Some(issued_at) = issued_at else {
            return Ok(());
        };

        if let (Some(user), Some(client)) = (&tag.user, &tag.client) {
            self.check_scope(Scope::subject_client(user.as_str(), client.as_str()), issued_at)
                .await?;
        }
        if let Some(user) = &tag.user {
            self.check_scope(Scope::subject(user.as_str()), issued_at)
                .await?;
        }
        if let Some(client) = &tag.client {
            self.check_scope(Scope::client(client.as_str()), issued_at)
                .await?;
        }
        self.check_scope(Scope::token(token), issued_at).await
    }

    async fn check_scope(&self, scope: Scope, issued_at: f64) -> Result<()> {
        if let Some(invalidated_at) = self.ledger.invalidation_time(&scope).await? {
            if issued_at < invalidated_at {
                return Err(
                    InvalidatedTokenError::new(scope.invalidation_type(), invalidated_at).into(),
                );
            }
        }
        Ok(())
    }
}
