use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, error};

use crate::config::{ConfigureOptions, Internals};
use crate::error::{Error, Result};
use crate::scope::Scope;
use crate::store::InvalidationStore;

/// Current wall-clock time as float Unix seconds
pub(crate) fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Timestamp-keyed record of invalidations, one store key per scope.
///
/// Writing a scope again overwrites its previous timestamp; there are no
/// cross-key transactions, single-key atomicity comes from the store.
pub struct InvalidationLedger {
    store: Arc<dyn InvalidationStore>,
    internals: Internals,
}

impl InvalidationLedger {
    pub fn new(store: Arc<dyn InvalidationStore>) -> Self {
        Self {
            store,
            internals: Internals::default(),
        }
    }

    pub(crate) fn configure(&mut self, options: ConfigureOptions) {
        self.internals.apply(options);
    }

    pub(crate) fn internals(&self) -> &Internals {
        &self.internals
    }

    /// Records an invalidation for the scope at the current wall-clock time.
    ///
    /// Store failures on the write path are not suppressed: a caller asking
    /// for an invalidation must learn that it did not happen.
    pub async fn record_invalidation(&self, scope: &Scope) -> Result<()> {
        let key = scope.storage_key();
        let invalidated_at = unix_now();
        self.store
            .set(&key, &invalidated_at.to_string())
            .await
            .map_err(Error::Store)?;
        debug!(key = %key, invalidated_at, "invalidation recorded");
        self.log(&format!("invalidation recorded for key {key}"));
        Ok(())
    }

    /// Reads the invalidation timestamp for the scope, if any.
    ///
    /// Recoverable read failures go through the shared policy: logged, then
    /// reported as "no record" unless `suppress_errors` is off. Values that
    /// do not parse as a timestamp are treated as absent.
    pub async fn invalidation_time(&self, scope: &Scope) -> Result<Option<f64>> {
        let key = scope.storage_key();
        match self.store.get(&key).await {
            Ok(value) => Ok(value.and_then(|raw| raw.parse::<f64>().ok())),
            Err(err) => self.handle_internal_error(err).map(|()| None),
        }
    }

    /// Deletes the invalidation record for the scope; absent keys are a no-op
    pub async fn clear_invalidation(&self, scope: &Scope) -> Result<()> {
        let key = scope.storage_key();
        match self.store.del(&key).await {
            Ok(()) => {
                debug!(key = %key, "invalidation cleared");
                self.log(&format!("invalidation cleared for key {key}"));
                Ok(())
            }
            Err(err) => self.handle_internal_error(err),
        }
    }

    /// Existence-check-then-delete. Returns `true` iff a record was found
    /// and removed; a scope with no record is a no-op reporting `false`.
    pub async fn revert(&self, scope: &Scope) -> Result<bool> {
        if self.invalidation_time(scope).await?.is_some() {
            self.clear_invalidation(scope).await?;
            return Ok(true);
        }
        Ok(false)
    }

    fn log(&self, message: &str) {
        if self.internals.allow_logging {
            if let Some(hook) = &self.internals.logger {
                hook(message);
            }
        }
    }

    /// Shared failure policy for store access during lookups and cleanup
    fn handle_internal_error(&self, err: anyhow::Error) -> Result<()> {
        if self.internals.allow_logging {
            error!(error = %err, "invalidation store access failed");
            if let Some(hook) = &self.internals.error_logger {
                hook(&err);
            }
        }
        if self.internals.suppress_errors {
            Ok(())
        } else {
            Err(Error::Store(err))
        }
    }
}
