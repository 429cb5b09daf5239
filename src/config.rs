use std::fmt;
use std::sync::Arc;

/// Message hook invoked for informational events
pub type LogHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Hook invoked with internal store failures
pub type ErrorLogHook = Arc<dyn Fn(&anyhow::Error) + Send + Sync>;

/// Runtime-tunable behavior of the invalidation layer.
///
/// `suppress_errors` keeps the default fail-open policy: a store outage makes
/// lookups behave as "no record found" instead of failing verification.
/// Callers that need fail-closed semantics turn it off.
#[derive(Clone)]
pub struct Internals {
    pub suppress_errors: bool,
    pub allow_logging: bool,
    pub logger: Option<LogHook>,
    pub error_logger: Option<ErrorLogHook>,
}

impl Default for Internals {
    fn default() -> Self {
        Self {
            suppress_errors: true,
            allow_logging: true,
            logger: None,
            error_logger: None,
        }
    }
}

impl Internals {
    /// Merge-applies an options record: only the fields present are updated
    pub(crate) fn apply(&mut self, options: ConfigureOptions) {
        if let Some(suppress_errors) = options.suppress_errors {
            self.suppress_errors = suppress_errors;
        }
        if let Some(allow_logging) = options.allow_logging {
            self.allow_logging = allow_logging;
        }
        if let Some(logger) = options.logger {
            self.logger = Some(logger);
        }
        if let Some(error_logger) = options.error_logger {
            self.error_logger = Some(error_logger);
        }
    }
}

impl fmt::Debug for Internals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Internals")
            .field("suppress_errors", &self.suppress_errors)
            .field("allow_logging", &self.allow_logging)
            .field("logger", &self.logger.as_ref().map(|_| "<hook>"))
            .field("error_logger", &self.error_logger.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

/// Partial update record for [`Internals`], merged field by field
#[derive(Clone, Default)]
pub struct ConfigureOptions {
    pub suppress_errors: Option<bool>,
    pub allow_logging: Option<bool>,
    pub logger: Option<LogHook>,
    pub error_logger: Option<ErrorLogHook>,
}

impl ConfigureOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suppress_errors(mut self, suppress_errors: bool) -> Self {
        self.suppress_errors = Some(suppress_errors);
        self
    }

    pub fn allow_logging(mut self, allow_logging: bool) -> Self {
        self.allow_logging = Some(allow_logging);
        self
    }

    pub fn logger(mut self, logger: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    pub fn error_logger(mut self, error_logger: impl Fn(&anyhow::Error) + Send + Sync + 'static) -> Self {
        self.error_logger = Some(Arc::new(error_logger));
        self
    }
}

impl fmt::Debug for ConfigureOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigureOptions")
            .field("suppress_errors", &self.suppress_errors)
            .field("allow_logging", &self.allow_logging)
            .field("logger", &self.logger.as_ref().map(|_| "<hook>"))
            .field("error_logger", &self.error_logger.as_ref().map(|_| "<hook>"))
            .finish()
    }
}
