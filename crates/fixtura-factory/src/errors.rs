use std::fmt;

use thiserror::Error;

use fixtura_store::StoreError;

/// Errors emitted by the fixture factory.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("blueprint '{0}' is not registered")]
    BlueprintNotFound(String),
    #[error("blueprint '{0}' has no identity attribute")]
    NoIdentityField(String),
    #[error("invalid override for blueprint '{blueprint}': {source}")]
    OverrideAttributeInvalid {
        blueprint: String,
        #[source]
        source: fixtura_core::Error,
    },
    #[error("blueprint '{blueprint}' produces {registered}, not {requested}")]
    RecordTypeMismatch {
        blueprint: String,
        registered: &'static str,
        requested: &'static str,
    },
    #[error("'{name}' requests more than two levels of indirection")]
    UnsupportedDepth { name: String },
    #[error("no storage adapter configured")]
    StoreNotConfigured,
    #[error("storage adapter failed: {0}")]
    Adapter(#[from] StoreError),
    #[error("generating '{blueprint}' exceeded {after_ms} ms")]
    Timeout { blueprint: String, after_ms: u64 },
    #[error("cleanup failed: {0}")]
    CleanupFailed(CleanupFailures),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl FactoryError {
    /// Classify an attribute failure raised while realizing `blueprint`.
    pub(crate) fn attribute(blueprint: &str, err: fixtura_core::Error) -> Self {
        match err {
            fixtura_core::Error::UnknownAttribute { .. }
            | fixtura_core::Error::IncompatibleValue { .. } => {
                FactoryError::OverrideAttributeInvalid {
                    blueprint: blueprint.to_string(),
                    source: err,
                }
            }
            other => FactoryError::Internal(format!("blueprint '{blueprint}': {other}")),
        }
    }
}

/// Per-name failures collected by a multi-name cleanup.
#[derive(Debug, Default)]
pub struct CleanupFailures {
    pub failures: Vec<(String, FactoryError)>,
}

impl CleanupFailures {
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.failures.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl fmt::Display for CleanupFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} blueprint(s) failed", self.failures.len())?;
        for (name, err) in &self.failures {
            write!(f, "; {name}: {err}")?;
        }
        Ok(())
    }
}

/// Convenience alias for factory results.
pub type FactoryResult<T> = std::result::Result<T, FactoryError>;
