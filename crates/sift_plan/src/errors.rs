use std::error::Error;

/// Opaque error produced by an environment or splitter implementation.
pub type EnvError = Box<dyn Error + Send + Sync>;

/// Errors raised while lowering a logical trace into a physical plan.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The trace uses a construct the execution engine cannot honor.
    #[error("query not supported: {0}")]
    Unsupported(String),

    /// Two surviving ORDER BY expressions are semantically equivalent.
    #[error("duplicate order by expression {0:?}")]
    DuplicateOrder(String),

    /// The environment lacks a capability the query requires.
    #[error("missing capability: {0}")]
    MissingCapability(&'static str),

    /// The environment or splitter failed; the underlying message is
    /// preserved.
    #[error("environment error: {0}")]
    Environment(EnvError),
}

pub type Result<T, E = PlanError> = std::result::Result<T, E>;

macro_rules! unsupported {
    ($($arg:tt)*) => {
        $crate::errors::PlanError::Unsupported(std::format!($($arg)*))
    };
}
pub(crate) use unsupported;
