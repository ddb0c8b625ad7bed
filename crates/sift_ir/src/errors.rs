/// Errors produced while transforming logical traces.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// The trace cannot be rewritten into a map/reduce pair.
    #[error("cannot split query: {0}")]
    Unsplittable(String),
}

pub type Result<T, E = TraceError> = std::result::Result<T, E>;
