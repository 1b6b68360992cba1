use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("index data file must be a JSON array of documents")]
    NotAnArray,
    #[error("field weight for {field} must be positive, got {weight}")]
    InvalidFieldWeight { field: &'static str, weight: f64 },
    #[error("missing search box attribute: {0}")]
    MissingAttribute(&'static str),
    #[error("max results must be a positive integer, got {0:?}")]
    InvalidMaxResults(String),
}
