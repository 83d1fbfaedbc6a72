use thiserror::Error;

/// floorcalc error types
#[derive(Error, Debug)]
pub enum FloorcalcError {
    /// Missing or inconsistent configuration (env vars, sheet shape)
    #[error("config error: {0}")]
    Config(String),

    /// Remote CSV source answered with a non-success status
    #[error("Failed to fetch CSV: {status}")]
    Fetch { url: String, status: u16 },

    /// Transport-level failure talking to a CSV source
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Primary sheet had no usable rows
    #[error("{0}")]
    EmptyData(String),

    /// A concurrent refresh this caller waited on failed; carries its message
    #[error("{0}")]
    Coalesced(String),

    /// Non-numeric text in a numeric column
    #[error("column '{column}' is not a number: {value:?}")]
    Coercion { column: &'static str, value: String },
}

/// Result type alias for floorcalc
pub type Result<T> = std::result::Result<T, FloorcalcError>;
