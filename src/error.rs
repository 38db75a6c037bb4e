use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbForgeError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Parsing Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Layout Validation Error: {0}")]
    Validation(String),

    #[error("DB must be inside mutable area (n={n}, m={m}, l={l}).")]
    OutOfBounds { n: i32, m: i32, l: i32 },

    #[error("Size of input array differs from layout ({got} != {expected}).")]
    InputSize { got: usize, expected: usize },

    #[error("Checkpoint version ({0}) unsupported.")]
    UnsupportedVersion(String),

    #[error("Simulator Error: {0}")]
    Oracle(String),
}

pub type DfResult<T> = Result<T, DbForgeError>;
