use thiserror::Error;

/// Success code carried in a Funifier response envelope
pub const SUCCESS_CODE: i64 = 200;

pub type Result<T> = std::result::Result<T, FunifierError>;

/// Everything that can go wrong between reading the inputs and writing the CSV
#[derive(Debug, Error)]
pub enum FunifierError {
    /// Transport-level failure (DNS, TLS, connect, timeout). Never retried.
    #[error("could not reach {url}")]
    Connectivity {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The upstream answered with an error envelope
    #[error("Funifier API error {code}: {message}")]
    Api { code: i64, message: String },

    /// The body was neither a table nor an error envelope
    #[error("could not decode response: {0}")]
    Decode(String),

    /// Missing or malformed input, detected before any request is sent
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl FunifierError {
    pub fn validation(msg: impl Into<String>) -> Self {
        FunifierError::Validation(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        FunifierError::Decode(msg.into())
    }
}

impl From<csv::Error> for FunifierError {
    fn from(err: csv::Error) -> Self {
        FunifierError::Export(err.to_string())
    }
}

impl From<std::io::Error> for FunifierError {
    fn from(err: std::io::Error) -> Self {
        FunifierError::Export(err.to_string())
    }
}
