use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed packet: {0}")]
    Malformed(String),

    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("invalid value {value:?} for field {field}")]
    InvalidField { field: &'static str, value: String },

    #[error("Unknown command {0:?}")]
    UnknownCommand(String),

    #[error("body of {size} bytes exceeds limit of {limit} bytes")]
    BodyTooLarge { size: u64, limit: u64 },

    #[error("body ended after {received} of {expected} bytes")]
    ShortBody { expected: u64, received: u64 },

    #[error("invalid body: {0}")]
    Body(#[from] serde_json::Error),
}
