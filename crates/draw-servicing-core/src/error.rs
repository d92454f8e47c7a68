use thiserror::Error;

#[derive(Debug, Error)]
pub enum DrawServicingError {
    #[error("Invalid loan terms: {field} — {reason}")]
    InvalidTerms { field: String, reason: String },

    #[error("Invalid payment: {field} — {reason}")]
    InvalidPayment { field: String, reason: String },

    #[error("Unknown assistant function: {0}")]
    UnknownFunction(String),

    #[error("Invalid arguments for {function}: {reason}")]
    InvalidArguments { function: String, reason: String },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("{port} port failure: {reason}")]
    Port { port: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for DrawServicingError {
    fn from(e: serde_json::Error) -> Self {
        DrawServicingError::SerializationError(e.to_string())
    }
}

impl From<crate::ports::PortError> for DrawServicingError {
    fn from(e: crate::ports::PortError) -> Self {
        DrawServicingError::Port {
            port: e.port.to_string(),
            reason: e.reason,
        }
    }
}
