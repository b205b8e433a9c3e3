use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("No cameras provided in request")]
    EmptyBatch,

    #[error("Missing required fields: {fields:?} in camera group {group}")]
    MissingFields { group: usize, fields: Vec<String> },

    #[error("Invalid fields: {fields:?} in camera group {group}")]
    InvalidFields { group: usize, fields: Vec<String> },

    #[error("RabbitMQ unavailable: {0}")]
    BrokerUnavailable(String),

    #[error("Failed to publish message for camera {camera_ids}: {cause}")]
    PublishFailure { camera_ids: String, cause: String },

    #[error("AMQP error: {0}")]
    Amqp(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Field names carried by a client rejection, if any.
    pub fn fields(&self) -> Option<&[String]> {
        match self {
            Self::MissingFields { fields, .. } | Self::InvalidFields { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Whether the error was caused by the request rather than the infrastructure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyBatch | Self::MissingFields { .. } | Self::InvalidFields { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
