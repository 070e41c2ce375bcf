use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got an answer. Non-fatal; the next poll catches up.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The rules engine refused a mutation and said why.
    #[error("rejected ({status}): {reason}")]
    Rejected { status: u16, reason: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid endpoint url {0}")]
    Endpoint(String),

    #[error("unknown color {0}")]
    UnknownColor(String),

    #[error("session storage: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl ClientError {
    /// Text to show the user for failures they should see.
    pub fn user_reason(&self) -> Option<&str> {
        match self {
            Self::Rejected { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
