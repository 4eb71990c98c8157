use std::time::Duration;

/// Board access errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("square {0} is off the board (valid squares are 0..32)")]
    OutOfRange(usize),
}

/// Failures of the client session transport. Protocol-level refusals are
/// carried by `Ack` replies instead.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("connection closed")]
    Closed,

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("malformed packet: {reason}")]
    Malformed {
        reason: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SessionError {
    pub(crate) fn malformed(source: serde_json::Error) -> Self {
        SessionError::Malformed {
            reason: source.to_string(),
            source: Some(source),
        }
    }
}
