use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    /// Non-success status from the completion endpoint, with a truncated
    /// excerpt of the response body
    #[error("completion endpoint returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Caller signalled the cancellation token. Distinct from a failure so
    /// the orchestrator can preserve partial output.
    #[error("generation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, TransportError>;
