use dayblock_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid header: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
    #[error("Notion API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("could not decode page: {0}")]
    Decode(String),
    #[error("tokio runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<NotionError> for StoreError {
    fn from(e: NotionError) -> Self {
        match e {
            NotionError::Api { status: 404, body } => StoreError::NotFound(body),
            NotionError::Api { status, body } => StoreError::Rejected { status, body },
            NotionError::Decode(msg) => StoreError::Malformed(msg),
            other => StoreError::Request(other.to_string()),
        }
    }
}
