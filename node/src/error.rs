use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("store error: {0}")]
    Store(#[from] srand_store::StoreError),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid authority identity: {0}")]
    Identity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("shared random service has stopped")]
    ServiceStopped,
}
