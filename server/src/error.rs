use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode packet: {0}")]
    Encode(#[from] bincode::Error),

    #[error("broadcast loop is already running")]
    BroadcastAlreadyRunning,

    #[error("broadcast period must be greater than zero")]
    ZeroBroadcastPeriod,
}
