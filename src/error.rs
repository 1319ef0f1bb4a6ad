use std::io;

use crate::notifications::RequestId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid interval {min}..={max} seconds")]
    InvalidInterval { min: u32, max: u32 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("pending notification limit of {0} reached")]
    PendingLimit(usize),

    #[error("request {0} is already scheduled")]
    DuplicateRequest(RequestId),

    #[error("background notifier has stopped")]
    NotifierStopped,

    #[error("audio error: {0}")]
    Audio(String),
}
