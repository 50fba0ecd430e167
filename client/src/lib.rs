pub mod collaborators;
pub mod events;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod session;

pub use collaborators::{ActionSubmitter, ChainReader};
pub use events::Stream;
pub use session::{Session, SessionView};
use mollinalli_execution::RoundError;
use mollinalli_types::{ConfigError, ContractError, DisplayStage};
use thiserror::Error;

/// Boxed collaborator error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for client operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("chain read failed: {0}")]
    Read(BoxError),
    #[error("submission failed: {0}")]
    Submission(BoxError),
    #[error("transaction reverted: {0}")]
    Reverted(ContractError),
    #[error("invalid game config: {0}")]
    Config(#[from] ConfigError),
    #[error("round state: {0}")]
    Round(#[from] RoundError),
    #[error("invalid data: {0}")]
    InvalidData(#[from] commonware_codec::Error),
    #[error("actions are not accepted while {0}")]
    ActionsClosed(DisplayStage),
    #[error("connection closed")]
    ConnectionClosed,
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
