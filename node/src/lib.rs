//! Shared random authority service.
//!
//! The service is the one owner of the protocol state. It:
//! - Advances the state machine once per voting round
//! - Renders our shared random vote lines
//! - Admits commits and reveals from peer votes
//! - Computes the majority SRVs for the consensus
//! - Adopts the SRVs of every finalized consensus
//!
//! [`SharedRandHandle`] runs the service on its own task so that every
//! operation is serialized through one message queue.

pub mod config;
pub mod directory;
pub mod error;
pub mod handle;
pub mod logging;
pub mod service;
pub mod shutdown;

pub use config::NodeConfig;
pub use directory::StaticDirectory;
pub use error::NodeError;
pub use handle::SharedRandHandle;
pub use logging::{init_logging, LogFormat};
pub use service::SharedRandService;
pub use shutdown::ShutdownController;
