//! Concrete implementations of the capability ports.

pub mod fs_store;
pub mod json_log;
pub mod memory;
pub mod mock_prover;

pub use fs_store::FsCheckpointStore;
pub use json_log::{EventLogFile, JsonLogReader};
pub use memory::{ChainError, MemoryChain, MemoryCheckpointStore};
pub use mock_prover::MockProver;
