#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod daemon;
pub mod registry;
pub mod storage;

#[cfg(test)]
mod testing;

pub use api::{ApiServer, AppState};
pub use config::{DaemonConfig, StorageBackend};
pub use daemon::{load_verifier, Daemon};
pub use registry::{
    AdmissionController, Admitted, LedgerStore, MemoryLedger, MemoryRootRegistry, RootOracle,
    RootRecord, RootRegistry,
};
pub use storage::{SledLedger, StorageConfig, StorageMetricsSnapshot};
