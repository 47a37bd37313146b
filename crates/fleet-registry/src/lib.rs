//! fleet-registry — core state and lifecycle for the fleet registry.
//!
//! The registry tracks devices and the administrative actions issued
//! against them. Two components cooperate, with the store as the sole
//! owner of shared state:
//!
//! ```text
//! RegistryStore
//!   ├── devices: id → DeviceRecord (status, metadata, last_seen)
//!   ├── actions: id → ActionRecord (status, message, timestamps)
//!   └── one coarse mutex over both maps + the action id counter
//!
//! ActionExecutor
//!   └── one detached task per created action
//!       ├── reports Running immediately
//!       ├── sleeps a random interval (simulated execution)
//!       └── reports Completed or Failed (weighted random)
//! ```
//!
//! All accessors return copies; concurrent readers never observe a
//! mutation in progress. Transport adapters live in `fleet-grpc`.

pub mod error;
pub mod executor;
pub mod store;
pub mod types;

pub use error::{RegistryError, RegistryResult};
pub use executor::ActionExecutor;
pub use store::RegistryStore;
pub use types::*;
