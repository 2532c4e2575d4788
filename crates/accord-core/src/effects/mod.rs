//! Effect interfaces
//!
//! Pure trait signatures for the side-effecting collaborators Accord talks
//! to. Implementations live in `accord-effects` (production/reference) and
//! `accord-testkit` (instrumented test doubles).

pub mod manifest;
pub mod storage;
pub mod task;

pub use manifest::ManifestEffects;
pub use storage::BlockStoreEffects;
pub use task::{CancellationToken, NeverCancel};
