//! # Accord Effects - Reference Handlers
//!
//! Implementations of the effect interfaces declared in `accord-core`:
//!
//! - [`MemoryBlockStore`]: content-addressed block storage held in memory
//! - [`DagCborManifestHandler`]: manifest publication/resolution over any
//!   block store, DAG-CBOR encoded and hash-verified on read
//! - [`CancellationSource`]: watch-channel cancellation tokens
//! - [`logging`]: tracing subscriber setup

#![forbid(unsafe_code)]

pub mod cancellation;
pub mod logging;
pub mod manifest;
pub mod storage;

pub use cancellation::CancellationSource;
pub use logging::{init_test_tracing, init_tracing};
pub use manifest::DagCborManifestHandler;
pub use storage::MemoryBlockStore;
