//! Accord Core - Foundation Types
//!
//! This crate provides the foundational types and effect interfaces shared by
//! every other Accord crate. It contains no handler implementations and no
//! orchestration logic.
//!
//! # Contents
//!
//! - `Hash32`: BLAKE3 content hash used for content addressing
//! - `ManifestAddress`, `Manifest`, `ManifestParams`: the durable record that
//!   pairs an access-controller type with its serialized parameters
//! - `OperationContext`: cancellation and deadline scope threaded through
//!   every suspension point
//! - Effect interfaces (pure signatures):
//!   - `BlockStoreEffects`: `put_block`, `get_block`, `has_block`
//!   - `ManifestEffects`: `create_manifest`, `resolve_manifest`
//!
//! # Architecture Constraints
//!
//! - YES pure types and trait signatures
//! - YES canonical DAG-CBOR serialization helpers
//! - NO effect handler implementations (those live in `accord-effects`)
//! - NO create/resolve orchestration (that is `accord-access`)

#![forbid(unsafe_code)]

/// Operation-scoped cancellation and deadline context
pub mod context;

/// Pure effect interfaces (no implementations)
pub mod effects;

/// Unified error handling
pub mod errors;

/// Content hashing for content addressing
pub mod hash;

/// Manifest, manifest address and manifest parameter types
pub mod manifest;

/// DAG-CBOR serialization (canonical format)
pub mod serialization;

pub use context::{CancelCause, OperationContext};
pub use effects::{BlockStoreEffects, CancellationToken, ManifestEffects, NeverCancel};
pub use errors::{AccordError, Result};
pub use hash::Hash32;
pub use manifest::{Manifest, ManifestAddress, ManifestParams, MANIFEST_PATH_PREFIX};
