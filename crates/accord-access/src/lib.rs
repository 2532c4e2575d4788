//! # Accord Access - Access-Controller Orchestration
//!
//! **Purpose**: Create and resolve the access controllers that guard Accord
//! databases, and own the grants cache those controllers share.
//!
//! A controller's policy is serialized into an immutable, content-addressed
//! manifest that is published once ([`AccessControllerManager::create`]) and
//! later rebuilt by any peer holding its address
//! ([`AccessControllerManager::resolve`]).
//!
//! # Architecture Constraints
//!
//! - YES create/resolve orchestration and its error taxonomy
//! - YES the grants cache and the controller-type registry table
//! - NO policy decisions (delegated to [`AccessController`] implementations)
//! - NO manifest encoding or block storage (consumed through `accord-core`
//!   effect traits)
//! - NO retries: every failure surfaces to the caller

#![forbid(unsafe_code)]

/// Grants cache shared by controllers
pub mod cache;

/// Controller and owning-database interfaces
pub mod controller;

/// Orchestration errors
pub mod errors;

/// Create/resolve orchestrators
pub mod manager;

/// Controller options
pub mod options;

/// Controller-type registry
pub mod registry;

pub use cache::GrantsCache;
pub use controller::{AccessController, ControllerDatabase, ADMIN_ROLE, WRITE_ROLE};
pub use errors::{ControllerError, Operation, Stage};
pub use manager::AccessControllerManager;
pub use options::ControllerOptions;
pub use registry::{ControllerFactory, ControllerRegistry};
