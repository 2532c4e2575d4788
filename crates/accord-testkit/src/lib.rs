//! Accord Testing Infrastructure
//!
//! Test doubles and fixtures for exercising create/resolve end to end
//! without a real network or store.
//!
//! # Usage
//!
//! ```rust,ignore
//! use accord_testkit::*;
//!
//! let factory = MockControllerFactory::new("mock");
//! let db = MockDatabase::builder("events")
//!     .register("mock", Arc::new(factory.clone()))
//!     .build();
//! let harness = Harness::new();
//! let address = harness.manager.create(&ctx, db.handle(), "mock", params, &options).await?;
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod database;
pub mod factory;
pub mod manifest;
pub mod simple;

pub use database::{MockDatabase, MockDatabaseBuilder};
pub use factory::{Fault, MockController, MockControllerFactory};
pub use manifest::RecordingManifestHandler;
pub use simple::{
    SimpleAccessController, SimpleControllerFactory, ANY_IDENTITY, SIMPLE_CONTROLLER_TYPE,
};

use accord_access::AccessControllerManager;
use std::sync::Arc;

/// Manager wired to a [`RecordingManifestHandler`] the test can inspect.
pub struct Harness {
    /// Handler shared with `manager`
    pub manifests: RecordingManifestHandler,
    /// Manager under test
    pub manager: AccessControllerManager,
}

impl Harness {
    /// Harness with a pass-through handler.
    pub fn new() -> Self {
        Self::with_handler(RecordingManifestHandler::new())
    }

    /// Harness around a configured handler.
    pub fn with_handler(manifests: RecordingManifestHandler) -> Self {
        let manager = AccessControllerManager::new(Arc::new(manifests.clone()));
        Self { manifests, manager }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
