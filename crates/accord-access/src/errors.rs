//! Orchestration errors
//!
//! Every create/resolve failure is terminal for the call and carries the
//! collaborator error that caused it. The variants separate configuration
//! mistakes (unknown controller type, malformed params) from I/O failures a
//! caller may choose to retry.

use accord_core::context::CancelCause;
use accord_core::AccordError;
use std::fmt;

/// Orchestration stage, in protocol order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Registry lookup of the controller type
    TypeLookup,
    /// Controller construction
    Construct,
    /// Controller state save (create path)
    Save,
    /// Manifest publication (create path)
    Publish,
    /// Manifest resolution (resolve path)
    Resolve,
    /// Controller state load (resolve path)
    Load,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TypeLookup => "type lookup",
            Self::Construct => "construct",
            Self::Save => "save",
            Self::Publish => "publish",
            Self::Resolve => "resolve",
            Self::Load => "load",
        };
        f.write_str(name)
    }
}

/// Which entry point raised the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `AccessControllerManager::create`
    Create,
    /// `AccessControllerManager::resolve`
    Resolve,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Resolve => f.write_str("resolve"),
        }
    }
}

/// Failure of a create or resolve call.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The database registry has no constructor for this type
    #[error("unrecognized access controller `{controller_type}` on {operation}")]
    UnrecognizedControllerType {
        /// Requested or manifest-declared type
        controller_type: String,
        /// Entry point that failed
        operation: Operation,
    },

    /// Parameters are self-contradictory
    #[error("invalid access controller params: {reason}")]
    InvalidParams {
        /// What is wrong with them
        reason: String,
    },

    /// The type's constructor rejected its input
    #[error("unable to init access controller `{controller_type}`: {source}")]
    ConstructionFailed {
        /// Controller type being constructed
        controller_type: String,
        /// Constructor error
        #[source]
        source: AccordError,
    },

    /// The controller could not produce its manifest params
    #[error("unable to save access controller `{controller_type}`: {source}")]
    SaveFailed {
        /// Controller type being saved
        controller_type: String,
        /// Save error
        #[source]
        source: AccordError,
    },

    /// The manifest could not be published
    #[error("unable to publish manifest for `{controller_type}`: {source}")]
    PublishFailed {
        /// Controller type being published
        controller_type: String,
        /// Manifest protocol error
        #[source]
        source: AccordError,
    },

    /// The manifest could not be fetched or decoded
    #[error("unable to resolve manifest `{address}`: {source}")]
    ManifestResolutionFailed {
        /// Requested manifest address
        address: String,
        /// Manifest protocol error
        #[source]
        source: AccordError,
    },

    /// The controller could not restore its state
    #[error("unable to load access controller `{controller_type}` at `{address}`: {source}")]
    LoadFailed {
        /// Controller type being loaded
        controller_type: String,
        /// Address handed to `load`
        address: String,
        /// Load error
        #[source]
        source: AccordError,
    },

    /// The loaded controller disagrees with its manifest
    #[error("access controller does not match manifest `{address}`: {reason}")]
    ManifestMismatch {
        /// Manifest address
        address: String,
        /// Which field disagrees
        reason: String,
    },

    /// Cancellation or deadline interrupted a stage
    #[error("access controller {stage} interrupted: {cause}")]
    Cancelled {
        /// Stage that was interrupted
        stage: Stage,
        /// Token or deadline
        cause: CancelCause,
        /// Collaborator error, when the collaborator itself reported the cancellation
        #[source]
        source: Option<AccordError>,
    },
}

impl ControllerError {
    /// Stage at which the call failed.
    pub fn stage(&self) -> Stage {
        match self {
            Self::UnrecognizedControllerType { .. } | Self::InvalidParams { .. } => {
                Stage::TypeLookup
            }
            Self::ConstructionFailed { .. } => Stage::Construct,
            Self::SaveFailed { .. } => Stage::Save,
            Self::PublishFailed { .. } => Stage::Publish,
            Self::ManifestResolutionFailed { .. } => Stage::Resolve,
            Self::LoadFailed { .. } | Self::ManifestMismatch { .. } => Stage::Load,
            Self::Cancelled { stage, .. } => *stage,
        }
    }

    /// Bad configuration: retrying the same call cannot succeed.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnrecognizedControllerType { .. } | Self::InvalidParams { .. }
        )
    }

    /// Transient I/O failure a caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PublishFailed { .. }
                | Self::ManifestResolutionFailed { .. }
                | Self::Cancelled {
                    cause: CancelCause::DeadlineExceeded,
                    ..
                }
        )
    }

    /// Whether cancellation or a deadline ended the call.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
