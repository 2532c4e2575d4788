//! Access-controller manifests
//!
//! A manifest is the immutable, content-addressed record that pairs an
//! access-controller type with the parameters needed to rebuild it. The
//! address of a manifest is the hash of its canonical DAG-CBOR encoding, so
//! identical type and parameters always land on the same address.

use crate::errors::AccordError;
use crate::hash::Hash32;
use crate::serialization;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Path prefix accepted in front of a textual manifest address
pub const MANIFEST_PATH_PREFIX: &str = "/accord/";

/// Content-derived address of a manifest
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ManifestAddress(pub Hash32);

impl ManifestAddress {
    /// Address of the given encoded bytes
    pub fn for_bytes(bytes: &[u8]) -> Self {
        Self(Hash32::from_bytes(bytes))
    }

    /// Underlying content hash
    pub fn hash(&self) -> &Hash32 {
        &self.0
    }

    /// Path form, e.g. `/accord/<hex>`
    pub fn to_path(&self) -> String {
        format!("{MANIFEST_PATH_PREFIX}{}", self.0)
    }
}

impl fmt::Debug for ManifestAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ManifestAddress({})", self.0)
    }
}

impl fmt::Display for ManifestAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ManifestAddress {
    type Err = AccordError;

    /// Accepts bare hex or the `/accord/<hex>` path form. Anything after the
    /// hash segment of a path is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex_part = match trimmed.strip_prefix(MANIFEST_PATH_PREFIX) {
            Some(rest) => rest.split('/').next().unwrap_or_default(),
            None => trimmed,
        };

        Hash32::from_hex(hex_part)
            .map(Self)
            .map_err(|e| AccordError::invalid(format!("malformed manifest address `{s}`: {e}")))
    }
}

impl From<Hash32> for ManifestAddress {
    fn from(hash: Hash32) -> Self {
        Self(hash)
    }
}

/// Controller-type specific parameters carried by a manifest.
///
/// The bundle is opaque to the orchestration layer except for two fields:
/// `skip_manifest` together with `address` tells it to use an existing
/// address and publish nothing. Role maps are ordered so that equal params
/// always encode to equal bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestParams {
    /// Controller type, required when resolving without a stored manifest
    pub controller_type: Option<String>,
    /// Human-readable controller name
    pub name: Option<String>,
    /// Address of the manifest or of controller-owned state
    pub address: Option<ManifestAddress>,
    /// Use `address` directly instead of publishing a manifest
    pub skip_manifest: bool,
    /// Role name to identity ids
    pub access: BTreeMap<String, Vec<String>>,
}

impl ManifestParams {
    /// Empty parameter bundle
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters that point at a fixed, already-known address
    pub fn skip_manifest(controller_type: impl Into<String>, address: ManifestAddress) -> Self {
        Self {
            controller_type: Some(controller_type.into()),
            address: Some(address),
            skip_manifest: true,
            ..Self::default()
        }
    }

    /// Set the controller name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the identities holding `role`
    pub fn with_access<I, S>(mut self, role: impl Into<String>, identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_access(role, identities.into_iter().map(Into::into).collect());
        self
    }

    /// Address supplied for a skipped manifest, if this bundle requests one
    pub fn pre_supplied_address(&self) -> Option<ManifestAddress> {
        if self.skip_manifest {
            self.address
        } else {
            None
        }
    }

    /// Identities holding `role`
    pub fn access(&self, role: &str) -> &[String] {
        self.access.get(role).map(Vec::as_slice).unwrap_or_default()
    }

    /// Replace the identities holding `role`
    pub fn set_access(&mut self, role: impl Into<String>, identities: Vec<String>) {
        self.access.insert(role.into(), identities);
    }

    /// Every role and its identities
    pub fn all_access(&self) -> &BTreeMap<String, Vec<String>> {
        &self.access
    }
}

/// Durable record pairing a controller type with its parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Registered controller type name
    pub controller_type: String,
    /// Parameters saved by the controller
    pub params: ManifestParams,
}

impl Manifest {
    /// Build a manifest
    pub fn new(controller_type: impl Into<String>, params: ManifestParams) -> Self {
        Self {
            controller_type: controller_type.into(),
            params,
        }
    }

    /// Canonical DAG-CBOR encoding
    pub fn encode(&self) -> crate::Result<Vec<u8>> {
        Ok(serialization::to_vec(self)?)
    }

    /// Decode from canonical DAG-CBOR
    pub fn decode(bytes: &[u8]) -> crate::Result<Self> {
        Ok(serialization::from_slice(bytes)?)
    }

    /// Content-derived address of this manifest
    pub fn address(&self) -> crate::Result<ManifestAddress> {
        Ok(ManifestAddress::for_bytes(&self.encode()?))
    }
}
