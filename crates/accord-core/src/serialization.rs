//! DAG-CBOR serialization for Accord types
//!
//! DAG-CBOR is the canonical format for manifests. It gives a deterministic
//! encoding, so hashing the encoded bytes yields a stable content address.

use serde::{Deserialize, Serialize};

/// Unified error type for serialization operations
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// DAG-CBOR encoding/decoding error
    #[error("DAG-CBOR error: {0}")]
    DagCbor(String),

    /// Invalid data format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Standard Result type for serialization operations
pub type Result<T> = std::result::Result<T, SerializationError>;

/// Serialize any serde-compatible type to DAG-CBOR bytes
pub fn to_vec<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_ipld_dagcbor::to_vec(value).map_err(|e| {
        SerializationError::InvalidFormat(format!("Failed to serialize to DAG-CBOR: {e}"))
    })
}

/// Deserialize DAG-CBOR bytes to any serde-compatible type
pub fn from_slice<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T> {
    serde_ipld_dagcbor::from_slice(bytes).map_err(|e| SerializationError::DagCbor(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        roles: BTreeMap<String, Vec<String>>,
    }

    #[test]
    fn test_roundtrip() {
        let mut roles = BTreeMap::new();
        roles.insert("write".to_string(), vec!["alice".to_string()]);
        let sample = Sample {
            name: "events".into(),
            roles,
        };

        let bytes = to_vec(&sample).unwrap();
        let decoded: Sample = from_slice(&bytes).unwrap();
        assert_eq!(decoded, sample);
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        let result: Result<Sample> = from_slice(&[0xff, 0x00, 0x13]);
        assert!(result.is_err());
    }
}
