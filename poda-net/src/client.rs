//! Compute client contract.
//!
//! The device asks peer compute nodes to re-execute an assignment and hand
//! back their attestation. The transport behind this trait is the host's
//! concern; the device only needs the call shape and its failure modes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use poda_core::{Address, Item};

/// Handle to a peer compute node, as resolved by the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeNode {
    /// Stable node identifier.
    pub id: String,
    /// Network endpoint the client should dial.
    pub endpoint: String,
}

impl ComputeNode {
    /// Create a new node handle.
    pub fn new(id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            endpoint: endpoint.into(),
        }
    }
}

impl std::fmt::Display for ComputeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.id, self.endpoint)
    }
}

/// Compute client errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connection to {node} failed: {message}")]
    ConnectionFailed { node: String, message: String },

    #[error("node {node} rejected the request: {message}")]
    Rejected { node: String, message: String },

    #[error("timed out waiting for {node}")]
    Timeout { node: String },

    #[error("malformed response from {node}: {message}")]
    MalformedResponse { node: String, message: String },
}

/// Client for requesting attestations from peer compute nodes.
///
/// A successful call returns the peer's attestation item. All failures are
/// equivalent from the device's point of view: the peer is dropped from the
/// aggregate.
#[async_trait]
pub trait ComputeClient: Send + Sync {
    /// Ask `node` to compute `assignment_id` of process `process_id` and
    /// return its attestation.
    async fn compute(
        &self,
        node: &ComputeNode,
        process_id: &Address,
        assignment_id: &Address,
    ) -> Result<Item, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_display() {
        let node = ComputeNode::new("cu-1", "10.0.0.7:4004");
        assert_eq!(format!("{}", node), "cu-1@10.0.0.7:4004");
    }

    #[test]
    fn test_client_error_display() {
        let e = ClientError::Timeout { node: "cu-1".into() };
        assert!(e.to_string().contains("cu-1"));
    }
}
