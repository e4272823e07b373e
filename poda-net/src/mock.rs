//! Mock compute nodes for testing and development.
//!
//! Provides an in-process [`ComputeClient`] backed by configurable mock
//! nodes: each node owns a real wallet and signs real attestations, with
//! optional latency and failure injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, warn};

use poda_core::{Address, Item, Wallet};

use crate::client::{ClientError, ComputeClient, ComputeNode};

/// Configuration for a mock compute node.
#[derive(Debug, Clone)]
pub struct MockNodeConfig {
    /// Node ID.
    pub id: String,
    /// Simulated endpoint.
    pub endpoint: String,
    /// Simulated network latency per call.
    pub latency: Duration,
}

impl Default for MockNodeConfig {
    fn default() -> Self {
        Self {
            id: "mock-cu".to_string(),
            endpoint: "mock:4004".to_string(),
            latency: Duration::from_millis(0),
        }
    }
}

impl MockNodeConfig {
    /// Config with a distinct id and no latency.
    pub fn named(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            endpoint: format!("{}:4004", id),
            id,
            latency: Duration::from_millis(0),
        }
    }
}

/// A single mock compute node.
///
/// The node attests messages that have been staged for an assignment: a
/// staged entry maps `(process_id, assignment_id)` to the id the node will
/// bind its attestation to via an `Attestation-For` tag.
pub struct MockComputeNode {
    config: MockNodeConfig,
    wallet: Wallet,
    /// Staged results by (process id, assignment id).
    staged: RwLock<HashMap<(Address, Address), Address>>,
    /// When set, every call fails with a connection error.
    failing: AtomicBool,
    /// When set, every call sleeps past any reasonable deadline.
    hanging: AtomicBool,
    /// Attestations served.
    served: AtomicU64,
    /// When the node last served an attestation.
    last_served: RwLock<Option<DateTime<Utc>>>,
}

impl MockComputeNode {
    /// Create a mock node with a fresh wallet.
    pub fn new(config: MockNodeConfig) -> Self {
        Self {
            config,
            wallet: Wallet::generate(),
            staged: RwLock::new(HashMap::new()),
            failing: AtomicBool::new(false),
            hanging: AtomicBool::new(false),
            served: AtomicU64::new(0),
            last_served: RwLock::new(None),
        }
    }

    /// The node's handle, as the router would return it.
    pub fn handle(&self) -> ComputeNode {
        ComputeNode::new(self.config.id.clone(), self.config.endpoint.clone())
    }

    /// The node's signer address.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// The node's wallet (for declaring it as an authority in tests).
    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    /// Stage the message id this node will attest for an assignment.
    pub fn stage(&self, process_id: Address, assignment_id: Address, message_id: Address) {
        self.staged
            .write()
            .insert((process_id, assignment_id), message_id);
    }

    /// Toggle hard failure on every call.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Toggle hanging (never answers within a deadline).
    pub fn set_hanging(&self, hanging: bool) {
        self.hanging.store(hanging, Ordering::SeqCst);
    }

    /// Number of attestations served.
    pub fn served(&self) -> u64 {
        self.served.load(Ordering::SeqCst)
    }

    /// When the node last served an attestation.
    pub fn last_served(&self) -> Option<DateTime<Utc>> {
        *self.last_served.read()
    }

    async fn attest(
        &self,
        process_id: &Address,
        assignment_id: &Address,
    ) -> Result<Item, ClientError> {
        if self.hanging.load(Ordering::SeqCst) {
            // Out-waits any per-peer deadline a caller would set
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.config.latency > Duration::ZERO {
            tokio::time::sleep(self.config.latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            debug!(node = %self.config.id, "injected connection failure");
            return Err(ClientError::ConnectionFailed {
                node: self.config.id.clone(),
                message: "injected failure".into(),
            });
        }

        let target = self
            .staged
            .read()
            .get(&(process_id.clone(), assignment_id.clone()))
            .cloned()
            .ok_or_else(|| ClientError::Rejected {
                node: self.config.id.clone(),
                message: "assignment not computed".into(),
            })?;

        self.served.fetch_add(1, Ordering::SeqCst);
        *self.last_served.write() = Some(Utc::now());
        Ok(Item::builder()
            .tag("Attestation-For", target.as_bytes().to_vec())
            .sign(&self.wallet))
    }
}

/// An in-process network of mock nodes, dispatching by node id.
#[derive(Default)]
pub struct MockNetwork {
    nodes: RwLock<HashMap<String, Arc<MockComputeNode>>>,
}

impl MockNetwork {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return it.
    pub fn add_node(&self, config: MockNodeConfig) -> Arc<MockComputeNode> {
        let node = Arc::new(MockComputeNode::new(config));
        self.nodes.write().insert(node.config.id.clone(), node.clone());
        node
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<Arc<MockComputeNode>> {
        self.nodes.read().get(id).cloned()
    }
}

#[async_trait]
impl ComputeClient for MockNetwork {
    async fn compute(
        &self,
        node: &ComputeNode,
        process_id: &Address,
        assignment_id: &Address,
    ) -> Result<Item, ClientError> {
        let Some(mock) = self.node(&node.id) else {
            warn!(node = %node.id, "dial to unknown mock node");
            return Err(ClientError::ConnectionFailed {
                node: node.id.clone(),
                message: "no such node".into(),
            });
        };
        mock.attest(process_id, assignment_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poda_core::hash;

    fn addr(label: &[u8]) -> Address {
        Address::from_hash(&hash(label))
    }

    #[tokio::test]
    async fn test_mock_node_attests_staged_assignment() {
        let network = MockNetwork::new();
        let node = network.add_node(MockNodeConfig::named("cu-1"));

        let process = addr(b"process");
        let assignment = addr(b"assignment");
        let message = addr(b"message");
        node.stage(process.clone(), assignment.clone(), message.clone());

        let att = network
            .compute(&node.handle(), &process, &assignment)
            .await
            .unwrap();

        assert!(att.verify());
        assert_eq!(att.signer(), Some(node.address()));
        assert_eq!(att.tag_value("Attestation-For"), Some(message.as_bytes()));
        assert_eq!(node.served(), 1);
        assert!(node.last_served().is_some());
    }

    #[tokio::test]
    async fn test_mock_node_rejects_unstaged_assignment() {
        let network = MockNetwork::new();
        let node = network.add_node(MockNodeConfig::named("cu-1"));

        let err = network
            .compute(&node.handle(), &addr(b"p"), &addr(b"a"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Rejected { .. }));
        assert_eq!(node.served(), 0);
    }

    #[tokio::test]
    async fn test_mock_node_failure_injection() {
        let network = MockNetwork::new();
        let node = network.add_node(MockNodeConfig::named("cu-1"));
        node.stage(addr(b"p"), addr(b"a"), addr(b"m"));
        node.set_failing(true);

        let err = network
            .compute(&node.handle(), &addr(b"p"), &addr(b"a"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ConnectionFailed { .. }));
    }

    #[tokio::test]
    async fn test_unknown_node_is_connection_failure() {
        let network = MockNetwork::new();
        let err = network
            .compute(
                &ComputeNode::new("ghost", "nowhere:4004"),
                &addr(b"p"),
                &addr(b"a"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ConnectionFailed { .. }));
    }
}
