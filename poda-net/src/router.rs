//! Routing of attestation requests to compute nodes.
//!
//! The router answers one question: which compute node is responsible for a
//! given (process, authority) pair? A missing route is a normal outcome; the
//! device drops that authority from the peer poll.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use poda_core::{Address, Result};

use crate::client::ComputeNode;

/// Resolves the compute node responsible for an authority on a process.
#[async_trait]
pub trait ComputeRouter: Send + Sync {
    /// Find the node serving `authority` for `process_id`.
    ///
    /// `Ok(None)` means no route is known; errors are reserved for transport
    /// faults in routers that resolve remotely.
    async fn find(
        &self,
        process_id: &Address,
        authority: &Address,
    ) -> Result<Option<ComputeNode>>;
}

/// In-memory routing table.
///
/// Routes are keyed by authority address, optionally overridden per
/// (process, authority) pair for processes pinned to dedicated nodes.
pub struct StaticRouter {
    /// Authority-wide routes.
    by_authority: RwLock<HashMap<Address, ComputeNode>>,
    /// Per-process overrides.
    by_process: RwLock<HashMap<(Address, Address), ComputeNode>>,
}

impl StaticRouter {
    /// Create an empty routing table.
    pub fn new() -> Self {
        Self {
            by_authority: RwLock::new(HashMap::new()),
            by_process: RwLock::new(HashMap::new()),
        }
    }

    /// Register the node serving an authority.
    pub fn add_route(&self, authority: Address, node: ComputeNode) {
        self.by_authority.write().insert(authority, node);
    }

    /// Register a node for an authority on one specific process.
    pub fn add_process_route(&self, process_id: Address, authority: Address, node: ComputeNode) {
        self.by_process.write().insert((process_id, authority), node);
    }

    /// Remove an authority-wide route.
    pub fn remove_route(&self, authority: &Address) {
        self.by_authority.write().remove(authority);
    }

    /// Number of authority-wide routes.
    pub fn route_count(&self) -> usize {
        self.by_authority.read().len()
    }
}

impl Default for StaticRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComputeRouter for StaticRouter {
    async fn find(
        &self,
        process_id: &Address,
        authority: &Address,
    ) -> Result<Option<ComputeNode>> {
        if let Some(node) = self
            .by_process
            .read()
            .get(&(process_id.clone(), authority.clone()))
        {
            return Ok(Some(node.clone()));
        }
        Ok(self.by_authority.read().get(authority).cloned())
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
    async fn test_static_router_find() {
        let router = StaticRouter::new();
        let process = addr(b"process");
        let authority = addr(b"authority-a");

        assert!(router.find(&process, &authority).await.unwrap().is_none());

        router.add_route(authority.clone(), ComputeNode::new("cu-1", "node-1:4004"));
        let node = router.find(&process, &authority).await.unwrap().unwrap();
        assert_eq!(node.id, "cu-1");
    }

    #[tokio::test]
    async fn test_process_route_overrides_authority_route() {
        let router = StaticRouter::new();
        let process = addr(b"process");
        let authority = addr(b"authority-a");

        router.add_route(authority.clone(), ComputeNode::new("cu-1", "node-1:4004"));
        router.add_process_route(
            process.clone(),
            authority.clone(),
            ComputeNode::new("cu-pinned", "node-9:4004"),
        );

        let node = router.find(&process, &authority).await.unwrap().unwrap();
        assert_eq!(node.id, "cu-pinned");

        // Other processes still get the authority-wide route
        let other = addr(b"other-process");
        let node = router.find(&other, &authority).await.unwrap().unwrap();
        assert_eq!(node.id, "cu-1");
    }

    #[tokio::test]
    async fn test_remove_route() {
        let router = StaticRouter::new();
        let authority = addr(b"authority-a");

        router.add_route(authority.clone(), ComputeNode::new("cu-1", "node-1:4004"));
        assert_eq!(router.route_count(), 1);

        router.remove_route(&authority);
        assert_eq!(router.route_count(), 0);
        assert!(router
            .find(&addr(b"p"), &authority)
            .await
            .unwrap()
            .is_none());
    }
}
