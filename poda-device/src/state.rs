//! Execution state threaded through the device.
//!
//! The runtime advances a process through numbered passes and hands the
//! device an `ExecState` it owns exclusively for the duration of each call.
//! The device reads and writes a handful of well-known slots; everything
//! else rides along untouched in the extension area.

use std::collections::BTreeMap;
use std::sync::Arc;

use poda_core::{Item, ItemData, Wallet};
use poda_net::{ComputeClient, ComputeRouter, MessageStore};

/// Pass at which the pre-execution gate runs.
pub const PASS_PRE_EXEC: u32 = 1;
/// Pass after results are produced; the device no-ops here (attestation of
/// outputs happens on the push path).
pub const PASS_POST_RESULTS: u32 = 3;

/// Outcome of a device call, as seen by the runtime's execution driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Proceed with execution.
    Ok,
    /// Bypass execution; the error outbox carries the reason downstream.
    Skip,
}

/// Per-call execution state.
#[derive(Clone)]
pub struct ExecState {
    /// Current pass of the execution pipeline.
    pub pass: u32,
    /// Virtual filesystem the executing program may read.
    pub vfs: BTreeMap<String, Vec<u8>>,
    /// Items prepended to the executor's argument list.
    pub arg_prefix: Vec<Item>,
    /// The node's signing wallet.
    pub wallet: Wallet,
    /// The scheduler's assignment item, carried through.
    pub assignment: Option<Item>,
    /// Execution results: an item whose data maps virtual output paths
    /// (`/Outbox`, `/Spawn`, ...) to containers of outbound messages.
    pub results: Option<Item>,
    /// Cached-message reader.
    pub store: Arc<dyn MessageStore>,
    /// Compute-node resolver.
    pub router: Arc<dyn ComputeRouter>,
    /// Peer attestation client.
    pub client: Arc<dyn ComputeClient>,
    /// Opaque slots owned by other devices.
    pub ext: BTreeMap<String, Vec<u8>>,
}

impl ExecState {
    /// Create a fresh state at pass 0.
    pub fn new(
        wallet: Wallet,
        store: Arc<dyn MessageStore>,
        router: Arc<dyn ComputeRouter>,
        client: Arc<dyn ComputeClient>,
    ) -> Self {
        Self {
            pass: 0,
            vfs: BTreeMap::new(),
            arg_prefix: Vec::new(),
            wallet,
            assignment: None,
            results: None,
            store,
            router,
            client,
            ext: BTreeMap::new(),
        }
    }

    /// Set the current pass.
    pub fn with_pass(mut self, pass: u32) -> Self {
        self.pass = pass;
        self
    }

    /// Set the scheduler assignment.
    pub fn with_assignment(mut self, assignment: Item) -> Self {
        self.assignment = Some(assignment);
        self
    }

    /// Set the results item.
    pub fn with_results(mut self, results: Item) -> Self {
        self.results = Some(results);
        self
    }

    /// Replace (or create) the entry at a virtual output path in `results`.
    pub fn replace_result(&mut self, path: &str, item: Item) {
        let results = self.results.get_or_insert_with(|| Item {
            target: None,
            tags: Vec::new(),
            data: ItemData::Map(Vec::new()),
            seal: None,
        });
        let key = path.as_bytes().to_vec();
        match &mut results.data {
            ItemData::Map(entries) => {
                if let Some(entry) = entries.iter_mut().find(|(k, _)| *k == key) {
                    entry.1 = item;
                } else {
                    entries.push((key, item));
                }
            }
            ItemData::Bytes(_) => {
                results.data = ItemData::Map(vec![(key, item)]);
            }
        }
    }

    /// Read back a results entry by virtual output path.
    pub fn result(&self, path: &str) -> Option<&Item> {
        self.results.as_ref()?.get(path)
    }
}

impl std::fmt::Debug for ExecState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecState")
            .field("pass", &self.pass)
            .field("vfs_entries", &self.vfs.len())
            .field("arg_prefix", &self.arg_prefix.len())
            .field("wallet", &self.wallet.address())
            .field("assignment", &self.assignment.is_some())
            .field("results", &self.results.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poda_net::{MemoryStore, MockNetwork, StaticRouter};

    fn test_state() -> ExecState {
        ExecState::new(
            Wallet::generate(),
            Arc::new(MemoryStore::new()),
            Arc::new(StaticRouter::new()),
            Arc::new(MockNetwork::new()),
        )
    }

    #[test]
    fn test_replace_result_creates_results() {
        let mut state = test_state();
        assert!(state.results.is_none());

        let item = Item::builder().data(b"error").build();
        state.replace_result("/Outbox", item.clone());

        assert_eq!(
            state.result("/Outbox").map(|i| i.unsigned_id()),
            Some(item.unsigned_id())
        );
    }

    #[test]
    fn test_replace_result_overwrites() {
        let mut state = test_state();
        state.replace_result("/Outbox", Item::builder().data(b"first").build());
        state.replace_result("/Outbox", Item::builder().data(b"second").build());

        let entry = state.result("/Outbox").unwrap();
        assert_eq!(entry.as_bytes(), Some(b"second".as_slice()));

        // Only one entry under the path
        let map = state.results.as_ref().unwrap().as_map().unwrap();
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_with_builders() {
        let state = test_state()
            .with_pass(PASS_PRE_EXEC)
            .with_assignment(Item::builder().data(b"assignment").build());

        assert_eq!(state.pass, PASS_PRE_EXEC);
        assert!(state.assignment.is_some());
    }

    #[test]
    fn test_debug_redacts_handles() {
        let state = test_state();
        let debug = format!("{:?}", state);
        assert!(debug.contains("pass"));
        assert!(!debug.contains("MemoryStore"));
    }
}
