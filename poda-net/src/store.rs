//! Message store contract.
//!
//! The runtime caches process definitions and other messages by their
//! encoded id; the device only ever reads from the cache (resolving a
//! message target to its process definition).

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use poda_core::{Address, Item, Result};

/// Read access to the runtime's message cache.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Fetch a cached message by its encoded id.
    ///
    /// `Ok(None)` is a cache miss, not an error.
    async fn read_message(&self, id: &Address) -> Result<Option<Item>>;
}

/// In-memory message store for embedding and tests.
pub struct MemoryStore {
    messages: RwLock<HashMap<Address, Item>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(HashMap::new()),
        }
    }

    /// Cache an item under its encoded unsigned id, returning that id.
    pub fn put(&self, item: Item) -> Address {
        let id = Address::from_hash(&item.unsigned_id());
        self.messages.write().insert(id.clone(), item);
        id
    }

    /// Cache an item under an explicit id.
    pub fn put_as(&self, id: Address, item: Item) {
        self.messages.write().insert(id, item);
    }

    /// Number of cached messages.
    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn read_message(&self, id: &Address) -> Result<Option<Item>> {
        Ok(self.messages.read().get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poda_core::Item;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        let item = Item::builder().tag("Type", "Process").build();
        let id = store.put(item.clone());

        assert_eq!(store.len(), 1);
        let fetched = store.read_message(&id).await.unwrap().unwrap();
        assert_eq!(fetched.unsigned_id(), item.unsigned_id());
    }

    #[tokio::test]
    async fn test_memory_store_miss() {
        let store = MemoryStore::new();
        let id = Address::from_hash(&poda_core::hash(b"missing"));
        assert!(store.read_message(&id).await.unwrap().is_none());
    }
}
