//! Collaborator contracts consumed by the PoDA device.
//!
//! The device's view of the outside world is three narrow traits:
//!
//! - [`store::MessageStore`] - read cached process definitions
//! - [`router::ComputeRouter`] - resolve (process, authority) to a node
//! - [`client::ComputeClient`] - request attestations from peer nodes
//!
//! Reference implementations live alongside the traits: an in-memory store
//! and routing table for embedding, and [`mock`] compute nodes that sign
//! real attestations for tests.

pub mod client;
pub mod mock;
pub mod router;
pub mod store;

pub use client::{ClientError, ComputeClient, ComputeNode};
pub use mock::{MockComputeNode, MockNetwork, MockNodeConfig};
pub use router::{ComputeRouter, StaticRouter};
pub use store::{MemoryStore, MessageStore};
