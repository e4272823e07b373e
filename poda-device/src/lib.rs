//! The Proof of Decentralized Authority (PoDA) consensus device.
//!
//! Processes in the enclosing compute runtime execute arbitrary messages;
//! this device gates execution by requiring that each inbound process
//! message carry a quorum of attestations from the process's declared
//! authority signers, and wraps each outbound message bound for a
//! PoDA-governed process in a freshly aggregated attestation bundle.
//!
//! The device acts at two points of the runtime's pipeline:
//!
//! - [`gate::execute`] at pass 1 - validate inbound bundles, publish
//!   attestations into the VFS, unwrap the message for the executor, or
//!   skip execution with a signed error outbox
//! - [`push::push`] after results - fan out to peer compute nodes, collect
//!   their attestations alongside the local one, and rewrite `/Outbox` and
//!   `/Spawn` messages as attestation bundles
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use poda_core::{Item, Tag, Wallet};
//! use poda_device::{DeviceTable, ExecState, PodaDevice};
//! use poda_net::{MemoryStore, MockNetwork, StaticRouter};
//!
//! # fn main() -> poda_core::Result<()> {
//! let state = ExecState::new(
//!     Wallet::generate(),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(StaticRouter::new()),
//!     Arc::new(MockNetwork::new()),
//! );
//!
//! // Initialize from the process's declared tags and register
//! let tags = vec![
//!     Tag::new("Authority", "xSM16hapDjrAt2oTpdJvRr22haOdjNzJtLM78bQyJPk"),
//!     Tag::new("Quorum", "1"),
//! ];
//! let (state, device) = PodaDevice::init(state, &tags)?;
//!
//! let mut table = DeviceTable::new();
//! table.register(Arc::new(device));
//! # let _ = (state, table);
//! # Ok(())
//! # }
//! ```

pub mod device;
pub mod gate;
pub mod options;
pub mod poller;
pub mod push;
pub mod state;
pub mod verify;
pub mod wire;

// Re-exports for convenience
pub use device::{Device, DeviceTable, PodaDevice};
pub use gate::{execute, is_user_signed};
pub use options::{AuthoritySet, DeviceOptions};
pub use poller::{poll_parallel, PollerConfig};
pub use push::{add_attestations, find_process, push, ProcessLookup};
pub use state::{ExecState, Verdict, PASS_POST_RESULTS, PASS_PRE_EXEC};
pub use verify::{binds_to, verify_bundle, Validated, VerifyError};
