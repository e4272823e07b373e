//! The attestation aggregator.
//!
//! After a program has produced results, every outbound message whose target
//! process is PoDA-governed is wrapped in an attestation bundle: the local
//! node signs its own attestation, peers responsible for the process's
//! authorities are polled in parallel for theirs, and the collected set
//! rides alongside the message on the wire.

use tracing::{debug, trace, warn};

use poda_core::{encode, Address, Item, ItemData};
use poda_net::MessageStore;

use crate::options::DeviceOptions;
use crate::poller::{poll_parallel, PollerConfig};
use crate::state::ExecState;
use crate::wire;

/// Outcome of resolving an item's process definition.
#[derive(Debug, Clone)]
pub enum ProcessLookup {
    /// The process definition.
    Found(Item),
    /// The item names no process (empty target, not self-describing).
    NotSpecified,
    /// The target names a process the cache does not hold.
    NotFound,
}

/// Resolve the process definition governing an item.
///
/// A non-empty target is looked up in the message cache; an item tagged
/// `("Type", "Process")` is its own definition; anything else is
/// unspecified. Callers treat everything but `Found` as "skip attestation
/// wrapping".
pub async fn find_process(item: &Item, store: &dyn MessageStore) -> ProcessLookup {
    if let Some(target) = &item.target {
        return match store.read_message(target).await {
            Ok(Some(process)) => ProcessLookup::Found(process),
            Ok(None) => {
                trace!(target = %target, "target process not cached");
                ProcessLookup::NotFound
            }
            Err(e) => {
                warn!(target = %target, error = %e, "process lookup failed");
                ProcessLookup::NotFound
            }
        };
    }
    if item.has_tag(wire::TAG_TYPE, wire::TYPE_PROCESS) {
        return ProcessLookup::Found(item.clone());
    }
    ProcessLookup::NotSpecified
}

/// Rewrite the results of an execution, wrapping outbound messages bound for
/// PoDA-governed processes in attestation bundles.
///
/// Only the `/Outbox` and `/Spawn` output paths are rewritten; every other
/// results entry passes through unmodified.
pub async fn push(item: &Item, mut state: ExecState, config: &PollerConfig) -> ExecState {
    trace!(item = %item, "push");
    let Some(mut results) = state.results.take() else {
        return state;
    };

    if let ItemData::Map(entries) = &mut results.data {
        for (path, container) in entries.iter_mut() {
            if path != wire::OUTBOX.as_bytes() && path != wire::SPAWN.as_bytes() {
                continue;
            }
            let ItemData::Map(messages) = &mut container.data else {
                continue;
            };
            for (_, message) in messages.iter_mut() {
                let original = std::mem::replace(message, Item::builder().build());
                *message = add_attestations(original, &state, config).await;
            }
        }
    }

    state.results = Some(results);
    state
}

/// Wrap one outbound message in an attestation bundle, if its target process
/// is PoDA-governed. Anything that prevents wrapping (no process, non-PoDA
/// process, unparseable options) returns the message unchanged.
pub async fn add_attestations(
    message: Item,
    state: &ExecState,
    config: &PollerConfig,
) -> Item {
    let process = match find_process(&message, state.store.as_ref()).await {
        ProcessLookup::Found(process) => process,
        ProcessLookup::NotSpecified | ProcessLookup::NotFound => return message,
    };

    if !process.has_tag(wire::TAG_DEVICE, wire::DEVICE_PODA) {
        return message;
    }

    let options = match DeviceOptions::from_tags(&process.tags, &state.wallet) {
        Ok(options) => options,
        Err(e) => {
            warn!(error = %e, "target process declares PODA but its options are invalid");
            return message;
        }
    };

    let process_id = Address::from_hash(&process.unsigned_id());
    let peer_attestations =
        poll_peer_attestations(&options, &process_id, state, config).await;

    // The local attestation binds to the outbound message by id
    let local = Item::builder()
        .tag(
            wire::TAG_ATTESTATION_FOR,
            encode(message.unsigned_id().as_bytes()),
        )
        .sign(&state.wallet);

    // Stable decimal indices assigned after the join, local first
    let mut set = Item::builder();
    for (index, attestation) in std::iter::once(local)
        .chain(peer_attestations)
        .enumerate()
    {
        set = set.entry((index + 1).to_string(), attestation);
    }
    let complete = set.sign(&state.wallet);

    let mut bundle = Item::builder()
        .entry(wire::KEY_ATTESTATIONS, complete)
        .entry(wire::KEY_MESSAGE, message.clone());
    if let Some(target) = &message.target {
        bundle = bundle.target(target.clone());
    }
    let bundle = bundle.sign(&state.wallet);

    debug!(message = %message, bundle = %bundle, "outbound message wrapped");
    bundle
}

/// Poll the compute node of every remote authority for its attestation.
///
/// The local address never appears in the poll list (the local attestation
/// is produced exactly once, by signing). Routing misses, client failures,
/// and deadline expiries drop that authority.
async fn poll_peer_attestations(
    options: &DeviceOptions,
    process_id: &Address,
    state: &ExecState,
    config: &PollerConfig,
) -> Vec<Item> {
    let Some(assignment) = &state.assignment else {
        debug!("no assignment in state, skipping peer poll");
        return Vec::new();
    };
    let assignment_id = Address::from_hash(&assignment.unsigned_id());

    let local = state.wallet.address();
    let peers: Vec<Address> = options
        .authorities
        .distinct()
        .into_iter()
        .filter(|authority| *authority != local)
        .collect();

    poll_parallel(peers, config, |authority| {
        let router = state.router.clone();
        let client = state.client.clone();
        let process_id = process_id.clone();
        let assignment_id = assignment_id.clone();
        async move {
            let node = match router.find(&process_id, &authority).await {
                Ok(Some(node)) => node,
                Ok(None) => {
                    trace!(authority = %authority, "no route to authority");
                    return None;
                }
                Err(e) => {
                    debug!(authority = %authority, error = %e, "router failure");
                    return None;
                }
            };
            match client.compute(&node, &process_id, &assignment_id).await {
                Ok(attestation) => Some(attestation),
                Err(e) => {
                    debug!(authority = %authority, node = %node, error = %e, "peer poll failed");
                    None
                }
            }
        }
    })
    .await
}
