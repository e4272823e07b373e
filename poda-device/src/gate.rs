//! The pre-execution gate.
//!
//! At pass 1 the device inspects the inbound item before the executor runs:
//! user-submitted messages pass through untouched, process-originated
//! messages must carry a quorum of attestations. On success the attestations
//! are published into the VFS and one wrapping layer is stripped so the
//! executor sees the actual message; on failure a signed error item replaces
//! the outbox and execution is skipped.

use tracing::{debug, trace};

use poda_core::{Item, ItemData};

use crate::options::DeviceOptions;
use crate::state::{ExecState, Verdict, PASS_PRE_EXEC};
use crate::verify::{self, VerifyError};
use crate::wire;

/// Classify an item as user-originated or process-originated.
///
/// A mapping payload with a `"Message"` entry is inspected: the inner
/// message is process-originated iff it carries a `"From-Process"` tag. Any
/// other shape classifies as user-signed; this discriminator fails open, the
/// verifier is the enforcer for well-formed process messages.
pub fn is_user_signed(item: &Item) -> bool {
    match item.get(wire::KEY_MESSAGE) {
        Some(inner) => inner.tag_value(wire::TAG_FROM_PROCESS).is_none(),
        None => true,
    }
}

/// Device entry point for execution passes.
///
/// Pass 1 runs the gate; every other pass (including pass 3, post-results)
/// is a pass-through.
pub fn execute(
    outer: &Item,
    state: ExecState,
    options: &DeviceOptions,
) -> (Verdict, ExecState) {
    match state.pass {
        PASS_PRE_EXEC => gate(outer, state, options),
        pass => {
            trace!(pass, "pass-through");
            (Verdict::Ok, state)
        }
    }
}

fn gate(outer: &Item, mut state: ExecState, options: &DeviceOptions) -> (Verdict, ExecState) {
    let Some(message) = outer.get(wire::KEY_MESSAGE) else {
        // Nothing to gate; treated like a user message
        trace!("outer item carries no Message entry");
        return (Verdict::Ok, state);
    };

    if is_user_signed(message) {
        trace!("user-signed message, no validation required");
        return (Verdict::Ok, state);
    }

    let validated = match verify::verify_bundle(message, options) {
        Ok(validated) => validated,
        Err(err) => return error_skip(err, state),
    };

    // Publish each attestation's payload where the program can read it.
    // Later attestations by the same signer overwrite earlier ones.
    for (_, attestation) in &validated.attestations {
        if let Some(signer) = attestation.signer() {
            let path = format!("{}{}", wire::VFS_ATTESTATIONS_PREFIX, signer);
            state.vfs.insert(path, attestation.data_bytes());
        }
    }

    // Strip one wrapping layer: the outer item's Message becomes the
    // validated content, so the executor sees the actual message instead of
    // the attestation bundle around it.
    let mut unwrapped = outer.clone();
    if let ItemData::Map(entries) = &mut unwrapped.data {
        for (key, value) in entries.iter_mut() {
            if key == wire::KEY_MESSAGE {
                *value = validated.content.clone();
                break;
            }
        }
    }
    state.arg_prefix = vec![unwrapped];

    debug!(
        attestations = validated.attestations.len(),
        "bundle admitted"
    );
    (Verdict::Ok, state)
}

/// Produce the error-skip transition: a signed outbox item carrying the
/// rejection reason replaces `/Outbox`, and the runtime is told to bypass
/// execution. The error is deliverable downstream like any other output.
fn error_skip(err: VerifyError, mut state: ExecState) -> (Verdict, ExecState) {
    debug!(%err, "validation failed, skipping execution");
    let error_item = Item::builder()
        .tag(wire::TAG_ERROR, wire::ERROR_PODA)
        .data(err.reason())
        .sign(&state.wallet);
    state.replace_result(wire::OUTBOX, error_item);
    (Verdict::Skip, state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use poda_core::{encode, Wallet};
    use poda_net::{MemoryStore, MockNetwork, StaticRouter};

    use crate::options::DeviceOptions;
    use crate::state::PASS_POST_RESULTS;

    fn test_state(wallet: Wallet) -> ExecState {
        ExecState::new(
            wallet,
            Arc::new(MemoryStore::new()),
            Arc::new(StaticRouter::new()),
            Arc::new(MockNetwork::new()),
        )
        .with_pass(PASS_PRE_EXEC)
    }

    fn options_for(wallets: &[&Wallet], quorum: u32, local: &Wallet) -> DeviceOptions {
        let mut tags: Vec<poda_core::Tag> = wallets
            .iter()
            .map(|w| poda_core::Tag::new(wire::TAG_AUTHORITY, w.address().as_bytes().to_vec()))
            .collect();
        tags.push(poda_core::Tag::new(wire::TAG_QUORUM, quorum.to_string()));
        DeviceOptions::from_tags(&tags, local).unwrap()
    }

    fn attest(message: &Item, wallet: &Wallet) -> Item {
        Item::builder()
            .tag(
                wire::TAG_ATTESTATION_FOR,
                encode(message.unsigned_id().as_bytes()),
            )
            .sign(wallet)
    }

    /// A process-originated content item.
    fn process_content(data: &[u8]) -> Item {
        Item::builder()
            .tag(wire::TAG_FROM_PROCESS, "sender-process")
            .data(data)
            .build()
    }

    /// Content -> attestation bundle -> outer envelope.
    fn wrap(content: Item, attestations: Vec<(&str, Item)>) -> Item {
        let mut set = Item::builder();
        for (key, att) in attestations {
            set = set.entry(key, att);
        }
        let bundle = Item::builder()
            .entry(wire::KEY_MESSAGE, content)
            .entry(wire::KEY_ATTESTATIONS, set.build())
            .build();
        Item::builder().entry(wire::KEY_MESSAGE, bundle).build()
    }

    #[test]
    fn test_user_signed_discriminator() {
        // No From-Process tag on the inner message: user-signed
        let user = Item::builder()
            .entry(wire::KEY_MESSAGE, Item::builder().data(b"hi").build())
            .build();
        assert!(is_user_signed(&user));

        // From-Process present: process-originated
        let process = Item::builder()
            .entry(
                wire::KEY_MESSAGE,
                Item::builder()
                    .tag(wire::TAG_FROM_PROCESS, "sender")
                    .data(b"hi")
                    .build(),
            )
            .build();
        assert!(!is_user_signed(&process));

        // Any other shape fails open
        assert!(is_user_signed(&Item::builder().data(b"opaque").build()));
    }

    #[test]
    fn test_user_message_passes_unchanged() {
        let wallet = Wallet::generate();
        let options = options_for(&[&Wallet::generate()], 1, &wallet);
        let state = test_state(wallet);

        let inner = Item::builder().data(b"user payload").build();
        let bundle = Item::builder().entry(wire::KEY_MESSAGE, inner).build();
        let outer = Item::builder().entry(wire::KEY_MESSAGE, bundle).build();

        let (verdict, after) = execute(&outer, state, &options);

        assert_eq!(verdict, Verdict::Ok);
        assert!(after.vfs.is_empty());
        assert!(after.arg_prefix.is_empty());
        assert!(after.results.is_none());
    }

    #[test]
    fn test_other_passes_are_noops() {
        let wallet = Wallet::generate();
        let options = options_for(&[&Wallet::generate()], 1, &wallet);

        // A process message that would fail validation at pass 1
        let outer = wrap(process_content(b"payload"), vec![]);

        for pass in [0, 2, PASS_POST_RESULTS, 7] {
            let state = test_state(Wallet::generate()).with_pass(pass);
            let (verdict, after) = execute(&outer, state, &options);
            assert_eq!(verdict, Verdict::Ok);
            assert!(after.results.is_none());
        }
    }

    #[test]
    fn test_admitted_bundle_publishes_vfs_and_unwraps() {
        let a = Wallet::generate();
        let b = Wallet::generate();
        let local = Wallet::generate();
        let options = options_for(&[&a, &b], 2, &local);

        let content = process_content(b"2 + 2");
        let outer = wrap(
            content.clone(),
            vec![("1", attest(&content, &a)), ("2", attest(&content, &b))],
        );

        let (verdict, after) = execute(&outer, test_state(local), &options);

        assert_eq!(verdict, Verdict::Ok);
        assert!(after
            .vfs
            .contains_key(&format!("{}{}", wire::VFS_ATTESTATIONS_PREFIX, a.address())));
        assert!(after
            .vfs
            .contains_key(&format!("{}{}", wire::VFS_ATTESTATIONS_PREFIX, b.address())));
        assert_eq!(after.vfs.len(), 2);

        // One wrapping layer stripped: the unwrapped outer's Message is the
        // validated content, not the attestation bundle
        assert_eq!(after.arg_prefix.len(), 1);
        let unwrapped = &after.arg_prefix[0];
        assert_eq!(
            unwrapped.get(wire::KEY_MESSAGE).map(|i| i.unsigned_id()),
            Some(content.unsigned_id())
        );
    }

    #[test]
    fn test_quorum_failure_writes_error_outbox() {
        let a = Wallet::generate();
        let b = Wallet::generate();
        let local = Wallet::generate();
        let options = options_for(&[&a, &b], 3, &local);
        let local_address = local.address();

        let content = process_content(b"payload");
        let outer = wrap(
            content.clone(),
            vec![("1", attest(&content, &a)), ("2", attest(&content, &b))],
        );

        let (verdict, after) = execute(&outer, test_state(local), &options);

        assert_eq!(verdict, Verdict::Skip);
        let error = after.result(wire::OUTBOX).unwrap();
        assert!(error.has_tag(wire::TAG_ERROR, wire::ERROR_PODA));
        assert_eq!(error.as_bytes(), Some(b"Not enough validations".as_slice()));
        assert!(error.verify());
        assert_eq!(error.signer(), Some(local_address));
    }

    #[test]
    fn test_malformed_bundle_writes_error_outbox() {
        let local = Wallet::generate();
        let options = options_for(&[&Wallet::generate()], 1, &local);

        // Process-originated but no Attestations entry at all
        let bundle = Item::builder()
            .entry(wire::KEY_MESSAGE, process_content(b"payload"))
            .build();
        let outer = Item::builder().entry(wire::KEY_MESSAGE, bundle).build();

        let (verdict, after) = execute(&outer, test_state(local), &options);

        assert_eq!(verdict, Verdict::Skip);
        let error = after.result(wire::OUTBOX).unwrap();
        assert_eq!(
            error.as_bytes(),
            Some(b"Required PoDA messages missing".as_slice())
        );
    }
}
