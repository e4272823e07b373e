//! The attestation verifier.
//!
//! Three stages, short-circuited on first failure:
//!
//! 1. Structural - the bundle must carry both `"Attestations"` and
//!    `"Message"`
//! 2. Cryptographic - every attestation's seal must verify
//! 3. Authority & quorum - count attestations whose signer is a declared
//!    authority and whose claim binds to the message; admit when the count
//!    of distinct signers reaches the quorum
//!
//! A failure is not exceptional: the caller turns it into a signed error
//! outbox item and skips execution.

use std::collections::HashSet;

use tracing::debug;

use poda_core::{encode, Hash, Item};

use crate::options::DeviceOptions;
use crate::wire;

/// A rejected bundle, with the reason bytes delivered downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// The bundle is missing `"Attestations"` or `"Message"`.
    #[error("required PoDA messages missing")]
    MalformedBundle,

    /// At least one attestation's seal does not verify.
    #[error("invalid attestations")]
    BadSignature,

    /// Fewer distinct valid attestations than the quorum.
    #[error("not enough validations")]
    QuorumUnmet,
}

impl VerifyError {
    /// The exact reason bytes carried in the error outbox item.
    pub fn reason(&self) -> &'static [u8] {
        match self {
            VerifyError::MalformedBundle => b"Required PoDA messages missing",
            VerifyError::BadSignature => b"Invalid attestations",
            VerifyError::QuorumUnmet => b"Not enough validations",
        }
    }
}

/// A bundle that passed all three stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    /// The content item the program will execute.
    pub content: Item,
    /// The attestation set, keys preserved.
    pub attestations: Vec<(Vec<u8>, Item)>,
}

/// Extract the attestation set and content from a bundle's data mapping.
///
/// The `"Attestations"` value is an item whose data is the set; it may be
/// wrapped one level deeper when the bundle was packaged inside another
/// envelope carrying routing metadata.
fn unwrap_bundle(outer: &Item) -> Option<(Vec<(Vec<u8>, Item)>, Item)> {
    let attestations = outer.get(wire::KEY_ATTESTATIONS)?;
    let content = outer.get(wire::KEY_MESSAGE)?.clone();

    let set_item = match attestations.get(wire::KEY_ATTESTATIONS) {
        Some(inner) if inner.as_map().is_some() => inner,
        _ => attestations,
    };
    let set = set_item.as_map()?.to_vec();

    Some((set, content))
}

/// True if the attestation's claim binds to the given unsigned id.
///
/// The three acceptable forms: the attestation *is* the same canonical
/// content; it names the id in an `"Attestation-For"` tag; or it
/// transitively contains an item with that unsigned id.
pub fn binds_to(attestation: &Item, id: &Hash) -> bool {
    if attestation.unsigned_id() == *id {
        return true;
    }
    if attestation.tag_value(wire::TAG_ATTESTATION_FOR)
        == Some(encode(id.as_bytes()).as_bytes())
    {
        return true;
    }
    attestation.member(id)
}

/// Run the three-stage verifier against a message bundle.
pub fn verify_bundle(outer: &Item, options: &DeviceOptions) -> Result<Validated, VerifyError> {
    // Stage 1: structural
    let Some((attestations, content)) = unwrap_bundle(outer) else {
        debug!("bundle rejected: missing Attestations or Message");
        return Err(VerifyError::MalformedBundle);
    };

    // Stage 2: cryptographic
    if !attestations.iter().all(|(_, att)| att.verify()) {
        debug!("bundle rejected: attestation signature failure");
        return Err(VerifyError::BadSignature);
    }

    // Stage 3: authority & quorum. Stage 2 already verified every seal and
    // the set has not been touched since, so only signer membership and
    // relevance are evaluated here. Distinct signers only: a single
    // authority must not satisfy quorum by replaying its attestation.
    let content_id = content.unsigned_id();
    let mut counted = HashSet::new();
    for (_, att) in &attestations {
        let Some(signer) = att.signer() else {
            continue;
        };
        if !options.authorities.contains(&signer) {
            debug!(signer = %signer, "attestation from non-authority signer dropped");
            continue;
        }
        if !binds_to(att, &content_id) {
            debug!(signer = %signer, "attestation does not bind to message, dropped");
            continue;
        }
        counted.insert(signer);
    }

    if (counted.len() as u32) < options.quorum {
        debug!(
            counted = counted.len(),
            quorum = options.quorum,
            "bundle rejected: quorum unmet"
        );
        return Err(VerifyError::QuorumUnmet);
    }

    Ok(Validated {
        content,
        attestations,
    })
}
