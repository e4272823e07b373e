//! Wire vocabulary: tag names, map keys, and output paths.

/// Multi-valued process tag declaring an authority signer.
pub const TAG_AUTHORITY: &[u8] = b"Authority";
/// Process tag declaring the admission threshold (decimal integer).
pub const TAG_QUORUM: &[u8] = b"Quorum";
/// Process tag selecting the governing device.
pub const TAG_DEVICE: &[u8] = b"Device";
/// `Device` tag value marking a PoDA-governed process.
pub const DEVICE_PODA: &[u8] = b"PODA";
/// Item tag marking a self-describing process definition.
pub const TAG_TYPE: &[u8] = b"Type";
/// `Type` tag value for process definitions.
pub const TYPE_PROCESS: &[u8] = b"Process";
/// Attestation tag binding the claim to an encoded unsigned id.
pub const TAG_ATTESTATION_FOR: &[u8] = b"Attestation-For";
/// Presence marks a message as process-originated.
pub const TAG_FROM_PROCESS: &[u8] = b"From-Process";
/// Tag on error-skip outbox items.
pub const TAG_ERROR: &[u8] = b"Error";
/// `Error` tag value for this device's rejections.
pub const ERROR_PODA: &[u8] = b"PoDA";

/// Bundle map key holding the message payload.
pub const KEY_MESSAGE: &[u8] = b"Message";
/// Bundle map key holding the attestation set.
pub const KEY_ATTESTATIONS: &[u8] = b"Attestations";

/// Virtual output path for outbound messages.
pub const OUTBOX: &str = "/Outbox";
/// Virtual output path for process spawns.
pub const SPAWN: &str = "/Spawn";
/// VFS prefix under which attestation payloads are published, one entry per
/// encoded signer.
pub const VFS_ATTESTATIONS_PREFIX: &str = "/Attestations/";
