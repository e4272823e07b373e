//! Fundamental types for the PoDA consensus device.
//!
//! This crate provides the data structures and cryptographic primitives the
//! device is built on:
//!
//! - [`crypto`] - Hashing (BLAKE3), signatures (Ed25519), base64-url addresses
//! - [`item`] - Bundle items (the universal transport envelope)
//! - [`error`] - Structured errors shared across the workspace
//!
//! # Example
//!
//! ```rust
//! use poda_core::{crypto::Wallet, item::Item};
//!
//! let wallet = Wallet::generate();
//!
//! // A signed message item
//! let msg = Item::builder()
//!     .tag("Action", "Transfer")
//!     .data(b"payload".as_slice())
//!     .sign(&wallet);
//!
//! assert!(msg.verify());
//! assert_eq!(msg.signer(), Some(wallet.address()));
//! ```

pub mod crypto;
pub mod error;
pub mod item;

// Re-exports for convenience
pub use crypto::{decode, encode, hash, Address, Hash, PublicKey, Sig, Wallet};
pub use error::{Error, ErrorCode, Result};
pub use item::{Item, ItemBuilder, ItemData, Seal, Tag};
