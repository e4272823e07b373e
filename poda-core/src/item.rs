//! The bundle item: the universal transport envelope.
//!
//! An item carries a routing `target`, an ordered sequence of name/value
//! `tags`, and a `data` payload that is either opaque bytes or a mapping of
//! byte-string keys to nested items. Items are content-addressed: the
//! unsigned id hashes the canonical form without the seal, the signed id
//! hashes it with the seal included. Attestations, messages, and attestation
//! bundles are all items.

use serde::{Deserialize, Serialize};

use crate::crypto::{hash, Address, Hash, PublicKey, Sig, Wallet};

/// A name/value tag pair. Both sides are byte strings; names may repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: Vec<u8>,
    pub value: Vec<u8>,
}

impl Tag {
    /// Create a new tag.
    pub fn new(name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Item payload: opaque bytes, or a mapping of keys to nested items.
///
/// Map entries preserve insertion order; the canonical form sorts them by
/// key (see [`Item::normalize`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemData {
    Bytes(Vec<u8>),
    Map(Vec<(Vec<u8>, Item)>),
}

impl ItemData {
    /// Empty byte payload.
    pub fn empty() -> Self {
        ItemData::Bytes(Vec::new())
    }
}

/// A signature seal: the signing key and the signature over the item's
/// unsigned canonical form. The signer address is derivable from the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seal {
    pub signer: PublicKey,
    pub signature: Sig,
}

/// The transport envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Routing target (an address or message-id reference), if any.
    pub target: Option<Address>,
    /// Ordered tag sequence.
    pub tags: Vec<Tag>,
    /// Payload.
    pub data: ItemData,
    /// Signature seal, present once signed.
    pub seal: Option<Seal>,
}

/// Canonical view serialized for ids and signing (seal excluded).
#[derive(Serialize)]
struct UnsignedView<'a> {
    target: &'a Option<Address>,
    tags: &'a [Tag],
    data: &'a ItemData,
}

impl Item {
    /// Start building an item.
    pub fn builder() -> ItemBuilder {
        ItemBuilder::default()
    }

    // ------------------------------------------------------------------
    // Canonical form and ids
    // ------------------------------------------------------------------

    /// Canonical bytes of the item excluding the seal.
    ///
    /// Map entries are serialized in key-sorted order regardless of the
    /// in-memory entry order, so the result is normalization-independent.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let normalized = self.clone().normalized();
        let view = UnsignedView {
            target: &normalized.target,
            tags: &normalized.tags,
            data: &normalized.data,
        };
        bincode::serialize(&view).expect("canonical serialization cannot fail")
    }

    /// Content hash over the canonical form excluding the seal.
    pub fn unsigned_id(&self) -> Hash {
        hash(&self.canonical_bytes())
    }

    /// Content hash over the canonical form including the seal.
    pub fn signed_id(&self) -> Hash {
        let mut bytes = self.canonical_bytes();
        if let Some(seal) = &self.seal {
            bytes.extend_from_slice(&seal.signer.as_bytes());
            bytes.extend_from_slice(&seal.signature.to_bytes());
        }
        hash(&bytes)
    }

    /// Recursively sort map entries by key, yielding the canonical wire
    /// ordering. Byte payloads and tag order are untouched.
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// In-place variant of [`Item::normalized`].
    pub fn normalize(&mut self) {
        if let ItemData::Map(entries) = &mut self.data {
            for (_, item) in entries.iter_mut() {
                item.normalize();
            }
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        }
    }

    // ------------------------------------------------------------------
    // Signing
    // ------------------------------------------------------------------

    /// Normalize and seal the item with the given wallet.
    pub fn sign(mut self, wallet: &Wallet) -> Self {
        self.normalize();
        let signature = wallet.sign(&self.canonical_bytes());
        self.seal = Some(Seal {
            signer: wallet.public_key(),
            signature,
        });
        self
    }

    /// Check the seal against the unsigned canonical form.
    ///
    /// Unsigned items verify as false.
    pub fn verify(&self) -> bool {
        match &self.seal {
            Some(seal) => seal
                .signer
                .verify(&self.canonical_bytes(), &seal.signature)
                .is_ok(),
            None => false,
        }
    }

    /// The sealing key's address, if the item is signed.
    pub fn signer(&self) -> Option<Address> {
        self.seal.as_ref().map(|s| s.signer.address())
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// True if `id` is the unsigned id of this item or of any transitively
    /// nested item.
    pub fn member(&self, id: &Hash) -> bool {
        if self.unsigned_id() == *id {
            return true;
        }
        match &self.data {
            ItemData::Bytes(_) => false,
            ItemData::Map(entries) => entries.iter().any(|(_, item)| item.member(id)),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Byte payload, if the data is bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.data {
            ItemData::Bytes(b) => Some(b),
            ItemData::Map(_) => None,
        }
    }

    /// Map entries, if the data is a mapping.
    pub fn as_map(&self) -> Option<&[(Vec<u8>, Item)]> {
        match &self.data {
            ItemData::Bytes(_) => None,
            ItemData::Map(entries) => Some(entries),
        }
    }

    /// Look up a nested item by map key.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&Item> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k == key.as_ref())
            .map(|(_, item)| item)
    }

    /// The payload as flat bytes: byte payloads as-is, map payloads in
    /// canonical bincode.
    pub fn data_bytes(&self) -> Vec<u8> {
        match &self.data {
            ItemData::Bytes(b) => b.clone(),
            ItemData::Map(_) => {
                let normalized = self.clone().normalized();
                bincode::serialize(&normalized.data)
                    .expect("canonical serialization cannot fail")
            }
        }
    }

    /// First value of the named tag.
    pub fn tag_value(&self, name: impl AsRef<[u8]>) -> Option<&[u8]> {
        self.tags
            .iter()
            .find(|t| t.name == name.as_ref())
            .map(|t| t.value.as_slice())
    }

    /// All values of the named tag, in tag order.
    pub fn tag_values(&self, name: impl AsRef<[u8]>) -> Vec<&[u8]> {
        self.tags
            .iter()
            .filter(|t| t.name == name.as_ref())
            .map(|t| t.value.as_slice())
            .collect()
    }

    /// True if a tag with this exact name and value is present.
    pub fn has_tag(&self, name: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> bool {
        self.tags
            .iter()
            .any(|t| t.name == name.as_ref() && t.value == value.as_ref())
    }
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shape = match &self.data {
            ItemData::Bytes(b) => format!("bytes[{}]", b.len()),
            ItemData::Map(entries) => format!("map[{}]", entries.len()),
        };
        write!(
            f,
            "Item(id={}, target={}, tags={}, data={}, signed={})",
            Address::from_hash(&self.unsigned_id()),
            self.target
                .as_ref()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".into()),
            self.tags.len(),
            shape,
            self.seal.is_some(),
        )
    }
}

/// Builder for items.
#[derive(Default)]
pub struct ItemBuilder {
    target: Option<Address>,
    tags: Vec<Tag>,
    data: Option<ItemData>,
}

impl ItemBuilder {
    /// Set the routing target.
    pub fn target(mut self, target: Address) -> Self {
        self.target = Some(target);
        self
    }

    /// Append a tag.
    pub fn tag(mut self, name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        self.tags.push(Tag::new(name, value));
        self
    }

    /// Set a byte payload.
    pub fn data(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.data = Some(ItemData::Bytes(bytes.into()));
        self
    }

    /// Append a map entry (switches the payload to a mapping).
    pub fn entry(mut self, key: impl Into<Vec<u8>>, item: Item) -> Self {
        let entry = (key.into(), item);
        self.data = Some(match self.data.take() {
            Some(ItemData::Map(mut entries)) => {
                entries.push(entry);
                ItemData::Map(entries)
            }
            _ => ItemData::Map(vec![entry]),
        });
        self
    }

    /// Build an unsigned item. Missing data defaults to empty bytes.
    pub fn build(self) -> Item {
        Item {
            target: self.target,
            tags: self.tags,
            data: self.data.unwrap_or_else(ItemData::empty),
            seal: None,
        }
    }

    /// Build, normalize, and sign.
    pub fn sign(self, wallet: &Wallet) -> Item {
        self.build().sign(wallet)
    }
}
