//! Device options parsed from a process's tag sequence.
//!
//! A PoDA-governed process declares its authority signers with multi-valued
//! `"Authority"` tags and its admission threshold with a single `"Quorum"`
//! tag. The local wallet's address is always appended to the authority list:
//! the node running the process implicitly self-authorizes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use poda_core::{Address, Error, Result, Tag, Wallet};

use crate::wire;

/// The set of authority signers declared by a process.
///
/// The ordered list preserves declaration order and multiplicity; the lookup
/// set answers membership in O(1).
#[derive(Debug, Clone, Serialize)]
pub struct AuthoritySet {
    /// Ordered list of authority addresses, as declared.
    authorities: Vec<Address>,
    /// Set for O(1) lookup (rebuilt on deserialize).
    #[serde(skip)]
    lookup: HashSet<Address>,
}

impl<'de> Deserialize<'de> for AuthoritySet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct AuthoritySetData {
            authorities: Vec<Address>,
        }

        let data = AuthoritySetData::deserialize(deserializer)?;
        Ok(AuthoritySet::new(data.authorities))
    }
}

impl AuthoritySet {
    /// Create a new authority set.
    pub fn new(authorities: Vec<Address>) -> Self {
        let lookup = authorities.iter().cloned().collect();
        Self { authorities, lookup }
    }

    /// Number of declared authorities (counting duplicates).
    pub fn len(&self) -> usize {
        self.authorities.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.authorities.is_empty()
    }

    /// Check if an address is an authority.
    pub fn contains(&self, address: &Address) -> bool {
        self.lookup.contains(address)
    }

    /// Iterator over the declared addresses, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.authorities.iter()
    }

    /// The distinct addresses, in first-declaration order.
    pub fn distinct(&self) -> Vec<Address> {
        let mut seen = HashSet::new();
        self.authorities
            .iter()
            .filter(|a| seen.insert((*a).clone()))
            .cloned()
            .collect()
    }

    fn push(&mut self, address: Address) {
        self.lookup.insert(address.clone());
        self.authorities.push(address);
    }
}

impl PartialEq for AuthoritySet {
    fn eq(&self, other: &Self) -> bool {
        self.authorities == other.authorities
    }
}

impl Eq for AuthoritySet {}

/// Parsed device options: who may attest, and how many attestations admit a
/// message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceOptions {
    /// Authority signers, local address included.
    pub authorities: AuthoritySet,
    /// Minimum count of valid, in-authority, relevant attestations.
    pub quorum: u32,
}

impl DeviceOptions {
    /// Parse options from a process's tag sequence.
    ///
    /// Fails with `InvalidOptions` on a missing `"Quorum"` tag, a
    /// non-integer or zero quorum, or no `"Authority"` tags. Note that a
    /// quorum larger than the authority set parses fine; such a process
    /// simply never admits a message.
    pub fn from_tags(tags: &[Tag], wallet: &Wallet) -> Result<Self> {
        let mut authorities = AuthoritySet::new(Vec::new());
        for tag in tags.iter().filter(|t| t.name == wire::TAG_AUTHORITY) {
            let encoded = std::str::from_utf8(&tag.value)
                .map_err(|_| Error::invalid_options("Authority tag is not valid UTF-8"))?;
            authorities.push(Address::from_encoded(encoded));
        }
        if authorities.is_empty() {
            return Err(Error::invalid_options("no Authority tags declared"));
        }

        let quorum_value = tags
            .iter()
            .find(|t| t.name == wire::TAG_QUORUM)
            .ok_or_else(|| Error::invalid_options("missing Quorum tag"))?;
        let quorum: u32 = std::str::from_utf8(&quorum_value.value)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::invalid_options("Quorum tag is not a decimal integer"))?;
        if quorum == 0 {
            return Err(Error::invalid_options("Quorum must be at least 1"));
        }

        // The local node implicitly self-authorizes
        authorities.push(wallet.address());

        Ok(Self { authorities, quorum })
    }
}
