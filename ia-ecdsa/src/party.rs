//! Party identities
//!
//! A party is identified by its `key`, an integer which also serves as the evaluation point of its
//! Shamir share. Parties are always kept sorted by key; [`PartyId::index`] is the position of the party
//! in the sorted set and is the only index used to address per-party data.

use core::fmt;

use libpaillier::unknown_order::BigNumber;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Position of a party in the sorted party set
pub type PartyIndex = u16;

/// Identity of a protocol participant
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyId {
    moniker: String,
    key: BigNumber,
    index: PartyIndex,
}

impl PartyId {
    /// Constructs a party identity
    ///
    /// Index is assigned once the party is placed into [`SortedPartyIds`].
    pub fn new(moniker: impl Into<String>, key: BigNumber) -> Self {
        Self {
            moniker: moniker.into(),
            key,
            index: 0,
        }
    }

    /// Human readable name
    pub fn moniker(&self) -> &str {
        &self.moniker
    }
    /// Unique key of the party
    pub fn key(&self) -> &BigNumber {
        &self.key
    }
    /// Position in the sorted party set
    pub fn index(&self) -> PartyIndex {
        self.index
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.moniker, self.index)
    }
}

/// Party set sorted by [key](PartyId::key)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortedPartyIds(Vec<PartyId>);

impl SortedPartyIds {
    /// Sorts the parties and assigns their indexes
    pub fn new(parties: impl IntoIterator<Item = PartyId>) -> Result<Self, InvalidPartySet> {
        let mut parties = parties.into_iter().collect::<Vec<_>>();
        if parties.is_empty() {
            return Err(InvalidPartySet::Empty);
        }
        if parties.len() > usize::from(PartyIndex::MAX) {
            return Err(InvalidPartySet::TooManyParties(parties.len()));
        }
        parties.sort_by(|a, b| a.key.cmp(&b.key));
        if parties.windows(2).any(|w| w[0].key == w[1].key) {
            return Err(InvalidPartySet::DuplicateKey);
        }
        for (party, index) in parties.iter_mut().zip(0..) {
            party.index = index;
        }
        debug_assert!(crate::utils::is_sorted_by_key(&parties, |p| &p.key));
        Ok(Self(parties))
    }

    /// Number of parties
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`, the set can't be constructed empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a party at given index
    pub fn get(&self, index: PartyIndex) -> Option<&PartyId> {
        self.0.get(usize::from(index))
    }

    /// Looks up a party by its key
    pub fn find_by_key(&self, key: &BigNumber) -> Option<&PartyId> {
        self.0
            .binary_search_by(|p| p.key.cmp(key))
            .ok()
            .and_then(|i| self.0.get(i))
    }

    /// Iterates over parties in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &PartyId> {
        self.0.iter()
    }

    /// Keys of all parties in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &BigNumber> {
        self.0.iter().map(|p| &p.key)
    }
}

/// Party set is invalid
#[derive(Debug, Error)]
pub enum InvalidPartySet {
    /// No parties given
    #[error("party set is empty")]
    Empty,
    /// Too many parties
    #[error("{0} parties don't fit into party index")]
    TooManyParties(usize),
    /// Same key appears twice
    #[error("two parties share the same key")]
    DuplicateKey,
}
