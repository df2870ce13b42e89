use std::collections::BTreeMap;

use generic_ec::Curve;
use serde::{Deserialize, Serialize};

use super::RoundKind;
use crate::{
    error::Bug,
    messages::{Msg, RoundMessage},
    party::PartyIndex,
};

/// Messages received from other parties, indexed by `(round, sender)`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub(crate) struct MessageStore<E: Curve> {
    n: u16,
    rounds: BTreeMap<RoundKind, Vec<Option<Msg<E>>>>,
}

impl<E: Curve> MessageStore<E> {
    pub fn new(n: u16) -> Self {
        Self {
            n,
            rounds: BTreeMap::new(),
        }
    }

    /// Number of parties
    pub fn party_count(&self) -> u16 {
        self.n
    }

    /// Saves the message, returns `false` if a message of that round from `from` is already stored
    pub fn insert(&mut self, from: PartyIndex, msg: Msg<E>) -> bool {
        let n = usize::from(self.n);
        let slots = self
            .rounds
            .entry(msg.round())
            .or_insert_with(|| vec![None; n]);
        match slots.get_mut(usize::from(from)) {
            Some(slot @ None) => {
                *slot = Some(msg);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, round: RoundKind, from: PartyIndex) -> bool {
        self.rounds
            .get(&round)
            .and_then(|slots| slots.get(usize::from(from)))
            .is_some_and(Option::is_some)
    }

    /// Returns the message of type `M` sent by `from`
    pub fn get<M: RoundMessage<E>>(&self, from: PartyIndex) -> Result<&M, Bug> {
        self.rounds
            .get(&M::ROUND)
            .and_then(|slots| slots.get(usize::from(from)))
            .and_then(Option::as_ref)
            .and_then(M::from_msg)
            .ok_or(Bug::MissingMessage(from))
    }
}
