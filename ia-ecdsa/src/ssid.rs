//! Session identifier
//!
//! SSID binds curve, the party set, a session nonce and the round number. It's recomputed every
//! round and, concatenated with the prover index, used as domain separation for every proof made
//! in that round.

use core::fmt;

use digest::Digest;
use generic_ec::{Curve, Point};
use libpaillier::unknown_order::BigNumber;
use serde::{Deserialize, Serialize};

use crate::{curve::curve_order, party::PartyIndex, party::SortedPartyIds};

/// Session identifier of one protocol round
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ssid([u8; 32]);

impl Ssid {
    /// Computes SSID of the `round` for given party set and session `nonce`
    pub fn compute<E: Curve>(parties: &SortedPartyIds, nonce: &BigNumber, round: u16) -> Self {
        let mut hash = sha2::Sha256::new();
        absorb(&mut hash, b"ia-ecdsa.ssid");
        absorb(&mut hash, E::CURVE_NAME.as_bytes());
        absorb(&mut hash, &curve_order::<E>().to_bytes());
        absorb(
            &mut hash,
            Point::<E>::generator().to_point().to_bytes(false).as_ref(),
        );
        absorb(&mut hash, &(parties.len() as u64).to_be_bytes());
        for key in parties.keys() {
            absorb(&mut hash, &key.to_bytes());
        }
        absorb(&mut hash, &nonce.to_bytes());
        absorb(&mut hash, &round.to_be_bytes());
        Self(hash.finalize().into())
    }

    /// Domain separation tag for proofs created by `prover` in this round
    pub fn with_prover(&self, prover: PartyIndex) -> Vec<u8> {
        let mut tag = Vec::with_capacity(self.0.len() + 2);
        tag.extend_from_slice(&self.0);
        tag.extend_from_slice(&prover.to_be_bytes());
        tag
    }

    /// Bytes representation
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Ssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Ssid(")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        f.write_str(")")
    }
}

/// Feeds length-prefixed bytes into the hash
fn absorb(hash: &mut sha2::Sha256, bytes: &[u8]) {
    hash.update((bytes.len() as u64).to_be_bytes());
    hash.update(bytes);
}
