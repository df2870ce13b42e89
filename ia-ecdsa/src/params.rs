//! Protocol parameters

use core::marker::PhantomData;

use generic_ec::Curve;
use libpaillier::unknown_order::BigNumber;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    curve::{curve_order, order_bits},
    party::{PartyId, PartyIndex, SortedPartyIds},
    zkp::RejectionSampler,
};

/// Protocol version
///
/// Determines how Fiat–Shamir challenges are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolVersion {
    /// Challenges are reduced modulo the bound
    V1,
    /// Challenges are rejection-sampled
    #[default]
    V2,
}

impl ProtocolVersion {
    /// Rejection sampler used by this version
    pub fn rejection_sampler(self) -> RejectionSampler {
        match self {
            Self::V1 => RejectionSampler::Legacy,
            Self::V2 => RejectionSampler::Uniform,
        }
    }
}

/// Security parameters of range proofs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityParams {
    /// $\ell$: bit size of secrets proven to be in range
    pub ell: usize,
    /// $\ell'$: bit size of MtA masks
    pub ell_prime: usize,
    /// $\varepsilon$: slackness of range proofs
    pub epsilon: usize,
    /// Minimal bit size of Paillier modulus
    pub min_paillier_bits: usize,
}

impl Default for SecurityParams {
    fn default() -> Self {
        Self {
            ell: 256,
            ell_prime: 768,
            epsilon: 512,
            min_paillier_bits: 2048,
        }
    }
}

/// Parameters of one protocol run
///
/// Immutable for the lifetime of the run.
#[derive(Debug, Clone)]
pub struct Parameters<E: Curve> {
    parties: SortedPartyIds,
    own: PartyId,
    threshold: u16,
    needs_identification: bool,
    version: ProtocolVersion,
    security: SecurityParams,
    _curve: PhantomData<E>,
}

impl<E: Curve> Parameters<E> {
    /// Starts building parameters
    ///
    /// * `parties` take part in the protocol, at least `threshold + 1` of them
    /// * `own_key` is key of the local party
    pub fn builder(
        parties: SortedPartyIds,
        own_key: BigNumber,
        threshold: u16,
    ) -> ParametersBuilder<E> {
        ParametersBuilder {
            parties,
            own_key,
            threshold,
            needs_identification: false,
            version: ProtocolVersion::default(),
            security: SecurityParams::default(),
            _curve: PhantomData,
        }
    }

    /// Name of the curve
    pub fn curve_name(&self) -> &'static str {
        E::CURVE_NAME
    }
    /// Sorted set of participants
    pub fn parties(&self) -> &SortedPartyIds {
        &self.parties
    }
    /// Index of the local party
    pub fn own_index(&self) -> PartyIndex {
        self.own.index()
    }
    /// Local party
    pub fn own(&self) -> &PartyId {
        &self.own
    }
    /// Number of participants
    pub fn party_count(&self) -> u16 {
        // fits into u16, checked by `SortedPartyIds`
        self.parties.len() as u16
    }
    /// Threshold $t$, any $t+1$ parties can sign
    pub fn threshold(&self) -> u16 {
        self.threshold
    }
    /// Whether parties keep data needed to identify misbehaving party
    pub fn needs_identification(&self) -> bool {
        self.needs_identification
    }
    /// Protocol version
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }
    /// Security parameters
    pub fn security(&self) -> &SecurityParams {
        &self.security
    }

    /// Indexes of all parties except the local one
    pub fn peers(&self) -> impl Iterator<Item = PartyIndex> + '_ {
        let own = self.own.index();
        (0..self.party_count()).filter(move |j| *j != own)
    }

    pub(crate) fn party(&self, index: PartyIndex) -> Option<&PartyId> {
        self.parties.get(index)
    }
}

/// Builder of [`Parameters`]
pub struct ParametersBuilder<E: Curve> {
    parties: SortedPartyIds,
    own_key: BigNumber,
    threshold: u16,
    needs_identification: bool,
    version: ProtocolVersion,
    security: SecurityParams,
    _curve: PhantomData<E>,
}

impl<E: Curve> ParametersBuilder<E> {
    /// Specifies whether identifiable abort is enabled
    ///
    /// When enabled, MtA transcripts are retained so that a failed presigning or signing continues
    /// with the identification round and names the misbehaving party. Disabled by default.
    pub fn set_needs_identification(mut self, enabled: bool) -> Self {
        self.needs_identification = enabled;
        self
    }

    /// Sets protocol version, [`ProtocolVersion::V2`] by default
    pub fn set_version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    /// Overrides security parameters
    pub fn set_security(mut self, security: SecurityParams) -> Self {
        self.security = security;
        self
    }

    /// Validates and builds parameters
    pub fn build(self) -> Result<Parameters<E>, InvalidParameters> {
        let own = self
            .parties
            .find_by_key(&self.own_key)
            .ok_or(InvalidParameters::OwnPartyNotInSet)?
            .clone();
        if usize::from(self.threshold) >= self.parties.len() {
            return Err(InvalidParameters::NotEnoughParties {
                threshold: self.threshold,
                n: self.parties.len(),
            });
        }
        let q = curve_order::<E>();
        if self
            .parties
            .keys()
            .any(|key| key.nmod(&q) == BigNumber::zero())
        {
            return Err(InvalidParameters::ZeroKey);
        }
        let q_bits = order_bits::<E>();
        if self.security.ell < q_bits || self.security.ell_prime < 3 * q_bits {
            return Err(InvalidParameters::WeakSecurity);
        }

        Ok(Parameters {
            parties: self.parties,
            own,
            threshold: self.threshold,
            needs_identification: self.needs_identification,
            version: self.version,
            security: self.security,
            _curve: PhantomData,
        })
    }
}

/// Parameters are invalid
#[derive(Debug, Error)]
pub enum InvalidParameters {
    /// Local party is not in the party set
    #[error("own key is not in the party set")]
    OwnPartyNotInSet,
    /// Threshold requires more parties
    #[error("threshold {threshold} requires more than {threshold} parties, got {n}")]
    NotEnoughParties {
        /// Threshold
        threshold: u16,
        /// Number of parties given
        n: usize,
    },
    /// A key reduces to zero modulo the curve order
    #[error("party key is zero modulo curve order")]
    ZeroKey,
    /// Security parameters are too small for the curve
    #[error("security parameters don't cover the curve order")]
    WeakSecurity,
}
