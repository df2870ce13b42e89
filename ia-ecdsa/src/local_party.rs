//! Party-level driver
//!
//! [`LocalParty`] holds the state of one protocol run of the local party and exposes the round
//! engine: messages are handed in via [`store_message`](LocalParty::store_message), the current
//! round is polled via [`update`](LocalParty::update) and advanced via
//! [`next_round`](LocalParty::next_round). Nothing here blocks or does I/O, transport is up to the
//! caller.

use generic_ec::{Curve, Scalar};
use libpaillier::unknown_order::BigNumber;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{
    dump::{Dump, ResumePoint},
    error::{Bug, CallerError, ProtocolError},
    key_share::{KeyShare, SigningKey},
    messages::{Envelope, MalformedMessage},
    params::Parameters,
    party::PartyId,
    presign::{self, PreSignatureData, PresignTemp},
    round::{CancellationToken, MessageStore, Outcome, Protocol, Round, RoundContext, RoundKind},
    sign::{self, SignTemp, SignatureData},
};

/// Temporary data of the protocol being run
#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub(crate) enum TempData<E: Curve> {
    Presign(Box<PresignTemp<E>>),
    Sign(Box<SignTemp<E>>),
}

impl<E: Curve> TempData<E> {
    pub fn protocol(&self) -> Protocol {
        match self {
            Self::Presign(_) => Protocol::Presign,
            Self::Sign(_) => Protocol::Sign,
        }
    }

    /// Nonce the SSID of every round is computed with
    fn nonce(&self) -> &BigNumber {
        match self {
            Self::Presign(temp) => &temp.nonce,
            Self::Sign(temp) => &temp.presignature.ssid_nonce,
        }
    }

    /// Whether the output round failed its final check
    fn identification_pending(&self) -> bool {
        match self {
            Self::Presign(temp) => temp.delta_mismatch,
            Self::Sign(temp) => temp.signature_invalid,
        }
    }
}

/// Local party of a presigning or signing run
pub struct LocalParty<E: Curve> {
    params: Parameters<E>,
    key: SigningKey<E>,
    round: Round,
    temp: TempData<E>,
    store: MessageStore<E>,
    pending_dump: Option<Dump<E>>,
}

impl<E: Curve> LocalParty<E> {
    /// Sets up presigning
    ///
    /// `nonce` is the session nonce, all parties must use the same one and never reuse it.
    pub fn presign(
        params: Parameters<E>,
        key_share: &KeyShare<E>,
        nonce: BigNumber,
    ) -> Result<Self, ProtocolError> {
        let temp = TempData::Presign(Box::new(PresignTemp::new(nonce)));
        Self::new(params, key_share, temp, ResumePoint::Entry(RoundKind::Presign1))
    }

    /// Sets up signing of `message` with a presignature
    ///
    /// `message` is a digest already reduced to a scalar. If `derivation_delta` is set, the
    /// signature is made under the public key shifted by $\delta \cdot G$.
    pub fn sign(
        params: Parameters<E>,
        key_share: &KeyShare<E>,
        presignature: PreSignatureData<E>,
        message: Scalar<E>,
        derivation_delta: Option<Scalar<E>>,
    ) -> Result<Self, ProtocolError> {
        if params.needs_identification() && presignature.transcript.is_none() {
            return Err(CallerError::MissingTranscript.into());
        }
        let temp = TempData::Sign(Box::new(SignTemp::new(
            presignature,
            message,
            derivation_delta,
        )));
        Self::new(params, key_share, temp, ResumePoint::Entry(RoundKind::Sign1))
    }

    /// Restores a run from a [dump](Self::dump)
    ///
    /// The dump must be taken by the same party within the same party set.
    pub fn restore(
        params: Parameters<E>,
        key_share: &KeyShare<E>,
        dump: Dump<E>,
    ) -> Result<Self, ProtocolError> {
        if dump.store.party_count() != params.party_count()
            || dump.owner != params.own_index()
            || dump.resume_point.round().protocol() != dump.temp.protocol()
        {
            return Err(CallerError::DumpMismatch.into());
        }
        let mut party = Self::new(params, key_share, dump.temp, dump.resume_point)?;
        party.store = dump.store;
        party.sync_acknowledgements();
        tracing::debug!(
            party = party.params.own_index(),
            resume_point = ?dump.resume_point,
            "restored from dump"
        );
        Ok(party)
    }

    fn new(
        params: Parameters<E>,
        key_share: &KeyShare<E>,
        temp: TempData<E>,
        resume_point: ResumePoint,
    ) -> Result<Self, ProtocolError> {
        let key = key_share
            .signing_key(&params)
            .map_err(CallerError::from)?;
        let n = params.party_count();
        let mut round = Round::new(resume_point.round(), n, params.own_index());
        round.started = matches!(resume_point, ResumePoint::AwaitingMessages(_));
        Ok(Self {
            params,
            key,
            round,
            temp,
            store: MessageStore::new(n),
            pending_dump: None,
        })
    }

    /// Starts the current round
    ///
    /// Returns messages to be delivered to other parties. A round can be started only once,
    /// including when it failed.
    #[tracing::instrument(skip_all, fields(party = self.params.own_index(), round = ?self.round.kind))]
    pub fn start<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        cancel: &CancellationToken,
    ) -> Result<Vec<Envelope<E>>, ProtocolError> {
        let kind = self.round.kind;
        if self.round.started {
            return Err(ProtocolError::AlreadyStarted(kind));
        }
        self.round.started = true;

        let nonce = self.temp.nonce().clone();
        let ctx = RoundContext {
            params: &self.params,
            key: &self.key,
            store: &self.store,
            cancel,
            nonce: &nonce,
        };
        let outgoing = match (&mut self.temp, kind) {
            (TempData::Presign(temp), RoundKind::Presign1) => {
                presign::round1::start(&ctx, temp, rng)
            }
            (TempData::Presign(temp), RoundKind::Presign2) => {
                presign::round2::start(&ctx, temp, rng)
            }
            (TempData::Presign(temp), RoundKind::Presign3) => {
                presign::round3::start(&ctx, temp, rng)
            }
            (TempData::Presign(temp), RoundKind::PresignOut) => {
                presign::output::finish(&ctx, temp, rng).map(|_| vec![])
            }
            (TempData::Presign(temp), RoundKind::PresignIdentification) => {
                presign::identification::start(&ctx, temp, rng)
            }
            (TempData::Presign(temp), RoundKind::PresignIdentificationOut) => {
                Err(presign::identification::finish(&ctx, temp, rng))
            }
            (TempData::Sign(temp), RoundKind::Sign1) => sign::round1::start(&ctx, temp),
            (TempData::Sign(temp), RoundKind::SignOut) => {
                sign::output::finish(&ctx, temp).map(|_| vec![])
            }
            (TempData::Sign(temp), RoundKind::SignIdentification) => {
                sign::identification::start(&ctx, temp, rng)
            }
            (TempData::Sign(temp), RoundKind::SignIdentificationOut) => {
                Err(sign::identification::finish(&ctx, temp, rng))
            }
            _ => Err(ProtocolError::local(kind, Bug::TempDataMismatch)),
        }?;

        if self.outcome() == Some(Outcome::Identify) {
            let entry = match self.temp.protocol() {
                Protocol::Presign => RoundKind::PresignIdentification,
                Protocol::Sign => RoundKind::SignIdentification,
            };
            self.pending_dump = Some(Dump {
                owner: self.params.own_index(),
                resume_point: ResumePoint::Entry(entry),
                temp: self.temp.clone(),
                store: self.store.clone(),
            });
        }
        tracing::debug!(messages = outgoing.len(), "round started");
        Ok(outgoing)
    }

    /// Outcome of a finished output round
    fn outcome(&self) -> Option<Outcome> {
        if !matches!(self.round.kind, RoundKind::PresignOut | RoundKind::SignOut) {
            return None;
        }
        if self.temp.identification_pending() {
            Some(Outcome::Identify)
        } else {
            Some(Outcome::Done)
        }
    }

    /// Checks sender, recipient, delivery channel and protocol of the message
    fn check_envelope(&self, envelope: &Envelope<E>) -> Result<(), MalformedMessage> {
        let own = self.params.own_index();
        if envelope.from == own {
            return Err(MalformedMessage::FromSelf);
        }
        if envelope.from >= self.params.party_count() {
            return Err(MalformedMessage::UnknownSender);
        }
        if matches!(envelope.to, Some(to) if to != own) {
            return Err(MalformedMessage::NotAddressedToUs);
        }
        if envelope.to.is_none() != envelope.content.is_broadcast() {
            return Err(MalformedMessage::WrongDelivery);
        }
        if envelope.content.round().protocol() != self.temp.protocol() {
            return Err(MalformedMessage::WrongProtocol);
        }
        Ok(())
    }

    /// Whether the message can be stored: it's addressed properly, belongs to the current or a
    /// later round, and no message of that round was received from the sender yet
    pub fn can_accept(&self, envelope: &Envelope<E>) -> bool {
        let round = envelope.content.round();
        self.check_envelope(envelope).is_ok()
            && round >= self.round.kind
            && !self.store.contains(round, envelope.from)
    }

    /// Validates and stores a message of another party
    ///
    /// Returns `Ok(false)` if the message is a duplicate or belongs to a round that is already
    /// over. Messages of later rounds are kept until their round comes.
    pub fn store_message(&mut self, envelope: Envelope<E>) -> Result<bool, ProtocolError> {
        let from = envelope.from;
        self.check_envelope(&envelope)
            .and_then(|()| {
                envelope
                    .content
                    .validate_basic(from, self.params.party_count())
            })
            .map_err(|reason| {
                tracing::warn!(from, %reason, "malformed message");
                ProtocolError::Malformed { from, reason }
            })?;

        let round = envelope.content.round();
        if round < self.round.kind {
            tracing::debug!(from, ?round, "message of a past round is ignored");
            return Ok(false);
        }
        if !self.store.insert(from, envelope.content) {
            tracing::debug!(from, ?round, "duplicate message is ignored");
            return Ok(false);
        }
        if round == self.round.kind {
            self.round.acknowledge(from);
        }
        Ok(true)
    }

    fn sync_acknowledgements(&mut self) {
        let kind = self.round.kind;
        for j in 0..self.params.party_count() {
            if self.store.contains(kind, j) {
                self.round.acknowledge(j);
            }
        }
    }

    /// Whether the current round is started and has every message it needs
    ///
    /// Doesn't block, meant to be polled after every stored message.
    pub fn update(&mut self) -> Result<bool, ProtocolError> {
        if !self.round.started {
            return Ok(false);
        }
        if !self.round.kind.expects_messages() {
            return Ok(true);
        }
        self.sync_acknowledgements();
        Ok(self.round.is_complete())
    }

    /// Moves to the next round
    ///
    /// Returns `None` once the protocol is over. The current round must be started and, if it
    /// expects messages, complete.
    pub fn next_round(&mut self) -> Result<Option<RoundKind>, ProtocolError> {
        let kind = self.round.kind;
        if !self.round.started {
            return Err(CallerError::RoundNotStarted(kind).into());
        }
        if kind.expects_messages() && !self.update()? {
            return Err(CallerError::RoundNotFinished(kind).into());
        }
        let identify = self.temp.identification_pending();
        let next = match kind {
            RoundKind::Presign1 => Some(RoundKind::Presign2),
            RoundKind::Presign2 => Some(RoundKind::Presign3),
            RoundKind::Presign3 => Some(RoundKind::PresignOut),
            RoundKind::PresignOut if identify => Some(RoundKind::PresignIdentification),
            RoundKind::PresignIdentification => Some(RoundKind::PresignIdentificationOut),
            RoundKind::Sign1 => Some(RoundKind::SignOut),
            RoundKind::SignOut if identify => Some(RoundKind::SignIdentification),
            RoundKind::SignIdentification => Some(RoundKind::SignIdentificationOut),
            RoundKind::PresignOut
            | RoundKind::PresignIdentificationOut
            | RoundKind::SignOut
            | RoundKind::SignIdentificationOut => None,
        };
        if let Some(next) = next {
            self.round = Round::new(next, self.params.party_count(), self.params.own_index());
            self.sync_acknowledgements();
            tracing::debug!(party = self.params.own_index(), round = ?next, "moved to next round");
        }
        Ok(next)
    }

    /// Parties whose message the current round still waits for
    pub fn waiting_for(&self) -> Vec<PartyId> {
        if !self.round.kind.expects_messages() {
            return vec![];
        }
        self.round
            .waiting_for()
            .filter_map(|j| self.params.party(j).cloned())
            .collect()
    }

    /// Current round
    pub fn current_round(&self) -> RoundKind {
        self.round.kind
    }

    /// Whether the current round is started
    pub fn is_started(&self) -> bool {
        self.round.started
    }

    /// Parameters of the run
    pub fn params(&self) -> &Parameters<E> {
        &self.params
    }

    /// Presignature, available once presigning is over
    pub fn presignature(&self) -> Option<&PreSignatureData<E>> {
        match &self.temp {
            TempData::Presign(temp) => temp.output.as_ref(),
            TempData::Sign(_) => None,
        }
    }

    /// Signature, available once signing is over
    pub fn signature(&self) -> Option<&SignatureData<E>> {
        match &self.temp {
            TempData::Sign(temp) => temp.output.as_ref(),
            TempData::Presign(_) => None,
        }
    }

    /// Snapshot of the run at the current round
    pub fn dump(&self) -> Dump<E> {
        let resume_point = if self.round.started {
            ResumePoint::AwaitingMessages(self.round.kind)
        } else {
            ResumePoint::Entry(self.round.kind)
        };
        Dump {
            owner: self.params.own_index(),
            resume_point,
            temp: self.temp.clone(),
            store: self.store.clone(),
        }
    }

    /// Snapshot taken when an output round failed its final check, positioned at the entry of
    /// identification
    pub fn take_pending_dump(&mut self) -> Option<Dump<E>> {
        self.pending_dump.take()
    }
}
