//! Running the protocols over [`round_based`] networking
//!
//! The [`LocalParty`] engine doesn't do any I/O. Functions of this module drive it with
//! messages delivered by a [`round_based::Mpc`] party: start a round, send its messages, store
//! incoming ones until the round is complete, move on.
//!
//! Party indexes of the `round_based` network must match [`PartyId::index`](crate::PartyId::index),
//! the position of a party in the sorted party set.

use futures::StreamExt;
use generic_ec::Curve;
use rand_core::{CryptoRng, RngCore};
use round_based::{Delivery, Incoming, MessageType, Outgoing, SinkExt};
use thiserror::Error;

use crate::{
    error::ProtocolError,
    messages::{Envelope, Msg},
    presign::PreSignatureData,
    round::{CancellationToken, Protocol},
    sign::SignatureData,
    LocalParty,
};

/// Carries out presigning, returns the presignature
pub async fn presign<E, M, R>(
    party: LocalParty<E>,
    mpc: M,
    rng: &mut R,
    cancel: &CancellationToken,
) -> Result<PreSignatureData<E>, InteractiveError>
where
    E: Curve,
    M: round_based::Mpc<ProtocolMessage = Msg<E>>,
    R: RngCore + CryptoRng,
{
    if party.current_round().protocol() != Protocol::Presign {
        return Err(Reason::WrongProtocol.into());
    }
    let party = run(party, mpc, rng, cancel).await?;
    party
        .presignature()
        .cloned()
        .ok_or_else(|| Reason::NoOutput.into())
}

/// Carries out signing, returns the signature
pub async fn sign<E, M, R>(
    party: LocalParty<E>,
    mpc: M,
    rng: &mut R,
    cancel: &CancellationToken,
) -> Result<SignatureData<E>, InteractiveError>
where
    E: Curve,
    M: round_based::Mpc<ProtocolMessage = Msg<E>>,
    R: RngCore + CryptoRng,
{
    if party.current_round().protocol() != Protocol::Sign {
        return Err(Reason::WrongProtocol.into());
    }
    let party = run(party, mpc, rng, cancel).await?;
    party
        .signature()
        .copied()
        .ok_or_else(|| Reason::NoOutput.into())
}

async fn run<E, M, R>(
    mut party: LocalParty<E>,
    mpc: M,
    rng: &mut R,
    cancel: &CancellationToken,
) -> Result<LocalParty<E>, InteractiveError>
where
    E: Curve,
    M: round_based::Mpc<ProtocolMessage = Msg<E>>,
    R: RngCore + CryptoRng,
{
    let own = party.params().own_index();
    let round_based::MpcParty { delivery, .. } = mpc.into_party();
    let (mut incoming, mut outgoing) = delivery.split();

    loop {
        for envelope in party.start(rng, cancel)? {
            let msg = match envelope.to {
                Some(to) => Outgoing::p2p(to, envelope.content),
                None => Outgoing::broadcast(envelope.content),
            };
            outgoing
                .send(msg)
                .await
                .map_err(|err| Reason::Send(Box::new(err)))?;
        }

        while !party.update()? {
            let Incoming {
                sender,
                msg_type,
                msg,
                ..
            } = incoming
                .next()
                .await
                .ok_or(Reason::UnexpectedEof)?
                .map_err(|err| Reason::Receive(Box::new(err)))?;
            if sender == own {
                continue;
            }
            let to = match msg_type {
                MessageType::P2P => Some(own),
                MessageType::Broadcast => None,
            };
            party.store_message(Envelope {
                from: sender,
                to,
                content: msg,
            })?;
        }

        if party.next_round()?.is_none() {
            return Ok(party);
        }
    }
}

/// Interactive protocol failed
#[derive(Debug, Error)]
#[error(transparent)]
pub struct InteractiveError(#[from] Reason);

impl InteractiveError {
    /// Protocol error, if the failure wasn't caused by networking
    pub fn protocol_error(&self) -> Option<&ProtocolError> {
        match &self.0 {
            Reason::Protocol(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProtocolError> for InteractiveError {
    fn from(err: ProtocolError) -> Self {
        Self(Reason::Protocol(err))
    }
}

#[derive(Debug, Error)]
enum Reason {
    #[error("protocol failed")]
    Protocol(#[source] ProtocolError),
    #[error("local party runs another protocol")]
    WrongProtocol,
    #[error("protocol finished without output")]
    NoOutput,
    #[error("send message")]
    Send(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("receive message")]
    Receive(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("incoming stream ended unexpectedly")]
    UnexpectedEof,
}
