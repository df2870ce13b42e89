//! Threshold ECDSA presigning and signing with identifiable abort
//!
//! Implements the presigning and signing phases of threshold ECDSA based on [CGGMP21]. Presigning
//! is message-independent and takes three rounds of communication; once a presignature is
//! obtained, a message is signed within a single broadcast round. When a run fails, parties may
//! carry out an identification round that names every party who deviated from the protocol.
//!
//! This crate provides:
//! * Round engine [`LocalParty`] \
//!   No I/O, no blocking: messages are handed in and taken out by the caller. A run can be
//!   [dumped](LocalParty::dump) at any time and [restored](LocalParty::restore) later.
//! * Interactive protocols over [`round_based`] networking when `interactive` feature is enabled,
//!   see [mod@interactive]
//! * [Trusted dealer](trusted_dealer) when `spof` feature is enabled
//!
//! Key generation and auxiliary info generation aren't part of this crate. [`KeyShare`] must be
//! obtained elsewhere.
//!
//! ## Identifiable abort
//! Identification is opt-in, see [`ParametersBuilder::set_needs_identification`]. Every protocol
//! failure is reported as [`ProtocolError`], and [`ProtocolError::culprits`] lists the parties
//! to blame.
//!
//! [CGGMP21]: https://ia.cr/2021/060

#![forbid(unsafe_code, unused_crate_dependencies)]
#![deny(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
#![deny(missing_docs)]
#![allow(clippy::type_complexity)]

pub use generic_ec;
pub use libpaillier::unknown_order::BigNumber;
#[cfg(feature = "interactive")]
pub use round_based;

pub mod curve;
pub mod dump;
pub mod error;
mod identification;
#[cfg(feature = "interactive")]
pub mod interactive;
pub mod key_share;
mod local_party;
pub mod messages;
pub mod mta;
pub mod paillier;
pub mod params;
pub mod party;
pub mod presign;
pub mod ring_pedersen;
pub mod round;
pub mod sign;
pub mod ssid;
#[cfg(feature = "spof")]
pub mod trusted_dealer;
mod utils;
pub mod zkp;

pub use self::{
    dump::{Dump, ResumePoint},
    error::{Culprit, Misbehavior, ProtocolError},
    key_share::KeyShare,
    local_party::LocalParty,
    messages::{Envelope, Msg},
    params::{Parameters, ParametersBuilder, ProtocolVersion, SecurityParams},
    party::{PartyId, PartyIndex, SortedPartyIds},
    presign::PreSignatureData,
    round::{CancellationToken, Protocol, RoundKind},
    sign::SignatureData,
};
