//! Snapshots of a protocol run
//!
//! [`Dump`] captures everything the local party needs to continue a run after a process
//! restart: temporary data of the protocol, messages received so far and the point to resume
//! from. Secrets are included, the dump must be stored as carefully as the key share.

use core::fmt;

use generic_ec::Curve;
use serde::{Deserialize, Serialize};

use crate::{
    error::CallerError,
    local_party::TempData,
    party::PartyIndex,
    round::{MessageStore, RoundKind},
};

/// Where a restored party continues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResumePoint {
    /// Round is not started yet, [`start`](crate::LocalParty::start) is called next
    Entry(RoundKind),
    /// Round is started and waits for messages of other parties
    AwaitingMessages(RoundKind),
}

impl ResumePoint {
    /// Round to resume
    pub fn round(self) -> RoundKind {
        match self {
            Self::Entry(round) | Self::AwaitingMessages(round) => round,
        }
    }
}

/// Serializable snapshot of a protocol run
#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Dump<E: Curve> {
    pub(crate) owner: PartyIndex,
    pub(crate) resume_point: ResumePoint,
    pub(crate) temp: TempData<E>,
    pub(crate) store: MessageStore<E>,
}

impl<E: Curve> Dump<E> {
    /// Index of the party that took the dump
    pub fn owner(&self) -> PartyIndex {
        self.owner
    }

    /// Point the run resumes from
    pub fn resume_point(&self) -> ResumePoint {
        self.resume_point
    }

    /// Moves the resume point
    ///
    /// Allows to enter identification directly, without a failed output round. The round must
    /// belong to the same protocol as the dump.
    pub fn resume_at(&mut self, point: ResumePoint) -> Result<(), CallerError> {
        if point.round().protocol() != self.temp.protocol() {
            return Err(CallerError::DumpMismatch);
        }
        self.resume_point = point;
        Ok(())
    }
}

impl<E: Curve> fmt::Debug for Dump<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dump")
            .field("owner", &self.owner)
            .field("resume_point", &self.resume_point)
            .field("temp", &"[redacted]")
            .finish()
    }
}
