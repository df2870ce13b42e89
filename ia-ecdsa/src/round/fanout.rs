//! Per-peer fan-out
//!
//! Verification and MtA are independent across peers, so a round runs one task per peer on the
//! rayon pool. Every task is joined and every result is kept: a round reports all culprits at
//! once rather than stopping at the first one.

use generic_ec::Curve;
use rand_chacha::ChaCha20Rng;
use rand_core::{CryptoRng, RngCore, SeedableRng};
use rayon::prelude::*;

use super::{CancellationToken, RoundKind};
use crate::{
    error::{Bug, Culprit, LocalError, Misbehavior, ProtocolError},
    paillier::PaillierError,
    params::Parameters,
    party::PartyIndex,
};

/// Failure of a single per-peer task
#[derive(Debug)]
pub(crate) enum TaskError {
    /// Peer misbehaved
    Culprit(Misbehavior),
    /// Local computation failed
    Local(LocalError),
    /// Task observed cancellation
    Cancelled,
}

impl From<LocalError> for TaskError {
    fn from(err: LocalError) -> Self {
        Self::Local(err)
    }
}

impl From<PaillierError> for TaskError {
    fn from(err: PaillierError) -> Self {
        Self::Local(err.into())
    }
}

impl From<Bug> for TaskError {
    fn from(err: Bug) -> Self {
        Self::Local(err.into())
    }
}

/// Runs `task` for every peer in parallel
///
/// Each task gets its own RNG seeded from `rng`, so the outcome doesn't depend on scheduling.
/// Results are returned in the order of `peers`.
pub(crate) fn fan_out<T, R, F>(
    peers: impl IntoIterator<Item = PartyIndex>,
    rng: &mut R,
    cancel: &CancellationToken,
    task: F,
) -> Vec<(PartyIndex, Result<T, TaskError>)>
where
    T: Send,
    R: RngCore + CryptoRng,
    F: Fn(PartyIndex, &mut ChaCha20Rng) -> Result<T, TaskError> + Sync + Send,
{
    let seeded = peers
        .into_iter()
        .map(|j| {
            let mut seed = <ChaCha20Rng as SeedableRng>::Seed::default();
            rng.fill_bytes(&mut seed);
            (j, seed)
        })
        .collect::<Vec<_>>();

    seeded
        .into_par_iter()
        .map(|(j, seed)| {
            if cancel.is_cancelled() {
                return (j, Err(TaskError::Cancelled));
            }
            let mut rng = ChaCha20Rng::from_seed(seed);
            let result = task(j, &mut rng);
            (j, result)
        })
        .collect()
}

/// Merges results of [`fan_out`]
///
/// Cancellation wins over everything, then local failures, then culprits. All culprits of the
/// round are reported together.
pub(crate) fn join_all<E: Curve, T>(
    params: &Parameters<E>,
    round: RoundKind,
    cancel: &CancellationToken,
    results: Vec<(PartyIndex, Result<T, TaskError>)>,
) -> Result<Vec<(PartyIndex, T)>, ProtocolError> {
    let mut outputs = Vec::with_capacity(results.len());
    let mut culprits = vec![];
    let mut local = None;
    let mut cancelled = cancel.is_cancelled();

    for (j, result) in results {
        match result {
            Ok(output) => outputs.push((j, output)),
            Err(TaskError::Culprit(reason)) => {
                let party = params
                    .party(j)
                    .ok_or(Bug::UnknownParty(j))
                    .map_err(|bug| ProtocolError::Local {
                        round,
                        source: bug.into(),
                    })?;
                culprits.push(Culprit {
                    party: party.clone(),
                    reason,
                });
            }
            Err(TaskError::Local(err)) => {
                local.get_or_insert(err);
            }
            Err(TaskError::Cancelled) => cancelled = true,
        }
    }

    if cancelled {
        tracing::debug!(?round, "round cancelled");
        return Err(ProtocolError::Cancelled);
    }
    if let Some(source) = local {
        tracing::error!(?round, err = %source, "local failure");
        return Err(ProtocolError::Local { round, source });
    }
    if !culprits.is_empty() {
        for culprit in &culprits {
            tracing::warn!(?round, %culprit, "party misbehaved");
        }
        return Err(ProtocolError::Violation { round, culprits });
    }
    Ok(outputs)
}
