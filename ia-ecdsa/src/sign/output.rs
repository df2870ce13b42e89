use generic_ec::Curve;

use super::{SignTemp, SignatureData};
use crate::{
    curve::r_and_recovery_id,
    error::{Bug, Culprit, Misbehavior, ProtocolError, UnattributedFailure},
    messages::SignRound1,
    round::{Outcome, RoundContext, RoundKind},
};

const ROUND: RoundKind = RoundKind::SignOut;

/// Assembles the signature out of $\sigma_j$ and verifies it
pub(crate) fn finish<E: Curve>(
    ctx: &RoundContext<E>,
    temp: &mut SignTemp<E>,
) -> Result<Outcome, ProtocolError> {
    let own = ctx.own();
    let presig = &temp.presignature;
    let sigma_share = temp
        .sigma_share
        .ok_or(Bug::MissingRoundData(RoundKind::Sign1))
        .map_err(|bug| ProtocolError::local(ROUND, bug))?;

    let mut s = sigma_share;
    let mut culprits = vec![];
    for j in ctx.params.peers() {
        let msg = ctx
            .store
            .get::<SignRound1<E>>(j)
            .map_err(|bug| ProtocolError::local(ROUND, bug))?;
        if msg.big_r != presig.big_r {
            let party = ctx
                .params
                .party(j)
                .ok_or(Bug::UnknownParty(j))
                .map_err(|bug| ProtocolError::local(ROUND, bug))?;
            culprits.push(Culprit {
                party: party.clone(),
                reason: Misbehavior::BigRMismatch,
            });
        }
        s = s + msg.sigma_share;
    }
    if !culprits.is_empty() {
        for culprit in &culprits {
            tracing::warn!(round = ?ROUND, %culprit, "party misbehaved");
        }
        return Err(ProtocolError::Violation {
            round: ROUND,
            culprits,
        });
    }

    let (r, recovery_id) =
        r_and_recovery_id(&presig.big_r).ok_or(ProtocolError::Unattributed {
            round: ROUND,
            reason: UnattributedFailure::DegenerateNonce,
        })?;
    let mut signature = SignatureData {
        r,
        s,
        recovery_id,
        m: temp.message,
    };
    signature.normalize_s();

    let public_key = temp.derived_public_key(ctx.key.public_key());
    if signature.verify(&public_key).is_err() {
        tracing::error!(party = own, "assembled signature is invalid");
        if ctx.params.needs_identification() {
            temp.signature_invalid = true;
            return Ok(Outcome::Identify);
        }
        return Err(ProtocolError::Unattributed {
            round: ROUND,
            reason: UnattributedFailure::SignatureInvalid,
        });
    }

    temp.output = Some(signature);
    tracing::debug!(party = own, "signature is ready");
    Ok(Outcome::Done)
}

