use generic_ec::{Curve, Point, Scalar, SecretScalar};
use rand_core::{CryptoRng, RngCore};

use super::{PreSignatureData, PresignTemp, Transcript};
use crate::{
    error::{Bug, Misbehavior, ProtocolError, UnattributedFailure},
    messages::{PresignRound1, PresignRound2, PresignRound3},
    round::{fan_out, join_all, Outcome, RoundContext, RoundKind, TaskError},
    ssid::Ssid,
    zkp::logstar,
};

const ROUND: RoundKind = RoundKind::PresignOut;

/// Verifies $\Delta_j$, checks $\delta \cdot G = \Delta$ and assembles the presignature
pub(crate) fn finish<E: Curve, R: RngCore + CryptoRng>(
    ctx: &RoundContext<E>,
    temp: &mut PresignTemp<E>,
    rng: &mut R,
) -> Result<Outcome, ProtocolError> {
    let own = ctx.own();
    let bug = |bug: Bug| ProtocolError::local(ROUND, bug);
    let local = temp
        .round3
        .as_ref()
        .ok_or(Bug::MissingRoundData(RoundKind::Presign3))
        .map_err(bug)?;
    let own_rp = ctx.rp(own).map_err(bug)?;

    let results = fan_out(ctx.params.peers(), rng, ctx.cancel, |j, _rng| {
        let msg1 = ctx.store.get::<PresignRound1>(j)?;
        let msg = ctx.store.get::<PresignRound3<E>>(j)?;
        msg.logstar
            .verify(
                &ctx.proof_context(RoundKind::Presign3, j),
                &logstar::Statement {
                    ek: ctx.ek(j)?,
                    c: &msg1.k,
                    x: &msg.big_delta_share,
                    base: &local.big_gamma,
                    rp: own_rp,
                },
            )
            .map_err(|_| TaskError::Culprit(Misbehavior::InvalidLogstarDelta))?;
        Ok((msg.delta_share, msg.big_delta_share))
    });
    let received = join_all(ctx.params, ROUND, ctx.cancel, results)?;

    let (delta, big_delta) = received.iter().fold(
        (local.delta_share, local.big_delta_share),
        |(delta, big_delta), (_, (delta_j, big_delta_j))| {
            (delta + delta_j, big_delta + big_delta_j)
        },
    );

    if Point::generator() * delta != big_delta {
        tracing::error!(party = own, "delta * G doesn't match Delta");
        if ctx.params.needs_identification() {
            temp.delta_mismatch = true;
            return Ok(Outcome::Identify);
        }
        return Err(ProtocolError::Unattributed {
            round: ROUND,
            reason: UnattributedFailure::DeltaMismatch,
        });
    }

    let delta_inv = delta.invert().ok_or(ProtocolError::Unattributed {
        round: ROUND,
        reason: UnattributedFailure::DegenerateNonce,
    })?;
    let big_r = local.big_gamma * delta_inv;
    if big_r.is_zero() {
        return Err(ProtocolError::Unattributed {
            round: ROUND,
            reason: UnattributedFailure::DegenerateNonce,
        });
    }

    let transcript = if ctx.params.needs_identification() {
        Some(transcript(ctx, temp).map_err(bug)?)
    } else {
        None
    };

    let secrets = temp
        .round1
        .as_ref()
        .ok_or(Bug::MissingRoundData(RoundKind::Presign1))
        .map_err(bug)?;
    let mut k_share: Scalar<E> = *secrets.k.as_ref();
    let mut chi_share: Scalar<E> = *local.chi_share.as_ref();
    temp.output = Some(PreSignatureData {
        index: own,
        ssid: Ssid::compute::<E>(ctx.params.parties(), &temp.nonce, 1),
        ssid_nonce: temp.nonce.clone(),
        big_r,
        k_share: SecretScalar::new(&mut k_share),
        chi_share: SecretScalar::new(&mut chi_share),
        transcript,
    });
    tracing::debug!(party = own, "presignature is ready");
    Ok(Outcome::Done)
}

/// Collects ciphertexts of the chi MtA
fn transcript<E: Curve>(ctx: &RoundContext<E>, temp: &PresignTemp<E>) -> Result<Transcript, Bug> {
    let own = ctx.own();
    let n = usize::from(ctx.params.party_count());
    let secrets = temp
        .round1
        .as_ref()
        .ok_or(Bug::MissingRoundData(RoundKind::Presign1))?;
    let local = temp
        .round2
        .as_ref()
        .ok_or(Bug::MissingRoundData(RoundKind::Presign2))?;

    let mut transcript = Transcript {
        k_ciphertexts: Vec::with_capacity(n),
        d_chi_received: vec![None; n],
        f_chi_sent: vec![None; n],
        d_chi_sent: vec![None; n],
        f_chi_received: vec![None; n],
    };
    for j in 0..ctx.params.party_count() {
        if j == own {
            transcript.k_ciphertexts.push(secrets.big_k.clone());
            continue;
        }
        let slot = usize::from(j);
        let msg1 = ctx.store.get::<PresignRound1>(j)?;
        let msg2 = ctx.store.get::<PresignRound2<E>>(j)?;
        let sent = local
            .sent
            .get(slot)
            .and_then(Option::as_ref)
            .ok_or(Bug::MissingRoundData(RoundKind::Presign2))?;
        transcript.k_ciphertexts.push(msg1.k.clone());
        transcript.d_chi_received[slot] = Some(msg2.d_chi.clone());
        transcript.f_chi_received[slot] = Some(msg2.f_chi.clone());
        transcript.d_chi_sent[slot] = Some(sent.d_chi.clone());
        transcript.f_chi_sent[slot] = Some(sent.f_chi.clone());
    }
    Ok(transcript)
}
