//! Identification after $\delta \cdot G \neq \Delta$
//!
//! Every party proves that its $\delta_i$ is consistent with the delta MtA ciphertexts it
//! exchanged. A party that sent a $\delta_i$ inconsistent with its ciphertexts can't produce a
//! valid decryption proof.

use generic_ec::Curve;
use rand_core::{CryptoRng, RngCore};

use super::PresignTemp;
use crate::{
    curve::{bn_to_scalar, scalar_to_bn},
    error::{Bug, LocalError, Misbehavior, ProtocolError, UnattributedFailure},
    identification::{accumulate, q3_encryption},
    messages::{Envelope, Msg, PresignIdentification, PresignRound1, PresignRound2, PresignRound3},
    round::{fan_out, join_all, RoundContext, RoundKind, TaskError},
    zkp::{dec, mul},
};

/// Sends $H_i$, the recombined encryption of $\delta_i$ and proofs of both
pub(crate) fn start<E: Curve, R: RngCore + CryptoRng>(
    ctx: &RoundContext<E>,
    temp: &PresignTemp<E>,
    rng: &mut R,
) -> Result<Vec<Envelope<E>>, ProtocolError> {
    const ROUND: RoundKind = RoundKind::PresignIdentification;
    let own = ctx.own();
    let n = usize::from(ctx.params.party_count());
    let bug = |bug: Bug| ProtocolError::local(ROUND, bug);
    let local_err = |err: LocalError| ProtocolError::local(ROUND, err);
    let secrets = temp
        .round1
        .as_ref()
        .ok_or(Bug::MissingRoundData(RoundKind::Presign1))
        .map_err(bug)?;
    let round2 = temp
        .round2
        .as_ref()
        .ok_or(Bug::MissingRoundData(RoundKind::Presign2))
        .map_err(bug)?;
    let round3 = temp
        .round3
        .as_ref()
        .ok_or(Bug::MissingRoundData(RoundKind::Presign3))
        .map_err(bug)?;
    let ek = ctx.ek(own).map_err(bug)?;
    let k_bn = scalar_to_bn(secrets.k.as_ref());

    let (h, h_nonce) = ek
        .mul_obfuscate(rng, &secrets.big_g, &k_bn)
        .map_err(|err| local_err(err.into()))?;
    let proof_ctx = ctx.proof_context(ROUND, own);
    let mul_proof = mul::MulProof::prove(
        &proof_ctx,
        &mul::Statement {
            ek,
            x: &secrets.big_k,
            y: &secrets.big_g,
            c: &h,
        },
        &mul::Witness {
            x: &k_bn,
            rho: &h_nonce,
            rho_x: &secrets.k_nonce,
        },
        rng,
    )
    .map_err(|err| local_err(err.into()))?;

    let mut d_deltas = vec![None; n];
    let mut f_deltas = vec![None; n];
    for j in ctx.params.peers() {
        let msg2 = ctx.store.get::<PresignRound2<E>>(j).map_err(bug)?;
        let sent = round2
            .sent
            .get(usize::from(j))
            .and_then(Option::as_ref)
            .ok_or(Bug::MissingRoundData(RoundKind::Presign2))
            .map_err(bug)?;
        d_deltas[usize::from(j)] = Some(msg2.d_delta.clone());
        f_deltas[usize::from(j)] = Some(sent.f_delta.clone());
    }

    let acc = accumulate(
        ek,
        &h,
        &q3_encryption::<E>(ek),
        d_deltas.iter().flatten(),
        f_deltas.iter().flatten(),
    )
    .map_err(|err| local_err(err.into()))?;
    let dk = ctx.key.dk();
    let plaintext = dk.decrypt(&acc).map_err(|err| local_err(err.into()))?;
    if bn_to_scalar::<E>(&plaintext) != round3.delta_share {
        return Err(bug(Bug::OwnAccumulatorMismatch));
    }
    let acc_nonce = dk
        .get_randomness(&acc)
        .map_err(|err| local_err(err.into()))?;
    let delta_bn = scalar_to_bn(&round3.delta_share);

    let results = fan_out(ctx.params.peers(), rng, ctx.cancel, |j, rng| {
        let proof = dec::DecProof::prove(
            &proof_ctx,
            &dec::Statement {
                ek,
                c: &acc,
                x: &delta_bn,
                rp: ctx.rp(j)?,
            },
            &dec::Witness {
                y: &plaintext,
                rho: &acc_nonce,
            },
            rng,
        )
        .map_err(LocalError::from)?;
        Ok(proof)
    });
    let proofs = join_all(ctx.params, ROUND, ctx.cancel, results)?;

    tracing::info!(party = own, "proving delta share");
    Ok(proofs
        .into_iter()
        .map(|(j, dec_proof)| {
            Envelope::p2p(
                own,
                j,
                Msg::PresignIdentification(PresignIdentification {
                    h: h.clone(),
                    mul_proof: mul_proof.clone(),
                    delta_share_enc: acc.clone(),
                    dec_proof,
                    d_deltas: d_deltas.clone(),
                    f_deltas: f_deltas.clone(),
                }),
            )
        })
        .collect())
}

/// Verifies proofs of every peer and names those whose $\delta_j$ is wrong
///
/// Never succeeds: identification only runs after a failure.
pub(crate) fn finish<E: Curve, R: RngCore + CryptoRng>(
    ctx: &RoundContext<E>,
    temp: &PresignTemp<E>,
    rng: &mut R,
) -> ProtocolError {
    const ROUND: RoundKind = RoundKind::PresignIdentificationOut;
    let own = ctx.own();
    let Some(round2) = temp.round2.as_ref() else {
        return ProtocolError::local(ROUND, Bug::MissingRoundData(RoundKind::Presign2));
    };
    let own_rp = match ctx.rp(own) {
        Ok(rp) => rp,
        Err(bug) => return ProtocolError::local(ROUND, bug),
    };

    let results = fan_out(ctx.params.peers(), rng, ctx.cancel, |p, _rng| {
        let msg = ctx.store.get::<PresignIdentification>(p)?;
        let msg1 = ctx.store.get::<PresignRound1>(p)?;
        let msg2 = ctx.store.get::<PresignRound2<E>>(p)?;
        let msg3 = ctx.store.get::<PresignRound3<E>>(p)?;
        let sent = round2
            .sent
            .get(usize::from(p))
            .and_then(Option::as_ref)
            .ok_or(Bug::MissingRoundData(RoundKind::Presign2))?;
        let ek_p = ctx.ek(p)?;
        let slot = usize::from(own);

        let d_own = msg.d_deltas.get(slot).and_then(Option::as_ref);
        let f_own = msg.f_deltas.get(slot).and_then(Option::as_ref);
        if d_own != Some(&sent.d_delta) || f_own != Some(&msg2.f_delta) {
            return Err(TaskError::Culprit(Misbehavior::TranscriptMismatch));
        }

        let ciphertexts_valid = ek_p.is_valid_ciphertext(&msg.h)
            && ek_p.is_valid_ciphertext(&msg.delta_share_enc)
            && msg
                .d_deltas
                .iter()
                .chain(&msg.f_deltas)
                .flatten()
                .all(|c| ek_p.is_valid_ciphertext(c));
        if !ciphertexts_valid {
            return Err(TaskError::Culprit(Misbehavior::InvalidCiphertext));
        }

        let proof_ctx = ctx.proof_context(RoundKind::PresignIdentification, p);
        msg.mul_proof
            .verify(
                &proof_ctx,
                &mul::Statement {
                    ek: ek_p,
                    x: &msg1.k,
                    y: &msg1.g,
                    c: &msg.h,
                },
            )
            .map_err(|_| TaskError::Culprit(Misbehavior::InvalidMulProof))?;

        let acc = accumulate(
            ek_p,
            &msg.h,
            &q3_encryption::<E>(ek_p),
            msg.d_deltas.iter().flatten(),
            msg.f_deltas.iter().flatten(),
        )
        .map_err(|_| TaskError::Culprit(Misbehavior::InvalidCiphertext))?;
        if acc != msg.delta_share_enc {
            return Err(TaskError::Culprit(Misbehavior::AccumulatorMismatch));
        }

        msg.dec_proof
            .verify(
                &proof_ctx,
                &dec::Statement {
                    ek: ek_p,
                    c: &acc,
                    x: &scalar_to_bn(&msg3.delta_share),
                    rp: own_rp,
                },
            )
            .map_err(|_| TaskError::Culprit(Misbehavior::InvalidDecProof))?;
        Ok(())
    });

    match join_all(ctx.params, ROUND, ctx.cancel, results) {
        Err(err) => err,
        Ok(_) => {
            tracing::warn!(party = own, "identification found no culprit");
            ProtocolError::Unattributed {
                round: ROUND,
                reason: UnattributedFailure::IdentificationInconclusive,
            }
        }
    }
}
