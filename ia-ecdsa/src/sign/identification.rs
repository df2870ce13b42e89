//! Identification after the assembled signature failed to verify
//!
//! $\sigma_i = k_i (m + r\delta) + r \chi_i$, so its encryption under $N_i$ is
//! $K_i^{m + r\delta} \cdot \text{Acc}_i^r$ where $\text{Acc}_i$ recombines the chi MtA
//! ciphertexts kept in the presignature transcript. Every party proves the plaintext of that
//! ciphertext equals the $\sigma_i$ it broadcast.

use generic_ec::Curve;
use libpaillier::unknown_order::BigNumber;
use rand_core::{CryptoRng, RngCore};

use super::SignTemp;
use crate::{
    curve::{bn_to_scalar, r_and_recovery_id, scalar_to_bn},
    error::{Bug, CallerError, LocalError, Misbehavior, ProtocolError, UnattributedFailure},
    identification::{accumulate, q3_encryption},
    messages::{Envelope, Msg, SignIdentification, SignRound1},
    paillier::{Ciphertext, EncryptionKey, PaillierError},
    presign::Transcript,
    round::{fan_out, join_all, RoundContext, RoundKind, TaskError},
    zkp::{dec, mulstar},
};

/// Encryption of $\sigma$ out of $K$ and the accumulator
fn sigma_encryption(
    ek: &EncryptionKey,
    big_k: &Ciphertext,
    acc: &Ciphertext,
    message_factor: &BigNumber,
    r: &BigNumber,
) -> Result<Ciphertext, PaillierError> {
    Ok(ek.add(&ek.mul(big_k, message_factor)?, &ek.mul(acc, r)?))
}

fn transcript<E: Curve>(temp: &SignTemp<E>) -> Result<&Transcript, CallerError> {
    temp.presignature
        .transcript
        .as_ref()
        .ok_or(CallerError::MissingTranscript)
}

/// Broadcasts $H_i$, the chi MtA ciphertexts and proofs for every verifier
pub(crate) fn start<E: Curve, R: RngCore + CryptoRng>(
    ctx: &RoundContext<E>,
    temp: &SignTemp<E>,
    rng: &mut R,
) -> Result<Vec<Envelope<E>>, ProtocolError> {
    const ROUND: RoundKind = RoundKind::SignIdentification;
    let own = ctx.own();
    let bug = |bug: Bug| ProtocolError::local(ROUND, bug);
    let local_err = |err: LocalError| ProtocolError::local(ROUND, err);
    let transcript = transcript(temp)?;
    let sigma_share = temp
        .sigma_share
        .ok_or(Bug::MissingRoundData(RoundKind::Sign1))
        .map_err(bug)?;
    let big_k = transcript
        .k_ciphertext(own)
        .ok_or(Bug::MissingRoundData(RoundKind::PresignOut))
        .map_err(bug)?;
    let (r, _) = r_and_recovery_id(&temp.presignature.big_r).ok_or(
        ProtocolError::Unattributed {
            round: ROUND,
            reason: UnattributedFailure::DegenerateNonce,
        },
    )?;
    let ek = ctx.ek(own).map_err(bug)?;
    let big_w = ctx.public_share(own).map_err(bug)?;
    let w = scalar_to_bn(ctx.key.w());

    let (h, h_nonce) = ek
        .mul_obfuscate(rng, big_k, &w)
        .map_err(|err| local_err(err.into()))?;
    let q3_enc = q3_encryption::<E>(ek);
    let acc = accumulate(
        ek,
        &h,
        &q3_enc,
        transcript.d_chi_received.iter().flatten(),
        transcript.f_chi_sent.iter().flatten(),
    )
    .map_err(|err| local_err(err.into()))?;
    let sigma_enc = sigma_encryption(
        ek,
        big_k,
        &acc,
        &scalar_to_bn(&temp.message_factor(r)),
        &scalar_to_bn(&r),
    )
    .map_err(|err| local_err(err.into()))?;

    let dk = ctx.key.dk();
    let plaintext = dk
        .decrypt(&sigma_enc)
        .map_err(|err| local_err(err.into()))?;
    if bn_to_scalar::<E>(&plaintext) != sigma_share {
        return Err(bug(Bug::OwnAccumulatorMismatch));
    }
    let sigma_nonce = dk
        .get_randomness(&sigma_enc)
        .map_err(|err| local_err(err.into()))?;
    let sigma_bn = scalar_to_bn(&sigma_share);

    let proof_ctx = ctx.proof_context(ROUND, own);
    let results = fan_out(ctx.params.peers(), rng, ctx.cancel, |j, rng| {
        let rp = ctx.rp(j)?;
        let mulstar_proof = mulstar::MulstarProof::prove(
            &proof_ctx,
            &mulstar::Statement {
                ek,
                c: big_k,
                d: &h,
                x: big_w,
                rp,
            },
            &mulstar::Witness { x: &w, rho: &h_nonce },
            rng,
        )
        .map_err(LocalError::from)?;
        let dec_proof = dec::DecProof::prove(
            &proof_ctx,
            &dec::Statement {
                ek,
                c: &sigma_enc,
                x: &sigma_bn,
                rp,
            },
            &dec::Witness {
                y: &plaintext,
                rho: &sigma_nonce,
            },
            rng,
        )
        .map_err(LocalError::from)?;
        Ok((mulstar_proof, dec_proof))
    });
    let proofs = join_all(ctx.params, ROUND, ctx.cancel, results)?;

    let n = usize::from(ctx.params.party_count());
    let mut mulstar_proofs = vec![None; n];
    let mut dec_proofs = vec![None; n];
    for (j, (mulstar_proof, dec_proof)) in proofs {
        mulstar_proofs[usize::from(j)] = Some(mulstar_proof);
        dec_proofs[usize::from(j)] = Some(dec_proof);
    }

    tracing::info!(party = own, "proving sigma share");
    Ok(vec![Envelope::broadcast(
        own,
        Msg::SignIdentification(SignIdentification {
            h,
            mulstar_proofs,
            d_chis: transcript.d_chi_received.clone(),
            f_chis: transcript.f_chi_sent.clone(),
            dec_proofs,
            q3_enc,
        }),
    )])
}

/// Verifies proofs of every peer and names those whose $\sigma_j$ is wrong
///
/// Never succeeds: identification only runs after a failure.
pub(crate) fn finish<E: Curve, R: RngCore + CryptoRng>(
    ctx: &RoundContext<E>,
    temp: &SignTemp<E>,
    rng: &mut R,
) -> ProtocolError {
    const ROUND: RoundKind = RoundKind::SignIdentificationOut;
    let own = ctx.own();
    let transcript = match transcript(temp) {
        Ok(transcript) => transcript,
        Err(err) => return err.into(),
    };
    let Some((r, _)) = r_and_recovery_id(&temp.presignature.big_r) else {
        return ProtocolError::Unattributed {
            round: ROUND,
            reason: UnattributedFailure::DegenerateNonce,
        };
    };
    let own_rp = match ctx.rp(own) {
        Ok(rp) => rp,
        Err(bug) => return ProtocolError::local(ROUND, bug),
    };
    let message_factor = scalar_to_bn(&temp.message_factor(r));
    let r = scalar_to_bn(&r);

    let results = fan_out(ctx.params.peers(), rng, ctx.cancel, |p, _rng| {
        let msg = ctx.store.get::<SignIdentification<E>>(p)?;
        let sigma_share = ctx.store.get::<SignRound1<E>>(p)?.sigma_share;
        let ek_p = ctx.ek(p)?;
        let big_w_p = ctx.public_share(p)?;
        let big_k_p = transcript
            .k_ciphertext(p)
            .ok_or(Bug::MissingRoundData(RoundKind::PresignOut))?;
        let own_slot = usize::from(own);
        let peer_slot = usize::from(p);

        if msg.q3_enc != q3_encryption::<E>(ek_p) {
            return Err(TaskError::Culprit(Misbehavior::Q3Mismatch));
        }
        let d_own = msg.d_chis.get(own_slot).and_then(Option::as_ref);
        let f_own = msg.f_chis.get(own_slot).and_then(Option::as_ref);
        let d_sent = transcript.d_chi_sent.get(peer_slot).and_then(Option::as_ref);
        let f_received = transcript
            .f_chi_received
            .get(peer_slot)
            .and_then(Option::as_ref);
        if d_own.is_none() || d_own != d_sent || f_own != f_received {
            return Err(TaskError::Culprit(Misbehavior::TranscriptMismatch));
        }
        let ciphertexts_valid = ek_p.is_valid_ciphertext(&msg.h)
            && msg
                .d_chis
                .iter()
                .chain(&msg.f_chis)
                .flatten()
                .all(|c| ek_p.is_valid_ciphertext(c));
        if !ciphertexts_valid {
            return Err(TaskError::Culprit(Misbehavior::InvalidCiphertext));
        }

        let (Some(mulstar_proof), Some(dec_proof)) = (
            msg.mulstar_proofs.get(own_slot).and_then(Option::as_ref),
            msg.dec_proofs.get(own_slot).and_then(Option::as_ref),
        ) else {
            return Err(TaskError::Culprit(Misbehavior::MissingIdentificationData));
        };

        let proof_ctx = ctx.proof_context(RoundKind::SignIdentification, p);
        mulstar_proof
            .verify(
                &proof_ctx,
                &mulstar::Statement {
                    ek: ek_p,
                    c: big_k_p,
                    d: &msg.h,
                    x: big_w_p,
                    rp: own_rp,
                },
            )
            .map_err(|_| TaskError::Culprit(Misbehavior::InvalidMulstarProof))?;

        let acc = accumulate(
            ek_p,
            &msg.h,
            &msg.q3_enc,
            msg.d_chis.iter().flatten(),
            msg.f_chis.iter().flatten(),
        )
        .map_err(|_| TaskError::Culprit(Misbehavior::InvalidCiphertext))?;
        let sigma_enc = sigma_encryption(ek_p, big_k_p, &acc, &message_factor, &r)
            .map_err(|_| TaskError::Culprit(Misbehavior::InvalidCiphertext))?;

        dec_proof
            .verify(
                &proof_ctx,
                &dec::Statement {
                    ek: ek_p,
                    c: &sigma_enc,
                    x: &scalar_to_bn(&sigma_share),
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
