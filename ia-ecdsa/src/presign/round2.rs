use generic_ec::{Curve, Point};
use rand_core::{CryptoRng, RngCore};

use super::{MtaSent, PresignTemp, Round2Local};
use crate::{
    curve::scalar_to_bn,
    error::{Bug, LocalError, Misbehavior, ProtocolError},
    messages::{Envelope, Msg, PresignRound1, PresignRound2},
    mta::{self, MtaStatement},
    round::{fan_out, join_all, RoundContext, RoundKind, TaskError},
    zkp::{enc, logstar},
};

const ROUND: RoundKind = RoundKind::Presign2;

/// Verifies $K_j$ of every peer and responds to it with delta and chi MtA
pub(crate) fn start<E: Curve, R: RngCore + CryptoRng>(
    ctx: &RoundContext<E>,
    temp: &mut PresignTemp<E>,
    rng: &mut R,
) -> Result<Vec<Envelope<E>>, ProtocolError> {
    let own = ctx.own();
    let secrets = temp
        .round1
        .as_ref()
        .ok_or(Bug::MissingRoundData(RoundKind::Presign1))
        .map_err(|bug| ProtocolError::local(ROUND, bug))?;
    let ek = ctx.ek(own).map_err(|bug| ProtocolError::local(ROUND, bug))?;
    let own_rp = ctx.rp(own).map_err(|bug| ProtocolError::local(ROUND, bug))?;
    let big_w = *ctx
        .public_share(own)
        .map_err(|bug| ProtocolError::local(ROUND, bug))?;

    let big_gamma_share = Point::generator() * secrets.gamma.as_ref();
    let gamma_bn = scalar_to_bn(secrets.gamma.as_ref());
    let min_bits = ctx.params.security().min_paillier_bits;
    let proof_ctx = ctx.proof_context(ROUND, own);

    let results = fan_out(ctx.params.peers(), rng, ctx.cancel, |j, rng| {
        let msg = ctx.store.get::<PresignRound1>(j)?;
        let ek_j = ctx.ek(j)?;
        let rp_j = ctx.rp(j)?;

        if !ek_j.has_bit_length(min_bits) {
            return Err(TaskError::Culprit(Misbehavior::PaillierModulusTooSmall));
        }
        if !ek_j.is_valid_ciphertext(&msg.k) || !ek_j.is_valid_ciphertext(&msg.g) {
            return Err(TaskError::Culprit(Misbehavior::InvalidCiphertext));
        }
        msg.enc_proof
            .verify(
                &ctx.proof_context(RoundKind::Presign1, j),
                &enc::Statement {
                    ek: ek_j,
                    k: &msg.k,
                    rp: own_rp,
                },
            )
            .map_err(|_| TaskError::Culprit(Misbehavior::InvalidEncProof))?;

        ctx.cancel.check()?;
        let (delta, beta_delta) = mta::respond(
            &proof_ctx,
            &MtaStatement {
                receiver_ek: ek_j,
                responder_ek: ek,
                k: &msg.k,
                big_a: &big_gamma_share,
                receiver_rp: rp_j,
            },
            secrets.gamma.as_ref(),
            rng,
        )
        .map_err(LocalError::from)?;
        let (chi, beta_chi) = mta::respond(
            &proof_ctx,
            &MtaStatement {
                receiver_ek: ek_j,
                responder_ek: ek,
                k: &msg.k,
                big_a: &big_w,
                receiver_rp: rp_j,
            },
            ctx.key.w(),
            rng,
        )
        .map_err(LocalError::from)?;

        let logstar = logstar::LogstarProof::prove(
            &proof_ctx,
            &logstar::Statement {
                ek,
                c: &secrets.big_g,
                x: &big_gamma_share,
                base: &Point::generator().to_point(),
                rp: rp_j,
            },
            &logstar::Witness {
                x: &gamma_bn,
                rho: &secrets.gamma_nonce,
            },
            rng,
        )
        .map_err(LocalError::from)?;

        let message = PresignRound2 {
            big_gamma_share,
            d_delta: delta.d.clone(),
            f_delta: delta.f.clone(),
            d_chi: chi.d.clone(),
            f_chi: chi.f.clone(),
            affg_delta: delta.proof,
            affg_chi: chi.proof,
            logstar,
        };
        let sent = MtaSent {
            beta_delta,
            beta_chi,
            d_delta: delta.d,
            f_delta: delta.f,
            d_chi: chi.d,
            f_chi: chi.f,
        };
        Ok((message, sent))
    });
    let responses = join_all(ctx.params, ROUND, ctx.cancel, results)?;

    let mut sent = vec![None; usize::from(ctx.params.party_count())];
    let mut messages = Vec::with_capacity(responses.len());
    for (j, (message, mta_sent)) in responses {
        if let Some(slot) = sent.get_mut(usize::from(j)) {
            *slot = Some(mta_sent);
        }
        messages.push(Envelope::p2p(own, j, Msg::PresignRound2(message)));
    }

    temp.round2 = Some(Round2Local {
        big_gamma_share,
        sent,
    });
    Ok(messages)
}
