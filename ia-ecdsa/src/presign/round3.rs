use generic_ec::{Curve, Point, SecretScalar};
use rand_core::{CryptoRng, RngCore};

use super::{PresignTemp, Round3Local};
use crate::{
    curve::{bn_to_scalar, scalar_to_bn},
    error::{Bug, LocalError, Misbehavior, ProtocolError},
    messages::{Envelope, Msg, PresignRound1, PresignRound2, PresignRound3},
    mta::{self, MtaStatement},
    round::{fan_out, join_all, RoundContext, RoundKind, TaskError},
    zkp::logstar,
};

const ROUND: RoundKind = RoundKind::Presign3;

/// Verifies MtA responses, computes $\delta_i$, $\chi_i$, $\Delta_i$ and proves $\Delta_i$ to
/// every peer
pub(crate) fn start<E: Curve, R: RngCore + CryptoRng>(
    ctx: &RoundContext<E>,
    temp: &mut PresignTemp<E>,
    rng: &mut R,
) -> Result<Vec<Envelope<E>>, ProtocolError> {
    let own = ctx.own();
    let bug = |bug: Bug| ProtocolError::local(ROUND, bug);
    let secrets = temp
        .round1
        .as_ref()
        .ok_or(Bug::MissingRoundData(RoundKind::Presign1))
        .map_err(bug)?;
    let local = temp
        .round2
        .as_ref()
        .ok_or(Bug::MissingRoundData(RoundKind::Presign2))
        .map_err(bug)?;
    let ek = ctx.ek(own).map_err(bug)?;
    let own_rp = ctx.rp(own).map_err(bug)?;
    let dk = ctx.key.dk();

    let results = fan_out(ctx.params.peers(), rng, ctx.cancel, |j, _rng| {
        let msg1 = ctx.store.get::<PresignRound1>(j)?;
        let msg = ctx.store.get::<PresignRound2<E>>(j)?;
        let ek_j = ctx.ek(j)?;
        let big_w_j = ctx.public_share(j)?;

        let ciphertexts_valid = ek.is_valid_ciphertext(&msg.d_delta)
            && ek.is_valid_ciphertext(&msg.d_chi)
            && ek_j.is_valid_ciphertext(&msg.f_delta)
            && ek_j.is_valid_ciphertext(&msg.f_chi);
        if !ciphertexts_valid {
            return Err(TaskError::Culprit(Misbehavior::InvalidCiphertext));
        }

        let proof_ctx = ctx.proof_context(RoundKind::Presign2, j);
        let delta = mta::MtaResponse {
            d: msg.d_delta.clone(),
            f: msg.f_delta.clone(),
            proof: msg.affg_delta.clone(),
        };
        delta
            .verify(
                &proof_ctx,
                &MtaStatement {
                    receiver_ek: ek,
                    responder_ek: ek_j,
                    k: &secrets.big_k,
                    big_a: &msg.big_gamma_share,
                    receiver_rp: own_rp,
                },
            )
            .map_err(|_| TaskError::Culprit(Misbehavior::InvalidAffgDelta))?;
        let chi = mta::MtaResponse {
            d: msg.d_chi.clone(),
            f: msg.f_chi.clone(),
            proof: msg.affg_chi.clone(),
        };
        chi.verify(
            &proof_ctx,
            &MtaStatement {
                receiver_ek: ek,
                responder_ek: ek_j,
                k: &secrets.big_k,
                big_a: big_w_j,
                receiver_rp: own_rp,
            },
        )
        .map_err(|_| TaskError::Culprit(Misbehavior::InvalidAffgChi))?;
        msg.logstar
            .verify(
                &proof_ctx,
                &logstar::Statement {
                    ek: ek_j,
                    c: &msg1.g,
                    x: &msg.big_gamma_share,
                    base: &Point::generator().to_point(),
                    rp: own_rp,
                },
            )
            .map_err(|_| TaskError::Culprit(Misbehavior::InvalidLogstarGamma))?;

        let alpha_delta = mta::receive::<E>(dk, &msg.d_delta)?;
        let alpha_chi = mta::receive::<E>(dk, &msg.d_chi)?;
        Ok((msg.big_gamma_share, alpha_delta, alpha_chi))
    });
    let received = join_all(ctx.params, ROUND, ctx.cancel, results)?;

    let k = secrets.k.as_ref();
    let mut big_gamma = local.big_gamma_share;
    let mut delta_share = k * secrets.gamma.as_ref();
    let mut chi_share = k * ctx.key.w();
    for (j, (big_gamma_j, alpha_delta, alpha_chi)) in received {
        let sent = local
            .sent
            .get(usize::from(j))
            .and_then(Option::as_ref)
            .ok_or(Bug::MissingRoundData(RoundKind::Presign2))
            .map_err(bug)?;
        big_gamma = big_gamma + big_gamma_j;
        delta_share = delta_share + alpha_delta + bn_to_scalar::<E>(&sent.beta_delta);
        chi_share = chi_share + alpha_chi + bn_to_scalar::<E>(&sent.beta_chi);
    }
    let big_delta_share = big_gamma * k;

    let k_bn = scalar_to_bn(k);
    let proof_ctx = ctx.proof_context(ROUND, own);
    let results = fan_out(ctx.params.peers(), rng, ctx.cancel, |j, rng| {
        let proof = logstar::LogstarProof::prove(
            &proof_ctx,
            &logstar::Statement {
                ek,
                c: &secrets.big_k,
                x: &big_delta_share,
                base: &big_gamma,
                rp: ctx.rp(j)?,
            },
            &logstar::Witness {
                x: &k_bn,
                rho: &secrets.k_nonce,
            },
            rng,
        )
        .map_err(LocalError::from)?;
        Ok(proof)
    });
    let proofs = join_all(ctx.params, ROUND, ctx.cancel, results)?;

    let messages = proofs
        .into_iter()
        .map(|(j, logstar)| {
            Envelope::p2p(
                own,
                j,
                Msg::PresignRound3(PresignRound3 {
                    delta_share,
                    big_delta_share,
                    logstar,
                }),
            )
        })
        .collect();

    temp.round3 = Some(Round3Local {
        big_gamma,
        delta_share,
        chi_share: SecretScalar::new(&mut chi_share),
        big_delta_share,
    });
    Ok(messages)
}

