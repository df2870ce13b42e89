use generic_ec::{Curve, SecretScalar};
use rand_core::{CryptoRng, RngCore};

use super::{PresignTemp, Round1Secrets};
use crate::{
    curve::scalar_to_bn,
    error::{LocalError, ProtocolError},
    messages::{Envelope, Msg, PresignRound1},
    round::{fan_out, join_all, RoundContext, RoundKind},
    zkp::enc,
};

const ROUND: RoundKind = RoundKind::Presign1;

/// Samples $k_i$, $\gamma_i$, sends $K_i$, $G_i$ and a range proof of $K_i$ to every peer
pub(crate) fn start<E: Curve, R: RngCore + CryptoRng>(
    ctx: &RoundContext<E>,
    temp: &mut PresignTemp<E>,
    rng: &mut R,
) -> Result<Vec<Envelope<E>>, ProtocolError> {
    let own = ctx.own();
    let ek = ctx.ek(own).map_err(|bug| ProtocolError::local(ROUND, bug))?;

    let k = SecretScalar::<E>::random(rng);
    let gamma = SecretScalar::<E>::random(rng);
    let k_bn = scalar_to_bn(k.as_ref());
    let gamma_bn = scalar_to_bn(gamma.as_ref());
    let (big_k, k_nonce) = ek
        .encrypt(rng, &k_bn)
        .map_err(|err| ProtocolError::local(ROUND, err))?;
    let (big_g, gamma_nonce) = ek
        .encrypt(rng, &gamma_bn)
        .map_err(|err| ProtocolError::local(ROUND, err))?;

    let proof_ctx = ctx.proof_context(ROUND, own);
    let results = fan_out(ctx.params.peers(), rng, ctx.cancel, |j, rng| {
        let proof = enc::EncProof::prove(
            &proof_ctx,
            &enc::Statement {
                ek,
                k: &big_k,
                rp: ctx.rp(j)?,
            },
            &enc::Witness {
                k: &k_bn,
                rho: &k_nonce,
            },
            rng,
        )
        .map_err(LocalError::from)?;
        Ok(proof)
    });
    let proofs = join_all(ctx.params, ROUND, ctx.cancel, results)?;

    let messages = proofs
        .into_iter()
        .map(|(j, enc_proof)| {
            Envelope::p2p(
                own,
                j,
                Msg::PresignRound1(PresignRound1 {
                    k: big_k.clone(),
                    g: big_g.clone(),
                    enc_proof,
                }),
            )
        })
        .collect();

    temp.round1 = Some(Round1Secrets {
        k,
        gamma,
        k_nonce,
        gamma_nonce,
        big_k,
        big_g,
    });
    tracing::debug!(party = own, "sampled nonces");
    Ok(messages)
}
