use generic_ec::Curve;

use super::SignTemp;
use crate::{
    curve::r_and_recovery_id,
    error::{CallerError, ProtocolError, UnattributedFailure},
    messages::{Envelope, Msg, SignRound1},
    round::{RoundContext, RoundKind},
    ssid::Ssid,
};

const ROUND: RoundKind = RoundKind::Sign1;

/// Computes and broadcasts $\sigma_i$
pub(crate) fn start<E: Curve>(
    ctx: &RoundContext<E>,
    temp: &mut SignTemp<E>,
) -> Result<Vec<Envelope<E>>, ProtocolError> {
    let own = ctx.own();
    let presig = &temp.presignature;
    if presig.index != own {
        return Err(CallerError::PresignatureIndexMismatch {
            presignature: presig.index,
            own,
        }
        .into());
    }
    if presig.ssid != Ssid::compute::<E>(ctx.params.parties(), &presig.ssid_nonce, 1) {
        return Err(CallerError::SsidMismatch.into());
    }

    let (r, _) = r_and_recovery_id(&presig.big_r).ok_or(ProtocolError::Unattributed {
        round: ROUND,
        reason: UnattributedFailure::DegenerateNonce,
    })?;
    let k = presig.k_share.as_ref();
    let sigma_share =
        k * temp.message + r * presig.chi_share.as_ref() + r * k * temp.derivation_delta;
    let message = Envelope::broadcast(
        own,
        Msg::SignRound1(SignRound1 {
            sigma_share,
            big_r: presig.big_r,
        }),
    );

    temp.sigma_share = Some(sigma_share);
    Ok(vec![message])
}
