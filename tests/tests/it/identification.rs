use ia_ecdsa::{
    error::{Misbehavior, UnattributedFailure},
    generic_ec::{curves::Secp256k1, Point, Scalar},
    BigNumber, Envelope, KeyShare, Msg, Parameters, PartyIndex, PreSignatureData, ProtocolError,
    RoundKind,
};
use ia_ecdsa_tests::{
    key_shares, parameters, presign_parties, session_nonce, sign_parties, Simulation, Status,
};

type E = Secp256k1;

const SIGNERS: [usize; 3] = [0, 1, 2];

fn setup(
    rng: &mut rand_dev::DevRng,
    identification: bool,
) -> (Vec<KeyShare<E>>, Vec<Parameters<E>>) {
    let shares = key_shares::<E>(rng, 1, 3);
    let params = parameters(&shares, &SIGNERS, identification);
    (shares, params)
}

fn presign(
    rng: &mut rand_dev::DevRng,
    shares: &[KeyShare<E>],
    params: &[Parameters<E>],
) -> Vec<PreSignatureData<E>> {
    let nonce = session_nonce(rng);
    let mut simulation = Simulation::new(presign_parties(params, shares, &SIGNERS, &nonce));
    simulation.run(rng);
    simulation.assert_done();
    simulation.presignatures()
}

#[track_caller]
fn assert_blamed(status: &Status, round: RoundKind, culprits: &[(PartyIndex, Misbehavior)]) {
    match status.unwrap_err() {
        ProtocolError::Violation {
            round: actual_round,
            culprits: actual,
        } => {
            assert_eq!(*actual_round, round);
            let actual = actual
                .iter()
                .map(|c| (c.party.index(), c.reason))
                .collect::<Vec<_>>();
            assert_eq!(actual, culprits);
        }
        err => panic!("expected violation, got {err:?}"),
    }
}

#[track_caller]
fn assert_unattributed(status: &Status, round: RoundKind, reason: UnattributedFailure) {
    match status.unwrap_err() {
        ProtocolError::Unattributed {
            round: actual_round,
            reason: actual,
        } => {
            assert_eq!(*actual_round, round);
            assert_eq!(*actual, reason);
        }
        err => panic!("expected unattributed failure, got {err:?}"),
    }
}

fn bump(c: &mut BigNumber) {
    *c = &*c + &BigNumber::one();
}

#[test]
fn wrong_delta_point_is_blamed_on_sender() {
    let mut rng = rand_dev::DevRng::new();
    let (shares, params) = setup(&mut rng, false);
    let nonce = session_nonce(&mut rng);

    let mut simulation = Simulation::new(presign_parties(&params, &shares, &SIGNERS, &nonce));
    simulation.run_with(&mut rng, |envelope: &mut Envelope<E>| {
        if let (1, Msg::PresignRound3(msg)) = (envelope.from, &mut envelope.content) {
            msg.big_delta_share = msg.big_delta_share + Point::generator() * Scalar::one();
        }
    });

    for i in [0, 2] {
        assert_blamed(
            &simulation.status[i],
            RoundKind::PresignOut,
            &[(1, Misbehavior::InvalidLogstarDelta)],
        );
    }
    // party 1 saw its own honest messages only
    assert!(matches!(simulation.status[1], Status::Done));
}

#[test]
fn every_culprit_of_a_round_is_reported() {
    let mut rng = rand_dev::DevRng::new();
    let (shares, params) = setup(&mut rng, false);
    let nonce = session_nonce(&mut rng);

    let mut simulation = Simulation::new(presign_parties(&params, &shares, &SIGNERS, &nonce));
    simulation.run_with(&mut rng, |envelope: &mut Envelope<E>| {
        if let (1 | 2, Some(0), Msg::PresignRound3(msg)) =
            (envelope.from, envelope.to, &mut envelope.content)
        {
            msg.big_delta_share = msg.big_delta_share + Point::generator() * Scalar::one();
        }
    });

    assert_blamed(
        &simulation.status[0],
        RoundKind::PresignOut,
        &[
            (1, Misbehavior::InvalidLogstarDelta),
            (2, Misbehavior::InvalidLogstarDelta),
        ],
    );
}

#[test]
fn tampered_mta_ciphertext_fails_affine_proof() {
    for culprit in 0..3u16 {
        let mut rng = rand_dev::DevRng::new();
        let (shares, params) = setup(&mut rng, true);
        let nonce = session_nonce(&mut rng);

        let mut simulation =
            Simulation::new(presign_parties(&params, &shares, &SIGNERS, &nonce));
        simulation.run_with(&mut rng, |envelope: &mut Envelope<E>| {
            if let (true, Msg::PresignRound2(msg)) =
                (envelope.from == culprit, &mut envelope.content)
            {
                bump(&mut msg.d_chi);
            }
        });

        for i in (0..3).filter(|i| *i != culprit) {
            assert_blamed(
                &simulation.status[usize::from(i)],
                RoundKind::Presign3,
                &[(culprit, Misbehavior::InvalidAffgChi)],
            );
        }
    }
}

#[test]
fn wrong_delta_share_without_identification_is_unattributed() {
    let mut rng = rand_dev::DevRng::new();
    let (shares, params) = setup(&mut rng, false);
    let nonce = session_nonce(&mut rng);

    let mut simulation = Simulation::new(presign_parties(&params, &shares, &SIGNERS, &nonce));
    simulation.run_with(&mut rng, |envelope: &mut Envelope<E>| {
        if let (1, Msg::PresignRound3(msg)) = (envelope.from, &mut envelope.content) {
            msg.delta_share = msg.delta_share + Scalar::one();
        }
    });

    for i in [0, 2] {
        assert_unattributed(
            &simulation.status[i],
            RoundKind::PresignOut,
            UnattributedFailure::DeltaMismatch,
        );
    }
}

#[test]
fn wrong_delta_share_is_identified() {
    let mut rng = rand_dev::DevRng::new();
    let (shares, params) = setup(&mut rng, true);
    let nonce = session_nonce(&mut rng);

    let mut simulation = Simulation::new(presign_parties(&params, &shares, &SIGNERS, &nonce));
    simulation.run_with(&mut rng, |envelope: &mut Envelope<E>| {
        if let (1, Msg::PresignRound3(msg)) = (envelope.from, &mut envelope.content) {
            msg.delta_share = msg.delta_share + Scalar::one();
        }
    });

    // honest parties detected the mismatch and entered identification
    for i in [0, 2] {
        assert!(matches!(simulation.status[i], Status::Running));
        let party = &mut simulation.parties[i];
        assert_eq!(party.current_round(), RoundKind::PresignIdentification);
        assert!(party.presignature().is_none());
        let dump = party.take_pending_dump().unwrap();
        assert_eq!(
            dump.resume_point(),
            ia_ecdsa::ResumePoint::Entry(RoundKind::PresignIdentification)
        );
    }
    assert!(matches!(simulation.status[1], Status::Done));

    // the sender of wrong delta share is made to prove it
    simulation.force_into(1, &shares[1], RoundKind::PresignIdentification);
    simulation.run(&mut rng);

    for i in [0, 2] {
        assert_blamed(
            &simulation.status[i],
            RoundKind::PresignIdentificationOut,
            &[(1, Misbehavior::InvalidDecProof)],
        );
    }
    assert_unattributed(
        &simulation.status[1],
        RoundKind::PresignIdentificationOut,
        UnattributedFailure::IdentificationInconclusive,
    );
}

#[test]
fn honest_presigning_identification_is_inconclusive() {
    let mut rng = rand_dev::DevRng::new();
    let (shares, params) = setup(&mut rng, true);
    let nonce = session_nonce(&mut rng);

    let mut simulation = Simulation::new(presign_parties(&params, &shares, &SIGNERS, &nonce));
    simulation.run(&mut rng);
    simulation.assert_done();

    for (i, share) in shares.iter().enumerate() {
        simulation.force_into(i, share, RoundKind::PresignIdentification);
    }
    simulation.run(&mut rng);

    for status in &simulation.status {
        assert_unattributed(
            status,
            RoundKind::PresignIdentificationOut,
            UnattributedFailure::IdentificationInconclusive,
        );
    }
}

#[test]
fn wrong_nonce_point_in_signing_is_blamed() {
    let mut rng = rand_dev::DevRng::new();
    let (shares, params) = setup(&mut rng, false);
    let presignatures = presign(&mut rng, &shares, &params);

    let mut simulation = Simulation::new(sign_parties(
        &params,
        &shares,
        &SIGNERS,
        presignatures,
        None,
    ));
    simulation.run_with(&mut rng, |envelope: &mut Envelope<E>| {
        if let (2, Msg::SignRound1(msg)) = (envelope.from, &mut envelope.content) {
            msg.big_r = msg.big_r + Point::generator() * Scalar::one();
        }
    });

    for i in [0, 1] {
        assert_blamed(
            &simulation.status[i],
            RoundKind::SignOut,
            &[(2, Misbehavior::BigRMismatch)],
        );
    }
}

#[test]
fn wrong_sigma_without_identification_is_unattributed() {
    let mut rng = rand_dev::DevRng::new();
    let (shares, params) = setup(&mut rng, false);
    let presignatures = presign(&mut rng, &shares, &params);

    let mut simulation = Simulation::new(sign_parties(
        &params,
        &shares,
        &SIGNERS,
        presignatures,
        None,
    ));
    simulation.run_with(&mut rng, |envelope: &mut Envelope<E>| {
        if let (2, Msg::SignRound1(msg)) = (envelope.from, &mut envelope.content) {
            msg.sigma_share = msg.sigma_share + Scalar::one();
        }
    });

    for i in [0, 1] {
        assert_unattributed(
            &simulation.status[i],
            RoundKind::SignOut,
            UnattributedFailure::SignatureInvalid,
        );
    }
}

#[test]
fn wrong_sigma_is_identified() {
    let mut rng = rand_dev::DevRng::new();
    let (shares, params) = setup(&mut rng, true);
    let presignatures = presign(&mut rng, &shares, &params);

    let mut simulation = Simulation::new(sign_parties(
        &params,
        &shares,
        &SIGNERS,
        presignatures,
        None,
    ));
    simulation.run_with(&mut rng, |envelope: &mut Envelope<E>| {
        if let (2, Msg::SignRound1(msg)) = (envelope.from, &mut envelope.content) {
            msg.sigma_share = msg.sigma_share + Scalar::one();
        }
    });

    for i in [0, 1] {
        assert_eq!(
            simulation.parties[i].current_round(),
            RoundKind::SignIdentification
        );
        assert!(simulation.parties[i].signature().is_none());
    }
    simulation.force_into(2, &shares[2], RoundKind::SignIdentification);
    simulation.run(&mut rng);

    for i in [0, 1] {
        assert_blamed(
            &simulation.status[i],
            RoundKind::SignIdentificationOut,
            &[(2, Misbehavior::InvalidDecProof)],
        );
    }
}

#[test]
fn tampered_chi_transcript_is_identified() {
    for culprit in 0..3u16 {
        let mut rng = rand_dev::DevRng::new();
        let (shares, params) = setup(&mut rng, true);
        let presignatures = presign(&mut rng, &shares, &params);

        let mut simulation = Simulation::new(sign_parties(
            &params,
            &shares,
            &SIGNERS,
            presignatures,
            None,
        ));
        simulation.run(&mut rng);
        simulation.assert_done();

        for (i, share) in shares.iter().enumerate() {
            simulation.force_into(i, share, RoundKind::SignIdentification);
        }
        simulation.run_with(&mut rng, |envelope: &mut Envelope<E>| {
            if let (true, Msg::SignIdentification(msg)) =
                (envelope.from == culprit, &mut envelope.content)
            {
                msg.d_chis.iter_mut().flatten().for_each(bump);
            }
        });

        for i in (0..3).filter(|i| *i != culprit) {
            assert_blamed(
                &simulation.status[usize::from(i)],
                RoundKind::SignIdentificationOut,
                &[(culprit, Misbehavior::TranscriptMismatch)],
            );
        }
        assert_unattributed(
            &simulation.status[usize::from(culprit)],
            RoundKind::SignIdentificationOut,
            UnattributedFailure::IdentificationInconclusive,
        );
    }
}
