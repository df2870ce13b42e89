use ia_ecdsa::{
    error::CallerError, generic_ec::curves::Secp256k1, CancellationToken, Dump, LocalParty,
    ProtocolError, ResumePoint, RoundKind,
};
use ia_ecdsa_tests::{key_shares, parameters, presign_parties, session_nonce, Simulation};

type E = Secp256k1;

#[test]
fn presigning_resumes_from_serialized_dumps() {
    let mut rng = rand_dev::DevRng::new();
    let shares = key_shares::<E>(&mut rng, 1, 3);
    let params = parameters(&shares, &[0, 1, 2], true);
    let nonce = session_nonce(&mut rng);

    let mut simulation = Simulation::new(presign_parties(&params, &shares, &[0, 1, 2], &nonce));
    simulation.run_until(&mut rng, RoundKind::Presign3);

    // every party is restarted from its serialized dump
    let parties = simulation
        .parties
        .iter()
        .zip(&shares)
        .map(|(party, share)| {
            let dump = party.dump();
            assert_eq!(dump.resume_point(), ResumePoint::Entry(RoundKind::Presign3));
            let serialized = serde_json::to_string(&dump).unwrap();
            let dump: Dump<E> = serde_json::from_str(&serialized).unwrap();
            LocalParty::restore(party.params().clone(), share, dump).unwrap()
        })
        .collect();

    let mut simulation = Simulation::new(parties);
    simulation.run(&mut rng);
    simulation.assert_done();

    let presignatures = simulation.presignatures();
    for presignature in &presignatures[1..] {
        assert_eq!(presignature.big_r(), presignatures[0].big_r());
    }
}

#[test]
fn started_round_resumes_awaiting_messages() {
    let mut rng = rand_dev::DevRng::new();
    let shares = key_shares::<E>(&mut rng, 1, 3);
    let params = parameters(&shares, &[0, 1, 2], false);
    let nonce = session_nonce(&mut rng);
    let mut parties = presign_parties(&params, &shares, &[0, 1, 2], &nonce);

    parties[0]
        .start(&mut rng, &CancellationToken::new())
        .unwrap();
    let dump = parties[0].dump();
    assert_eq!(
        dump.resume_point(),
        ResumePoint::AwaitingMessages(RoundKind::Presign1)
    );

    let mut restored = LocalParty::restore(params[0].clone(), &shares[0], dump).unwrap();
    assert!(restored.is_started());
    assert_eq!(restored.waiting_for().len(), 2);
    let err = restored
        .start(&mut rng, &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, ProtocolError::AlreadyStarted(RoundKind::Presign1)));
}

#[test]
fn resume_point_stays_within_protocol() {
    let mut rng = rand_dev::DevRng::new();
    let shares = key_shares::<E>(&mut rng, 1, 3);
    let params = parameters(&shares, &[0, 1, 2], true);
    let nonce = session_nonce(&mut rng);
    let parties = presign_parties(&params, &shares, &[0, 1, 2], &nonce);

    let mut dump = parties[0].dump();
    let err = dump
        .resume_at(ResumePoint::Entry(RoundKind::SignIdentification))
        .unwrap_err();
    assert!(matches!(err, CallerError::DumpMismatch));
    assert_eq!(dump.resume_point(), ResumePoint::Entry(RoundKind::Presign1));

    dump.resume_at(ResumePoint::Entry(RoundKind::PresignIdentification))
        .unwrap();
    assert_eq!(
        dump.resume_point(),
        ResumePoint::Entry(RoundKind::PresignIdentification)
    );
}

#[test]
fn dump_must_match_party_set() {
    let mut rng = rand_dev::DevRng::new();
    let shares = key_shares::<E>(&mut rng, 1, 3);
    let params = parameters(&shares, &[0, 1, 2], false);
    let nonce = session_nonce(&mut rng);
    let parties = presign_parties(&params, &shares, &[0, 1, 2], &nonce);
    let dump = parties[0].dump();

    let other_params = parameters(&shares, &[0, 1], false);
    let err = LocalParty::restore(other_params[0].clone(), &shares[0], dump).err().unwrap();
    assert!(matches!(
        err,
        ProtocolError::Caller(CallerError::DumpMismatch)
    ));
}

#[test]
fn dump_must_be_restored_by_its_owner() {
    let mut rng = rand_dev::DevRng::new();
    let shares = key_shares::<E>(&mut rng, 1, 3);
    let params = parameters(&shares, &[0, 1, 2], false);
    let nonce = session_nonce(&mut rng);
    let mut parties = presign_parties(&params, &shares, &[0, 1, 2], &nonce);
    parties[0]
        .start(&mut rng, &CancellationToken::new())
        .unwrap();
    let dump = parties[0].dump();
    assert_eq!(dump.owner(), 0);

    let err = LocalParty::restore(params[1].clone(), &shares[1], dump.clone()).err().unwrap();
    assert!(matches!(
        err,
        ProtocolError::Caller(CallerError::DumpMismatch)
    ));
    LocalParty::restore(params[0].clone(), &shares[0], dump).unwrap();
}

#[test]
fn dump_debug_hides_secrets() {
    let mut rng = rand_dev::DevRng::new();
    let shares = key_shares::<E>(&mut rng, 1, 3);
    let params = parameters(&shares, &[0, 1, 2], false);
    let nonce = session_nonce(&mut rng);
    let mut parties = presign_parties(&params, &shares, &[0, 1, 2], &nonce);
    parties[0]
        .start(&mut rng, &CancellationToken::new())
        .unwrap();

    let debug = format!("{:?}", parties[0].dump());
    assert!(debug.contains("[redacted]"));
    assert!(!debug.contains("gamma"));
}
