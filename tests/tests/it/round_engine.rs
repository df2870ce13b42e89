use ia_ecdsa::{
    error::CallerError,
    generic_ec::{curves::Secp256k1, Point, Scalar},
    messages::{MalformedMessage, SignRound1},
    CancellationToken, Envelope, KeyShare, LocalParty, Msg, Parameters, ProtocolError, RoundKind,
};
use ia_ecdsa_tests::{
    key_shares, parameters, presign_parties, session_nonce, sign_parties, Simulation,
};

type E = Secp256k1;

fn setup(
    rng: &mut rand_dev::DevRng,
    identification: bool,
) -> (Vec<KeyShare<E>>, Vec<Parameters<E>>, Vec<LocalParty<E>>) {
    let shares = key_shares::<E>(rng, 1, 3);
    let params = parameters(&shares, &[0, 1, 2], identification);
    let nonce = session_nonce(rng);
    let parties = presign_parties(&params, &shares, &[0, 1, 2], &nonce);
    (shares, params, parties)
}

/// Starts every party and returns messages addressed to party `to`
fn start_all(
    rng: &mut rand_dev::DevRng,
    parties: &mut [LocalParty<E>],
    to: u16,
) -> Vec<Envelope<E>> {
    let cancel = CancellationToken::new();
    let mut inbox = vec![];
    for party in parties.iter_mut() {
        let outgoing = party.start(rng, &cancel).unwrap();
        inbox.extend(
            outgoing
                .into_iter()
                .filter(|e| e.to == Some(to) || (e.to.is_none() && e.from != to)),
        );
    }
    inbox
}

fn sign_round1() -> Msg<E> {
    Msg::SignRound1(SignRound1 {
        sigma_share: Scalar::one(),
        big_r: Point::generator() * Scalar::one(),
    })
}

#[test]
fn round_is_started_once() {
    let mut rng = rand_dev::DevRng::new();
    let (_, _, mut parties) = setup(&mut rng, false);
    let cancel = CancellationToken::new();

    assert!(!parties[0].is_started());
    parties[0].start(&mut rng, &cancel).unwrap();
    assert!(parties[0].is_started());
    let err = parties[0].start(&mut rng, &cancel).unwrap_err();
    assert!(matches!(err, ProtocolError::AlreadyStarted(RoundKind::Presign1)));
}

#[test]
fn round_completes_once_every_peer_is_heard() {
    let mut rng = rand_dev::DevRng::new();
    let (_, _, mut parties) = setup(&mut rng, false);

    assert!(!parties[0].update().unwrap());
    let err = parties[0].next_round().unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::Caller(CallerError::RoundNotStarted(RoundKind::Presign1))
    ));

    let inbox = start_all(&mut rng, &mut parties, 0);
    assert_eq!(inbox.len(), 2);
    let waiting = parties[0]
        .waiting_for()
        .iter()
        .map(|p| p.index())
        .collect::<Vec<_>>();
    assert_eq!(waiting, [1, 2]);
    assert!(!parties[0].update().unwrap());
    let err = parties[0].next_round().unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::Caller(CallerError::RoundNotFinished(RoundKind::Presign1))
    ));

    let mut inbox = inbox.into_iter();
    let first = inbox.next().unwrap();
    let first_sender = first.from;
    assert!(parties[0].can_accept(&first));
    assert!(parties[0].store_message(first.clone()).unwrap());
    assert!(!parties[0].can_accept(&first));
    // duplicates are ignored
    assert!(!parties[0].store_message(first).unwrap());
    assert!(!parties[0].update().unwrap());
    assert_eq!(parties[0].waiting_for().len(), 1);
    assert_ne!(parties[0].waiting_for()[0].index(), first_sender);

    for envelope in inbox {
        assert!(parties[0].store_message(envelope).unwrap());
    }
    assert!(parties[0].update().unwrap());
    assert!(parties[0].waiting_for().is_empty());
    assert_eq!(parties[0].next_round().unwrap(), Some(RoundKind::Presign2));
    assert_eq!(parties[0].current_round(), RoundKind::Presign2);
    assert!(!parties[0].is_started());
}

#[test]
fn messages_of_later_rounds_are_kept() {
    let mut rng = rand_dev::DevRng::new();
    let (_, _, mut parties) = setup(&mut rng, false);
    let cancel = CancellationToken::new();

    // deliver round 1 to everyone
    let mut outgoing = vec![];
    for party in parties.iter_mut() {
        outgoing.extend(party.start(&mut rng, &cancel).unwrap());
    }
    for envelope in outgoing {
        let to = usize::from(envelope.to.unwrap());
        parties[to].store_message(envelope).unwrap();
    }

    // parties 1 and 2 run ahead
    let mut early = vec![];
    for party in &mut parties[1..] {
        assert_eq!(party.next_round().unwrap(), Some(RoundKind::Presign2));
        early.extend(
            party
                .start(&mut rng, &cancel)
                .unwrap()
                .into_iter()
                .filter(|e| e.to == Some(0)),
        );
    }
    assert_eq!(early.len(), 2);
    for envelope in early {
        assert!(parties[0].can_accept(&envelope));
        assert!(parties[0].store_message(envelope).unwrap());
    }

    // party 0 catches up and finds its round already complete
    assert_eq!(parties[0].next_round().unwrap(), Some(RoundKind::Presign2));
    assert!(parties[0].waiting_for().is_empty());
    parties[0].start(&mut rng, &cancel).unwrap();
    assert!(parties[0].update().unwrap());
}

#[test]
fn messages_of_past_rounds_are_ignored() {
    let mut rng = rand_dev::DevRng::new();
    let (_, _, mut parties) = setup(&mut rng, false);
    let inbox = start_all(&mut rng, &mut parties, 0);
    for envelope in inbox.clone() {
        parties[0].store_message(envelope).unwrap();
    }
    parties[0].next_round().unwrap();

    for envelope in inbox {
        assert!(!parties[0].can_accept(&envelope));
        assert!(!parties[0].store_message(envelope).unwrap());
    }
}

#[test]
fn misaddressed_messages_are_malformed() {
    let mut rng = rand_dev::DevRng::new();
    let (_, _, mut parties) = setup(&mut rng, false);
    let cancel = CancellationToken::new();
    let outgoing = parties[1].start(&mut rng, &cancel).unwrap();
    let to_party_0 = outgoing.iter().find(|e| e.to == Some(0)).unwrap().clone();
    let to_party_2 = outgoing.iter().find(|e| e.to == Some(2)).unwrap().clone();

    let cases = [
        (
            Envelope {
                from: 0,
                ..to_party_0.clone()
            },
            0,
        ),
        (
            Envelope {
                from: 7,
                ..to_party_0.clone()
            },
            7,
        ),
        (to_party_2, 1),
        (
            Envelope {
                to: None,
                ..to_party_0.clone()
            },
            1,
        ),
        (
            Envelope {
                from: 1,
                to: None,
                content: sign_round1(),
            },
            1,
        ),
    ];
    let expected: [fn(&MalformedMessage) -> bool; 5] = [
        |r: &MalformedMessage| matches!(r, MalformedMessage::FromSelf),
        |r: &MalformedMessage| matches!(r, MalformedMessage::UnknownSender),
        |r: &MalformedMessage| matches!(r, MalformedMessage::NotAddressedToUs),
        |r: &MalformedMessage| matches!(r, MalformedMessage::WrongDelivery),
        |r: &MalformedMessage| matches!(r, MalformedMessage::WrongProtocol),
    ];

    for ((envelope, sender), is_expected) in cases.into_iter().zip(expected) {
        assert!(!parties[0].can_accept(&envelope));
        match parties[0].store_message(envelope) {
            Err(ProtocolError::Malformed { from, reason }) => {
                assert_eq!(from, sender);
                assert!(is_expected(&reason), "unexpected reason: {reason:?}");
            }
            res => panic!("expected malformed message error, got {res:?}"),
        }
    }

    // the genuine message is still accepted
    assert!(parties[0].store_message(to_party_0).unwrap());
}

#[test]
fn cancelled_round_fails() {
    let mut rng = rand_dev::DevRng::new();
    let (_, _, mut parties) = setup(&mut rng, false);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = parties[0].start(&mut rng, &cancel).unwrap_err();
    assert!(matches!(err, ProtocolError::Cancelled));
    let err = parties[0]
        .start(&mut rng, &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, ProtocolError::AlreadyStarted(_)));
}

#[test]
fn key_share_must_belong_to_local_party() {
    let mut rng = rand_dev::DevRng::new();
    let (shares, params, _) = setup(&mut rng, false);
    let nonce = session_nonce(&mut rng);

    let err = LocalParty::presign(params[0].clone(), &shares[1], nonce).err().unwrap();
    assert!(matches!(
        err,
        ProtocolError::Caller(CallerError::InvalidKeyShare(_))
    ));
}

#[test]
fn presignature_of_another_party_is_rejected() {
    let mut rng = rand_dev::DevRng::new();
    let (shares, params, parties) = setup(&mut rng, false);
    let mut simulation = Simulation::new(parties);
    simulation.run(&mut rng);
    simulation.assert_done();
    let mut presignatures = simulation.presignatures();
    presignatures.swap(0, 1);

    let mut parties = sign_parties(&params, &shares, &[0, 1, 2], presignatures, None);
    let err = parties[0]
        .start(&mut rng, &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::Caller(CallerError::PresignatureIndexMismatch {
            presignature: 1,
            own: 0
        })
    ));
}

#[test]
fn presignature_of_another_session_is_rejected() {
    let mut rng = rand_dev::DevRng::new();
    let shares = key_shares::<E>(&mut rng, 1, 4);

    let presigners = [0, 1, 2];
    let params = parameters(&shares, &presigners, false);
    let nonce = session_nonce(&mut rng);
    let mut simulation = Simulation::new(presign_parties(&params, &shares, &presigners, &nonce));
    simulation.run(&mut rng);
    simulation.assert_done();

    // party 0 keeps its index in another party set
    let signers = [0, 1, 3];
    let params = parameters(&shares, &signers, false);
    let mut parties = sign_parties(&params, &shares, &signers, simulation.presignatures(), None);
    let err = parties[0]
        .start(&mut rng, &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::Caller(CallerError::SsidMismatch)
    ));
}

#[test]
fn identification_requires_transcript() {
    let mut rng = rand_dev::DevRng::new();
    let (shares, _, parties) = setup(&mut rng, false);
    let mut simulation = Simulation::new(parties);
    simulation.run(&mut rng);
    simulation.assert_done();

    let params = parameters(&shares, &[0, 1, 2], true);
    let presignature = simulation.presignatures().remove(0);
    let err = LocalParty::sign(
        params[0].clone(),
        &shares[0],
        presignature,
        ia_ecdsa_tests::message(),
        None,
    )
    .err().unwrap();
    assert!(matches!(
        err,
        ProtocolError::Caller(CallerError::MissingTranscript)
    ));
}
