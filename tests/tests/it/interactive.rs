#[generic_tests::define(attrs(tokio::test))]
mod generic {
    use std::iter;

    use ia_ecdsa::{CancellationToken, LocalParty, Msg};
    use ia_ecdsa_tests::{key_shares, message, parameters, session_nonce, ExternalVerifier};

    #[tokio::test]
    async fn presign_and_sign<E: ExternalVerifier>() {
        let mut rng = rand_dev::DevRng::new();
        let shares = key_shares::<E>(&mut rng, 1, 3);
        let signers = [0, 1, 2];
        let params = parameters(&shares, &signers, true);
        let nonce = session_nonce(&mut rng);
        let cancel = CancellationToken::new();
        let cancel = &cancel;

        // --- Presigning
        let mut simulation = round_based::simulation::Simulation::<Msg<E>>::new();
        let presign_executions = params
            .iter()
            .zip(&shares)
            .zip(iter::repeat_with(|| (rng.fork(), simulation.add_party())))
            .map(|((params, share), (mut rng, party))| {
                let local = LocalParty::presign(params.clone(), share, nonce.clone()).unwrap();
                async move { ia_ecdsa::interactive::presign(local, party, &mut rng, cancel).await }
            });
        let presignatures = futures::future::try_join_all(presign_executions)
            .await
            .unwrap();
        for presignature in &presignatures[1..] {
            assert_eq!(presignature.big_r(), presignatures[0].big_r());
        }

        // --- Signing
        let mut simulation = round_based::simulation::Simulation::<Msg<E>>::new();
        let sign_executions = params
            .iter()
            .zip(&shares)
            .zip(presignatures)
            .zip(iter::repeat_with(|| (rng.fork(), simulation.add_party())))
            .map(|(((params, share), presignature), (mut rng, party))| {
                let local =
                    LocalParty::sign(params.clone(), share, presignature, message(), None)
                        .unwrap();
                async move { ia_ecdsa::interactive::sign(local, party, &mut rng, cancel).await }
            });
        let signatures = futures::future::try_join_all(sign_executions)
            .await
            .unwrap();

        let pk = shares[0].public_key();
        signatures[0].verify(&pk).unwrap();
        E::verify_sig(&pk, &signatures[0]).unwrap();
        for sig in &signatures[1..] {
            assert_eq!(sig, &signatures[0]);
        }
    }

    #[tokio::test]
    async fn local_party_must_run_matching_protocol<E: ExternalVerifier>() {
        let mut rng = rand_dev::DevRng::new();
        let shares = key_shares::<E>(&mut rng, 1, 3);
        let params = parameters(&shares, &[0, 1, 2], false);
        let local =
            LocalParty::presign(params[0].clone(), &shares[0], session_nonce(&mut rng)).unwrap();

        let mut simulation = round_based::simulation::Simulation::<Msg<E>>::new();
        let err = ia_ecdsa::interactive::sign(
            local,
            simulation.add_party(),
            &mut rng,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(err.protocol_error().is_none());
    }

    #[instantiate_tests(<ia_ecdsa::generic_ec::curves::Secp256k1>)]
    mod secp256k1 {}
    #[instantiate_tests(<ia_ecdsa::generic_ec::curves::Secp256r1>)]
    mod secp256r1 {}
}
