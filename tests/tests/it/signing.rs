#[generic_tests::define(attrs(test_case::case))]
mod generic {
    use ia_ecdsa::generic_ec::{Point, Scalar};
    use ia_ecdsa_tests::{
        key_shares, parameters, presign_parties, session_nonce, sign_parties, ExternalVerifier,
        Simulation,
    };

    #[test_case::case(1, 3, &[0, 1, 2], false; "t1n3")]
    #[test_case::case(1, 3, &[0, 1, 2], true; "t1n3_identifiable")]
    #[test_case::case(1, 3, &[0, 2], false; "t1n3_two_signers")]
    #[test_case::case(2, 4, &[1, 2, 3], true; "t2n4_identifiable")]
    fn presign_and_sign<E: ExternalVerifier>(
        t: u16,
        n: u16,
        signers: &[usize],
        identification: bool,
    ) {
        ia_ecdsa_tests::init_tracing();
        let mut rng = rand_dev::DevRng::new();
        let shares = key_shares::<E>(&mut rng, t, n);
        let params = parameters(&shares, signers, identification);
        let pk = shares[0].public_key();

        // Presigning
        let nonce = session_nonce(&mut rng);
        let mut simulation =
            Simulation::new(presign_parties(&params, &shares, signers, &nonce));
        simulation.run(&mut rng);
        simulation.assert_done();

        let presignatures = simulation.presignatures();
        for (i, presignature) in presignatures.iter().enumerate() {
            assert_eq!(usize::from(presignature.index()), i);
            assert_eq!(presignature.big_r(), presignatures[0].big_r());
            assert_eq!(presignature.ssid(), presignatures[0].ssid());
            assert_eq!(presignature.transcript().is_some(), identification);
        }
        assert_ne!(presignatures[0].big_r(), Point::zero());

        // Signing
        let mut simulation = Simulation::new(sign_parties(
            &params,
            &shares,
            signers,
            presignatures,
            None,
        ));
        simulation.run(&mut rng);
        simulation.assert_done();

        let signatures = simulation.signatures();
        for sig in &signatures[1..] {
            assert_eq!(sig, &signatures[0]);
        }
        let sig = signatures[0];
        assert!(sig.is_normalized());
        sig.verify(&pk).unwrap();
        E::verify_sig(&pk, &sig).unwrap();
    }

    #[test_case::case(false; "plain")]
    #[test_case::case(true; "identifiable")]
    fn sign_with_derived_key<E: ExternalVerifier>(identification: bool) {
        let mut rng = rand_dev::DevRng::new();
        let shares = key_shares::<E>(&mut rng, 1, 3);
        let signers = [0, 1, 2];
        let params = parameters(&shares, &signers, identification);

        let nonce = session_nonce(&mut rng);
        let mut simulation =
            Simulation::new(presign_parties(&params, &shares, &signers, &nonce));
        simulation.run(&mut rng);
        simulation.assert_done();

        let delta = Scalar::<E>::random(&mut rng);
        let mut simulation = Simulation::new(sign_parties(
            &params,
            &shares,
            &signers,
            simulation.presignatures(),
            Some(delta),
        ));
        simulation.run(&mut rng);
        simulation.assert_done();

        let sig = simulation.signatures()[0];
        let child_pk = shares[0].public_key() + Point::generator() * delta;
        sig.verify(&child_pk).unwrap();
        E::verify_sig(&child_pk, &sig).unwrap();
        assert!(sig.verify(&shares[0].public_key()).is_err());
    }

    #[instantiate_tests(<ia_ecdsa::generic_ec::curves::Secp256k1>)]
    mod secp256k1 {}
    #[instantiate_tests(<ia_ecdsa::generic_ec::curves::Secp256r1>)]
    mod secp256r1 {}
}
