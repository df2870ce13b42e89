use ia_ecdsa::{
    curve::scalar_to_bn,
    generic_ec::{curves::Secp256k1, Point, Scalar},
    paillier::DecryptionKey,
    ring_pedersen::RingPedersen,
    zkp::{dec, enc, logstar, mul, mulstar, ProofContext, RejectionSampler},
    BigNumber, SecurityParams,
};

type E = Secp256k1;

struct Keys {
    prover: DecryptionKey,
    verifier_rp: RingPedersen,
}

fn keys(rng: &mut rand_dev::DevRng) -> Keys {
    let mut primes = ia_ecdsa_tests::primes(2).into_iter();
    let (p, q) = primes.next().unwrap();
    let prover = DecryptionKey::from_primes(p, q).unwrap();
    let (p, q) = primes.next().unwrap();
    let verifier = DecryptionKey::from_primes(p, q).unwrap();
    let verifier_rp =
        RingPedersen::generate(rng, verifier.encryption_key().n(), &verifier.phi()).unwrap();
    Keys {
        prover,
        verifier_rp,
    }
}

fn context(sampler: RejectionSampler, tag: &[u8]) -> ProofContext {
    ProofContext::new::<E>(tag.to_vec(), sampler, SecurityParams::default())
}

#[test_case::case(RejectionSampler::Uniform; "uniform")]
#[test_case::case(RejectionSampler::Legacy; "legacy")]
fn enc_proof(sampler: RejectionSampler) {
    let mut rng = rand_dev::DevRng::new();
    let keys = keys(&mut rng);
    let ek = keys.prover.encryption_key();
    let ctx = context(sampler, b"enc");

    let k = scalar_to_bn(&Scalar::<E>::random(&mut rng));
    let (big_k, rho) = ek.encrypt(&mut rng, &k).unwrap();
    let statement = enc::Statement {
        ek,
        k: &big_k,
        rp: &keys.verifier_rp,
    };
    let proof =
        enc::EncProof::prove(&ctx, &statement, &enc::Witness { k: &k, rho: &rho }, &mut rng)
            .unwrap();
    proof.verify(&ctx, &statement).unwrap();

    // proof made in another session
    assert!(proof.verify(&context(sampler, b"other"), &statement).is_err());
    // proof of another ciphertext
    let (other_k, _) = ek.encrypt(&mut rng, &k).unwrap();
    let other = enc::Statement {
        k: &other_k,
        ..statement
    };
    assert!(proof.verify(&ctx, &other).is_err());
}

#[test]
fn enc_proof_rejects_out_of_range_plaintext() {
    let mut rng = rand_dev::DevRng::new();
    let keys = keys(&mut rng);
    let ek = keys.prover.encryption_key();
    let ctx = context(RejectionSampler::Uniform, b"enc");

    let security = SecurityParams::default();
    let k = BigNumber::one() << (security.ell + security.epsilon + 8);
    let (big_k, rho) = ek.encrypt(&mut rng, &k).unwrap();
    let statement = enc::Statement {
        ek,
        k: &big_k,
        rp: &keys.verifier_rp,
    };
    let proof =
        enc::EncProof::prove(&ctx, &statement, &enc::Witness { k: &k, rho: &rho }, &mut rng)
            .unwrap();
    assert!(proof.verify(&ctx, &statement).is_err());
}

#[test]
fn logstar_proof() {
    let mut rng = rand_dev::DevRng::new();
    let keys = keys(&mut rng);
    let ek = keys.prover.encryption_key();
    let ctx = context(RejectionSampler::Uniform, b"logstar");

    let x = Scalar::<E>::random(&mut rng);
    let x_bn = scalar_to_bn(&x);
    let (c, rho) = ek.encrypt(&mut rng, &x_bn).unwrap();
    let base = Point::generator() * Scalar::<E>::random(&mut rng);
    let big_x = base * x;
    let statement = logstar::Statement {
        ek,
        c: &c,
        x: &big_x,
        base: &base,
        rp: &keys.verifier_rp,
    };
    let proof = logstar::LogstarProof::prove(
        &ctx,
        &statement,
        &logstar::Witness {
            x: &x_bn,
            rho: &rho,
        },
        &mut rng,
    )
    .unwrap();
    proof.verify(&ctx, &statement).unwrap();

    let generator = Point::generator() * Scalar::<E>::one();
    let wrong_base = logstar::Statement {
        base: &generator,
        ..statement
    };
    assert!(proof.verify(&ctx, &wrong_base).is_err());
}

#[test]
fn mul_proof() {
    let mut rng = rand_dev::DevRng::new();
    let keys = keys(&mut rng);
    let ek = keys.prover.encryption_key();
    let ctx = context(RejectionSampler::Uniform, b"mul");

    let x = scalar_to_bn(&Scalar::<E>::random(&mut rng));
    let y = scalar_to_bn(&Scalar::<E>::random(&mut rng));
    let (big_x, rho_x) = ek.encrypt(&mut rng, &x).unwrap();
    let (big_y, _) = ek.encrypt(&mut rng, &y).unwrap();
    let (c, rho) = ek.mul_obfuscate(&mut rng, &big_y, &x).unwrap();
    let statement = mul::Statement {
        ek,
        x: &big_x,
        y: &big_y,
        c: &c,
    };
    let proof = mul::MulProof::prove(
        &ctx,
        &statement,
        &mul::Witness {
            x: &x,
            rho: &rho,
            rho_x: &rho_x,
        },
        &mut rng,
    )
    .unwrap();
    proof.verify(&ctx, &statement).unwrap();

    // the product decrypts to x * y
    let product = keys.prover.decrypt(&c).unwrap();
    assert_eq!(product, (&x * &y).nmod(ek.n()));

    let (other_c, _) = ek.encrypt(&mut rng, &product).unwrap();
    let other = mul::Statement {
        c: &other_c,
        ..statement
    };
    assert!(proof.verify(&ctx, &other).is_err());
}

#[test]
fn mulstar_proof() {
    let mut rng = rand_dev::DevRng::new();
    let keys = keys(&mut rng);
    let ek = keys.prover.encryption_key();
    let ctx = context(RejectionSampler::Uniform, b"mulstar");

    let x = Scalar::<E>::random(&mut rng);
    let x_bn = scalar_to_bn(&x);
    let k = Scalar::<E>::random(&mut rng);
    let (c, _) = ek
        .encrypt(&mut rng, &scalar_to_bn(&k))
        .unwrap();
    let (d, rho) = ek.mul_obfuscate(&mut rng, &c, &x_bn).unwrap();
    let big_x = Point::generator() * x;
    let statement = mulstar::Statement {
        ek,
        c: &c,
        d: &d,
        x: &big_x,
        rp: &keys.verifier_rp,
    };
    let proof = mulstar::MulstarProof::prove(
        &ctx,
        &statement,
        &mulstar::Witness {
            x: &x_bn,
            rho: &rho,
        },
        &mut rng,
    )
    .unwrap();
    proof.verify(&ctx, &statement).unwrap();

    let other_x = big_x + Point::generator() * Scalar::one();
    let other = mulstar::Statement {
        x: &other_x,
        ..statement
    };
    assert!(proof.verify(&ctx, &other).is_err());
}

#[test]
fn dec_proof() {
    let mut rng = rand_dev::DevRng::new();
    let keys = keys(&mut rng);
    let ek = keys.prover.encryption_key();
    let ctx = context(RejectionSampler::Uniform, b"dec");

    // plaintext exceeds q, the proof is about its residue
    let q = ia_ecdsa::curve::curve_order::<E>();
    let y = &q * &q + BigNumber::from(5u64);
    let (c, _) = ek.encrypt(&mut rng, &y).unwrap();
    let rho = keys.prover.get_randomness(&c).unwrap();
    let x = y.nmod(&q);
    let statement = dec::Statement {
        ek,
        c: &c,
        x: &x,
        rp: &keys.verifier_rp,
    };
    let proof = dec::DecProof::prove(
        &ctx,
        &statement,
        &dec::Witness { y: &y, rho: &rho },
        &mut rng,
    )
    .unwrap();
    proof.verify(&ctx, &statement).unwrap();

    let wrong_x = &x + &BigNumber::one();
    let wrong = dec::Statement {
        x: &wrong_x,
        ..statement
    };
    assert!(proof.verify(&ctx, &wrong).is_err());
}
