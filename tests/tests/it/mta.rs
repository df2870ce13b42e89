use ia_ecdsa::{
    curve::{bn_to_scalar, scalar_to_bn},
    generic_ec::{curves::Secp256k1, Point, Scalar},
    mta::{self, MtaStatement},
    paillier::DecryptionKey,
    ring_pedersen::RingPedersen,
    zkp::{ProofContext, RejectionSampler},
    SecurityParams,
};

type E = Secp256k1;

struct Party {
    dk: DecryptionKey,
    rp: RingPedersen,
}

fn parties(rng: &mut rand_dev::DevRng) -> (Party, Party) {
    let mut primes = ia_ecdsa_tests::primes(2).into_iter().map(|(p, q)| {
        let dk = DecryptionKey::from_primes(p, q).unwrap();
        let rp = RingPedersen::generate(rng, dk.encryption_key().n(), &dk.phi()).unwrap();
        Party { dk, rp }
    });
    let a = primes.next().unwrap();
    let b = primes.next().unwrap();
    (a, b)
}

fn context(tag: &[u8]) -> ProofContext {
    ProofContext::new::<E>(
        tag.to_vec(),
        RejectionSampler::Uniform,
        SecurityParams::default(),
    )
}

#[test]
fn shares_add_up_to_product() {
    let mut rng = rand_dev::DevRng::new();
    let (responder, receiver) = parties(&mut rng);

    let a = Scalar::<E>::random(&mut rng);
    let b = Scalar::<E>::random(&mut rng);
    let (big_k, _) = receiver
        .dk
        .encryption_key()
        .encrypt(&mut rng, &scalar_to_bn(&b))
        .unwrap();
    let big_a = Point::generator() * a;
    let statement = MtaStatement {
        receiver_ek: receiver.dk.encryption_key(),
        responder_ek: responder.dk.encryption_key(),
        k: &big_k,
        big_a: &big_a,
        receiver_rp: &receiver.rp,
    };

    let ctx = context(b"mta");
    let (response, beta) = mta::respond(&ctx, &statement, &a, &mut rng).unwrap();
    response.verify(&ctx, &statement).unwrap();

    let alpha = mta::receive::<E>(&receiver.dk, &response.d).unwrap();
    assert_eq!(alpha + bn_to_scalar::<E>(&beta), a * b);
}

#[test]
fn response_is_bound_to_statement() {
    let mut rng = rand_dev::DevRng::new();
    let (responder, receiver) = parties(&mut rng);

    let a = Scalar::<E>::random(&mut rng);
    let k = Scalar::<E>::random(&mut rng);
    let (big_k, _) = receiver
        .dk
        .encryption_key()
        .encrypt(&mut rng, &scalar_to_bn(&k))
        .unwrap();
    let big_a = Point::generator() * a;
    let statement = MtaStatement {
        receiver_ek: receiver.dk.encryption_key(),
        responder_ek: responder.dk.encryption_key(),
        k: &big_k,
        big_a: &big_a,
        receiver_rp: &receiver.rp,
    };
    let ctx = context(b"mta");
    let (response, _) = mta::respond(&ctx, &statement, &a, &mut rng).unwrap();

    // another session
    assert!(response.verify(&context(b"other"), &statement).is_err());

    // another committed value
    let other_a = big_a + Point::generator() * Scalar::one();
    let other = MtaStatement {
        big_a: &other_a,
        ..statement
    };
    assert!(response.verify(&ctx, &other).is_err());

    // tampered ciphertext
    let mut tampered = response.clone();
    tampered.d = &tampered.d + &ia_ecdsa::BigNumber::one();
    assert!(tampered.verify(&ctx, &statement).is_err());
}
