//! RSA walkthrough: key generation, encryption, decryption

use num_bigint::BigUint;
use num_integer::Integer;
use rand::Rng;

use crate::crypto::{decode_text, encode_text, ensure_below, gen_prime, mod_inverse, modpow};
use crate::error::{Result, SimError};
use crate::protocol::transcript::{Phase, Stage, Step, Transcript, VERIFIED_LABEL};
use crate::types::{SimConfig, PUBLIC_EXPONENT};

/// What Alice publishes: `(N, a)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    pub n: BigUint,
    pub e: BigUint,
}

/// What Alice keeps: `(p, q, b)` plus the derived `phi(N)`.
#[derive(Debug, Clone)]
pub struct RsaPrivateKey {
    pub p: BigUint,
    pub q: BigUint,
    pub phi: BigUint,
    pub d: BigUint,
    n: BigUint,
}

#[derive(Debug, Clone)]
pub struct RsaKeyPair {
    pub public: RsaPublicKey,
    pub private: RsaPrivateKey,
}

impl RsaKeyPair {
    /// Derive a key pair from two known primes and a public exponent.
    ///
    /// Fails with `NotInvertible` when `gcd(e, phi(N)) != 1`.
    pub fn from_primes(p: BigUint, q: BigUint, e: BigUint) -> Result<Self> {
        let two = BigUint::from(2u32);
        if p < two || q < two {
            return Err(SimError::InvalidArgument(format!(
                "RSA primes must be at least 2, got p = {}, q = {}",
                p, q
            )));
        }
        if p == q {
            return Err(SimError::InvalidArgument(format!(
                "RSA primes must be distinct, got p = q = {}",
                p
            )));
        }

        let n = &p * &q;
        let phi = (&p - 1u32) * (&q - 1u32);
        let d = mod_inverse(&e, &phi)?;

        Ok(Self {
            public: RsaPublicKey { n: n.clone(), e },
            private: RsaPrivateKey { p, q, phi, d, n },
        })
    }

    /// Generate a fresh key pair with `e = 65537`.
    pub fn generate<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Result<Self> {
        Self::generate_with_exponent(&BigUint::from(PUBLIC_EXPONENT), config, rng)
    }

    /// Generate a fresh key pair for public exponent `e`.
    ///
    /// Draws new primes whenever `e` is not coprime with `phi(N)`, up to
    /// `config.max_key_attempts` pairs.
    pub fn generate_with_exponent<R: Rng + ?Sized>(
        e: &BigUint,
        config: &SimConfig,
        rng: &mut R,
    ) -> Result<Self> {
        for attempt in 0..config.max_key_attempts {
            let p = gen_prime(
                config.prime_bits,
                config.miller_rabin_rounds,
                config.max_prime_candidates,
                rng,
            )?;
            let q = gen_prime(
                config.prime_bits,
                config.miller_rabin_rounds,
                config.max_prime_candidates,
                rng,
            )?;
            if p == q {
                tracing::warn!(attempt, "drew the same prime twice, retrying");
                continue;
            }

            match Self::from_primes(p, q, e.clone()) {
                Ok(key_pair) => return Ok(key_pair),
                Err(SimError::NotInvertible { gcd, .. }) => {
                    tracing::warn!(attempt, %gcd, "public exponent not coprime with phi(N), retrying");
                }
                Err(err) => return Err(err),
            }
        }

        Err(SimError::KeyGenerationTimeout {
            stage: Stage::KeyPairDerived,
            attempts: config.max_key_attempts,
        })
    }
}

impl RsaPublicKey {
    /// `y = x^e mod N`, for `x < N`.
    pub fn encrypt(&self, x: &BigUint) -> Result<BigUint> {
        ensure_below(x, &self.n, Stage::PlaintextEncoded)?;
        modpow(x, &self.e, &self.n)
    }
}

impl RsaPrivateKey {
    /// `x' = y^d mod N`.
    pub fn decrypt(&self, y: &BigUint) -> Result<BigUint> {
        modpow(y, &self.d, &self.n)
    }
}

/// Everything a run produced, typed, alongside its printable transcript.
#[derive(Debug, Clone)]
pub struct RsaRun {
    pub key_pair: RsaKeyPair,
    pub plaintext: String,
    pub encoded: BigUint,
    pub ciphertext: BigUint,
    pub recovered: String,
    pub verified: bool,
    pub transcript: Transcript,
}

/// Generate keys and walk `message` through encryption and decryption.
pub fn run<R: Rng + ?Sized>(message: &str, config: &SimConfig, rng: &mut R) -> Result<RsaRun> {
    let key_pair = RsaKeyPair::generate(config, rng)?;
    run_with_keys(message, key_pair)
}

/// Walk `message` through a run using an existing key pair.
pub fn run_with_keys(message: &str, key_pair: RsaKeyPair) -> Result<RsaRun> {
    let mut transcript = Transcript::new("RSA CRYPTOSYSTEM");
    let RsaKeyPair { public, private } = &key_pair;

    transcript.push(
        Step::new(
            Phase::KeyGeneration,
            Stage::ParametersGenerated,
            "Alice generates two large primes p and q, then calculates N = p x q:",
        )
        .with("p", &private.p)
        .with("q", &private.q)
        .with("N", &public.n),
    );
    transcript.push(
        Step::new(
            Phase::KeyGeneration,
            Stage::ParametersGenerated,
            "Alice calculates phi(N) = (p-1) x (q-1):",
        )
        .with("phi(N)", &private.phi),
    );
    transcript.push(
        Step::new(
            Phase::KeyGeneration,
            Stage::KeyPairDerived,
            "Alice picks a such that gcd(a, phi(N)) = 1:",
        )
        .with("a", &public.e)
        .with("gcd(a, phi(N))", public.e.gcd(&private.phi)),
    );
    transcript.push(
        Step::new(
            Phase::KeyGeneration,
            Stage::KeyPairDerived,
            "Alice calculates b such that a x b is congruent to 1 (mod phi(N)):",
        )
        .with("b", &private.d)
        .with("(a x b) mod phi(N)", (&public.e * &private.d) % &private.phi),
    );
    transcript.push(Step::new(
        Phase::KeyGeneration,
        Stage::KeyPairDerived,
        "Alice sends (N, a) over the network and keeps (p, q, b) for herself",
    ));

    transcript.push(Step::new(
        Phase::MessageExchange,
        Stage::KeyPairDerived,
        "Bob receives (N, a) and builds the ring (Z_N, oplus, otimes) for his algebra",
    ));

    let encoded = encode_text(message);
    ensure_below(&encoded, &public.n, Stage::PlaintextEncoded)?;
    transcript.push(
        Step::new(
            Phase::MessageExchange,
            Stage::PlaintextEncoded,
            "Bob encodes his message as a number x in Z_N (UTF-8):",
        )
        .with("Bob's message", message)
        .with("Encoded plaintext x", &encoded)
        .with("In Z_N?", encoded < public.n),
    );

    let ciphertext = public.encrypt(&encoded)?;
    transcript.push(
        Step::new(
            Phase::MessageExchange,
            Stage::Encrypted,
            "Bob calculates the ciphertext y = x^a in Z_N and sends it to Alice:",
        )
        .with("Encoded ciphertext y", &ciphertext),
    );

    let recovered_int = private.decrypt(&ciphertext)?;
    transcript.push(
        Step::new(
            Phase::MessageExchange,
            Stage::Decrypted,
            "Alice receives y and calculates x' = y^b:",
        )
        .with("Encoded plaintext x'", &recovered_int),
    );

    let recovered = decode_text(&recovered_int, Stage::Decrypted)?;
    let verified = recovered == message;
    if !verified {
        tracing::error!(%recovered, expected = %message, "RSA round trip mismatch");
    }
    transcript.push(
        Step::new(
            Phase::MessageExchange,
            Stage::Verified,
            "Alice decodes x' with the same scheme (UTF-8):",
        )
        .with("Alice's message", recovered.as_str())
        .with(VERIFIED_LABEL, verified),
    );

    Ok(RsaRun {
        plaintext: message.to_string(),
        encoded,
        ciphertext,
        recovered,
        verified,
        transcript,
        key_pair,
    })
}
