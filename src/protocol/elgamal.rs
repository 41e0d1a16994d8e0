//! ElGamal walkthrough over the fixed RFC 5114 group

use num_bigint::{BigUint, RandBigInt};
use rand::Rng;

use crate::crypto::{decode_text, encode_text, ensure_below, mod_inverse, modpow};
use crate::error::{Result, SimError};
use crate::protocol::transcript::{Phase, Stage, Step, Transcript, VERIFIED_LABEL};
use crate::types::ElGamalGroup;

/// Group description `(p, alpha)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElGamalParams {
    pub p: BigUint,
    pub alpha: BigUint,
}

impl ElGamalParams {
    pub fn new(p: BigUint, alpha: BigUint) -> Result<Self> {
        if p < BigUint::from(5u32) {
            return Err(SimError::InvalidArgument(format!(
                "ElGamal prime must be at least 5, got {}",
                p
            )));
        }
        if alpha < BigUint::from(2u32) || alpha >= p {
            return Err(SimError::InvalidArgument(format!(
                "generator must lie in [2, p), got {}",
                alpha
            )));
        }
        Ok(Self { p, alpha })
    }

    /// The published RFC 5114 1024-bit group.
    pub fn rfc5114() -> Self {
        Self {
            p: ElGamalGroup::p(),
            alpha: ElGamalGroup::alpha(),
        }
    }

    /// Uniform exponent in `[2, p-2]`.
    fn random_exponent<R: Rng + ?Sized>(&self, rng: &mut R) -> BigUint {
        rng.gen_biguint_range(&BigUint::from(2u32), &(&self.p - 1u32))
    }
}

/// Published `(p, alpha, beta)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElGamalPublicKey {
    pub params: ElGamalParams,
    pub beta: BigUint,
}

/// Alice's secret exponent `r`.
#[derive(Debug, Clone)]
pub struct ElGamalPrivateKey {
    pub params: ElGamalParams,
    pub r: BigUint,
}

#[derive(Debug, Clone)]
pub struct ElGamalKeyPair {
    pub public: ElGamalPublicKey,
    pub private: ElGamalPrivateKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElGamalCiphertext {
    pub y1: BigUint,
    pub y2: BigUint,
}

/// Intermediate values of a decryption.
#[derive(Debug, Clone)]
pub struct Decryption {
    pub shared: BigUint,
    pub shared_inverse: BigUint,
    pub plaintext: BigUint,
}

impl ElGamalKeyPair {
    pub fn generate<R: Rng + ?Sized>(params: ElGamalParams, rng: &mut R) -> Result<Self> {
        let r = params.random_exponent(rng);
        Self::from_secret(params, r)
    }

    /// `beta = alpha^r mod p`.
    pub fn from_secret(params: ElGamalParams, r: BigUint) -> Result<Self> {
        let beta = modpow(&params.alpha, &r, &params.p)?;
        Ok(Self {
            public: ElGamalPublicKey {
                params: params.clone(),
                beta,
            },
            private: ElGamalPrivateKey { params, r },
        })
    }
}

impl ElGamalPublicKey {
    /// Encrypt `x < p` with a fresh ephemeral exponent.
    ///
    /// Returns the ephemeral `m` too, so it can be shown.
    pub fn encrypt<R: Rng + ?Sized>(
        &self,
        x: &BigUint,
        rng: &mut R,
    ) -> Result<(BigUint, ElGamalCiphertext)> {
        ensure_below(x, &self.params.p, Stage::PlaintextEncoded)?;
        let m = self.params.random_exponent(rng);
        let ciphertext = self.encrypt_with(x, &m)?;
        Ok((m, ciphertext))
    }

    /// `y1 = alpha^m`, `y2 = x * beta^m`, all mod p.
    pub fn encrypt_with(&self, x: &BigUint, m: &BigUint) -> Result<ElGamalCiphertext> {
        let p = &self.params.p;
        ensure_below(x, p, Stage::PlaintextEncoded)?;

        let y1 = modpow(&self.params.alpha, m, p)?;
        let y2 = (x * modpow(&self.beta, m, p)?) % p;
        Ok(ElGamalCiphertext { y1, y2 })
    }
}

impl ElGamalPrivateKey {
    /// `x' = y2 * (y1^r)^-1 mod p`.
    pub fn decrypt(&self, ciphertext: &ElGamalCiphertext) -> Result<Decryption> {
        let p = &self.params.p;
        let shared = modpow(&ciphertext.y1, &self.r, p)?;
        let shared_inverse = mod_inverse(&shared, p)?;
        let plaintext = (&ciphertext.y2 * &shared_inverse) % p;
        Ok(Decryption {
            shared,
            shared_inverse,
            plaintext,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ElGamalRun {
    pub key_pair: ElGamalKeyPair,
    pub plaintext: String,
    pub encoded: BigUint,
    pub ephemeral: BigUint,
    pub ciphertext: ElGamalCiphertext,
    pub recovered: String,
    pub verified: bool,
    pub transcript: Transcript,
}

/// Walk `message` through ElGamal over the RFC 5114 group.
pub fn run<R: Rng + ?Sized>(message: &str, rng: &mut R) -> Result<ElGamalRun> {
    run_with_params(message, ElGamalParams::rfc5114(), rng)
}

pub fn run_with_params<R: Rng + ?Sized>(
    message: &str,
    params: ElGamalParams,
    rng: &mut R,
) -> Result<ElGamalRun> {
    let mut transcript = Transcript::new("ELGAMAL CRYPTOSYSTEM");

    transcript.push(
        Step::new(
            Phase::KeyGeneration,
            Stage::ParametersFixed,
            "Alice fixes a large prime p. All further operations are in the group (Z_p^*, otimes):",
        )
        .with("p", &params.p),
    );
    transcript.push(
        Step::new(
            Phase::KeyGeneration,
            Stage::ParametersFixed,
            "Alice takes a generator alpha of (Z_p^*, otimes):",
        )
        .with("alpha", &params.alpha),
    );

    let key_pair = ElGamalKeyPair::generate(params, rng)?;
    let ElGamalKeyPair { public, private } = &key_pair;
    let p = &public.params.p;

    transcript.push(
        Step::new(
            Phase::KeyGeneration,
            Stage::KeyPairDerived,
            "Alice chooses a random r in Z_p^* and calculates beta = alpha^r:",
        )
        .with("r", &private.r)
        .with("beta", &public.beta),
    );
    transcript.push(Step::new(
        Phase::KeyGeneration,
        Stage::KeyPairDerived,
        "Alice sends (p, alpha, beta) over the network and keeps r for herself",
    ));

    transcript.push(Step::new(
        Phase::MessageExchange,
        Stage::KeyPairDerived,
        "Bob receives (p, alpha, beta) and builds the group (Z_p^*, otimes) for his algebra",
    ));

    let encoded = encode_text(message);
    ensure_below(&encoded, p, Stage::PlaintextEncoded)?;
    transcript.push(
        Step::new(
            Phase::MessageExchange,
            Stage::PlaintextEncoded,
            "Bob encodes his message as a number x in Z_p^* (UTF-8):",
        )
        .with("Bob's message", message)
        .with("Encoded plaintext x", &encoded)
        .with("In Z_p^*?", &encoded < p),
    );

    let (ephemeral, ciphertext) = public.encrypt(&encoded, rng)?;
    transcript.push(
        Step::new(
            Phase::MessageExchange,
            Stage::Encrypted,
            "Bob chooses a random integer m in Z_p^*:",
        )
        .with("m", &ephemeral),
    );
    transcript.push(
        Step::new(
            Phase::MessageExchange,
            Stage::Encrypted,
            "Bob calculates y1 = alpha^m and y2 = x otimes beta^m, then sends (y1, y2) to Alice:",
        )
        .with("Encoded ciphertext y1", &ciphertext.y1)
        .with("Encoded ciphertext y2", &ciphertext.y2),
    );

    let decryption = private.decrypt(&ciphertext)?;
    transcript.push(
        Step::new(
            Phase::MessageExchange,
            Stage::Decrypted,
            "Alice receives (y1, y2) and calculates x' = y2 otimes (y1^r)^-1:",
        )
        .with("y1^r", &decryption.shared)
        .with("(y1^r)^-1", &decryption.shared_inverse)
        .with("Encoded plaintext x'", &decryption.plaintext),
    );

    let recovered = decode_text(&decryption.plaintext, Stage::Decrypted)?;
    let verified = recovered == message;
    if !verified {
        tracing::error!(%recovered, expected = %message, "ElGamal round trip mismatch");
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

    Ok(ElGamalRun {
        plaintext: message.to_string(),
        encoded,
        ephemeral,
        ciphertext,
        recovered,
        verified,
        transcript,
        key_pair,
    })
}
