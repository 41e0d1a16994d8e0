//! Common types and constants

use num_bigint::BigUint;

/// Public RSA exponent (F4).
pub const PUBLIC_EXPONENT: u32 = 65537;

/// Default size of each RSA prime.
pub const DEFAULT_PRIME_BITS: u64 = 1024;

/// Default number of Miller-Rabin witnesses per candidate.
pub const DEFAULT_MILLER_RABIN_ROUNDS: usize = 40;

/// Default number of random candidates tried per prime.
pub const DEFAULT_MAX_PRIME_CANDIDATES: usize = 20_000;

/// Default number of fresh prime pairs tried before RSA key generation gives up.
pub const DEFAULT_MAX_KEY_ATTEMPTS: usize = 32;

/// RFC 5114 section 2.1 group: 1024-bit MODP prime with a published generator.
///
/// Fixed so every ElGamal walkthrough runs over the same group; only the
/// exponents are random.
#[derive(Clone)]
pub struct ElGamalGroup;

impl ElGamalGroup {
    const P_HEX: &'static [u8] = b"\
        B10B8F96A080E01DDE92DE5EAE5D54EC52C99FBCFB06A3C69A6A9DCA52D23B61\
        6073E28675A23D189838EF1E2EE652C013ECB4AEA906112324975C3CD49B83BF\
        ACCBDD7D90C4BD7098488E9C219A73724EFFD6FAE5644738FAA31A4FF55BCCC0\
        A151AF5F0DC8B4BD45BF37DF365C1A65E68CFDA76D4DA708DF1FB2BC2E4A4371";

    const ALPHA_HEX: &'static [u8] = b"\
        A4D1CBD5C3FD34126765A442EFB99905F8104DD258AC507FD6406CFF14266D31\
        266FEA1E5C41564B777E690F5504F213160217B4B01B886A5E91547F9E2749F4\
        D7FBD7D3B9A92EE1909D0D2263F80A76A6A24C087A091F531DBF0A0169B6A28A\
        D662A4D18E73AFA32D779D5918D08BC8858F4DCEF97C2A24855E6EEB22B3B2E5";

    pub fn p() -> BigUint {
        BigUint::parse_bytes(Self::P_HEX, 16).expect("RFC 5114 prime is valid hex")
    }

    pub fn alpha() -> BigUint {
        BigUint::parse_bytes(Self::ALPHA_HEX, 16).expect("RFC 5114 generator is valid hex")
    }
}

/// Knobs for a single protocol run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub prime_bits: u64,
    pub miller_rabin_rounds: usize,
    pub max_prime_candidates: usize,
    pub max_key_attempts: usize,
    /// Seed for the run's random source; fresh entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            prime_bits: DEFAULT_PRIME_BITS,
            miller_rabin_rounds: DEFAULT_MILLER_RABIN_ROUNDS,
            max_prime_candidates: DEFAULT_MAX_PRIME_CANDIDATES,
            max_key_attempts: DEFAULT_MAX_KEY_ATTEMPTS,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Random source for one run: seeded when a seed is configured.
    pub fn rng(&self) -> rand::rngs::StdRng {
        use rand::SeedableRng;

        match self.seed {
            Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
            None => rand::rngs::StdRng::from_entropy(),
        }
    }
}
