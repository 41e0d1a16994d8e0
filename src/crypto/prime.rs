//! Probable-prime generation

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::Rng;

use crate::error::{Result, SimError};
use crate::protocol::Stage;

const SMALL_PRIMES: [u32; 25] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// Miller-Rabin probable-prime test with `rounds` random witnesses.
pub fn is_probable_prime<R: Rng + ?Sized>(n: &BigUint, rounds: usize, rng: &mut R) -> bool {
    let two = BigUint::from(2u32);
    if n < &two {
        return false;
    }

    for &p in SMALL_PRIMES.iter() {
        let p = BigUint::from(p);
        if *n == p {
            return true;
        }
        if (n % &p).is_zero() {
            return false;
        }
    }

    // n - 1 = d * 2^s with d odd
    let n_minus_one = n - 1u32;
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;

    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }

    true
}

/// Generate a random probable prime of exactly `bits` bits.
///
/// Gives up with `KeyGenerationTimeout` after `max_candidates` odd candidates.
pub fn gen_prime<R: Rng + ?Sized>(
    bits: u64,
    rounds: usize,
    max_candidates: usize,
    rng: &mut R,
) -> Result<BigUint> {
    if bits < 2 {
        return Err(SimError::InvalidArgument(format!(
            "prime size must be at least 2 bits, got {}",
            bits
        )));
    }

    for attempt in 0..max_candidates {
        let mut candidate = rng.gen_biguint(bits);
        candidate.set_bit(bits - 1, true);
        if bits > 2 {
            candidate.set_bit(0, true);
        }

        if is_probable_prime(&candidate, rounds, rng) {
            tracing::debug!(bits, attempt, "found probable prime");
            return Ok(candidate);
        }
    }

    Err(SimError::KeyGenerationTimeout {
        stage: Stage::ParametersGenerated,
        attempts: max_candidates,
    })
}
