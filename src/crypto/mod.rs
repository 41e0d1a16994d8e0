//! Arbitrary-precision modular arithmetic

pub mod encoding;
pub mod prime;

pub use encoding::{decode_text, encode_text, ensure_below, sanitize_message};
pub use prime::{gen_prime, is_probable_prime};

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::error::{Result, SimError};

/// Computes `base^exponent mod modulus` by square-and-multiply.
///
/// A zero modulus is rejected; a modulus of one always yields zero.
pub fn modpow(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> Result<BigUint> {
    if modulus.is_zero() {
        return Err(SimError::Domain {
            modulus: modulus.clone(),
        });
    }
    Ok(base.modpow(exponent, modulus))
}

/// Extended Euclidean algorithm.
///
/// Returns `(gcd, x, y)` with `a*x + b*y = gcd`. `extended_gcd(0, b)` is
/// `(b, 0, 1)`. Unrolled into a loop so operand size never affects stack depth.
pub fn extended_gcd(a: &BigUint, b: &BigUint) -> (BigUint, BigInt, BigInt) {
    if a.is_zero() {
        return (b.clone(), BigInt::zero(), BigInt::one());
    }

    let mut old_r = BigInt::from(a.clone());
    let mut r = BigInt::from(b.clone());
    let mut old_x = BigInt::one();
    let mut x = BigInt::zero();
    let mut old_y = BigInt::zero();
    let mut y = BigInt::one();

    while !r.is_zero() {
        let q = &old_r / &r;

        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);

        let next_x = &old_x - &q * &x;
        old_x = std::mem::replace(&mut x, next_x);

        let next_y = &old_y - &q * &y;
        old_y = std::mem::replace(&mut y, next_y);
    }

    (old_r.magnitude().clone(), old_x, old_y)
}

/// Calculate modular multiplicative inverse using the extended Euclidean algorithm.
///
/// The result is normalised into `[0, modulus)`.
pub fn mod_inverse(a: &BigUint, modulus: &BigUint) -> Result<BigUint> {
    if modulus.is_zero() {
        return Err(SimError::Domain {
            modulus: modulus.clone(),
        });
    }

    let (gcd, x, _) = extended_gcd(&(a % modulus), modulus);
    if !gcd.is_one() {
        return Err(SimError::NotInvertible {
            value: a.clone(),
            modulus: modulus.clone(),
            gcd,
        });
    }

    let m = BigInt::from(modulus.clone());
    Ok(x.mod_floor(&m).magnitude().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    use quickcheck::{quickcheck, TestResult};

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn test_extended_gcd_zero_base_case() {
        let (g, x, y) = extended_gcd(&big(0), &big(42));
        assert_eq!(g, big(42));
        assert_eq!(x, BigInt::zero());
        assert_eq!(y, BigInt::one());

        let (g, x, y) = extended_gcd(&big(0), &big(0));
        assert_eq!(g, big(0));
        assert_eq!(x, BigInt::zero());
        assert_eq!(y, BigInt::one());
    }

    #[test]
    fn test_extended_gcd_textbook() {
        let (g, x, y) = extended_gcd(&big(240), &big(46));
        assert_eq!(g, big(2));
        assert_eq!(BigInt::from(240) * x + BigInt::from(46) * y, BigInt::from(2));
    }

    #[test]
    fn test_mod_inverse_textbook_rsa() {
        // phi(3233) = 60 * 52
        assert_eq!(mod_inverse(&big(17), &big(3120)).unwrap(), big(2753));
    }

    #[test]
    fn test_mod_inverse_not_coprime() {
        let err = mod_inverse(&big(6), &big(9)).unwrap_err();
        match err {
            SimError::NotInvertible { gcd, .. } => assert_eq!(gcd, big(3)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_modulus_is_domain_error() {
        assert!(matches!(
            modpow(&big(3), &big(4), &big(0)),
            Err(SimError::Domain { .. })
        ));
        assert!(matches!(
            mod_inverse(&big(3), &big(0)),
            Err(SimError::Domain { .. })
        ));
    }

    #[test]
    fn test_modpow_modulus_one() {
        assert_eq!(modpow(&big(12345), &big(678), &big(1)).unwrap(), big(0));
    }

    #[test]
    fn test_modpow_large_operands() {
        // Fermat: a^(p-1) = 1 mod p for the 1024-bit RFC 5114 prime.
        let p = crate::types::ElGamalGroup::p();
        let e = &p - 1u32;
        assert_eq!(modpow(&big(7), &e, &p).unwrap(), big(1));
    }

    quickcheck! {
        fn prop_modpow_matches_schoolbook(base: u32, exponent: u8, modulus: u32) -> TestResult {
            if modulus == 0 {
                return TestResult::discard();
            }
            let m = BigUint::from(modulus);
            let expected = num_traits::pow(BigUint::from(base), exponent as usize) % &m;
            let actual = modpow(&BigUint::from(base), &BigUint::from(exponent), &m).unwrap();
            TestResult::from_bool(actual == expected)
        }

        fn prop_extended_gcd_bezout(a: u64, b: u64) -> bool {
            let (g, x, y) = extended_gcd(&big(a), &big(b));
            BigInt::from(a) * x + BigInt::from(b) * y == BigInt::from(g.clone())
                && g == big(a).gcd(&big(b))
        }

        fn prop_mod_inverse_is_inverse(a: u64, modulus: u64) -> TestResult {
            if modulus < 2 {
                return TestResult::discard();
            }
            let (a, m) = (big(a), big(modulus));
            match mod_inverse(&a, &m) {
                Ok(inv) => TestResult::from_bool(inv < m && (&inv * &a) % &m == big(1)),
                Err(SimError::NotInvertible { .. }) => TestResult::from_bool(!a.gcd(&m).is_one()),
                Err(_) => TestResult::failed(),
            }
        }
    }
}
