//! Classical side of Shor's order finding
//!
//! Finds the multiplicative order of `a` in `Z_N` by walking its powers and,
//! when the order allows it, splits `N` the way Shor's post-processing does.
//! The quantum phase-estimation circuit is not simulated; only the register
//! sizes it would need are reported.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};

use crate::crypto::modpow;
use crate::error::{Result, SimError};
use crate::protocol::transcript::{Phase, Stage, Step, Transcript};

/// Default cap on the number of powers walked.
pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;

#[derive(Debug, Clone)]
pub struct OrderRun {
    pub a: BigUint,
    pub n: BigUint,
    pub eigen_qubits: u64,
    pub eval_qubits: u64,
    pub order: BigUint,
    pub factors: Option<(BigUint, BigUint)>,
    pub transcript: Transcript,
}

/// `ceil(log2 x)`, zero for `x <= 1`.
fn ceil_log2(x: &BigUint) -> u64 {
    if *x <= BigUint::one() {
        0
    } else {
        (x - 1u32).bits()
    }
}

/// Qubits for the eigenstate and evaluation registers of the QPE circuit.
pub fn register_sizes(n: &BigUint) -> (u64, u64) {
    (ceil_log2(n), ceil_log2(&(n * n)))
}

/// `N != 0`, `a <= N` and `gcd(a, N) = 1`.
pub fn validate(a: &BigUint, n: &BigUint) -> Result<()> {
    if n.is_zero() {
        return Err(SimError::InvalidArgument("N must be non-zero".to_string()));
    }
    if a > n {
        return Err(SimError::InvalidArgument(format!(
            "a = {} must not exceed N = {}",
            a, n
        )));
    }
    let gcd = a.gcd(n);
    if !gcd.is_one() {
        return Err(SimError::InvalidArgument(format!(
            "a = {} is not a unit of Z_{} (gcd = {})",
            a, n, gcd
        )));
    }
    Ok(())
}

/// Smallest `r >= 1` with `a^r = 1 (mod N)`.
///
/// The order of a unit never exceeds `N`, so at most `min(N, max_steps)`
/// powers are walked.
pub fn multiplicative_order(a: &BigUint, n: &BigUint, max_steps: u64) -> Result<BigUint> {
    if n.is_zero() {
        return Err(SimError::Domain { modulus: n.clone() });
    }

    let bound = n.to_u64().map_or(max_steps, |n| n.min(max_steps));
    let one = BigUint::one() % n;
    let base = a % n;
    let mut value = base.clone();
    let mut r = BigUint::one();

    for _ in 0..bound {
        if value == one {
            return Ok(r);
        }
        value = (value * &base) % n;
        r += 1u32;
    }

    Err(SimError::OrderNotFound {
        a: a.clone(),
        n: n.clone(),
        bound: BigUint::from(bound),
    })
}

/// Non-trivial factors `(f, N/f)` from an even order, via `gcd(a^(r/2) +- 1, N)`.
pub fn factors_from_order(
    a: &BigUint,
    n: &BigUint,
    order: &BigUint,
) -> Result<Option<(BigUint, BigUint)>> {
    if order.is_odd() || n < &BigUint::from(3u32) {
        return Ok(None);
    }

    let half = modpow(a, &(order >> 1u32), n)?;
    if half == n - 1u32 {
        return Ok(None);
    }

    let below = if half.is_zero() { n - 1u32 } else { &half - 1u32 };
    let candidates = [below.gcd(n), (&half + 1u32).gcd(n)];

    Ok(candidates
        .into_iter()
        .find(|f| !f.is_one() && f != n)
        .map(|f| {
            let cofactor = n / &f;
            (f, cofactor)
        }))
}

pub fn run(a: &BigUint, n: &BigUint, max_steps: u64) -> Result<OrderRun> {
    validate(a, n)?;

    let mut transcript = Transcript::new("SHOR ORDER FINDING (CLASSICAL)");
    let (eigen_qubits, eval_qubits) = register_sizes(n);

    transcript.push(
        Step::new(
            Phase::OrderFinding,
            Stage::ParametersFixed,
            format!("Find the order of element {} in Z_{}:", a, n),
        )
        .with("gcd(a, N)", a.gcd(n))
        .with("Eigenstate qubits", eigen_qubits)
        .with("Evaluation qubits", eval_qubits),
    );

    let order = multiplicative_order(a, n, max_steps)?;
    transcript.push(
        Step::new(
            Phase::OrderFinding,
            Stage::OrderFound,
            "Smallest r with a^r congruent to 1 (mod N):",
        )
        .with("r", &order)
        .with("a^r mod N", modpow(a, &order, n)?),
    );

    let factors = factors_from_order(a, n, &order)?;
    let step = Step::new(
        Phase::OrderFinding,
        Stage::OrderFound,
        "Shor post-processing: gcd(a^(r/2) +- 1, N):",
    );
    let step = match &factors {
        Some((f, g)) => step.with("Factor", f).with("Cofactor", g),
        None => step.with("Factor", "none (r odd, a^(r/2) = -1, or N prime)"),
    };
    transcript.push(step);

    Ok(OrderRun {
        a: a.clone(),
        n: n.clone(),
        eigen_qubits,
        eval_qubits,
        order,
        factors,
        transcript,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn test_register_sizes() {
        // N = 13: 4 eigenstate qubits, 169 -> 8 evaluation qubits
        assert_eq!(register_sizes(&big(13)), (4, 8));
        assert_eq!(register_sizes(&big(16)), (4, 8));
        assert_eq!(register_sizes(&big(1)), (0, 0));
    }

    #[test]
    fn test_order_of_five_mod_thirteen() {
        assert_eq!(multiplicative_order(&big(5), &big(13), DEFAULT_MAX_STEPS).unwrap(), big(4));
    }

    #[test]
    fn test_order_mod_one() {
        assert_eq!(multiplicative_order(&big(0), &big(1), DEFAULT_MAX_STEPS).unwrap(), big(1));
    }

    #[test]
    fn test_order_bound() {
        let err = multiplicative_order(&big(2), &big(1_000_003), 10).unwrap_err();
        assert!(matches!(err, SimError::OrderNotFound { .. }));
    }

    #[test]
    fn test_order_search_stops_at_modulus() {
        // 3 is not a unit mod 9, its powers never return to 1
        let err = multiplicative_order(&big(3), &big(9), DEFAULT_MAX_STEPS).unwrap_err();
        match err {
            SimError::OrderNotFound { bound, .. } => assert_eq!(bound, big(9)),
            other => panic!("expected OrderNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_validation() {
        assert!(validate(&big(5), &big(0)).is_err());
        assert!(validate(&big(14), &big(13)).is_err());
        assert!(validate(&big(6), &big(15)).is_err());
        assert!(validate(&big(7), &big(15)).is_ok());
    }

    #[test]
    fn test_factor_fifteen() {
        // 7 has order 4 mod 15; 7^2 = 4, gcd(3, 15) = 3, gcd(5, 15) = 5
        let run = run(&big(7), &big(15), DEFAULT_MAX_STEPS).unwrap();
        assert_eq!(run.order, big(4));
        assert_eq!(run.factors, Some((big(3), big(5))));
        assert_eq!(run.transcript.value("Cofactor").and_then(|v| v.as_int()), Some(&big(5)));
    }

    #[test]
    fn test_prime_modulus_has_no_factors() {
        let run = run(&big(5), &big(13), DEFAULT_MAX_STEPS).unwrap();
        assert_eq!(run.order, big(4));
        assert_eq!(run.factors, None);
    }

    quickcheck::quickcheck! {
        fn prop_order_is_minimal(a: u8, n: u8) -> quickcheck::TestResult {
            let (a, n) = (big(a as u64), big(n as u64));
            if validate(&a, &n).is_err() {
                return quickcheck::TestResult::discard();
            }
            let r = multiplicative_order(&a, &n, DEFAULT_MAX_STEPS).unwrap();
            let one = BigUint::one() % &n;
            let minimal = num_iter_below(&r).all(|k| a.modpow(&k, &n) != one);
            quickcheck::TestResult::from_bool(a.modpow(&r, &n) == one && minimal)
        }
    }

    fn num_iter_below(r: &BigUint) -> impl Iterator<Item = BigUint> {
        let limit: u64 = r.try_into().unwrap_or(u64::MAX);
        (1..limit).map(BigUint::from)
    }
}
