//! Classical simulation of BB84 basis encoding, measurement and sifting

use std::fmt;

use rand::Rng;

use crate::error::{Result, SimError};
use crate::protocol::transcript::{Phase, Stage, Step, Transcript, VERIFIED_LABEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bit {
    Zero,
    One,
}

impl Bit {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Bit::from(rng.gen::<bool>())
    }
}

impl From<bool> for Bit {
    fn from(b: bool) -> Self {
        if b {
            Bit::One
        } else {
            Bit::Zero
        }
    }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bit::Zero => f.write_str("0"),
            Bit::One => f.write_str("1"),
        }
    }
}

/// Shown as `0` (computational) and `1` (Hadamard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Basis {
    Computational,
    Hadamard,
}

impl Basis {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen::<bool>() {
            Basis::Hadamard
        } else {
            Basis::Computational
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basis::Computational => f.write_str("0"),
            Basis::Hadamard => f.write_str("1"),
        }
    }
}

/// One "photon": a bit prepared in a basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedState {
    pub basis: Basis,
    pub bit: Bit,
}

impl EncodedState {
    /// Measure in `basis`. A matching basis reads the prepared bit; any other
    /// basis collapses to a uniformly random bit.
    pub fn measure<R: Rng + ?Sized>(&self, basis: Basis, rng: &mut R) -> Bit {
        if basis == self.basis {
            self.bit
        } else {
            Bit::random(rng)
        }
    }
}

impl fmt::Display for EncodedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ket = match (self.basis, self.bit) {
            (Basis::Computational, Bit::Zero) => "|0>",
            (Basis::Computational, Bit::One) => "|1>",
            (Basis::Hadamard, Bit::Zero) => "|+>",
            (Basis::Hadamard, Bit::One) => "|->",
        };
        f.write_str(ket)
    }
}

/// Sender side: random raw key and random preparation bases.
#[derive(Debug, Clone)]
pub struct Alice {
    bits: Vec<Bit>,
    bases: Vec<Basis>,
}

impl Alice {
    pub fn prepare<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Self {
        let mut bits = Vec::with_capacity(n);
        let mut bases = Vec::with_capacity(n);
        for _ in 0..n {
            bits.push(Bit::random(rng));
            bases.push(Basis::random(rng));
        }
        Self { bits, bases }
    }

    pub fn from_choices(bits: Vec<Bit>, bases: Vec<Basis>) -> Result<Self> {
        if bits.len() != bases.len() {
            return Err(SimError::InvalidArgument(format!(
                "Alice has {} bits but {} bases",
                bits.len(),
                bases.len()
            )));
        }
        Ok(Self { bits, bases })
    }

    pub fn bits(&self) -> &[Bit] {
        &self.bits
    }

    pub fn bases(&self) -> &[Basis] {
        &self.bases
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn states(&self) -> Vec<EncodedState> {
        self.bases
            .iter()
            .zip(&self.bits)
            .map(|(&basis, &bit)| EncodedState { basis, bit })
            .collect()
    }
}

/// Receiver side: random measurement bases and the bits read.
#[derive(Debug, Clone)]
pub struct Bob {
    bases: Vec<Basis>,
    bits: Vec<Bit>,
}

impl Bob {
    /// Pick a basis per state independently of Alice, then measure.
    pub fn measure<R: Rng + ?Sized>(states: &[EncodedState], rng: &mut R) -> Self {
        let bases: Vec<Basis> = (0..states.len()).map(|_| Basis::random(rng)).collect();
        Self::read(states, bases, rng)
    }

    pub fn measure_with_bases<R: Rng + ?Sized>(
        states: &[EncodedState],
        bases: Vec<Basis>,
        rng: &mut R,
    ) -> Result<Self> {
        if states.len() != bases.len() {
            return Err(SimError::InvalidArgument(format!(
                "{} states but {} measurement bases",
                states.len(),
                bases.len()
            )));
        }
        Ok(Self::read(states, bases, rng))
    }

    pub fn bases(&self) -> &[Basis] {
        &self.bases
    }

    pub fn bits(&self) -> &[Bit] {
        &self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    fn read<R: Rng + ?Sized>(states: &[EncodedState], bases: Vec<Basis>, rng: &mut R) -> Self {
        let bits = states
            .iter()
            .zip(&bases)
            .map(|(state, &basis)| state.measure(basis, rng))
            .collect();
        Self { bases, bits }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiftedBit {
    Kept(Bit),
    Discarded,
}

impl fmt::Display for SiftedBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiftedBit::Kept(bit) => write!(f, "{}", bit),
            SiftedBit::Discarded => f.write_str("_"),
        }
    }
}

/// Full-length key with discarded positions marked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiftedKey(pub Vec<SiftedBit>);

impl SiftedKey {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Indices that survived sifting.
    pub fn kept_positions(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, b)| matches!(b, SiftedBit::Kept(_)))
            .map(|(i, _)| i)
            .collect()
    }

    /// The usable key: kept bits only.
    pub fn bits(&self) -> Vec<Bit> {
        self.0
            .iter()
            .filter_map(|b| match b {
                SiftedBit::Kept(bit) => Some(*bit),
                SiftedBit::Discarded => None,
            })
            .collect()
    }
}

impl fmt::Display for SiftedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.0 {
            write!(f, "{}", bit)?;
        }
        Ok(())
    }
}

/// Keep every slot where the bases agree, on both sides.
///
/// Both keys span every slot, so Alice and Bob must hold the same number.
pub fn sift(alice: &Alice, bob: &Bob) -> Result<(SiftedKey, SiftedKey)> {
    if alice.len() != bob.len() {
        return Err(SimError::InvalidArgument(format!(
            "Alice sent {} states but Bob measured {}",
            alice.len(),
            bob.len()
        )));
    }

    let mut alice_key = Vec::with_capacity(alice.len());
    let mut bob_key = Vec::with_capacity(bob.len());

    for i in 0..alice.len() {
        if alice.bases[i] == bob.bases[i] {
            alice_key.push(SiftedBit::Kept(alice.bits[i]));
            bob_key.push(SiftedBit::Kept(bob.bits[i]));
        } else {
            alice_key.push(SiftedBit::Discarded);
            bob_key.push(SiftedBit::Discarded);
        }
    }

    Ok((SiftedKey(alice_key), SiftedKey(bob_key)))
}

#[derive(Debug, Clone)]
pub struct Bb84Run {
    pub alice: Alice,
    pub states: Vec<EncodedState>,
    pub bob: Bob,
    pub alice_key: SiftedKey,
    pub bob_key: SiftedKey,
    pub transcript: Transcript,
}

/// One BB84 exchange of `n` slots.
pub fn run<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Result<Bb84Run> {
    let alice = Alice::prepare(n, rng);
    let states = alice.states();
    let bob = Bob::measure(&states, rng);
    run_with_actors(alice, bob)
}

/// Build the run for already-chosen actors.
pub fn run_with_actors(alice: Alice, bob: Bob) -> Result<Bb84Run> {
    let (alice_key, bob_key) = sift(&alice, &bob)?;
    let mut transcript = Transcript::new("BB84 KEY DISTRIBUTION");
    let states = alice.states();

    transcript.push(
        Step::new(
            Phase::Transmission,
            Stage::StatesPrepared,
            "Alice draws a random bit and a random basis for every slot:",
        )
        .with("Alice generated key", joined(&alice.bits))
        .with("Alice generated base", joined(&alice.bases)),
    );
    transcript.push(
        Step::new(
            Phase::Transmission,
            Stage::StatesPrepared,
            "Alice encodes each bit in its basis and sends the states to Bob:",
        )
        .with("Alice encoded key in states", joined(&states)),
    );
    transcript.push(
        Step::new(
            Phase::Transmission,
            Stage::StatesMeasured,
            "Bob measures each state in a basis of his own choosing:",
        )
        .with("Bob generated base'", joined(&bob.bases))
        .with("Bob decoded key'", joined(&bob.bits)),
    );

    let retained = alice_key.kept_positions().len();
    let fraction = if alice_key.is_empty() {
        0.0
    } else {
        retained as f64 / alice_key.len() as f64
    };
    transcript.push(
        Step::new(
            Phase::Comparison,
            Stage::KeySifted,
            "Alice and Bob compare bases and keep only the slots where they match:",
        )
        .with("Alice gets reduced key", alice_key.to_string())
        .with("Bob gets reduced key'", bob_key.to_string())
        .with("Retained positions", retained)
        .with("Retained fraction", format!("{:.2}", fraction)),
    );

    let agree = alice_key == bob_key;
    if !agree {
        tracing::error!(%alice_key, %bob_key, "sifted keys disagree");
    }
    transcript.push(
        Step::new(
            Phase::Comparison,
            Stage::Verified,
            "Alice's reduced key is compared with Bob's:",
        )
        .with(VERIFIED_LABEL, agree),
    );

    Ok(Bb84Run {
        alice,
        states,
        bob,
        alice_key,
        bob_key,
        transcript,
    })
}

fn joined<T: fmt::Display>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bases(symbols: &[u8]) -> Vec<Basis> {
        symbols
            .iter()
            .map(|&s| if s == 0 { Basis::Computational } else { Basis::Hadamard })
            .collect()
    }

    #[test]
    fn test_state_labels() {
        let labels: Vec<String> = [
            (Basis::Computational, Bit::Zero),
            (Basis::Computational, Bit::One),
            (Basis::Hadamard, Bit::Zero),
            (Basis::Hadamard, Bit::One),
        ]
        .iter()
        .map(|&(basis, bit)| EncodedState { basis, bit }.to_string())
        .collect();
        assert_eq!(labels, ["|0>", "|1>", "|+>", "|->"]);
    }

    #[test]
    fn test_sifting_keeps_matching_bases() {
        let mut rng = StdRng::seed_from_u64(0);
        let alice = Alice::from_choices(
            vec![Bit::One, Bit::Zero, Bit::One, Bit::Zero],
            bases(&[0, 1, 0, 1]),
        )
        .unwrap();
        let bob = Bob::measure_with_bases(&alice.states(), bases(&[0, 0, 1, 1]), &mut rng).unwrap();
        let run = run_with_actors(alice, bob).unwrap();

        assert_eq!(run.alice_key.kept_positions(), vec![0, 3]);
        assert_eq!(run.alice_key.0[1], SiftedBit::Discarded);
        assert_eq!(run.alice_key.0[2], SiftedBit::Discarded);
        assert_eq!(run.bob_key.kept_positions(), vec![0, 3]);
        assert_eq!(run.alice_key.bits(), vec![Bit::One, Bit::Zero]);
        assert_eq!(run.bob_key.bits(), vec![Bit::One, Bit::Zero]);
        assert_eq!(run.alice_key.to_string(), "1__0");
        assert_eq!(run.transcript.verified(), Some(true));
    }

    #[test]
    fn test_fixed_seed_ten_slots() {
        let mut rng = StdRng::seed_from_u64(10);
        let run = run(10, &mut rng).unwrap();

        assert_eq!(run.alice_key.len(), 10);
        assert_eq!(run.bob_key.len(), 10);
        assert_eq!(run.alice_key.kept_positions(), run.bob_key.kept_positions());
        assert_eq!(run.alice_key, run.bob_key);
        for i in run.alice_key.kept_positions() {
            assert_eq!(run.alice.bases()[i], run.bob.bases()[i]);
            assert_eq!(run.alice.bits()[i], run.bob.bits()[i]);
        }
    }

    #[test]
    fn test_same_seed_same_run() {
        let a = run(32, &mut StdRng::seed_from_u64(99)).unwrap();
        let b = run(32, &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a.alice.bits(), b.alice.bits());
        assert_eq!(a.bob.bases(), b.bob.bases());
        assert_eq!(a.alice_key, b.alice_key);
    }

    #[test]
    fn test_about_half_retained() {
        let mut retained = 0usize;
        let mut total = 0usize;
        for seed in 0..200u64 {
            let run = run(100, &mut StdRng::seed_from_u64(seed)).unwrap();
            retained += run.alice_key.kept_positions().len();
            total += run.alice_key.len();
        }
        let fraction = retained as f64 / total as f64;
        assert!((0.47..=0.53).contains(&fraction), "fraction = {fraction}");
    }

    #[test]
    fn test_mismatched_basis_reads_random_bits() {
        let mut rng = StdRng::seed_from_u64(3);
        let state = EncodedState {
            basis: Basis::Computational,
            bit: Bit::One,
        };
        let ones = (0..10_000)
            .filter(|_| state.measure(Basis::Hadamard, &mut rng) == Bit::One)
            .count();
        assert!((4_600..=5_400).contains(&ones), "ones = {ones}");
        assert!((0..100).all(|_| state.measure(Basis::Computational, &mut rng) == Bit::One));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(Alice::from_choices(vec![Bit::One], vec![]).is_err());
        let mut rng = StdRng::seed_from_u64(0);
        let states = Alice::prepare(3, &mut rng).states();
        assert!(Bob::measure_with_bases(&states, bases(&[0, 1]), &mut rng).is_err());
    }

    #[test]
    fn test_sifting_rejects_unequal_actors() {
        let mut rng = StdRng::seed_from_u64(0);
        let alice = Alice::prepare(4, &mut rng);
        let bob = Bob::measure(&alice.states()[..2], &mut rng);
        assert_eq!(alice.len(), 4);
        assert_eq!(bob.len(), 2);

        assert!(matches!(sift(&alice, &bob), Err(SimError::InvalidArgument(_))));
        assert!(matches!(run_with_actors(alice, bob), Err(SimError::InvalidArgument(_))));
    }

    #[test]
    fn test_zero_slots() {
        let run = run(0, &mut StdRng::seed_from_u64(0)).unwrap();
        assert!(run.alice_key.is_empty());
        assert_eq!(
            run.transcript.value("Retained fraction").and_then(|v| v.as_text()),
            Some("0.00")
        );
    }
}
