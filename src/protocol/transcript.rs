//! Ordered record of a protocol run

use std::fmt;

use num_bigint::BigUint;

/// Protocol state reached by a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ParametersGenerated,
    ParametersFixed,
    KeyPairDerived,
    PlaintextEncoded,
    Encrypted,
    Decrypted,
    Verified,
    StatesPrepared,
    StatesMeasured,
    KeySifted,
    OrderFound,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ParametersGenerated => "parameters generated",
            Stage::ParametersFixed => "parameters fixed",
            Stage::KeyPairDerived => "key pair derived",
            Stage::PlaintextEncoded => "plaintext encoded",
            Stage::Encrypted => "encrypted",
            Stage::Decrypted => "decrypted",
            Stage::Verified => "verified",
            Stage::StatesPrepared => "states prepared",
            Stage::StatesMeasured => "states measured",
            Stage::KeySifted => "key sifted",
            Stage::OrderFound => "order found",
        };
        f.write_str(name)
    }
}

/// Heading under which steps are grouped when printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    KeyGeneration,
    MessageExchange,
    Transmission,
    Comparison,
    OrderFinding,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::KeyGeneration => "KEY GENERATION PHASE",
            Phase::MessageExchange => "MESSAGE EXCHANGE PHASE",
            Phase::Transmission => "TRANSMISSION PHASE",
            Phase::Comparison => "BASIS COMPARISON PHASE",
            Phase::OrderFinding => "ORDER FINDING PHASE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(BigUint),
    Text(String),
    Flag(bool),
}

impl Value {
    pub fn as_int(&self) -> Option<&BigUint> {
        match self {
            Value::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Value::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Flag(b) => write!(f, "{}", b),
        }
    }
}

impl From<BigUint> for Value {
    fn from(n: BigUint) -> Self {
        Value::Int(n)
    }
}

impl From<&BigUint> for Value {
    fn from(n: &BigUint) -> Self {
        Value::Int(n.clone())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Int(BigUint::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Int(BigUint::from(n))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Flag(b)
    }
}

/// One labelled stage of a run and the values computed there.
#[derive(Debug, Clone)]
pub struct Step {
    pub phase: Phase,
    pub stage: Stage,
    pub description: String,
    pub values: Vec<(&'static str, Value)>,
}

impl Step {
    pub fn new(phase: Phase, stage: Stage, description: impl Into<String>) -> Self {
        Self {
            phase,
            stage,
            description: description.into(),
            values: Vec::new(),
        }
    }

    pub fn with(mut self, label: &'static str, value: impl Into<Value>) -> Self {
        self.values.push((label, value.into()));
        self
    }

    pub fn value(&self, label: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v)
    }
}

/// Append-only while the engine runs, read-only once returned.
#[derive(Debug, Clone)]
pub struct Transcript {
    title: &'static str,
    steps: Vec<Step>,
}

impl Transcript {
    pub(crate) fn new(title: &'static str) -> Self {
        Self {
            title,
            steps: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, step: Step) {
        tracing::debug!(stage = %step.stage, "{}", step.description);
        self.steps.push(step);
    }

    pub fn title(&self) -> &str {
        self.title
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Latest value recorded under `label`.
    pub fn value(&self, label: &str) -> Option<&Value> {
        self.steps.iter().rev().find_map(|step| step.value(label))
    }

    pub fn stages(&self) -> Vec<Stage> {
        let mut stages: Vec<Stage> = Vec::new();
        for step in &self.steps {
            if stages.last() != Some(&step.stage) {
                stages.push(step.stage);
            }
        }
        stages
    }

    /// Outcome of the final round-trip check, if the run has one.
    pub fn verified(&self) -> Option<bool> {
        self.steps
            .iter()
            .rev()
            .find(|step| step.stage == Stage::Verified)
            .and_then(|step| step.value(VERIFIED_LABEL))
            .and_then(Value::as_flag)
    }
}

pub(crate) const VERIFIED_LABEL: &str = "Equal to Bob's";

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(60))?;

        let mut phase = None;
        for (i, step) in self.steps.iter().enumerate() {
            if phase != Some(step.phase) {
                writeln!(f)?;
                writeln!(f, "{}", step.phase)?;
                phase = Some(step.phase);
            }

            writeln!(f)?;
            writeln!(f, "  {}) {}", i + 1, step.description)?;

            let width = step.values.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
            for (label, value) in &step.values {
                writeln!(f, "     {:width$} = {}", label, value, width = width)?;
            }
        }

        writeln!(f, "{}", "=".repeat(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transcript {
        let mut t = Transcript::new("SAMPLE");
        t.push(
            Step::new(Phase::KeyGeneration, Stage::ParametersFixed, "Alice picks p")
                .with("p", BigUint::from(23u32)),
        );
        t.push(
            Step::new(Phase::MessageExchange, Stage::Decrypted, "Alice decodes")
                .with("Alice's message", "hi")
                .with(VERIFIED_LABEL, true),
        );
        t.push(Step::new(Phase::MessageExchange, Stage::Verified, "Round trip").with(VERIFIED_LABEL, true));
        t
    }

    #[test]
    fn test_lookup() {
        let t = sample();
        assert_eq!(t.value("p").and_then(Value::as_int), Some(&BigUint::from(23u32)));
        assert_eq!(t.value("Alice's message").and_then(Value::as_text), Some("hi"));
        assert_eq!(t.verified(), Some(true));
        assert!(t.value("missing").is_none());
    }

    #[test]
    fn test_stages_are_deduplicated_in_order() {
        let t = sample();
        assert_eq!(
            t.stages(),
            vec![Stage::ParametersFixed, Stage::Decrypted, Stage::Verified]
        );
    }

    #[test]
    fn test_render_groups_by_phase() {
        let out = sample().to_string();
        assert!(out.contains("SAMPLE"));
        assert_eq!(out.matches("KEY GENERATION PHASE").count(), 1);
        assert_eq!(out.matches("MESSAGE EXCHANGE PHASE").count(), 1);
        assert!(out.contains("  1) Alice picks p"));
        assert!(out.contains("     p = 23"));
        assert!(out.contains("     Alice's message = hi"));
        assert!(out.contains("  3) Round trip"));
    }
}
