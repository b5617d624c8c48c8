//! MeasurementSource - one random n-bit outcome per run.
//!
//! The outcome comes from a single shot of an n-qubit register placed in
//! equal superposition. The backend doing the shot is always a local
//! simulator; remote hardware never feeds the response table.

use qball_env::{Circuit, Counts, QballContext, QuantumBackend};
use serde::Serialize;
use tracing::debug;

use crate::error::MeasurementError;
use crate::simulator::StatevectorSimulator;

/// RNG stream id reserved for measurement sampling.
pub const MEASUREMENT_STREAM: u64 = 0x8BA11;

/// A validated measurement bitstring (one char per qubit, '0' or '1').
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MeasurementResult(String);

impl MeasurementResult {
    /// Validates `bits` as a `qubits`-long bitstring.
    pub fn parse(bits: &str, qubits: usize) -> Result<Self, MeasurementError> {
        if bits.len() != qubits || !bits.chars().all(|c| c == '0' || c == '1') {
            return Err(MeasurementError::MalformedCounts(format!(
                "'{}' is not a {}-bit string",
                bits, qubits
            )));
        }
        Ok(Self(bits.to_string()))
    }

    /// Extracts the outcome of a single-shot histogram.
    pub fn from_counts(counts: &Counts, qubits: usize) -> Result<Self, MeasurementError> {
        let bits = counts.single_outcome().ok_or_else(|| {
            MeasurementError::MalformedCounts(format!("expected one shot, got {}", counts))
        })?;
        Self::parse(bits, qubits)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of bits (== qubit count).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for MeasurementResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "|{}>", self.0)
    }
}

/// Builds the n-qubit "H on every qubit, measure everything" circuit.
pub fn superposition_circuit(qubits: usize) -> Circuit {
    let mut circuit = Circuit::new(qubits);
    circuit.apply_superposition().measure_all();
    circuit
}

/// Produces measurement results from a local simulation backend.
pub struct MeasurementSource {
    backend: Box<dyn QuantumBackend>,
}

impl MeasurementSource {
    /// Wraps an explicit backend.
    pub fn new(backend: Box<dyn QuantumBackend>) -> Self {
        Self { backend }
    }

    /// Local statevector simulator fed from the context's measurement stream.
    pub fn local<Ctx: QballContext>(ctx: &Ctx) -> Self {
        let rng = ctx.derive_rng(MEASUREMENT_STREAM);
        Self::new(Box::new(StatevectorSimulator::new(rng)))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    fn check_backend(&self, qubits: usize) -> Result<(), MeasurementError> {
        if qubits == 0 {
            return Err(MeasurementError::InvalidQubitCount(qubits));
        }
        if !self.backend.is_simulator() {
            return Err(MeasurementError::BackendUnavailable(format!(
                "{} is not a local simulator",
                self.backend.name()
            )));
        }
        if self.backend.max_qubits() < qubits {
            return Err(MeasurementError::BackendUnavailable(format!(
                "{} supports at most {} qubits",
                self.backend.name(),
                self.backend.max_qubits()
            )));
        }
        Ok(())
    }

    /// Takes exactly one shot of an n-qubit superposition.
    pub fn measure(&mut self, qubits: usize) -> Result<MeasurementResult, MeasurementError> {
        self.check_backend(qubits)?;

        let circuit = superposition_circuit(qubits);
        let counts = self
            .backend
            .execute(&circuit, 1)
            .map_err(|e| MeasurementError::BackendUnavailable(e.to_string()))?;

        let result = MeasurementResult::from_counts(&counts, qubits)?;
        debug!("Measured {} on {}", result, self.backend.name());
        Ok(result)
    }

    /// Runs the same circuit for many shots (illustrative histogram only).
    pub fn sample(&mut self, qubits: usize, shots: u32) -> Result<Counts, MeasurementError> {
        self.check_backend(qubits)?;
        self.backend
            .execute(&superposition_circuit(qubits), shots)
            .map_err(|e| MeasurementError::BackendUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qball_env::{BackendError, TokioContext};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn seeded(seed: u64) -> MeasurementSource {
        MeasurementSource::new(Box::new(StatevectorSimulator::new(
            ChaCha8Rng::seed_from_u64(seed),
        )))
    }

    struct Hardware;

    impl QuantumBackend for Hardware {
        fn name(&self) -> &str {
            "ibmqx4"
        }
        fn is_simulator(&self) -> bool {
            false
        }
        fn max_qubits(&self) -> usize {
            5
        }
        fn execute(&mut self, _circuit: &Circuit, _shots: u32) -> Result<Counts, BackendError> {
            unreachable!("hardware must never be asked for the answer")
        }
    }

    struct DoubleShot;

    impl QuantumBackend for DoubleShot {
        fn name(&self) -> &str {
            "double_shot"
        }
        fn is_simulator(&self) -> bool {
            true
        }
        fn max_qubits(&self) -> usize {
            8
        }
        fn execute(&mut self, _circuit: &Circuit, _shots: u32) -> Result<Counts, BackendError> {
            let mut counts = Counts::new();
            counts.record("0");
            counts.record("1");
            Ok(counts)
        }
    }

    #[test]
    fn test_measure_length_for_each_n() {
        let mut source = seeded(5);
        for n in 1..=8 {
            let result = source.measure(n).unwrap();
            assert_eq!(result.len(), n);
            assert!(result.as_str().chars().all(|c| c == '0' || c == '1'));
        }
    }

    #[test]
    fn test_single_qubit_is_fair() {
        let mut source = seeded(2024);
        let trials = 10_000;
        let ones = (0..trials)
            .filter(|_| source.measure(1).unwrap().as_str() == "1")
            .count();

        approx::assert_abs_diff_eq!(ones as f64 / trials as f64, 0.5, epsilon = 0.02);
    }

    #[test]
    fn test_local_uses_context_rng() {
        let ctx = TokioContext::new();
        let mut source = MeasurementSource::local(&ctx);
        assert_eq!(source.backend_name(), "statevector_simulator");
        assert_eq!(source.measure(3).unwrap().len(), 3);
    }

    #[test]
    fn test_zero_qubits_rejected() {
        assert_eq!(
            seeded(1).measure(0),
            Err(MeasurementError::InvalidQubitCount(0))
        );
    }

    #[test]
    fn test_non_simulator_is_unavailable() {
        let mut source = MeasurementSource::new(Box::new(Hardware));
        assert!(matches!(
            source.measure(1),
            Err(MeasurementError::BackendUnavailable(_))
        ));
    }

    #[test]
    fn test_register_too_large_is_unavailable() {
        let sim = StatevectorSimulator::new(ChaCha8Rng::seed_from_u64(0)).with_max_qubits(2);
        let mut source = MeasurementSource::new(Box::new(sim));
        assert!(matches!(
            source.measure(3),
            Err(MeasurementError::BackendUnavailable(_))
        ));
    }

    #[test]
    fn test_multi_key_counts_rejected() {
        let mut source = MeasurementSource::new(Box::new(DoubleShot));
        assert!(matches!(
            source.measure(1),
            Err(MeasurementError::MalformedCounts(_))
        ));
    }

    #[test]
    fn test_parse_validates_bits() {
        assert!(MeasurementResult::parse("101", 3).is_ok());
        assert!(MeasurementResult::parse("10", 3).is_err());
        assert!(MeasurementResult::parse("1a1", 3).is_err());
        assert_eq!(MeasurementResult::parse("01", 2).unwrap().to_string(), "|01>");
    }

    #[test]
    fn test_sample_histogram_totals_shots() {
        let counts = seeded(8).sample(3, 1024).unwrap();
        assert_eq!(counts.total(), 1024);
    }
}
