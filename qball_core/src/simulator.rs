//! Local statevector simulator.
//!
//! Supports the gates the 8-ball circuit needs (H, X, measure). Amplitudes
//! stay real under these gates, so the state is a plain `Vec<f64>` of
//! length 2^n. Measurement is deferred to the end of the circuit and
//! sampled once per shot.

use qball_env::{BackendError, Circuit, Counts, Gate, QuantumBackend};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::f64::consts::FRAC_1_SQRT_2;

/// Largest register the simulator accepts (2^16 amplitudes).
pub const DEFAULT_MAX_QUBITS: usize = 16;

/// Statevector simulator driven by an injected RNG.
pub struct StatevectorSimulator {
    rng: ChaCha8Rng,
    max_qubits: usize,
}

impl StatevectorSimulator {
    pub fn new(rng: ChaCha8Rng) -> Self {
        Self {
            rng,
            max_qubits: DEFAULT_MAX_QUBITS,
        }
    }

    pub fn with_max_qubits(mut self, max_qubits: usize) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    /// Evolves |0...0> through the circuit's unitary gates.
    ///
    /// Returns the amplitudes and which qubits are measured.
    fn evolve(circuit: &Circuit) -> Result<(Vec<f64>, Vec<bool>), BackendError> {
        let n = circuit.qubits();
        let mut amplitudes = vec![0.0; 1usize << n];
        amplitudes[0] = 1.0;
        let mut measured = vec![false; n];

        for gate in circuit.gates() {
            match *gate {
                Gate::H(q) | Gate::X(q) if measured[q] => {
                    return Err(BackendError::InvalidCircuit(format!(
                        "gate on qubit {} after its measurement",
                        q
                    )));
                }
                Gate::H(q) => {
                    let mask = 1usize << q;
                    for i in 0..amplitudes.len() {
                        if i & mask == 0 {
                            let (a, b) = (amplitudes[i], amplitudes[i | mask]);
                            amplitudes[i] = (a + b) * FRAC_1_SQRT_2;
                            amplitudes[i | mask] = (a - b) * FRAC_1_SQRT_2;
                        }
                    }
                }
                Gate::X(q) => {
                    let mask = 1usize << q;
                    for i in 0..amplitudes.len() {
                        if i & mask == 0 {
                            amplitudes.swap(i, i | mask);
                        }
                    }
                }
                Gate::Measure(q) => measured[q] = true,
            }
        }

        Ok((amplitudes, measured))
    }

    fn sample_index(&mut self, probabilities: &[f64]) -> usize {
        let draw: f64 = self.rng.gen();
        let mut cumulative = 0.0;
        for (i, p) in probabilities.iter().enumerate() {
            cumulative += p;
            if draw < cumulative {
                return i;
            }
        }
        // Rounding left the draw past the last bucket
        probabilities
            .iter()
            .rposition(|p| *p > 0.0)
            .unwrap_or(0)
    }
}

/// Formats a basis index as a bitstring, qubit 0 rightmost.
///
/// Unmeasured qubits read as '0' in the classical register.
fn classical_key(index: usize, measured: &[bool]) -> String {
    (0..measured.len())
        .rev()
        .map(|q| if measured[q] && index & (1 << q) != 0 { '1' } else { '0' })
        .collect()
}

impl QuantumBackend for StatevectorSimulator {
    fn name(&self) -> &str {
        "statevector_simulator"
    }

    fn is_simulator(&self) -> bool {
        true
    }

    fn max_qubits(&self) -> usize {
        self.max_qubits
    }

    fn execute(&mut self, circuit: &Circuit, shots: u32) -> Result<Counts, BackendError> {
        if circuit.qubits() > self.max_qubits {
            return Err(BackendError::TooManyQubits {
                requested: circuit.qubits(),
                supported: self.max_qubits,
            });
        }
        if shots == 0 {
            return Err(BackendError::InvalidCircuit("zero shots requested".into()));
        }
        circuit.validate()?;

        let (amplitudes, measured) = Self::evolve(circuit)?;
        let probabilities: Vec<f64> = amplitudes.iter().map(|a| a * a).collect();

        let mut counts = Counts::new();
        for _ in 0..shots {
            let index = self.sample_index(&probabilities);
            counts.record(classical_key(index, &measured));
        }
        Ok(counts)
    }
}
