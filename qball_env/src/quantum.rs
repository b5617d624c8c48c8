//! Quantum execution backend contract and the circuit it executes.

use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::types::Counts;

/// A single circuit instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gate {
    /// Hadamard on one qubit
    H(usize),
    /// Pauli-X (bit flip) on one qubit
    X(usize),
    /// Measure one qubit into the classical bit of the same index
    Measure(usize),
}

/// A quantum register with an equally sized classical register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circuit {
    qubits: usize,
    gates: Vec<Gate>,
}

impl Circuit {
    /// Builds an empty circuit over `qubits` qubits and classical bits.
    pub fn new(qubits: usize) -> Self {
        Self {
            qubits,
            gates: Vec::new(),
        }
    }

    pub fn h(&mut self, qubit: usize) -> &mut Self {
        self.gates.push(Gate::H(qubit));
        self
    }

    pub fn x(&mut self, qubit: usize) -> &mut Self {
        self.gates.push(Gate::X(qubit));
        self
    }

    /// Measures one qubit into the classical bit of the same index.
    pub fn measure(&mut self, qubit: usize) -> &mut Self {
        self.gates.push(Gate::Measure(qubit));
        self
    }

    /// Places every qubit into equal superposition.
    pub fn apply_superposition(&mut self) -> &mut Self {
        for q in 0..self.qubits {
            self.gates.push(Gate::H(q));
        }
        self
    }

    /// Measures every qubit into its classical bit.
    pub fn measure_all(&mut self) -> &mut Self {
        for q in 0..self.qubits {
            self.gates.push(Gate::Measure(q));
        }
        self
    }

    pub fn qubits(&self) -> usize {
        self.qubits
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Rejects gates that address qubits outside the register.
    pub fn validate(&self) -> Result<(), BackendError> {
        for gate in &self.gates {
            let q = match gate {
                Gate::H(q) | Gate::X(q) | Gate::Measure(q) => *q,
            };
            if q >= self.qubits {
                return Err(BackendError::InvalidCircuit(format!(
                    "{:?} addresses qubit {} of a {}-qubit register",
                    gate, q, self.qubits
                )));
            }
        }
        Ok(())
    }
}

/// A backend able to execute circuits and return measurement counts.
pub trait QuantumBackend: Send {
    fn name(&self) -> &str;

    fn is_simulator(&self) -> bool;

    /// Largest register the backend accepts.
    fn max_qubits(&self) -> usize;

    /// Runs the circuit `shots` times.
    ///
    /// With `shots == 1` the result holds exactly one key with count 1.
    fn execute(&mut self, circuit: &Circuit, shots: u32) -> Result<Counts, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superposition_circuit_layout() {
        let mut circuit = Circuit::new(3);
        circuit.apply_superposition().measure_all();

        assert_eq!(circuit.gates().len(), 6);
        assert_eq!(circuit.gates()[0], Gate::H(0));
        assert_eq!(circuit.gates()[5], Gate::Measure(2));
        assert!(circuit.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_qubit() {
        let mut circuit = Circuit::new(1);
        circuit.h(1);

        assert!(matches!(circuit.validate(), Err(BackendError::InvalidCircuit(_))));
    }
}
