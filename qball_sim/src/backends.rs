//! Scripted quantum backends for forcing a specific answer.

use qball_env::{BackendError, Circuit, Counts, QuantumBackend};

/// Simulator that always observes the same bitstring.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    outcome: String,
}

impl ScriptedBackend {
    pub fn new(outcome: impl Into<String>) -> Self {
        Self {
            outcome: outcome.into(),
        }
    }
}

impl QuantumBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted_simulator"
    }

    fn is_simulator(&self) -> bool {
        true
    }

    fn max_qubits(&self) -> usize {
        self.outcome.len()
    }

    fn execute(&mut self, circuit: &Circuit, shots: u32) -> Result<Counts, BackendError> {
        circuit.validate()?;
        if circuit.qubits() > self.outcome.len() {
            return Err(BackendError::TooManyQubits {
                requested: circuit.qubits(),
                supported: self.outcome.len(),
            });
        }
        let mut counts = Counts::new();
        for _ in 0..shots {
            counts.record(self.outcome.clone());
        }
        Ok(counts)
    }
}

/// Simulator that is always down.
#[derive(Debug, Clone, Default)]
pub struct UnavailableBackend;

impl QuantumBackend for UnavailableBackend {
    fn name(&self) -> &str {
        "unavailable_simulator"
    }

    fn is_simulator(&self) -> bool {
        true
    }

    fn max_qubits(&self) -> usize {
        16
    }

    fn execute(&mut self, _circuit: &Circuit, _shots: u32) -> Result<Counts, BackendError> {
        Err(BackendError::Offline("simulator process crashed".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qball_core::superposition_circuit;

    #[test]
    fn test_scripted_backend_repeats_outcome() {
        let mut backend = ScriptedBackend::new("101");
        let counts = backend.execute(&superposition_circuit(3), 4).unwrap();
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.0.get("101"), Some(&4));
    }

    #[test]
    fn test_scripted_backend_rejects_larger_register() {
        let mut backend = ScriptedBackend::new("1");
        assert!(matches!(
            backend.execute(&superposition_circuit(3), 1),
            Err(BackendError::TooManyQubits { .. })
        ));
    }

    #[test]
    fn test_unavailable_backend() {
        let mut backend = UnavailableBackend;
        assert!(backend.execute(&superposition_circuit(1), 1).is_err());
    }
}
