//! Scenario catalogue for the simulation harness.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// QB-001: forced affirmative outcome, every collaborator healthy
    Affirmative,

    /// QB-002: forced negative outcome, lowered head and return to dock
    Negative,

    /// QB-003: accessory discovery never answers
    AccessoryTimeout,

    /// QB-004: robot unreachable
    ConnectFailure,

    /// QB-005: every docking maneuver fails
    DockingExhausted,

    /// QB-006: answer image cannot be decoded
    DecodeFailure,

    /// QB-007: local simulator is down
    MeasurementFailure,

    /// QB-008: remote provider rejects credentials
    RemoteAuthFailure,

    /// QB-009: celebration animation missing from the robot
    AnimationFailure,

    /// QB-010: seeded measurement under the configured fault plan
    Random,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Affirmative,
            ScenarioId::Negative,
            ScenarioId::AccessoryTimeout,
            ScenarioId::ConnectFailure,
            ScenarioId::DockingExhausted,
            ScenarioId::DecodeFailure,
            ScenarioId::MeasurementFailure,
            ScenarioId::RemoteAuthFailure,
            ScenarioId::AnimationFailure,
            ScenarioId::Random,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Affirmative => "affirmative",
            ScenarioId::Negative => "negative",
            ScenarioId::AccessoryTimeout => "accessory_timeout",
            ScenarioId::ConnectFailure => "connect_failure",
            ScenarioId::DockingExhausted => "docking_exhausted",
            ScenarioId::DecodeFailure => "decode_failure",
            ScenarioId::MeasurementFailure => "measurement_failure",
            ScenarioId::RemoteAuthFailure => "remote_auth_failure",
            ScenarioId::AnimationFailure => "animation_failure",
            ScenarioId::Random => "random",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Affirmative => "Affirmative outcome: celebrate, return to dock, exit 0",
            ScenarioId::Negative => "Negative outcome: head lowered, return to dock, exit 0",
            ScenarioId::AccessoryTimeout => "Cube never answers: docking skipped, answer still given",
            ScenarioId::ConnectFailure => "Robot unreachable: no actions, no disconnect, exit 1",
            ScenarioId::DockingExhausted => "Docking fails every time: exactly the bounded attempts",
            ScenarioId::DecodeFailure => "Answer image corrupt: image skipped, phrase still spoken",
            ScenarioId::MeasurementFailure => "Simulator down: no answer, clean disconnect, exit 2",
            ScenarioId::RemoteAuthFailure => "Remote credentials rejected: answer unaffected",
            ScenarioId::AnimationFailure => "One animation missing: the rest still play",
            ScenarioId::Random => "Seeded measurement under the configured fault plan",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "affirmative" | "a" | "qb-001" => Ok(ScenarioId::Affirmative),
            "negative" | "b" | "qb-002" => Ok(ScenarioId::Negative),
            "accessory_timeout" | "cube_timeout" | "c" | "qb-003" => Ok(ScenarioId::AccessoryTimeout),
            "connect_failure" | "d" | "qb-004" => Ok(ScenarioId::ConnectFailure),
            "docking_exhausted" | "qb-005" => Ok(ScenarioId::DockingExhausted),
            "decode_failure" | "qb-006" => Ok(ScenarioId::DecodeFailure),
            "measurement_failure" | "qb-007" => Ok(ScenarioId::MeasurementFailure),
            "remote_auth_failure" | "qb-008" => Ok(ScenarioId::RemoteAuthFailure),
            "animation_failure" | "qb-009" => Ok(ScenarioId::AnimationFailure),
            "random" | "qb-010" => Ok(ScenarioId::Random),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_from_str() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>(), Ok(scenario));
        }
    }

    #[test]
    fn test_letter_aliases() {
        assert_eq!("A".parse::<ScenarioId>(), Ok(ScenarioId::Affirmative));
        assert_eq!("c".parse::<ScenarioId>(), Ok(ScenarioId::AccessoryTimeout));
        assert!("z".parse::<ScenarioId>().is_err());
    }

    #[test]
    fn test_built_in_answers_describe_return_to_dock() {
        for scenario in [ScenarioId::Affirmative, ScenarioId::Negative] {
            let text = scenario.description();
            assert!(text.contains("return to dock"), "{}", text);
            assert!(!text.contains("pose reset"), "{}", text);
        }
    }
}
