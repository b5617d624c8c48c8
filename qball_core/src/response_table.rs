//! ResponseTable - total mapping from measurement outcome to robot response.
//!
//! Policy: exactly one affirmative entry (celebration + return to dock),
//! exactly one negative entry (head lowered + return to dock), every other
//! outcome neutral (one short animation, no terminal action).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, LookupError, TableError};
use crate::measurement::MeasurementResult;

/// Which side of the answer an entry falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Affirmative,
    Negative,
    Neutral,
}

/// What the robot does once the answer has been given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalAction {
    /// Drive back onto the charging base
    ReturnToDock,
    /// Raise the head and lower the lift so the face stays visible
    PoseReset,
}

/// The response for one outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEntry {
    /// Image asset key, relative to the asset directory
    pub image_ref: String,

    /// Spoken answer
    pub phrase: String,

    /// Animations played in order after the answer
    #[serde(default)]
    pub animations: Vec<String>,

    /// Head angle (degrees) applied before the image is shown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_angle_deg: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_action: Option<TerminalAction>,

    pub sentiment: Sentiment,
}

/// On-disk form of a table: entries keyed by an explicit outcome field.
#[derive(Debug, Deserialize)]
struct TableFile {
    qubits: usize,
    entries: Vec<KeyedEntry>,
}

#[derive(Debug, Deserialize)]
struct KeyedEntry {
    outcome: String,
    #[serde(flatten)]
    entry: ResponseEntry,
}

/// Immutable, validated outcome -> response mapping.
#[derive(Debug, Clone)]
pub struct ResponseTable {
    qubits: usize,
    entries: BTreeMap<String, ResponseEntry>,
}

const CELEBRATION: [&str; 3] = [
    "anim_pounce_success_02",
    "anim_eyecontact_giggle_01_head_angle_40",
    "anim_fistbump_success_01",
];
const SAD: &str = "anim_feedback_meanwords_01";
const NEUTRAL: &str = "anim_eyepose_curious";
const LOWERED_HEAD_DEG: f32 = -22.0;

fn affirmative(image_ref: &str, phrase: &str) -> ResponseEntry {
    ResponseEntry {
        image_ref: image_ref.to_string(),
        phrase: phrase.to_string(),
        animations: CELEBRATION.iter().map(|a| a.to_string()).collect(),
        head_angle_deg: None,
        terminal_action: Some(TerminalAction::ReturnToDock),
        sentiment: Sentiment::Affirmative,
    }
}

fn negative(image_ref: &str, phrase: &str) -> ResponseEntry {
    ResponseEntry {
        image_ref: image_ref.to_string(),
        phrase: phrase.to_string(),
        animations: vec![SAD.to_string()],
        head_angle_deg: Some(LOWERED_HEAD_DEG),
        terminal_action: Some(TerminalAction::ReturnToDock),
        sentiment: Sentiment::Negative,
    }
}

fn neutral(image_ref: &str, phrase: &str) -> ResponseEntry {
    ResponseEntry {
        image_ref: image_ref.to_string(),
        phrase: phrase.to_string(),
        animations: vec![NEUTRAL.to_string()],
        head_angle_deg: None,
        terminal_action: None,
        sentiment: Sentiment::Neutral,
    }
}

impl ResponseTable {
    /// Validates a set of entries against the table policy.
    pub fn new(
        qubits: usize,
        entries: impl IntoIterator<Item = (String, ResponseEntry)>,
    ) -> Result<Self, TableError> {
        if qubits == 0 {
            return Err(TableError::NoQubits);
        }
        let mut map = BTreeMap::new();
        for (key, entry) in entries {
            if key.len() != qubits || !key.chars().all(|c| c == '0' || c == '1') {
                return Err(TableError::InvalidKey { key, qubits });
            }
            if map.contains_key(&key) {
                return Err(TableError::DuplicateKey(key));
            }
            map.insert(key, entry);
        }

        let expected = 1usize
            .checked_shl(qubits as u32)
            .ok_or(TableError::WrongEntryCount {
                qubits,
                expected: usize::MAX,
                actual: map.len(),
            })?;
        if map.len() != expected {
            return Err(TableError::WrongEntryCount {
                qubits,
                expected,
                actual: map.len(),
            });
        }

        let count = |s: Sentiment| map.values().filter(|e| e.sentiment == s).count();
        match count(Sentiment::Affirmative) {
            1 => {}
            n => return Err(TableError::AffirmativeCount(n)),
        }
        match count(Sentiment::Negative) {
            1 => {}
            n => return Err(TableError::NegativeCount(n)),
        }

        Ok(Self { qubits, entries: map })
    }

    /// Single-qubit yes/no table.
    pub fn yes_no() -> Self {
        let entries = [
            ("1".to_string(), affirmative("ket-1.png", "Yes!")),
            ("0".to_string(), negative("ket-0.png", "No.")),
        ];
        Self {
            qubits: 1,
            entries: entries.into_iter().collect(),
        }
    }

    /// Three-qubit Magic 8-Ball table.
    pub fn eight_ball() -> Self {
        let entries = [
            ("000", affirmative("ket-000.png", "It is certain.")),
            ("001", neutral("ket-001.png", "Without a doubt.")),
            ("010", neutral("ket-010.png", "Yes - definitely.")),
            ("011", neutral("ket-011.png", "Most likely.")),
            ("100", neutral("ket-100.png", "Don't count on it.")),
            ("101", negative("ket-101.png", "My reply is no.")),
            ("110", neutral("ket-110.png", "Very doubtful.")),
            ("111", neutral("ket-111.png", "Concentrate and ask again.")),
        ];
        Self {
            qubits: 3,
            entries: entries
                .into_iter()
                .map(|(k, e)| (k.to_string(), e))
                .collect(),
        }
    }

    /// Built-in table for the configured qubit count.
    pub fn builtin(qubits: usize) -> Result<Self, TableError> {
        match qubits {
            1 => Ok(Self::yes_no()),
            3 => Ok(Self::eight_ball()),
            n => Err(TableError::NoBuiltin(n)),
        }
    }

    /// Parses and validates a JSON table.
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        let file: TableFile =
            serde_json::from_str(json).map_err(|e| TableError::Parse(e.to_string()))?;
        Self::new(
            file.qubits,
            file.entries.into_iter().map(|k| (k.outcome, k.entry)),
        )
    }

    /// Loads a JSON table from disk.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_json(&json)?)
    }

    /// Resolves a measurement to its response.
    ///
    /// Pure: no device or session state is involved.
    pub fn lookup(&self, measurement: &MeasurementResult) -> Result<&ResponseEntry, LookupError> {
        let invalid = || LookupError::InvalidMeasurement {
            expected: self.qubits,
            actual: measurement.as_str().to_string(),
        };
        if measurement.len() != self.qubits {
            return Err(invalid());
        }
        self.entries.get(measurement.as_str()).ok_or_else(invalid)
    }

    pub fn qubits(&self) -> usize {
        self.qubits
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResponseEntry)> {
        self.entries.iter()
    }

    /// Outcome key of the affirmative entry.
    pub fn affirmative_outcome(&self) -> Option<&str> {
        self.outcome_with(Sentiment::Affirmative)
    }

    /// Outcome key of the negative entry.
    pub fn negative_outcome(&self) -> Option<&str> {
        self.outcome_with(Sentiment::Negative)
    }

    fn outcome_with(&self, sentiment: Sentiment) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, e)| e.sentiment == sentiment)
            .map(|(k, _)| k.as_str())
    }
}
