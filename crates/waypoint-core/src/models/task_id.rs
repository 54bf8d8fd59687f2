//! Canonical task identifiers.

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A task identifier of the form `phase{N}-task{M}`.
///
/// The verbatim text is kept so ids round-trip unchanged from compiler input
/// to persisted state. Ordering follows the numeric components, so
/// `phase1-task2` sorts before `phase1-task10`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId {
    raw: String,
    phase: u32,
    index: u32,
}

impl TaskId {
    /// Phase number encoded in the id.
    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// Position of the task within its phase, as encoded in the id.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The id exactly as it was written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Parses a positive decimal integer without sign or leading zeros.
fn parse_component(digits: &str) -> Option<u32> {
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    digits.parse().ok()
}

impl FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Invalid task id: {s}");
        let rest = s.strip_prefix("phase").ok_or_else(invalid)?;
        let (phase, index) = rest.split_once("-task").ok_or_else(invalid)?;
        let phase = parse_component(phase).ok_or_else(invalid)?;
        let index = parse_component(index).ok_or_else(invalid)?;

        Ok(TaskId {
            raw: s.to_string(),
            phase,
            index,
        })
    }
}

impl TryFrom<String> for TaskId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.raw
    }
}

impl PartialEq for TaskId {
    fn eq(&self, other: &Self) -> bool {
        self.phase == other.phase && self.index == other.index
    }
}

impl Eq for TaskId {}

impl std::hash::Hash for TaskId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.phase.hash(state);
        self.index.hash(state);
    }
}

impl PartialOrd for TaskId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TaskId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.phase, self.index).cmp(&(other.phase, other.index))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_ids() {
        let id: TaskId = "phase2-task13".parse().unwrap();
        assert_eq!(id.phase(), 2);
        assert_eq!(id.index(), 13);
        assert_eq!(id.as_str(), "phase2-task13");
    }

    #[test]
    fn test_reject_malformed_ids() {
        for bad in [
            "",
            "phase1",
            "task1",
            "phase0-task1",
            "phase1-task0",
            "phase01-task1",
            "Phase1-task1",
            "phase1-task1a",
            "phase-1-task1",
            "phase1_task1",
            "phase1-task+1",
        ] {
            assert!(bad.parse::<TaskId>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_numeric_ordering() {
        let a: TaskId = "phase1-task2".parse().unwrap();
        let b: TaskId = "phase1-task10".parse().unwrap();
        let c: TaskId = "phase2-task1".parse().unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_serde_is_verbatim() {
        let id: TaskId = "phase3-task4".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"phase3-task4\"");

        let back: TaskId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<TaskId>("\"step-1\"").is_err());
    }
}
