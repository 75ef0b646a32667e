use biasscan_cache::{action_label, intern_action, lookup_action};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two stimulus categories of a two-tone task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StimulusCategory {
    Low,
    High,
}

impl StimulusCategory {
    pub const ALL: [StimulusCategory; 2] = [StimulusCategory::Low, StimulusCategory::High];
}

impl fmt::Display for StimulusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StimulusCategory::Low => f.write_str("low"),
            StimulusCategory::High => f.write_str("high"),
        }
    }
}

/// A response label, interned so trials compare actions by ID
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Action(usize);

impl Action {
    pub fn intern(label: &str) -> Self {
        Action(intern_action(label))
    }

    /// Returns `None` when no loaded data or config ever mentioned `label`.
    pub fn lookup(label: &str) -> Option<Self> {
        lookup_action(label).map(Action)
    }

    pub fn id(&self) -> usize {
        self.0
    }

    pub fn label(&self) -> String {
        action_label(self.0)
            .map(|atom| atom.to_string())
            .unwrap_or_else(|| format!("#{}", self.0))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action({:?})", self.label())
    }
}

impl Serialize for Action {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Action::intern(&label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_label_same_action() {
        assert_eq!(Action::intern("stim-left"), Action::intern("stim-left"));
        assert_ne!(Action::intern("stim-left"), Action::intern("stim-right"));
    }

    #[test]
    fn action_displays_label() {
        let a = Action::intern("stim-lick");
        assert_eq!(a.to_string(), "stim-lick");
        assert_eq!(format!("{:?}", a), "Action(\"stim-lick\")");
    }

    #[test]
    fn action_serializes_as_label() {
        let a = Action::intern("stim-serde");
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"stim-serde\"");
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
