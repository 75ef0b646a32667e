use serde::{Deserialize, Serialize};

/// Classification assigned to every trial index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntervalLabel {
    Biased,
    NonBiased,
}

impl IntervalLabel {
    pub fn from_predicate(biased: bool) -> Self {
        if biased {
            IntervalLabel::Biased
        } else {
            IntervalLabel::NonBiased
        }
    }

    pub fn is_biased(&self) -> bool {
        matches!(self, IntervalLabel::Biased)
    }
}

/// Maximal span of equally labelled trials, `start..=end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub label: IntervalLabel,
    pub start: usize,
    pub end: usize,
}

impl Run {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }
}
