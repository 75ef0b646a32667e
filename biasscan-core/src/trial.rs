use crate::stimulus::{Action, StimulusCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One recorded trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    pub stimulus: StimulusCategory,
    pub action: Action,
}

impl Trial {
    pub fn new(stimulus: StimulusCategory, action: Action) -> Self {
        Self { stimulus, action }
    }
}

/// Ordered trials of a single subject. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrialSequence {
    trials: Vec<Trial>,
}

impl TrialSequence {
    pub fn new(trials: Vec<Trial>) -> Self {
        Self { trials }
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    /// Trials in `[start, start + len)`. Panics if the range exceeds the sequence.
    pub fn window(&self, start: usize, len: usize) -> &[Trial] {
        &self.trials[start..start + len]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trial> {
        self.trials.iter()
    }

    /// Every action that occurs in this sequence
    pub fn alphabet(&self) -> ResponseAlphabet {
        self.trials.iter().map(|t| t.action).collect()
    }
}

impl FromIterator<Trial> for TrialSequence {
    fn from_iter<I: IntoIterator<Item = Trial>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TrialSequence {
    type Item = &'a Trial;
    type IntoIter = std::slice::Iter<'a, Trial>;

    fn into_iter(self) -> Self::IntoIter {
        self.trials.iter()
    }
}

/// Set of response labels a subject can produce
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseAlphabet {
    actions: BTreeSet<Action>,
}

impl ResponseAlphabet {
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        labels.iter().map(|l| Action::intern(l.as_ref())).collect()
    }

    pub fn contains(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }

    pub fn insert(&mut self, action: Action) {
        self.actions.insert(action);
    }

    pub fn extend(&mut self, other: &ResponseAlphabet) {
        self.actions.extend(other.actions.iter().copied());
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        self.actions.iter().copied()
    }
}

impl FromIterator<Action> for ResponseAlphabet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self {
            actions: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ResponseAlphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.actions.iter().map(Action::label).collect();
        f.write_str(&labels.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_collects_distinct_actions() {
        let l = Action::intern("trial-left");
        let r = Action::intern("trial-right");
        let seq: TrialSequence = [
            Trial::new(StimulusCategory::Low, l),
            Trial::new(StimulusCategory::High, l),
            Trial::new(StimulusCategory::High, r),
        ]
        .into_iter()
        .collect();

        let alphabet = seq.alphabet();
        assert_eq!(alphabet.len(), 2);
        assert!(alphabet.contains(l));
        assert!(alphabet.contains(r));
        assert!(!alphabet.contains(Action::intern("trial-none")));
    }

    #[test]
    fn window_slices_in_range() {
        let a = Action::intern("trial-a");
        let seq = TrialSequence::new(vec![Trial::new(StimulusCategory::Low, a); 5]);
        assert_eq!(seq.window(1, 4).len(), 4);
        assert_eq!(seq.window(5, 0).len(), 0);
    }

    #[test]
    fn alphabet_union() {
        let mut a = ResponseAlphabet::from_labels(&["trial-u1"]);
        a.extend(&ResponseAlphabet::from_labels(&["trial-u2", "trial-u1"]));
        assert_eq!(a.len(), 2);
        assert!(!a.is_empty());
    }
}
