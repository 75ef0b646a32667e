use crate::predicate::is_biased_window;
use biasscan_core::{IntervalLabel, Run, TrialSequence, WindowSpec};
use serde::{Deserialize, Serialize};

/// Which window decides whether a run keeps growing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionRule {
    /// Probe the window after the run's last agreeing one. A run covers
    /// exactly the union of its agreeing windows.
    #[default]
    WindowUnion,
    /// Re-probe the run's current window before stepping, so a run reaches
    /// one trial past its last agreeing window. Reproduces older result sets.
    Overreach,
}

/// Forward scan over a trial sequence, yielding one labelled span per step.
///
/// Consecutive spans may carry the same label; [`Segmentation::runs`]
/// merges them into maximal runs.
#[derive(Debug, Clone)]
pub struct Scan<'a> {
    sequence: &'a TrialSequence,
    spec: WindowSpec,
    rule: ExtensionRule,
    cursor: usize,
}

impl<'a> Scan<'a> {
    pub fn new(sequence: &'a TrialSequence, spec: WindowSpec, rule: ExtensionRule) -> Self {
        Self {
            sequence,
            spec,
            rule,
            cursor: 0,
        }
    }

    /// First index not yet assigned to a span
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn window_label(&self, start: usize) -> IntervalLabel {
        IntervalLabel::from_predicate(is_biased_window(self.sequence, start, &self.spec))
    }
}

impl Iterator for Scan<'_> {
    type Item = Run;

    fn next(&mut self) -> Option<Run> {
        let n = self.sequence.len();
        let tau = self.spec.tau();
        let t = self.cursor;
        if t + tau > n {
            return None;
        }

        let state = self.window_label(t);
        let mut k = 0;
        while t + tau + k < n {
            let probe = match self.rule {
                ExtensionRule::WindowUnion => t + k + 1,
                ExtensionRule::Overreach => t + k,
            };
            if self.window_label(probe) != state {
                break;
            }
            k += 1;
        }

        let end = t + tau + k - 1;
        self.cursor = end + 1;
        Some(Run {
            label: state,
            start: t,
            end,
        })
    }
}

/// Biased-trial total for one subject at one window spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationResult {
    pub biased: usize,
    pub trials: usize,
}

/// Label for every trial index of one sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    labels: Vec<IntervalLabel>,
    trailing: usize,
    biased: usize,
}

impl Segmentation {
    pub fn labels(&self) -> &[IntervalLabel] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn biased_count(&self) -> usize {
        self.biased
    }

    /// Trailing trials no full window reached. They are labelled `NonBiased`.
    pub fn trailing(&self) -> usize {
        self.trailing
    }

    pub fn result(&self) -> SegmentationResult {
        SegmentationResult {
            biased: self.biased,
            trials: self.labels.len(),
        }
    }

    /// Maximal runs, in order, covering every index
    pub fn runs(&self) -> Vec<Run> {
        let mut runs: Vec<Run> = Vec::new();
        for (i, &label) in self.labels.iter().enumerate() {
            match runs.last_mut() {
                Some(run) if run.label == label => run.end = i,
                _ => runs.push(Run {
                    label,
                    start: i,
                    end: i,
                }),
            }
        }
        runs
    }
}

/// Partition `sequence` into biased and non-biased spans.
pub fn segment(sequence: &TrialSequence, spec: WindowSpec, rule: ExtensionRule) -> Segmentation {
    let n = sequence.len();
    let mut labels = Vec::with_capacity(n);
    let mut biased = 0;
    for run in Scan::new(sequence, spec, rule) {
        if run.label.is_biased() {
            biased += run.len();
        }
        labels.resize(run.end + 1, run.label);
    }
    let trailing = n - labels.len();
    labels.resize(n, IntervalLabel::NonBiased);

    Segmentation {
        labels,
        trailing,
        biased,
    }
}

/// Same count as [`segment`], without the label buffer.
pub fn biased_count(sequence: &TrialSequence, spec: WindowSpec, rule: ExtensionRule) -> usize {
    Scan::new(sequence, spec, rule)
        .filter(|run| run.label.is_biased())
        .map(|run| run.len())
        .sum()
}
