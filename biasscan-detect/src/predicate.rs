use biasscan_core::{StimulusCategory, TrialSequence, WindowSpec};

/// Largest tolerated `|low - high| / tau`, exclusive
pub const BALANCE_THRESHOLD: f64 = 0.3;

/// Target-action trials inside one window, split by stimulus category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowTally {
    pub low: usize,
    pub high: usize,
}

impl WindowTally {
    /// Counts the window `[start, start + tau)`, which must lie inside `sequence`.
    pub fn count(sequence: &TrialSequence, start: usize, spec: &WindowSpec) -> Self {
        let target = spec.target();
        sequence
            .window(start, spec.tau())
            .iter()
            .filter(|trial| trial.action == target)
            .fold(WindowTally::default(), |mut tally, trial| {
                match trial.stimulus {
                    StimulusCategory::Low => tally.low += 1,
                    StimulusCategory::High => tally.high += 1,
                }
                tally
            })
    }

    pub fn total(&self) -> usize {
        self.low + self.high
    }

    pub fn imbalance(&self, tau: usize) -> f64 {
        self.low.abs_diff(self.high) as f64 / tau as f64
    }
}

/// True when every trial of the window chose the target action and both
/// categories contributed near-equally.
pub fn is_biased_window(sequence: &TrialSequence, start: usize, spec: &WindowSpec) -> bool {
    debug_assert!(start + spec.tau() <= sequence.len());
    let tau = spec.tau();
    let tally = WindowTally::count(sequence, start, spec);
    tally.imbalance(tau) < BALANCE_THRESHOLD && tally.total() == tau
}
