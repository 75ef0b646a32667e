//! Cohort × tau grid
//!
//! Every subject is loaded once, then scanned at every tau. All work runs on
//! a rayon pool; each task owns or shares read-only inputs and returns its
//! result by value. A cell's statistic is computed only after every task of
//! the sweep has finished.

use crate::config::SweepConfig;
use crate::error::ScanError;
use crate::loader::{LoadError, TrialSource};
use crate::roster::{Roster, SubjectId};
use biasscan_core::{Action, ResponseAlphabet, TrialSequence, WindowSpec};
use biasscan_detect::{ExtensionRule, segment};
use biasscan_stats::{CohortStat, aggregate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Inputs that stay fixed for a whole sweep
#[derive(Debug, Clone)]
pub struct SweepSettings {
    pub target: String,
    pub taus: Vec<usize>,
    /// `None` infers the alphabet from the loaded sessions
    pub alphabet: Option<ResponseAlphabet>,
    pub rule: ExtensionRule,
    pub fail_fast: bool,
}

impl SweepSettings {
    pub fn from_config(config: &SweepConfig, target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            taus: config.sweep_taus(),
            alphabet: config.fixed_alphabet(),
            rule: config.extension,
            fail_fast: config.fail_fast,
        }
    }
}

/// Biased-trial count of one subject at one tau
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectCount {
    pub cohort: String,
    pub subject: SubjectId,
    pub tau: usize,
    pub biased: usize,
    pub trials: usize,
}

/// A subject left out of its cohort's statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Omission {
    pub cohort: String,
    pub subject: SubjectId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellStat {
    pub cohort: String,
    pub tau: usize,
    #[serde(flatten)]
    pub stat: CohortStat,
}

/// A (cohort, tau) pair with no statistic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCell {
    pub cohort: String,
    pub tau: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub target: String,
    pub rule: ExtensionRule,
    pub cohorts: Vec<String>,
    pub taus: Vec<usize>,
    /// Roster order, then ascending tau
    pub cells: Vec<CellStat>,
    pub skipped: Vec<SkippedCell>,
    pub omissions: Vec<Omission>,
    pub subjects: Vec<SubjectCount>,
}

impl SweepReport {
    pub fn cell(&self, cohort: &str, tau: usize) -> Option<&CohortStat> {
        self.cells
            .iter()
            .find(|c| c.cohort == cohort && c.tau == tau)
            .map(|c| &c.stat)
    }
}

struct Loaded {
    cohort: usize,
    subject: SubjectId,
    sequence: Arc<TrialSequence>,
}

pub fn run_sweep<S: TrialSource>(
    source: &S,
    roster: &Roster,
    settings: &SweepSettings,
    pool: &rayon::ThreadPool,
) -> Result<SweepReport, ScanError> {
    let target = Action::intern(settings.target.trim());
    let mut taus = settings.taus.clone();
    taus.sort_unstable();
    taus.dedup();

    // Reject bad specs before touching any data.
    for &tau in &taus {
        match &settings.alphabet {
            Some(alphabet) => WindowSpec::within(tau, target, alphabet)?,
            None => WindowSpec::new(tau, target)?,
        };
    }

    let cohorts = roster.cohorts();
    info!(
        cohorts = cohorts.len(),
        subjects = roster.subject_count(),
        taus = ?taus,
        target = %target,
        "starting sweep"
    );

    let tasks: Vec<(usize, SubjectId)> = cohorts
        .iter()
        .enumerate()
        .flat_map(|(ci, c)| c.subjects.iter().map(move |&s| (ci, s)))
        .collect();

    let attempts: Vec<(usize, SubjectId, Result<TrialSequence, LoadError>)> = pool.install(|| {
        tasks
            .par_iter()
            .map(|&(ci, subject)| (ci, subject, source.load_sequence(subject, &cohorts[ci].name)))
            .collect()
    });

    let mut loaded = Vec::with_capacity(attempts.len());
    let mut omissions = Vec::new();
    for (ci, subject, attempt) in attempts {
        match attempt {
            Ok(sequence) => {
                debug!(cohort = %cohorts[ci].name, %subject, trials = sequence.len(), "loaded");
                loaded.push(Loaded {
                    cohort: ci,
                    subject,
                    sequence: Arc::new(sequence),
                });
            }
            Err(source) if settings.fail_fast => {
                return Err(ScanError::SequenceLoadFailure {
                    cohort: cohorts[ci].name.clone(),
                    subject,
                    source,
                });
            }
            Err(err) => {
                warn!(cohort = %cohorts[ci].name, %subject, error = %err, "omitting subject");
                omissions.push(Omission {
                    cohort: cohorts[ci].name.clone(),
                    subject,
                    reason: err.to_string(),
                });
            }
        }
    }

    let specs: Vec<WindowSpec> = match &settings.alphabet {
        Some(alphabet) => taus
            .iter()
            .map(|&tau| WindowSpec::within(tau, target, alphabet))
            .collect::<Result<_, _>>()?,
        None if loaded.is_empty() => taus
            .iter()
            .map(|&tau| WindowSpec::new(tau, target))
            .collect::<Result<_, _>>()?,
        None => {
            let mut alphabet = ResponseAlphabet::default();
            for l in &loaded {
                alphabet.extend(&l.sequence.alphabet());
            }
            taus.iter()
                .map(|&tau| WindowSpec::within(tau, target, &alphabet))
                .collect::<Result<_, _>>()?
        }
    };

    let work: Vec<(&Loaded, WindowSpec)> = loaded
        .iter()
        .flat_map(|l| specs.iter().map(move |&spec| (l, spec)))
        .collect();

    let subjects: Vec<SubjectCount> = pool.install(|| {
        work.par_iter()
            .map(|&(l, spec)| {
                let result = segment(&l.sequence, spec, settings.rule).result();
                SubjectCount {
                    cohort: cohorts[l.cohort].name.clone(),
                    subject: l.subject,
                    tau: spec.tau(),
                    biased: result.biased,
                    trials: result.trials,
                }
            })
            .collect()
    });

    let mut buckets: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
    for (l, count) in work.iter().map(|(l, _)| l).zip(&subjects) {
        buckets
            .entry((l.cohort, count.tau))
            .or_default()
            .push(count.biased);
    }

    let mut cells = Vec::new();
    let mut skipped = Vec::new();
    for (ci, cohort) in cohorts.iter().enumerate() {
        for &tau in &taus {
            let counts = buckets.remove(&(ci, tau)).unwrap_or_default();
            match aggregate(&counts) {
                Ok(stat) => {
                    debug!(cohort = %cohort.name, tau, mean = stat.mean, std = stat.std_dev, n = stat.n, "cell");
                    cells.push(CellStat {
                        cohort: cohort.name.clone(),
                        tau,
                        stat,
                    });
                }
                Err(err) => {
                    warn!(cohort = %cohort.name, tau, "no statistic: {}", err);
                    skipped.push(SkippedCell {
                        cohort: cohort.name.clone(),
                        tau,
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    info!(
        cells = cells.len(),
        skipped = skipped.len(),
        omitted = omissions.len(),
        "sweep finished"
    );

    Ok(SweepReport {
        target: target.label(),
        rule: settings.rule,
        cohorts: cohorts.iter().map(|c| c.name.clone()).collect(),
        taus,
        cells,
        skipped,
        omissions,
        subjects,
    })
}

/// Pool with `threads` workers, or one per core when `threads` is 0.
pub fn build_pool(threads: usize) -> Result<rayon::ThreadPool, ScanError> {
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("bias-scan-{}", i))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Cohort;
    use approx::assert_abs_diff_eq;
    use biasscan_core::{InvalidWindowSpec, StimulusCategory, Trial};
    use std::collections::HashMap;

    /// In-memory sessions keyed by subject id
    struct MemorySource(HashMap<u32, TrialSequence>);

    impl TrialSource for MemorySource {
        fn load_sequence(&self, subject: SubjectId, _cohort: &str) -> Result<TrialSequence, LoadError> {
            self.0
                .get(&subject.0)
                .cloned()
                .ok_or(LoadError::NotFound(subject))
        }
    }

    /// `biased` balanced target trials followed by `other` non-target trials
    fn session(biased: usize, other: usize) -> TrialSequence {
        let x = Action::intern("sweep-x");
        let y = Action::intern("sweep-y");
        let cat = |i: usize| {
            if i % 2 == 0 {
                StimulusCategory::Low
            } else {
                StimulusCategory::High
            }
        };
        (0..biased)
            .map(|i| Trial::new(cat(i), x))
            .chain((0..other).map(|i| Trial::new(cat(i), y)))
            .collect()
    }

    fn settings(taus: Vec<usize>) -> SweepSettings {
        SweepSettings {
            target: "sweep-x".to_string(),
            taus,
            alphabet: None,
            rule: ExtensionRule::WindowUnion,
            fail_fast: false,
        }
    }

    fn roster(cohorts: &[(&str, &[u32])]) -> Roster {
        Roster::new(
            cohorts
                .iter()
                .map(|(name, ids)| Cohort {
                    name: name.to_string(),
                    subjects: ids.iter().map(|&i| SubjectId(i)).collect(),
                })
                .collect(),
        )
    }

    fn pool() -> rayon::ThreadPool {
        build_pool(2).unwrap()
    }

    #[test]
    fn per_cohort_mean_and_std() {
        let source = MemorySource(HashMap::from([
            (1, session(4, 6)),
            (2, session(6, 4)),
            (3, session(8, 4)),
            (10, session(0, 10)),
        ]));
        let roster = roster(&[("KO", &[1, 2, 3]), ("WT", &[10])]);
        let report = run_sweep(&source, &roster, &settings(vec![4, 2]), &pool()).unwrap();

        assert_eq!(report.taus, vec![2, 4]);
        assert_eq!(report.cells.len(), 4);
        assert_eq!(report.subjects.len(), 8);
        assert!(report.omissions.is_empty() && report.skipped.is_empty());

        // For an even block of n balanced target trials, tau 4 labels exactly n.
        let ko = report.cell("KO", 4).unwrap();
        assert_abs_diff_eq!(ko.mean, 6.0);
        assert_abs_diff_eq!(ko.std_dev, (8.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        let wt = report.cell("WT", 4).unwrap();
        assert_abs_diff_eq!(wt.mean, 0.0);

        let order: Vec<(&str, usize)> = report.cells.iter().map(|c| (c.cohort.as_str(), c.tau)).collect();
        assert_eq!(order, vec![("KO", 2), ("KO", 4), ("WT", 2), ("WT", 4)]);
    }

    #[test]
    fn failed_subjects_are_omitted_not_zeroed() {
        let source = MemorySource(HashMap::from([(1, session(4, 6)), (2, session(8, 2))]));
        let roster = roster(&[("KO", &[1, 2, 99])]);
        let report = run_sweep(&source, &roster, &settings(vec![4]), &pool()).unwrap();

        assert_eq!(report.omissions.len(), 1);
        assert_eq!(report.omissions[0].subject, SubjectId(99));
        let ko = report.cell("KO", 4).unwrap();
        assert_eq!(ko.n, 2);
        assert_abs_diff_eq!(ko.mean, 6.0);
    }

    #[test]
    fn cohort_without_loaded_subjects_is_skipped() {
        let source = MemorySource(HashMap::from([(1, session(4, 6))]));
        let roster = roster(&[("KO", &[1]), ("WT", &[50, 51])]);
        let report = run_sweep(&source, &roster, &settings(vec![4, 6]), &pool()).unwrap();

        assert!(report.cell("WT", 4).is_none());
        assert_eq!(report.skipped.len(), 2);
        assert!(report.skipped.iter().all(|s| s.cohort == "WT"));
        assert_eq!(report.omissions.len(), 2);
    }

    #[test]
    fn fail_fast_aborts_the_sweep() {
        let source = MemorySource(HashMap::from([(1, session(4, 6))]));
        let roster = roster(&[("KO", &[1, 7])]);
        let mut s = settings(vec![4]);
        s.fail_fast = true;
        let err = run_sweep(&source, &roster, &s, &pool()).unwrap_err();
        assert!(matches!(
            err,
            ScanError::SequenceLoadFailure { subject: SubjectId(7), .. }
        ));
    }

    #[test]
    fn zero_tau_fails_before_loading() {
        let source = MemorySource(HashMap::new());
        let roster = roster(&[("KO", &[1])]);
        let err = run_sweep(&source, &roster, &settings(vec![4, 0]), &pool()).unwrap_err();
        assert!(matches!(
            err,
            ScanError::InvalidWindowSpec(InvalidWindowSpec::ZeroTau)
        ));
    }

    #[test]
    fn target_must_appear_in_inferred_alphabet() {
        let source = MemorySource(HashMap::from([(1, session(4, 6))]));
        let roster = roster(&[("KO", &[1])]);
        let mut s = settings(vec![4]);
        s.target = "sweep-missing".to_string();
        assert!(matches!(
            run_sweep(&source, &roster, &s, &pool()),
            Err(ScanError::InvalidWindowSpec(InvalidWindowSpec::UnknownTarget { .. }))
        ));
    }

    #[test]
    fn fixed_alphabet_is_checked_up_front() {
        let source = MemorySource(HashMap::new());
        let roster = roster(&[("KO", &[1])]);
        let mut s = settings(vec![4]);
        s.alphabet = Some(ResponseAlphabet::from_labels(&["sweep-y"]));
        assert!(matches!(
            run_sweep(&source, &roster, &s, &pool()),
            Err(ScanError::InvalidWindowSpec(InvalidWindowSpec::UnknownTarget { .. }))
        ));
    }

    #[test]
    fn results_do_not_depend_on_pool_size() {
        let source = MemorySource((1..=12).map(|i| (i, session(2 * i as usize, 5))).collect());
        let roster = roster(&[("A", &[1, 2, 3, 4, 5, 6]), ("B", &[7, 8, 9, 10, 11, 12])]);
        let s = settings(vec![4, 5, 6]);
        let one = run_sweep(&source, &roster, &s, &build_pool(1).unwrap()).unwrap();
        let many = run_sweep(&source, &roster, &s, &build_pool(4).unwrap()).unwrap();
        assert_eq!(one, many);
    }
}
