use serde::{Deserialize, Serialize};
use thiserror::Error;

/// No subject contributed a count, so there is nothing to summarise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot aggregate an empty cohort")]
pub struct EmptyCohortAggregation;

/// Summary of per-subject biased-trial counts for one (cohort, tau) cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CohortStat {
    pub mean: f64,
    /// Population standard deviation (divides by `n`)
    pub std_dev: f64,
    pub n: usize,
    pub min: usize,
    pub max: usize,
}

pub fn aggregate(counts: &[usize]) -> Result<CohortStat, EmptyCohortAggregation> {
    let (&first, rest) = counts.split_first().ok_or(EmptyCohortAggregation)?;

    let n = counts.len() as f64;
    let mean = counts.iter().map(|&c| c as f64).sum::<f64>() / n;
    let var = counts
        .iter()
        .map(|&c| (c as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    let (min, max) = rest
        .iter()
        .fold((first, first), |(lo, hi), &c| (lo.min(c), hi.max(c)));

    Ok(CohortStat {
        mean,
        std_dev: var.sqrt(),
        n: counts.len(),
        min,
        max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn population_std_of_three() {
        let stat = aggregate(&[4, 6, 5]).unwrap();
        assert_abs_diff_eq!(stat.mean, 5.0);
        assert_abs_diff_eq!(stat.std_dev, (2.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(stat.std_dev, 0.8165, epsilon = 1e-4);
        assert_eq!((stat.n, stat.min, stat.max), (3, 4, 6));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(aggregate(&[]), Err(EmptyCohortAggregation));
    }

    #[test]
    fn single_subject_has_zero_spread() {
        let stat = aggregate(&[7]).unwrap();
        assert_abs_diff_eq!(stat.mean, 7.0);
        assert_abs_diff_eq!(stat.std_dev, 0.0);
    }

    #[test]
    fn all_zero_counts_stay_finite() {
        let stat = aggregate(&[0, 0, 0, 0]).unwrap();
        assert!(stat.mean.is_finite() && stat.std_dev.is_finite());
        assert_abs_diff_eq!(stat.mean, 0.0);
    }

    #[test]
    fn order_does_not_matter() {
        let a = aggregate(&[1, 9, 3, 12]).unwrap();
        let b = aggregate(&[12, 3, 9, 1]).unwrap();
        assert_abs_diff_eq!(a.mean, b.mean, epsilon = 1e-12);
        assert_abs_diff_eq!(a.std_dev, b.std_dev, epsilon = 1e-12);
    }
}
