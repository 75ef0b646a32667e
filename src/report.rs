//! Sweep output: JSON export, stdout table and chart data

use crate::sweep::SweepReport;
use biasscan_render::{GroupedBars, Series};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn write_json(report: &SweepReport, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// One block per cohort, one row per tau. Cells without a statistic show `-`.
pub fn summary_table(report: &SweepReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Bias towards `{}` ({} extension)",
        report.target,
        match report.rule {
            biasscan_detect::ExtensionRule::WindowUnion => "window-union",
            biasscan_detect::ExtensionRule::Overreach => "overreach",
        }
    );
    for cohort in &report.cohorts {
        let _ = writeln!(out, "\n{}", cohort);
        let _ = writeln!(
            out,
            "  {:>4}  {:>8}  {:>8}  {:>3}  {:>5}  {:>5}",
            "tau", "mean", "std", "n", "min", "max"
        );
        for &tau in &report.taus {
            match report.cell(cohort, tau) {
                Some(stat) => {
                    let _ = writeln!(
                        out,
                        "  {:>4}  {:>8.3}  {:>8.3}  {:>3}  {:>5}  {:>5}",
                        tau, stat.mean, stat.std_dev, stat.n, stat.min, stat.max
                    );
                }
                None => {
                    let _ = writeln!(out, "  {:>4}  {:>8}", tau, "-");
                }
            }
        }
    }
    if !report.omissions.is_empty() {
        let _ = writeln!(out, "\nOmitted subjects:");
        for o in &report.omissions {
            let _ = writeln!(out, "  {} #{}: {}", o.cohort, o.subject, o.reason);
        }
    }
    out
}

/// Taus on the x axis, one bar series per cohort with std-dev error bars.
pub fn to_chart(report: &SweepReport) -> GroupedBars {
    let series = report
        .cohorts
        .iter()
        .map(|cohort| Series {
            name: cohort.clone(),
            values: report
                .taus
                .iter()
                .map(|&tau| report.cell(cohort, tau).map(|s| (s.mean, s.std_dev)))
                .collect(),
        })
        .collect();

    GroupedBars {
        title: format!(
            "Mean Bias Count towards {} for Different Types of Mice and Tau Values",
            report.target
        ),
        x_label: "Tau".to_string(),
        y_label: "Mean Bias Count".to_string(),
        categories: report.taus.iter().map(|t| t.to_string()).collect(),
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::SubjectId;
    use crate::sweep::{CellStat, Omission, SkippedCell};
    use biasscan_detect::ExtensionRule;
    use biasscan_stats::CohortStat;
    use tempfile::TempDir;

    fn report() -> SweepReport {
        let stat = |mean, n| CohortStat {
            mean,
            std_dev: 0.5,
            n,
            min: 1,
            max: 9,
        };
        SweepReport {
            target: "left".into(),
            rule: ExtensionRule::WindowUnion,
            cohorts: vec!["KO".into(), "WT".into()],
            taus: vec![4, 6],
            cells: vec![
                CellStat {
                    cohort: "KO".into(),
                    tau: 4,
                    stat: stat(5.0, 3),
                },
                CellStat {
                    cohort: "KO".into(),
                    tau: 6,
                    stat: stat(2.0, 3),
                },
                CellStat {
                    cohort: "WT".into(),
                    tau: 6,
                    stat: stat(1.0, 1),
                },
            ],
            skipped: vec![SkippedCell {
                cohort: "WT".into(),
                tau: 4,
                reason: "cannot aggregate an empty cohort".into(),
            }],
            omissions: vec![Omission {
                cohort: "WT".into(),
                subject: SubjectId(3),
                reason: "missing".into(),
            }],
            subjects: vec![],
        }
    }

    #[test]
    fn chart_groups_by_cohort_and_leaves_gaps() {
        let chart = to_chart(&report());
        assert_eq!(chart.categories, vec!["4", "6"]);
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].values, vec![Some((5.0, 0.5)), Some((2.0, 0.5))]);
        assert_eq!(chart.series[1].values, vec![None, Some((1.0, 0.5))]);
        assert!(chart.title.contains("towards left"));
    }

    #[test]
    fn table_lists_every_cell() {
        let table = summary_table(&report());
        assert!(table.contains("KO"));
        assert!(table.contains("5.000"));
        assert!(table.contains("WT #3: missing"));
        assert_eq!(table.lines().filter(|l| l.trim_end().ends_with('-')).count(), 1);
    }

    #[test]
    fn json_export_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("report.json");
        write_json(&report(), &path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["cells"].as_array().unwrap().len(), 3);
        assert_eq!(value["cells"][0]["mean"], 5.0);
        assert_eq!(value["skipped"][0]["tau"], 4);
        assert_eq!(value["rule"], "window_union");
        let back: SweepReport = serde_json::from_value(value).unwrap();
        assert_eq!(back, report());
    }
}
