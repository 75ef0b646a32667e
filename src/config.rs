//! Sweep configuration

use crate::error::ScanError;
use biasscan_core::{Action, InvalidWindowSpec, ResponseAlphabet};
use biasscan_detect::ExtensionRule;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A named cohort and the roster column holding its subject ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortColumn {
    pub name: String,
    pub column: String,
}

impl CohortColumn {
    pub fn new(name: &str, column: &str) -> Self {
        Self {
            name: name.to_string(),
            column: column.to_string(),
        }
    }
}

/// Column headers of a per-subject trial file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnNames {
    pub stimulus: String,
    pub action: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            stimulus: "tone_freq".to_string(),
            action: "response".to_string(),
        }
    }
}

/// Raw stimulus values mapped to the two categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StimulusCodes {
    pub low: String,
    pub high: String,
}

impl Default for StimulusCodes {
    fn default() -> Self {
        Self {
            low: "6000".to_string(),
            high: "10000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    /// TrueType font for labels; without one the chart has no text
    pub font: Option<PathBuf>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1400,
            height: 800,
            font: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Directory holding per-subject trial files
    pub data_dir: PathBuf,
    /// File name of one subject's trials; `{id}` and `{cohort}` are substituted
    pub file_template: String,
    /// Table whose columns list subject ids per cohort
    pub roster: PathBuf,
    /// Only the first rows of each roster column are read
    pub roster_rows: usize,
    pub cohorts: Vec<CohortColumn>,
    pub taus: Vec<usize>,
    /// Asked for interactively when absent
    pub target_action: Option<String>,
    /// Allowed response labels; empty means infer from the loaded trials
    pub response_alphabet: Vec<String>,
    pub columns: ColumnNames,
    pub stimulus_codes: StimulusCodes,
    pub extension: ExtensionRule,
    /// Worker threads, 0 = one per core
    pub threads: usize,
    /// Abort on the first subject that fails to load
    pub fail_fast: bool,
    pub chart: ChartConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            file_template: "mouse_data_{id}_{cohort}_prob.csv".to_string(),
            roster: PathBuf::from("Mouse_DATA.csv"),
            roster_rows: 5,
            cohorts: vec![
                CohortColumn::new("16p11.2 REV", "16p_rev"),
                CohortColumn::new("16p11.2 VAR", "16p_var"),
                CohortColumn::new("WT REV", "WT_rev"),
                CohortColumn::new("WT VAR", "WT_var"),
            ],
            taus: (4..10).collect(),
            target_action: None,
            response_alphabet: Vec::new(),
            columns: ColumnNames::default(),
            stimulus_codes: StimulusCodes::default(),
            extension: ExtensionRule::default(),
            threads: 0,
            fail_fast: false,
            chart: ChartConfig::default(),
        }
    }
}

impl SweepConfig {
    /// Check every field that does not depend on loaded data.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.taus.is_empty() {
            return Err(ScanError::Config("at least one tau is required".to_string()));
        }
        if self.taus.contains(&0) {
            return Err(InvalidWindowSpec::ZeroTau.into());
        }
        if self.cohorts.is_empty() {
            return Err(ScanError::Config("at least one cohort is required".to_string()));
        }
        let mut seen = HashSet::new();
        for cohort in &self.cohorts {
            if cohort.name.trim().is_empty() || cohort.column.trim().is_empty() {
                return Err(ScanError::Config(
                    "cohort name and column must not be empty".to_string(),
                ));
            }
            if !seen.insert(cohort.name.as_str()) {
                return Err(ScanError::Config(format!(
                    "duplicate cohort `{}`",
                    cohort.name
                )));
            }
        }
        if self.roster_rows == 0 {
            return Err(ScanError::Config("roster_rows must be > 0".to_string()));
        }
        if !self.file_template.contains("{id}") {
            return Err(ScanError::Config(format!(
                "file_template must contain {{id}}, got `{}`",
                self.file_template
            )));
        }
        if self.stimulus_codes.low.trim() == self.stimulus_codes.high.trim() {
            return Err(ScanError::Config(
                "low and high stimulus codes must differ".to_string(),
            ));
        }
        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(ScanError::Config("chart size must be non-zero".to_string()));
        }
        if let Some(target) = &self.target_action {
            if target.trim().is_empty() {
                return Err(ScanError::Config("target_action must not be empty".to_string()));
            }
            if let Some(alphabet) = self.fixed_alphabet() {
                let action = Action::intern(target.trim());
                if !alphabet.contains(action) {
                    return Err(InvalidWindowSpec::UnknownTarget {
                        action: action.label(),
                        alphabet: alphabet.to_string(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Sorted, deduplicated tau values
    pub fn sweep_taus(&self) -> Vec<usize> {
        let mut taus = self.taus.clone();
        taus.sort_unstable();
        taus.dedup();
        taus
    }

    /// The configured response alphabet, if one was given
    pub fn fixed_alphabet(&self) -> Option<ResponseAlphabet> {
        if self.response_alphabet.is_empty() {
            None
        } else {
            Some(ResponseAlphabet::from_labels(&self.response_alphabet))
        }
    }

    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ScanError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ScanError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_follow_the_reference_sweep() {
        let config = SweepConfig::default();
        assert_eq!(config.taus, vec![4, 5, 6, 7, 8, 9]);
        assert_eq!(config.cohorts.len(), 4);
        assert_eq!(config.roster_rows, 5);
        assert_eq!(config.extension, ExtensionRule::WindowUnion);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_tau_is_an_invalid_window() {
        let config = SweepConfig {
            taus: vec![4, 0],
            ..SweepConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ScanError::InvalidWindowSpec(InvalidWindowSpec::ZeroTau))
        ));
    }

    #[test]
    fn target_outside_fixed_alphabet_is_rejected() {
        let config = SweepConfig {
            target_action: Some("cfg-up".to_string()),
            response_alphabet: vec!["cfg-left".to_string(), "cfg-right".to_string()],
            ..SweepConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ScanError::InvalidWindowSpec(InvalidWindowSpec::UnknownTarget { .. }))
        ));

        let ok = SweepConfig {
            target_action: Some("cfg-left".to_string()),
            ..config
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn other_invalid_fields() {
        let cases = [
            SweepConfig {
                taus: vec![],
                ..SweepConfig::default()
            },
            SweepConfig {
                cohorts: vec![],
                ..SweepConfig::default()
            },
            SweepConfig {
                cohorts: vec![CohortColumn::new("A", "a"), CohortColumn::new("A", "b")],
                ..SweepConfig::default()
            },
            SweepConfig {
                roster_rows: 0,
                ..SweepConfig::default()
            },
            SweepConfig {
                file_template: "subject.csv".to_string(),
                ..SweepConfig::default()
            },
            SweepConfig {
                stimulus_codes: StimulusCodes {
                    low: "1".to_string(),
                    high: "1".to_string(),
                },
                ..SweepConfig::default()
            },
        ];
        for config in cases {
            assert!(matches!(config.validate(), Err(ScanError::Config(_))), "{:?}", config);
        }
    }

    #[test]
    fn sweep_taus_are_sorted_and_unique() {
        let config = SweepConfig {
            taus: vec![9, 4, 6, 4],
            ..SweepConfig::default()
        };
        assert_eq!(config.sweep_taus(), vec![4, 6, 9]);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("sweep.json");
        let config = SweepConfig {
            target_action: Some("1".to_string()),
            extension: ExtensionRule::Overreach,
            ..SweepConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(SweepConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SweepConfig =
            serde_json::from_str(r#"{"taus": [5], "extension": "overreach"}"#).unwrap();
        assert_eq!(config.taus, vec![5]);
        assert_eq!(config.extension, ExtensionRule::Overreach);
        assert_eq!(config.columns, ColumnNames::default());
    }
}
