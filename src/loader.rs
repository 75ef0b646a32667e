//! Per-subject trial files
//!
//! Each subject's session is a CSV with (at least) a stimulus column and a
//! response column, one row per trial, in presentation order.

use crate::config::{ColumnNames, StimulusCodes, SweepConfig};
use crate::roster::{SubjectId, split_fields};
use biasscan_core::{Action, ResponseAlphabet, StimulusCategory, Trial, TrialSequence};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: missing column `{}`", .path.display(), .column)]
    MissingColumn { path: PathBuf, column: String },

    #[error("{}:{}: {}", .path.display(), .line, .message)]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{}: no trials", .path.display())]
    Empty { path: PathBuf },

    #[error("no session recorded for subject {0}")]
    NotFound(SubjectId),
}

/// Where the sweep gets each subject's trials from
pub trait TrialSource: Sync {
    fn load_sequence(&self, subject: SubjectId, cohort: &str) -> Result<TrialSequence, LoadError>;
}

/// Cohort names are lower-cased with spaces replaced by `_` in file names.
pub fn cohort_slug(cohort: &str) -> String {
    cohort.trim().to_lowercase().replace(' ', "_")
}

#[derive(Debug, Clone)]
pub struct CsvTrialSource {
    data_dir: PathBuf,
    file_template: String,
    columns: ColumnNames,
    codes: StimulusCodes,
    alphabet: Option<ResponseAlphabet>,
}

impl CsvTrialSource {
    pub fn new(data_dir: impl Into<PathBuf>, file_template: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            file_template: file_template.into(),
            columns: ColumnNames::default(),
            codes: StimulusCodes::default(),
            alphabet: None,
        }
    }

    pub fn from_config(config: &SweepConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            file_template: config.file_template.clone(),
            columns: config.columns.clone(),
            codes: config.stimulus_codes.clone(),
            alphabet: config.fixed_alphabet(),
        }
    }

    pub fn with_columns(mut self, columns: ColumnNames) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_codes(mut self, codes: StimulusCodes) -> Self {
        self.codes = codes;
        self
    }

    /// Rows whose response is outside `alphabet` are rejected.
    pub fn with_alphabet(mut self, alphabet: ResponseAlphabet) -> Self {
        self.alphabet = Some(alphabet);
        self
    }

    pub fn path_for(&self, subject: SubjectId, cohort: &str) -> PathBuf {
        let name = self
            .file_template
            .replace("{id}", &subject.to_string())
            .replace("{cohort}", &cohort_slug(cohort));
        self.data_dir.join(name)
    }

    pub fn read_file(&self, path: &Path) -> Result<TrialSequence, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse(BufReader::new(file), path)
    }

    /// Parse a session; `path` is only used in error messages.
    pub fn parse<R: BufRead>(&self, reader: R, path: &Path) -> Result<TrialSequence, LoadError> {
        let io_err = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let malformed = |line: usize, message: String| LoadError::Malformed {
            path: path.to_path_buf(),
            line,
            message,
        };

        let mut header: Option<(usize, usize)> = None;
        let mut trials = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }
            let fields = split_fields(&line);

            let Some((stim_idx, action_idx)) = header else {
                let find = |name: &str| {
                    fields
                        .iter()
                        .position(|f| *f == name)
                        .ok_or_else(|| LoadError::MissingColumn {
                            path: path.to_path_buf(),
                            column: name.to_string(),
                        })
                };
                header = Some((find(&self.columns.stimulus)?, find(&self.columns.action)?));
                continue;
            };

            let line_no = line_num + 1;
            let stim_raw = fields
                .get(stim_idx)
                .copied()
                .ok_or_else(|| malformed(line_no, "row is missing the stimulus field".into()))?;
            let action_raw = fields
                .get(action_idx)
                .copied()
                .ok_or_else(|| malformed(line_no, "row is missing the response field".into()))?;

            let stimulus = self.category(stim_raw).ok_or_else(|| {
                malformed(line_no, format!("unknown stimulus code `{}`", stim_raw))
            })?;
            if action_raw.is_empty() {
                return Err(malformed(line_no, "empty response".into()));
            }
            let action = Action::intern(action_raw);
            if let Some(alphabet) = &self.alphabet {
                if !alphabet.contains(action) {
                    return Err(malformed(
                        line_no,
                        format!("response `{}` is not one of [{}]", action_raw, alphabet),
                    ));
                }
            }
            trials.push(Trial::new(stimulus, action));
        }

        if header.is_none() {
            return Err(LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: self.columns.stimulus.clone(),
            });
        }
        if trials.is_empty() {
            return Err(LoadError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(TrialSequence::new(trials))
    }

    fn category(&self, raw: &str) -> Option<StimulusCategory> {
        if code_matches(raw, &self.codes.low) {
            Some(StimulusCategory::Low)
        } else if code_matches(raw, &self.codes.high) {
            Some(StimulusCategory::High)
        } else {
            None
        }
    }
}

impl TrialSource for CsvTrialSource {
    fn load_sequence(&self, subject: SubjectId, cohort: &str) -> Result<TrialSequence, LoadError> {
        self.read_file(&self.path_for(subject, cohort))
    }
}

/// `6000` matches `6000.0` when both sides are numeric.
fn code_matches(raw: &str, code: &str) -> bool {
    let code = code.trim();
    if raw == code {
        return true;
    }
    match (raw.parse::<f64>(), code.parse::<f64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
