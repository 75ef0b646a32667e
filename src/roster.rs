//! Cohort membership table
//!
//! A roster is a CSV whose header names one column per cohort; each cell
//! below holds one subject id. Columns may have different lengths, so blank
//! cells are skipped.

use crate::config::CohortColumn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(pub u32);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("cannot read roster: {0}")]
    Io(#[from] std::io::Error),

    #[error("roster has no header row")]
    MissingHeader,

    #[error("roster has no column `{0}`")]
    MissingColumn(String),

    #[error("roster line {line}, column `{column}`: `{value}` is not a subject id")]
    InvalidId {
        line: usize,
        column: String,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cohort {
    pub name: String,
    pub subjects: Vec<SubjectId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Roster {
    cohorts: Vec<Cohort>,
}

impl Roster {
    pub fn new(cohorts: Vec<Cohort>) -> Self {
        Self { cohorts }
    }

    pub fn cohorts(&self) -> &[Cohort] {
        &self.cohorts
    }

    pub fn subject_count(&self) -> usize {
        self.cohorts.iter().map(|c| c.subjects.len()).sum()
    }

    pub fn load(path: &Path, columns: &[CohortColumn], rows: usize) -> Result<Self, RosterError> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file), columns, rows)
    }

    /// Takes the first `rows` data rows of each requested column, in order.
    pub fn read<R: BufRead>(
        reader: R,
        columns: &[CohortColumn],
        rows: usize,
    ) -> Result<Self, RosterError> {
        let mut lines = reader.lines().enumerate();

        let header: Vec<String> = loop {
            match lines.next() {
                Some((_, line)) => {
                    let line = line?;
                    if !line.trim().is_empty() {
                        break split_fields(&line).into_iter().map(str::to_string).collect();
                    }
                }
                None => return Err(RosterError::MissingHeader),
            }
        };

        let indices = columns
            .iter()
            .map(|c| {
                header
                    .iter()
                    .position(|h| *h == c.column)
                    .ok_or_else(|| RosterError::MissingColumn(c.column.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut cohorts: Vec<Cohort> = columns
            .iter()
            .map(|c| Cohort {
                name: c.name.clone(),
                subjects: Vec::new(),
            })
            .collect();

        let data_rows = lines
            .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()));
        for (line_num, line) in data_rows.take(rows) {
            let line = line?;
            let fields = split_fields(&line);
            for (cohort, (&idx, column)) in cohorts.iter_mut().zip(indices.iter().zip(columns)) {
                let Some(value) = fields.get(idx).filter(|v| !v.is_empty()) else {
                    continue;
                };
                let id = parse_id(value).ok_or_else(|| RosterError::InvalidId {
                    line: line_num + 1,
                    column: column.column.clone(),
                    value: value.to_string(),
                })?;
                cohort.subjects.push(id);
            }
        }

        Ok(Self { cohorts })
    }
}

pub(crate) fn split_fields(line: &str) -> Vec<&str> {
    line.split(',')
        .map(|f| f.trim().trim_matches('"').trim())
        .collect()
}

/// Spreadsheet exports write integer ids of float columns as `12.0`.
fn parse_id(value: &str) -> Option<SubjectId> {
    if let Ok(id) = value.parse::<u32>() {
        return Some(SubjectId(id));
    }
    let f = value.parse::<f64>().ok()?;
    if f.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&f) {
        Some(SubjectId(f as u32))
    } else {
        None
    }
}
