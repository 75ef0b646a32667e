//! Command-Line Interface

use crate::config::SweepConfig;
use biasscan_detect::ExtensionRule;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Bias Scan - action-bias intervals in two-category choice sessions
#[derive(Parser, Debug)]
#[command(name = "bias-scan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Sweep configuration (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan every cohort of the roster over a range of tau values
    Sweep(SweepArgs),

    /// Segment a single session file and print its runs
    Classify {
        /// Trial file (CSV)
        input: PathBuf,

        /// Window length
        #[arg(short, long)]
        tau: usize,

        /// Action whose bias is measured
        #[arg(long)]
        target: String,

        /// Extension rule (defaults to the configured one)
        #[arg(long, value_enum)]
        extension: Option<Extension>,

        /// Print every maximal run, not only the totals
        #[arg(long)]
        runs: bool,
    },

    /// Write a configuration file with the default settings
    InitConfig {
        #[arg(default_value = "bias-scan.json")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct SweepArgs {
    /// Directory holding the per-subject trial files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Roster table mapping cohorts to subject ids
    #[arg(long)]
    pub roster: Option<PathBuf>,

    /// Action whose bias is measured (prompted for when neither given nor configured)
    #[arg(long)]
    pub target: Option<String>,

    /// Window length; repeat to sweep several values
    #[arg(long = "tau")]
    pub taus: Vec<usize>,

    /// Worker threads (0 = one per core)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Abort on the first subject that fails to load
    #[arg(long)]
    pub fail_fast: bool,

    #[arg(long, value_enum)]
    pub extension: Option<Extension>,

    /// JSON report path
    #[arg(short, long, default_value = "bias_report.json")]
    pub output: PathBuf,

    /// Write a PNG bar chart
    #[arg(long)]
    pub chart: Option<PathBuf>,

    /// TrueType font for chart labels
    #[arg(long)]
    pub font: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extension {
    WindowUnion,
    Overreach,
}

impl From<Extension> for ExtensionRule {
    fn from(ext: Extension) -> Self {
        match ext {
            Extension::WindowUnion => ExtensionRule::WindowUnion,
            Extension::Overreach => ExtensionRule::Overreach,
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl SweepArgs {
    /// Flags given on the command line take precedence over the file.
    pub fn apply(&self, config: &mut SweepConfig) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(roster) = &self.roster {
            config.roster = roster.clone();
        }
        if let Some(target) = &self.target {
            config.target_action = Some(target.clone());
        }
        if !self.taus.is_empty() {
            config.taus = self.taus.clone();
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if self.fail_fast {
            config.fail_fast = true;
        }
        if let Some(ext) = self.extension {
            config.extension = ext.into();
        }
        if let Some(font) = &self.font {
            config.chart.font = Some(font.clone());
        }
    }
}
