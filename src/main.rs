use anyhow::{Context, Result, bail};
use bias_scan::cli::{Cli, Commands, SweepArgs};
use bias_scan::{CsvTrialSource, Roster, SweepConfig, SweepSettings, build_pool, report, run_sweep};
use biasscan_core::{Action, IntervalLabel, WindowSpec};
use biasscan_detect::{ExtensionRule, segment};
use biasscan_render::{BarChartRenderer, load_font, save_png};
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => SweepConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SweepConfig::default(),
    };

    match cli.command {
        Commands::Sweep(args) => run_sweep_command(config, &args),
        Commands::Classify {
            input,
            tau,
            target,
            extension,
            runs,
        } => {
            let rule = extension.map(ExtensionRule::from).unwrap_or(config.extension);
            run_classify(&config, &input, tau, &target, rule, runs)
        }
        Commands::InitConfig { path, force } => run_init_config(&config, &path, force),
    }
}

fn run_sweep_command(mut config: SweepConfig, args: &SweepArgs) -> Result<()> {
    args.apply(&mut config);
    if config.target_action.is_none() {
        config.target_action = Some(prompt_target()?);
    }
    config.validate()?;
    let target = config.target_action.clone().unwrap_or_default();

    let roster = Roster::load(&config.roster, &config.cohorts, config.roster_rows)
        .with_context(|| format!("reading roster {}", config.roster.display()))?;
    let source = CsvTrialSource::from_config(&config);
    let pool = build_pool(config.threads)?;
    info!(threads = pool.current_num_threads(), "thread pool ready");

    let settings = SweepSettings::from_config(&config, target);
    let sweep = run_sweep(&source, &roster, &settings, &pool)?;

    print!("{}", report::summary_table(&sweep));
    report::write_json(&sweep, &args.output)
        .with_context(|| format!("writing report {}", args.output.display()))?;
    info!(path = %args.output.display(), "report written");

    if let Some(chart_path) = &args.chart {
        let chart = report::to_chart(&sweep);
        let renderer = BarChartRenderer::new(config.chart.width, config.chart.height);
        let pixmap = match &config.chart.font {
            Some(font) => renderer.with_font(load_font(font)?).render(&chart)?,
            None => {
                info!("no font configured, chart is drawn without labels");
                renderer.render(&chart)?
            }
        };
        save_png(&pixmap, chart_path)?;
        info!(path = %chart_path.display(), "chart written");
    }
    Ok(())
}

fn run_classify(
    config: &SweepConfig,
    input: &Path,
    tau: usize,
    target: &str,
    rule: ExtensionRule,
    show_runs: bool,
) -> Result<()> {
    let source = CsvTrialSource::from_config(config);
    let sequence = source.read_file(input)?;
    let alphabet = config
        .fixed_alphabet()
        .unwrap_or_else(|| sequence.alphabet());
    let spec = WindowSpec::within(tau, Action::intern(target.trim()), &alphabet)?;

    let segmentation = segment(&sequence, spec, rule);
    if show_runs {
        for run in segmentation.runs() {
            let label = match run.label {
                IntervalLabel::Biased => "biased",
                IntervalLabel::NonBiased => "non-biased",
            };
            println!("{:>6}..={:<6} {:>5}  {}", run.start, run.end, run.len(), label);
        }
    }
    println!(
        "{}: {} of {} trials biased towards `{}` (tau {}, {} trailing)",
        input.display(),
        segmentation.biased_count(),
        segmentation.len(),
        target.trim(),
        tau,
        segmentation.trailing()
    );
    Ok(())
}

fn run_init_config(config: &SweepConfig, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    config.save(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn prompt_target() -> Result<String> {
    print!("What do you want your action bias to be: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let target = line.trim();
    if target.is_empty() {
        bail!("no target action given");
    }
    Ok(target.to_string())
}
