use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use trajfind_core::report::{LocateReport, ReportFormat, render_report};
use trajfind_core::{
    Bootstrapper, ConfigError, ConfigLoader, LocatorConfig, LogLevel, ReadyState, RetryPolicy,
    RetryScheduler, StartPolicy, Strategy, TrajectoryLocator, TrajectoryRecord,
};
use trajfind_scanner::{is_valid_trajectory, resolve_path};

pub fn print_banner() {
    println!(
        "{} {}",
        "trajfind".bright_cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("{}", "trajectory record locator".dimmed());
    println!();
}

/// Install the fmt subscriber on stderr. `RUST_LOG` wins over the configured level.
pub fn init_logging(level: LogLevel) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.as_filter().into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Read and parse a JSON snapshot of the host graph.
pub fn load_graph_snapshot(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read graph snapshot {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse graph snapshot {}", path.display()))
}

/// A probe that re-reads the snapshot on every attempt, so a file that is
/// still being written (or not yet there) simply counts as a miss.
pub fn snapshot_probe(
    path: PathBuf,
    locator: TrajectoryLocator,
) -> impl FnMut() -> Option<TrajectoryRecord> + Send + 'static {
    move || match load_graph_snapshot(&path) {
        Ok(graph) => locator.locate(&&graph),
        Err(e) => {
            debug!("Snapshot unavailable: {:#}", e);
            None
        }
    }
}

fn flag<'a, T: Clone + Send + Sync + 'static>(args: &'a ArgMatches, id: &str) -> Option<&'a T> {
    // Subcommands define different subsets of the override flags
    args.try_get_one::<T>(id).ok().flatten()
}

/// Layer command line flags over the loaded configuration.
pub fn apply_overrides(mut config: LocatorConfig, args: &ArgMatches) -> Result<LocatorConfig> {
    if let Some(max_attempts) = flag::<u32>(args, "max-attempts") {
        config.max_attempts = *max_attempts;
    }
    if let Some(interval_ms) = flag::<u64>(args, "interval-ms") {
        config.interval_ms = *interval_ms;
    }
    if let Some(marker_key) = flag::<String>(args, "marker-key") {
        config.marker_key = marker_key.clone();
    }
    if let Some(max_depth) = flag::<usize>(args, "max-depth") {
        config.max_depth = Some(*max_depth);
    }
    if let Some(max_nodes) = flag::<usize>(args, "max-nodes") {
        config.max_nodes = Some(*max_nodes);
    }
    if let Some(level) = flag::<String>(args, "log-level") {
        config.log_level =
            LogLevel::from_str(level).ok_or_else(|| ConfigError::InvalidLogLevel(level.clone()))?;
    }
    if let Some(specs) = args.try_get_many::<String>("strategy").ok().flatten() {
        config.strategies = specs
            .map(|raw| Strategy::parse(raw))
            .collect::<Result<Vec<_>, _>>()?;
    }

    config.validate()?;
    Ok(config)
}

/// Load the config file named by `--config` (tilde-expanded) plus environment.
pub fn load_config(args: &ArgMatches) -> Result<LocatorConfig> {
    let path = args
        .get_one::<String>("config")
        .map(|raw| PathBuf::from(shellexpand::tilde(raw).as_ref()));
    let config = ConfigLoader::load(path.as_deref())?;
    apply_overrides(config, args)
}

pub fn write_output(rendered: &str, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
            fs::write(&expanded, rendered)
                .with_context(|| format!("Failed to write report to {}", expanded))?;
            println!("{} Report saved to {}", "✓".green(), expanded);
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

/// Run the retry loop against a graph snapshot and print a report.
///
/// Returns whether a record was found.
pub async fn handle_locate(args: &ArgMatches, quiet: bool) -> Result<bool> {
    let config = load_config(args)?;
    init_logging(config.log_level);

    let Some(graph_path) = args.get_one::<PathBuf>("graph") else {
        bail!("--graph is required");
    };
    let graph_path = PathBuf::from(shellexpand::tilde(&graph_path.to_string_lossy()).as_ref());
    let format = args
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);

    for strategy in &config.strategies {
        debug!("Strategy: {}", strategy);
    }

    let locator = TrajectoryLocator::from_config(&config);
    let policy = RetryPolicy::from_config(&config)?;

    // Log lines and a spinner on the same stream interleave badly
    let spinner = (!quiet && config.log_level >= LogLevel::Warn).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let mut scheduler = RetryScheduler::new(policy, snapshot_probe(graph_path.clone(), locator));
    if let Some(ref pb) = spinner {
        let pb = pb.clone();
        let source = graph_path.display().to_string();
        scheduler = scheduler.with_attempt_callback(Arc::new(move |attempt, max| {
            pb.set_message(format!("Searching {} (attempt {}/{})", source, attempt, max));
        }));
    }

    let bootstrapper = Bootstrapper::new(Arc::new(scheduler), StartPolicy::FirstSignal);
    let started_at = chrono::Utc::now();
    let Some(outcome) = bootstrapper.attach(ReadyState::Complete).await else {
        bail!("Search did not start");
    };
    let finished_at = chrono::Utc::now();

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let report = LocateReport::from_outcome(
        graph_path.display().to_string(),
        outcome,
        config.max_attempts,
        started_at,
        finished_at,
    );
    let rendered = render_report(&report, format)?;
    write_output(&rendered, args.get_one::<PathBuf>("output"))?;

    Ok(report.is_success())
}

/// List candidate containers under `--root` in discovery order.
pub fn handle_scan(args: &ArgMatches) -> Result<bool> {
    let config = load_config(args)?;
    init_logging(config.log_level.max(LogLevel::Warn));

    let Some(graph_path) = args.get_one::<PathBuf>("graph") else {
        bail!("--graph is required");
    };
    let graph = load_graph_snapshot(graph_path)?;
    let root_path = args.get_one::<String>("root").map(String::as_str).unwrap_or("");

    let Some(base) = resolve_path(&&graph, root_path)? else {
        warn!("Base object not found at path '{}'", root_path);
        println!("{} Nothing at '{}'", "✗".red(), root_path);
        return Ok(false);
    };

    let containers = config.scanner().scan(&base)?;

    println!(
        "{} candidate container(s) with key '{}':",
        containers.len().to_string().bold(),
        config.marker_key
    );
    for container in &containers {
        println!("  {}", container.path);
    }

    Ok(!containers.is_empty())
}

/// Check a single JSON document against the trajectory shape.
pub fn handle_validate(args: &ArgMatches) -> Result<bool> {
    let Some(path) = args.get_one::<PathBuf>("file") else {
        bail!("--file is required");
    };
    let document = load_graph_snapshot(path)?;

    if is_valid_trajectory(&document) {
        println!("{} {} is a trajectory record", "✓".green(), path.display());
        Ok(true)
    } else {
        println!("{} {} is not a trajectory record", "✗".red(), path.display());
        Ok(false)
    }
}
