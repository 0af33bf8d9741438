use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use depscan::{
    cache::Cache,
    checker::{default_checker, default_version_checker, VulnerabilityChecker},
    collector::{collect_for_project, discover_projects, get_collector, Collector},
    config::Config,
    model::{ScanReport, Severity, Source},
    output::{format_report_to_string, print_report, OutputFormat},
};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const CRITICAL_VULN: u8 = 2;
    pub const HIGH_VULN: u8 = 3;
    pub const MEDIUM_VULN: u8 = 4;
    pub const LOW_VULN: u8 = 5;
}

#[derive(Parser)]
#[command(name = "depscan")]
#[command(
    author,
    version,
    about = "Normalize a project's dependency tree and audit it for vulnerabilities"
)]
struct Cli {
    /// Increase log verbosity (-v: info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a project's dependencies
    Scan {
        /// Project directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Force a specific source (lockfile, yarn, npm) instead of auto-detecting
        #[arg(short, long)]
        source: Option<String>,

        /// Output format (table, json, cyclonedx)
        #[arg(short, long)]
        format: Option<String>,

        /// Skip vulnerability checking
        #[arg(long)]
        no_vuln_check: bool,

        /// Skip outdated version checking
        #[arg(long)]
        no_outdated_check: bool,

        /// Write output to file
        #[arg(short, long)]
        output: Option<String>,

        /// Clear cache before scanning
        #[arg(long)]
        clear_cache: bool,

        /// Exit with error if vulnerabilities at or above this severity are found
        #[arg(long, value_enum)]
        fail_on: Option<FailLevel>,

        /// Discover and scan every project under the path (monorepos)
        #[arg(short, long)]
        recursive: bool,
    },

    /// List available dependency sources
    ListSources,

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Clear the cache
    ClearCache,
}

#[derive(Clone, Copy, ValueEnum)]
enum FailLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl FailLevel {
    fn threshold(self) -> Severity {
        match self {
            FailLevel::Critical => Severity::Critical,
            FailLevel::High => Severity::High,
            FailLevel::Medium => Severity::Medium,
            FailLevel::Low => Severity::Low,
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("depscan={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let config = Config::load().unwrap_or_default();

    match cli.command {
        Commands::Scan {
            path,
            source,
            format,
            no_vuln_check,
            no_outdated_check,
            output,
            clear_cache,
            fail_on,
            recursive,
        } => {
            if clear_cache {
                Cache::new().clear()?;
            }

            let format_str = format.unwrap_or(config.default_format.clone());
            let skip_vuln = no_vuln_check || config.skip_vuln_check;
            let check_outdated = !no_outdated_check && config.check_outdated;

            run_scan(ScanOptions {
                path,
                source,
                format: format_str,
                skip_vuln_check: skip_vuln,
                check_outdated,
                output_file: output,
                fail_on,
                recursive,
                config,
            })
            .await
        }
        Commands::ListSources => {
            list_sources();
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::ClearCache => {
            Cache::new().clear()?;
            println!("Cache cleared.");
            Ok(exit_codes::SUCCESS)
        }
    }
}

struct ScanOptions {
    path: PathBuf,
    source: Option<String>,
    format: String,
    skip_vuln_check: bool,
    check_outdated: bool,
    output_file: Option<String>,
    fail_on: Option<FailLevel>,
    recursive: bool,
    config: Config,
}

async fn run_scan(options: ScanOptions) -> Result<u8> {
    let format = OutputFormat::from_str(&options.format).map_err(|e| anyhow::anyhow!(e))?;
    let is_interactive = format == OutputFormat::Table && options.output_file.is_none();

    let projects = if options.recursive {
        let found = discover_projects(&options.path);
        if found.is_empty() {
            anyhow::bail!("no projects found under {}", options.path.display());
        }
        found
    } else {
        vec![options.path.clone()]
    };

    let source_filter = options
        .source
        .as_deref()
        .map(parse_source)
        .transpose()?;

    // Collect all projects concurrently
    let progress = if is_interactive && projects.len() > 1 {
        let pb = ProgressBar::new(projects.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} Collecting...")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let futures: Vec<_> = projects
        .iter()
        .map(|project| {
            let pb = progress.as_ref();
            async move {
                let result = collect_project(project, source_filter).await;
                if let Some(pb) = pb {
                    pb.inc(1);
                }
                (project.clone(), result)
            }
        })
        .collect();

    let collected = join_all(futures).await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let mut reports = Vec::new();
    let mut failures = 0usize;
    for (project, result) in collected {
        match result {
            Ok(records) => {
                let records: Vec<_> = records
                    .into_iter()
                    .filter(|r| !options.config.ignore.should_ignore_package(&r.name))
                    .collect();
                reports.push(ScanReport::new(project, records));
            }
            Err(error) => {
                warn!(project = %project.display(), %error, "skipping project");
                failures += 1;
            }
        }
    }

    if reports.is_empty() {
        anyhow::bail!("all {} project(s) failed to scan", failures);
    }

    for report in &mut reports {
        if !options.skip_vuln_check && !report.packages.is_empty() {
            check_vulnerabilities(report, &options.config, is_interactive).await;
        }
        if options.check_outdated && !report.packages.is_empty() {
            check_outdated(report, &options.config, is_interactive).await;
        }
    }

    // Handle output
    if let Some(path) = &options.output_file {
        let content = if reports.len() == 1 {
            format_report_to_string(&reports[0], format)?
        } else {
            serde_json::to_string_pretty(&reports)?
        };
        std::fs::write(path, content)?;
        if is_interactive {
            println!("Results written to: {}", path);
        }
    } else {
        for report in &reports {
            print_report(report, format)?;
        }
    }

    Ok(determine_exit_code(&reports, options.fail_on))
}

async fn collect_project(
    project: &Path,
    source: Option<Source>,
) -> Result<Vec<depscan::PackageRecord>> {
    match source {
        Some(source) => get_collector(source).collect(project).await,
        None => collect_for_project(project).await.map(|(_, records)| records),
    }
}

async fn check_vulnerabilities(report: &mut ScanReport, config: &Config, is_interactive: bool) {
    let spinner = make_spinner(is_interactive, "Checking for vulnerabilities...");

    let checker = default_checker();
    match checker.check(&report.packages).await {
        Ok(vulns) => {
            report.vulnerabilities = vulns
                .into_iter()
                .filter(|v| !config.ignore.should_ignore_vulnerability(&v.id))
                .collect();
        }
        Err(error) => {
            warn!(%error, "vulnerability check failed, continuing without");
        }
    }

    if let Some(pb) = spinner {
        pb.finish_with_message(format!(
            "Found {} vulnerabilities",
            report.vulnerabilities.len()
        ));
    }
}

async fn check_outdated(report: &mut ScanReport, config: &Config, is_interactive: bool) {
    let spinner = make_spinner(is_interactive, "Checking for outdated packages...");

    let checkable: Vec<_> = report
        .packages
        .iter()
        .filter(|r| !config.ignore.should_ignore_outdated(&r.name))
        .cloned()
        .collect();

    let version_checker = default_version_checker();
    match version_checker.check_outdated(&checkable).await {
        Ok(outdated) => {
            report.outdated = outdated;
        }
        Err(error) => {
            warn!(%error, "outdated check failed, continuing without");
        }
    }

    if let Some(pb) = spinner {
        pb.finish_with_message(format!("Found {} outdated packages", report.outdated.len()));
    }
}

fn make_spinner(is_interactive: bool, message: &'static str) -> Option<ProgressBar> {
    if !is_interactive {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    Some(pb)
}

/// Determine the exit code based on the worst vulnerability across all
/// reports and the --fail-on setting.
fn determine_exit_code(reports: &[ScanReport], fail_on: Option<FailLevel>) -> u8 {
    let Some(fail_on) = fail_on else {
        return exit_codes::SUCCESS;
    };

    let worst = reports
        .iter()
        .filter_map(|r| r.worst_severity())
        .min_by_key(|s| s.rank());

    let Some(worst) = worst else {
        return exit_codes::SUCCESS;
    };

    if worst.rank() > fail_on.threshold().rank() {
        return exit_codes::SUCCESS;
    }

    match worst {
        Severity::Critical => exit_codes::CRITICAL_VULN,
        Severity::High => exit_codes::HIGH_VULN,
        Severity::Medium => exit_codes::MEDIUM_VULN,
        Severity::Low => exit_codes::LOW_VULN,
        Severity::Unknown => exit_codes::SUCCESS,
    }
}

fn list_sources() {
    println!("Available sources:");
    println!();

    let sources = [
        ("lockfile", "package-lock.json + package.json", "most precise; includes integrity hashes"),
        ("yarn", "yarn list", "runs `yarn list --depth=Infinity --no-progress`"),
        ("npm", "npm ls", "runs `npm ls --all`"),
    ];

    for (id, name, detail) in sources {
        println!("  {:<10} {:<35} {}", id, name, detail);
    }

    println!();
    println!("Sources are tried in the order above when --source is not given.");
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    // Show current config
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'depscan config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}

fn parse_source(s: &str) -> Result<Source> {
    match s.to_lowercase().as_str() {
        "lockfile" | "lock" => Ok(Source::Lockfile),
        "yarn" => Ok(Source::Yarn),
        "npm" => Ok(Source::Npm),
        _ => Err(anyhow::anyhow!(
            "Unknown source: {}. Use: lockfile, yarn, npm",
            s
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depscan::model::Vulnerability;

    fn report_with(severity: Severity) -> ScanReport {
        let mut report = ScanReport::new("/srv/app", Vec::new());
        report.vulnerabilities = vec![Vulnerability {
            id: "GHSA-test".to_string(),
            purl: "pkg:npm/a@1.0.0".to_string(),
            severity,
            title: "test".to_string(),
            description: None,
            fixed_version: None,
            reference_url: None,
        }];
        report
    }

    #[test]
    fn test_exit_code_without_fail_on() {
        let reports = vec![report_with(Severity::Critical)];
        assert_eq!(determine_exit_code(&reports, None), exit_codes::SUCCESS);
    }

    #[test]
    fn test_exit_code_below_threshold() {
        let reports = vec![report_with(Severity::Low)];
        assert_eq!(
            determine_exit_code(&reports, Some(FailLevel::High)),
            exit_codes::SUCCESS
        );
    }

    #[test]
    fn test_exit_code_at_threshold() {
        let reports = vec![report_with(Severity::High)];
        assert_eq!(
            determine_exit_code(&reports, Some(FailLevel::High)),
            exit_codes::HIGH_VULN
        );
    }

    #[test]
    fn test_exit_code_reports_worst() {
        let reports = vec![report_with(Severity::Medium), report_with(Severity::Critical)];
        assert_eq!(
            determine_exit_code(&reports, Some(FailLevel::Low)),
            exit_codes::CRITICAL_VULN
        );
    }

    #[test]
    fn test_parse_source() {
        assert_eq!(parse_source("yarn").unwrap(), Source::Yarn);
        assert_eq!(parse_source("LOCKFILE").unwrap(), Source::Lockfile);
        assert!(parse_source("pnpm").is_err());
    }
}
