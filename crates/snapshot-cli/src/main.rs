//! Snapshot Manager CLI
//!
//! The `snapshot-manager` command inspects the Copr project a snapshot is
//! built in and tells whether the required build matrix is green.
//!
//! ## Commands
//!
//! - `chroots`: list the chroots Copr supports, filtered by a pattern
//! - `exists`: check whether a Copr project exists
//! - `states`: list the build state of every package in every chroot
//! - `check`: verify that every required (package x chroot) build succeeded

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use snapshot_core::telemetry::{init_tracing, level_for};
use snapshot_core::{
    evaluate_matrix_with, BuildState, BuildStateList, ChrootFilter, CoprApi, CoprClient,
    CoprConfig, CoprService, DuplicatePolicy, MatrixVerdict, DEFAULT_CHROOT_PATTERN,
};

const DEFAULT_OWNER: &str = "@fedora-llvm-team";
const DEFAULT_PROJECT: &str = "llvm-snapshots";

#[derive(Parser)]
#[command(name = "snapshot-manager")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check Copr builds of a snapshot across the required build matrix", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Copr frontend URL (overrides COPR_URL and ~/.config/copr)
    #[arg(long, global = true, env = "SNAPSHOT_COPR_URL")]
    copr_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct ProjectArgs {
    /// Copr project owner (user or @group)
    #[arg(long, env = "SNAPSHOT_COPR_OWNER", default_value = DEFAULT_OWNER)]
    owner: String,

    /// Copr project name
    #[arg(long, env = "SNAPSHOT_COPR_PROJECT", default_value = DEFAULT_PROJECT)]
    project: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List the chroots Copr currently supports that match a pattern
    Chroots {
        /// Regular expression matched against the start of each chroot name
        #[arg(short, long, env = "SNAPSHOT_CHROOT_PATTERN", default_value = DEFAULT_CHROOT_PATTERN)]
        pattern: String,
    },

    /// Check whether a Copr project exists
    Exists {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// List the build state of every package in every chroot
    States {
        #[command(flatten)]
        project: ProjectArgs,

        /// Print the states as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that every required package built successfully in every required chroot
    Check {
        #[command(flatten)]
        project: ProjectArgs,

        /// Required packages (comma-separated)
        #[arg(long, env = "SNAPSHOT_PACKAGES", value_delimiter = ',', default_value = "llvm")]
        packages: Vec<String>,

        /// Required chroots (comma-separated); when given, --pattern is ignored
        #[arg(long, value_delimiter = ',')]
        chroots: Vec<String>,

        /// Pattern selecting the required chroots from the ones Copr supports
        #[arg(short, long, env = "SNAPSHOT_CHROOT_PATTERN", default_value = DEFAULT_CHROOT_PATTERN)]
        pattern: String,

        /// Only count the newest build of each package/chroot pair
        #[arg(long)]
        latest_only: bool,

        /// Print the verdict as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(cli.json_logs, level_for(cli.verbose));

    let mut config = CoprConfig::load().context("Failed to load Copr configuration")?;
    if let Some(url) = &cli.copr_url {
        config = config.with_url(url);
    }
    let copr_url = config.copr_url.clone();
    let service = CoprService::new(CoprClient::new(config).context("Failed to create Copr client")?);

    match cli.command {
        Commands::Chroots { pattern } => {
            for chroot in cmd_chroots(&service, &pattern).await? {
                println!("{}", chroot);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Exists { project } => {
            let exists = cmd_exists(&service, &project).await?;
            println!("{}", exists);
            Ok(ExitCode::SUCCESS)
        }
        Commands::States { project, json } => {
            let states = cmd_states(&service, &project).await?;
            print_states(&states, &copr_url, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check {
            project,
            packages,
            chroots,
            pattern,
            latest_only,
            json,
        } => {
            let policy = if latest_only {
                DuplicatePolicy::LatestAttempt
            } else {
                DuplicatePolicy::AnySuccess
            };
            let report = cmd_check(&service, &project, &packages, &chroots, &pattern, policy).await?;
            print_report(&report, json)?;
            Ok(if report.verdict.passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// Supported chroots matching `pattern`, sorted.
async fn cmd_chroots<C: CoprApi>(service: &CoprService<C>, pattern: &str) -> Result<Vec<String>> {
    let filter = ChrootFilter::new(pattern).context("Invalid chroot pattern")?;
    service
        .chroots_matching(&filter)
        .await
        .context("Failed to list Copr chroots")
}

async fn cmd_exists<C: CoprApi>(service: &CoprService<C>, project: &ProjectArgs) -> Result<bool> {
    service
        .project_exists(&project.owner, &project.project)
        .await
        .with_context(|| format!("Failed to look up {}/{}", project.owner, project.project))
}

async fn cmd_states<C: CoprApi>(
    service: &CoprService<C>,
    project: &ProjectArgs,
) -> Result<BuildStateList> {
    service
        .build_states(&project.owner, &project.project)
        .await
        .with_context(|| {
            format!(
                "Failed to fetch build states of {}/{}",
                project.owner, project.project
            )
        })
}

/// Result of `check`, also what `--json` prints.
#[derive(Debug, Serialize)]
struct CheckReport {
    owner: String,
    project: String,
    packages: Vec<String>,
    chroots: Vec<String>,
    policy: DuplicatePolicy,
    #[serde(flatten)]
    verdict: MatrixVerdict,
}

async fn cmd_check<C: CoprApi>(
    service: &CoprService<C>,
    project: &ProjectArgs,
    packages: &[String],
    chroots: &[String],
    pattern: &str,
    policy: DuplicatePolicy,
) -> Result<CheckReport> {
    // Compile the pattern up front so a typo fails before any request.
    let filter = ChrootFilter::new(pattern).context("Invalid chroot pattern")?;

    let chroots = if chroots.is_empty() {
        service
            .chroots_matching(&filter)
            .await
            .context("Failed to list Copr chroots")?
    } else {
        let mut chroots = chroots.to_vec();
        chroots.sort();
        chroots
    };

    let states = cmd_states(service, project).await?;
    let verdict = evaluate_matrix_with(packages, &chroots, &states, policy);
    info!(
        passed = verdict.passed,
        expected = verdict.expected,
        missing = verdict.missing.len(),
        "build matrix evaluated"
    );

    Ok(CheckReport {
        owner: project.owner.clone(),
        project: project.project.clone(),
        packages: packages.to_vec(),
        chroots,
        policy,
        verdict,
    })
}

fn print_states(states: &BuildStateList, copr_url: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(states)?);
        return Ok(());
    }

    if states.is_empty() {
        println!("No builds found.");
        return Ok(());
    }

    for state in states {
        println!("{}", state_line(state, copr_url));
    }
    println!();
    println!("{}", states_summary(states));
    Ok(())
}

fn state_line(state: &BuildState, copr_url: &str) -> String {
    format!(
        "{:<24} {:<32} {:<10} {}",
        state.package_name,
        state.chroot,
        state.copr_build_state,
        state.build_page_url(copr_url)
    )
}

fn states_summary(states: &BuildStateList) -> String {
    let counts: Vec<String> = states
        .status_counts()
        .into_iter()
        .map(|(status, count)| format!("{}={}", status, count))
        .collect();
    let in_progress = states
        .iter()
        .filter(|state| state.copr_build_state.is_in_progress())
        .count();
    format!(
        "{} builds ({} in progress): {}",
        states.len(),
        in_progress,
        counts.join(" ")
    )
}

fn print_report(report: &CheckReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Project:  {}/{}", report.owner, report.project);
    println!("Packages: {}", report.packages.join(", "));
    println!("Chroots:  {}", report.chroots.join(", "));

    if report.verdict.passed {
        println!(
            "All {} required builds succeeded.",
            report.verdict.expected
        );
        return Ok(());
    }

    println!(
        "{} of {} required builds are missing or not successful:",
        report.verdict.missing.len(),
        report.verdict.expected
    );
    for (package, chroots) in report.verdict.missing_by_package() {
        println!("  {}: {}", package, chroots.join(", "));
    }
    Ok(())
}
