//! gh-label-manager CLI
//!
//! Command line tool for keeping GitHub repository labels in line with a label file

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use tracing_subscriber::EnvFilter;
use url::Url;

use gh_label_manager::{
    config::{load_labels, ConfigFormat},
    output::{plural, status_line, Style},
    sync::{OperationStatus, SyncOperation, SyncResult},
    validate::{validate_labels, ValidationReport, MAX_DESCRIPTION_LENGTH},
    GitHubClient, SyncConfig, Target,
};

/// gh-label-manager CLI
///
/// Set up labels on GitHub repositories from a label file
#[derive(Parser)]
#[command(
    name = "gh-label-manager",
    version,
    about = "Set up labels on GitHub repositories from a label file",
    long_about = "Keeps the labels of a repository, or of every repository of a user or \
    organization, in line with a JSON or YAML label file. Labels are matched by name \
    (case-insensitively); only the labels that differ are created, updated or deleted."
)]
#[command(group(ArgGroup::new("format").args(["json", "yaml"])))]
#[command(group(ArgGroup::new("target").args(["user", "org", "repo"])))]
struct Cli {
    /// Perform a dry run (don't make actual changes)
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// Validate the local labels and exit
    #[arg(short = 'v', long)]
    validate: bool,

    /// JSON formatted label file (default)
    #[arg(short = 'j', long)]
    json: bool,

    /// YAML formatted label file
    #[arg(short = 'y', long)]
    yaml: bool,

    /// GitHub access token (needed for everything except --validate)
    #[arg(short = 't', long = "token")]
    access_token: Option<String>,

    /// File containing labels
    #[arg(short = 'f', long)]
    filename: PathBuf,

    /// Process every repository of a user
    #[arg(short = 'u', long)]
    user: Option<String>,

    /// Process every repository of an organization
    #[arg(short = 'o', long)]
    org: Option<String>,

    /// Process a single repository (owner/repo format)
    #[arg(short = 'r', long)]
    repo: Option<String>,

    /// GitHub API base URL (for GitHub Enterprise)
    #[arg(long, env = "GITHUB_API_URL")]
    api_url: Option<Url>,

    /// Verbose output
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn format(&self) -> ConfigFormat {
        if self.yaml {
            ConfigFormat::Yaml
        } else {
            ConfigFormat::Json
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{}", status_line(Style::Error, &format!("{e:#}")));
        std::process::exit(1);
    }
}

/// Install the tracing subscriber; `RUST_LOG` takes precedence
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "warn,gh_label_manager=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Execute the requested action
async fn run(cli: Cli) -> Result<()> {
    let labels = load_labels(&cli.filename, cli.format(), &mut rand::thread_rng())
        .with_context(|| format!("Failed to load labels from {}", cli.filename.display()))?;

    if cli.validate {
        display_validation_report(&validate_labels(&labels));
        return Ok(());
    }

    let target = Target::from_options(cli.user, cli.org, cli.repo)?.context(
        "One of --user, --org or --repo is required",
    )?;
    let access_token = get_access_token(cli.access_token)?;

    let config = SyncConfig {
        access_token,
        api_url: cli.api_url,
        target,
        dry_run: cli.dry_run,
        labels,
    };
    config.validate()?;

    run_sync(config, cli.verbose).await
}

/// Execute synchronization
async fn run_sync(config: SyncConfig, verbose: bool) -> Result<()> {
    if verbose {
        println!(
            "{}",
            status_line(
                Style::Info,
                &format!(
                    "Reconciling {} label{} for {}",
                    config.labels.len(),
                    plural(config.labels.len()),
                    config.target
                )
            )
        );
    }
    if config.dry_run {
        println!(
            "{}",
            status_line(Style::Warning, "Running in dry-run mode (no changes will be made)")
        );
    }

    let client = GitHubClient::connect(&config.access_token, config.api_url.as_ref())
        .await
        .context("Failed to connect to GitHub")?;

    let outcome =
        gh_label_manager::sync_repositories(&client, &config, display_sync_result).await;

    match outcome {
        Ok(results) => {
            if verbose {
                display_summary(&results);
            }
        }
        Err(e) => {
            // Nothing was processed; reported like any other remote failure
            println!(
                "{}",
                status_line(Style::Error, &format!("Failed to process {}: {e}", config.target))
            );
        }
    }

    if verbose {
        match client.rate_limit().await {
            Ok(rate) => println!(
                "{}",
                status_line(
                    Style::Info,
                    &format!(
                        "API rate limit: {}/{} remaining, resets at {}",
                        rate.remaining,
                        rate.limit,
                        rate.reset_at.format("%Y-%m-%d %H:%M:%S UTC")
                    )
                )
            ),
            Err(e) => tracing::debug!(error = %e, "Could not read rate limit"),
        }
    }

    Ok(())
}

/// Display the validation report
fn display_validation_report(report: &ValidationReport) {
    println!(
        "{}",
        status_line(
            Style::Info,
            &format!(
                "Validating {} label{}",
                report.checks.len(),
                plural(report.checks.len())
            )
        )
    );

    for check in &report.checks {
        println!("Validating label '{}'", check.name);

        if check.color_valid {
            println!(
                "{}",
                status_line(Style::Success, &format!("\tColor '{}' is valid", check.color))
            );
        } else {
            println!(
                "{}",
                status_line(Style::Error, &format!("\tColor '{}' is invalid", check.color))
            );
        }

        if check.description_valid {
            println!("{}", status_line(Style::Success, "\tDescription is valid"));
        } else {
            println!(
                "{}",
                status_line(
                    Style::Error,
                    &format!(
                        "\tDescription is too long {} characters (max {})",
                        check.description_length, MAX_DESCRIPTION_LENGTH
                    )
                )
            );
        }

        if check.duplicate_name {
            println!(
                "{}",
                status_line(
                    Style::Error,
                    "\tName is used by another label (names are case-insensitive)"
                )
            );
        }
    }
}

/// Display synchronization results for one repository
fn display_sync_result(result: &SyncResult) {
    println!(
        "{}",
        status_line(
            Style::Info,
            &format!("Processing labels for {}:", result.repository)
        )
    );

    if let Some(error) = &result.fetch_error {
        println!("{}", status_line(Style::Error, error));
        return;
    }

    for heading in ["Adding", "Deleting", "Updating"] {
        let group: Vec<_> = result
            .outcomes
            .iter()
            .filter(|o| group_heading(&o.operation) == heading)
            .collect();
        println!("{} {} label{}", heading, group.len(), plural(group.len()));

        for outcome in group {
            let name = &outcome.operation.label().name;
            match &outcome.status {
                OperationStatus::Applied => println!("\t{heading} '{name}' ... Done!"),
                OperationStatus::DryRun => println!("\t{heading} '{name}' ... Dry run!"),
                OperationStatus::Failed(reason) => {
                    println!("\t{heading} '{name}' ... Failed!");
                    println!("{}", status_line(Style::Error, &format!("\t{reason}")));
                }
            }
        }
    }
}

fn group_heading(operation: &SyncOperation) -> &'static str {
    match operation {
        SyncOperation::Create { .. } => "Adding",
        SyncOperation::Delete { .. } => "Deleting",
        SyncOperation::Update { .. } => "Updating",
    }
}

/// Display totals across every processed repository
fn display_summary(results: &[SyncResult]) {
    let created: usize = results.iter().map(SyncResult::created).sum();
    let updated: usize = results.iter().map(SyncResult::updated).sum();
    let deleted: usize = results.iter().map(SyncResult::deleted).sum();
    let errors: usize = results.iter().map(|r| r.errors().len()).sum();

    let style = if errors == 0 {
        Style::Success
    } else {
        Style::Warning
    };
    println!(
        "{}",
        status_line(
            style,
            &format!(
                "{} repositor{}: {} created, {} updated, {} deleted, {} error{}",
                results.len(),
                if results.len() == 1 { "y" } else { "ies" },
                created,
                updated,
                deleted,
                errors,
                plural(errors)
            )
        )
    );
}

/// Get access token
fn get_access_token(arg_token: Option<String>) -> gh_label_manager::Result<String> {
    arg_token
        .filter(|token| !token.trim().is_empty())
        .or_else(|| std::env::var("GITHUB_TOKEN").ok())
        .ok_or_else(|| gh_label_manager::Error::config_validation(
            "GitHub access token is required. Set via --token, -t flag, or GITHUB_TOKEN env var"
        ))
}
