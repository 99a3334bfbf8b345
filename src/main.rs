mod config;
mod github;
mod input;
mod metrics;
mod report;
mod timestamp;

use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::github::{HttpGateway, RepositoryRef};
use crate::input::InvalidArgument;
use crate::timestamp::TimeWindow;

/// contrib-metrics: aggregates GitHub contribution metrics (pushed
/// repositories, merged pull requests, reviews) per user within a date window.
#[derive(Parser, Debug)]
#[command(name = "contrib-metrics", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List repositories pushed between start-date and end-date
    Repo {
        /// Organization or user names
        #[arg(required = true)]
        owners: Vec<String>,

        #[command(flatten)]
        dates: DateArgs,
    },

    /// Count merged PRs and reviews between start-date and end-date
    Pr {
        /// Repositories as owner/name, or bare names when --owner is given
        #[arg(required = true)]
        repos: Vec<String>,

        /// Owner applied to every repository argument
        #[arg(long)]
        owner: Option<String>,

        #[command(flatten)]
        dates: DateArgs,

        /// Export the merged PR table to this CSV file
        #[arg(long)]
        csv_output: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct DateArgs {
    /// First day of the window (YYYY-MM-DD)
    #[arg(long)]
    start_date: String,

    /// Last day of the window (YYYY-MM-DD), defaults to today
    #[arg(long)]
    end_date: Option<String>,
}

impl DateArgs {
    fn window(&self) -> Result<TimeWindow, InvalidArgument> {
        let start = input::parse_date(&self.start_date)?;
        let end = match &self.end_date {
            Some(end) => input::parse_date(end)?,
            None => Local::now().date_naive(),
        };
        input::date_window(start, end)
    }

    fn describe(&self) -> String {
        let end = self
            .end_date
            .clone()
            .unwrap_or_else(|| Local::now().date_naive().to_string());
        format!("{}..={}", self.start_date, end)
    }
}

/// Validated arguments for one subcommand, ready to run against the API.
enum Job {
    Repo {
        owners: Vec<String>,
        window: TimeWindow,
        span: String,
    },
    Pr {
        repos: Vec<RepositoryRef>,
        window: TimeWindow,
        span: String,
        csv_output: Option<PathBuf>,
    },
}

impl Job {
    fn from_command(command: Command) -> Result<Self, InvalidArgument> {
        match command {
            Command::Repo { owners, dates } => {
                let owners = owners
                    .iter()
                    .map(|o| input::parse_owner(o))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Job::Repo {
                    owners,
                    window: dates.window()?,
                    span: dates.describe(),
                })
            }
            Command::Pr {
                repos,
                owner,
                dates,
                csv_output,
            } => {
                let owner = owner.as_deref().map(input::parse_owner).transpose()?;
                let repos = input::parse_repositories(&repos, owner.as_deref())?;
                if let Some(path) = &csv_output {
                    input::validate_csv_path(path)?;
                }
                Ok(Job::Pr {
                    repos,
                    window: dates.window()?,
                    span: dates.describe(),
                    csv_output,
                })
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let job = Job::from_command(cli.command)?;

    // The token prompt blocks, so it runs before signal handling takes over.
    let gateway = connect()?;

    tokio::select! {
        result = run(job, &gateway) => result,
        _ = shutdown_signal() => {
            warn!("interrupted, abandoning in-flight requests");
            Err("interrupted".into())
        }
    }
}

async fn run(job: Job, gateway: &HttpGateway) -> Result<(), Box<dyn std::error::Error>> {
    match job {
        Job::Repo {
            owners,
            window,
            span,
        } => {
            info!(owners = owners.len(), window = %span, "listing pushed repositories");
            let listed = metrics::list_pushed_repos_for_owners(gateway, &owners, &window).await?;
            report::print_pushed_repos(&listed);
        }
        Job::Pr {
            repos,
            window,
            span,
            csv_output,
        } => {
            info!(repos = repos.len(), window = %span, "collecting repository metrics");
            let collected = metrics::collect_repository_metrics(gateway, &repos, &window).await?;

            let built = report::build(&collected);
            report::output(&built, csv_output.as_deref())?;
            info!(merged = built.merged.grand_total, users = built.merged.rows.len(), "done");
        }
    }
    Ok(())
}

/// Load configuration, resolve the token and open the HTTP session shared by
/// the whole batch. A missing token is asked for on the terminal without echo.
fn connect() -> Result<HttpGateway, Box<dyn std::error::Error>> {
    debug!("loading configuration");
    let config = config::Config::load()?;
    debug!(?config, "loaded configuration");

    let token = config.resolve_token(|| rpassword::prompt_password("GitHub token: "))?;
    Ok(HttpGateway::new(config.api_url(), token)?)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
