use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use launcher_fetch::{ArtifactFetcher, LauncherConfig, LauncherResult, ProgressTracker};

/// Resolve a Minecraft version and retrieve everything it needs.
#[derive(Parser)]
#[command(name = "launcher-fetch")]
#[command(version)]
struct Cli {
    /// Version identifier, e.g. `1.20.1` or `fabric-loader-0.15.7-1.20.1`
    #[arg(value_name = "VERSION")]
    version_id: String,

    /// Override the data directory for this invocation
    #[arg(long = "data-dir")]
    data_dir: Option<PathBuf>,

    /// Number of parallel download workers
    #[arg(long)]
    concurrency: Option<usize>,

    /// Check the local installation instead of downloading
    #[arg(long)]
    verify: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    launcher_fetch::init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> LauncherResult<ExitCode> {
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| LauncherConfig::default().data_dir);
    let mut config = LauncherConfig::load(data_dir);
    if let Some(n) = cli.concurrency {
        config.concurrency = n.max(1);
    }
    info!("Data directory: {:?}", config.data_dir);

    let fetcher = ArtifactFetcher::new(config)?;

    if cli.verify {
        let version = fetcher.resolve(&cli.version_id).await?;
        let problems = fetcher.verify(&version).await?;
        for problem in &problems {
            println!("{:>8}  {}", format!("{:?}", problem.status).to_lowercase(), problem.file);
        }
        return Ok(if problems.is_empty() {
            println!("{} is intact", cli.version_id);
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let progress = Arc::new(ProgressTracker::default());
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling downloads...");
                cancel.cancel();
            }
        });
    }

    let reporter = {
        let progress = Arc::clone(&progress);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            loop {
                ticker.tick().await;
                println!("{}", progress.status());
            }
        })
    };

    let result = fetcher
        .download_version(&cli.version_id, Arc::clone(&progress), cancel)
        .await;
    reporter.abort();
    let report = result?;

    println!("{}", progress.status());
    if report.is_success() {
        info!(
            "{} ready ({} files, main class {}, Java {})",
            report.version.id,
            report.total,
            report.version.main_class.as_deref().unwrap_or("?"),
            report.version.required_java_major()
        );
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{} file(s) failed:", report.failures.len());
        for failure in &report.failures {
            eprintln!("  {}", failure);
        }
        Ok(ExitCode::FAILURE)
    }
}
