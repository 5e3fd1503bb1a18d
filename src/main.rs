use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use agentic_apply::{AgenticBrowser, ApplyConfig, ApplySession, Result};

#[derive(Parser)]
#[command(name = "agentic-apply")]
#[command(about = "Fill and submit multi-step job applications")]
#[command(version)]
struct Cli {
    /// TOML file with identity, knowledge base and pacing
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Job listing to work through
    #[arg(long, default_value = "https://www.linkedin.com/jobs/")]
    url: String,

    /// How many jobs from the listing to apply to
    #[arg(long, default_value_t = 2)]
    max_jobs: usize,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Chrome profile directory holding the signed-in session
    #[arg(long)]
    user_data_dir: Option<PathBuf>,

    /// Login identity; overrides `identity` from the config file
    #[arg(long, env = "APPLY_IDENTITY")]
    identity: Option<String>,

    /// Chrome or Chromium executable
    #[arg(long)]
    chrome_path: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ApplyConfig::load(path)?,
        None => ApplyConfig::default(),
    };
    if let Some(identity) = cli.identity {
        config = config.identity(identity);
    }
    config.validate()?;
    if config.identity.is_empty() {
        warn!("no identity configured; email fields fall back to the knowledge base only");
    }

    let mut builder = AgenticBrowser::builder().headless(!cli.headed);
    if let Some(dir) = cli.user_data_dir {
        builder = builder.user_data_dir(dir);
    }
    if let Some(path) = cli.chrome_path {
        builder = builder.chrome_path(path);
    }
    let browser = builder.build().await?;

    info!(url = %cli.url, "opening job listing");
    let page = browser.new_page(&cli.url).await?;

    let session = ApplySession::new(page, config)?;
    let report = session.process_applications(cli.max_jobs).await?;

    for job in &report.jobs {
        match &job.result {
            Ok(outcome) => info!(
                job = job.index,
                state = ?outcome.state,
                steps = outcome.fill_passes(),
                "result"
            ),
            Err(e) => warn!(job = job.index, error = %e, "result"),
        }
    }
    info!(
        submitted = report.submitted(),
        failed = report.failed(),
        "done"
    );
    Ok(())
}
