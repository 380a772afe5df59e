use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use review_sentiment::analyzer::Analyzer;
use review_sentiment::config::Config;
use review_sentiment::page::{PageSource, Source};
use review_sentiment::protocol::{Session, TabInfo, blocking_lines};
use review_sentiment::report::{self, Report};
use review_sentiment::sentiment;

#[derive(Parser)]
#[command(name = "review-sentiment")]
#[command(about = "Extract restaurant reviews from a page and score their sentiment")]
#[command(version)]
struct Cli {
    /// JSON config file (built-in defaults when omitted)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the reviews on a page
    Analyze {
        /// Saved HTML file or http(s) URL
        source: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Seed for review sampling, for repeatable runs
        #[arg(long)]
        seed: Option<u64>,

        /// Number of reviews to sample (1 to 5)
        #[arg(long)]
        sample_size: Option<usize>,
    },

    /// Score a single piece of text
    Score {
        text: String,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report whether a URL is a restaurant page on the review site
    TabInfo { url: String },

    /// Answer JSON requests on stdin, one per line
    Serve {
        /// Page analyzed when a request names no source
        source: Option<String>,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&str>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    Ok(config)
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("valid template"),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, shutting down");
            token.cancel();
        }
    });
}

async fn analyze(
    mut config: Config,
    source: &str,
    json: bool,
    seed: Option<u64>,
    sample_size: Option<usize>,
) -> Result<ExitCode> {
    if let Some(n) = sample_size {
        config.extraction.sample_size = n;
    }
    config.validate()?;

    let mut analyzer = Analyzer::from_config(&config).context("invalid extraction config")?;
    if let Some(seed) = seed {
        analyzer = analyzer.with_seed(seed);
    }
    let source = Source::parse(source, &config.fetch.user_agent, config.fetch_timeout())?;

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let pb = spinner(format!("Analyzing reviews on {}", source.describe()));
    let report = analyzer.analyze(&source, &cancel).await;
    pb.finish_and_clear();

    print_report(&report, json)?;
    Ok(exit_code(&report))
}

fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", report::render(report));
    }
    Ok(())
}

/// Empty pages are a normal outcome; only real failures exit non-zero.
fn exit_code(report: &Report) -> ExitCode {
    if report.is_success() || report.is_no_reviews() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn serve(config: Config, source: Option<String>) -> Result<()> {
    config.validate()?;
    let source = source
        .map(|s| Source::parse(&s, &config.fetch.user_agent, config.fetch_timeout()))
        .transpose()?;
    let session = Session::from_config(&config, source).context("invalid extraction config")?;

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    session
        .serve(
            blocking_lines(std::io::BufReader::new(std::io::stdin())),
            tokio::io::stdout(),
            &cancel,
        )
        .await
        .context("stdio session failed")
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            source,
            json,
            seed,
            sample_size,
        } => analyze(config, &source, json, seed, sample_size).await,
        Commands::Score { text, json } => {
            let analysis = sentiment::score(&text);
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                println!(
                    "{} {:.3} (positive words: {}, negative words: {}, words: {})",
                    analysis.label,
                    analysis.score,
                    analysis.positive_word_count,
                    analysis.negative_word_count,
                    analysis.total_word_count
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::TabInfo { url } => {
            let info = TabInfo::for_url(&url, &config.site);
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Serve { source } => {
            serve(config, source).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
