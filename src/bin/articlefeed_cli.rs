use std::sync::Arc;

use anyhow::{Context, Result, bail};
use articlefeed::ArticleFeed;
use articlefeed::catalog::Catalog;
use articlefeed::config::FeedConfig;
use articlefeed::lake::Lake;
use articlefeed::store::MongoArticleStore;
use articlefeed::telemetry::{HttpTelemetrySink, NullTelemetrySink, TelemetrySink};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use deltalake::arrow::util::pretty::pretty_format_batches;
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(
    name = "articlefeed-cli",
    about = "Run and inspect the daily article feed export."
)]
struct Cli {
    /// Minimum log level to display.
    #[arg(long, default_value_t = LogLevelArg::Info, value_enum)]
    log_level: LogLevelArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the daily export (defaults to today's UTC date).
    Run {
        /// Run date in YYYY-MM-DD form.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print recent runs from the catalog.
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Display rows of a written partition.
    Show {
        /// Partition date in YYYY-MM-DD form (defaults to today).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Maximum number of rows to display (0 = no limit).
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(value: LogLevelArg) -> Self {
        match value {
            LogLevelArg::Error => LevelFilter::Error,
            LogLevelArg::Warn => LevelFilter::Warn,
            LogLevelArg::Info => LevelFilter::Info,
            LogLevelArg::Debug => LevelFilter::Debug,
            LogLevelArg::Trace => LevelFilter::Trace,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default());
    logger.filter_level(LevelFilter::from(cli.log_level));
    let _ = logger.try_init();

    let config = FeedConfig::from_env().context("failed to resolve feed configuration")?;

    match cli.command {
        Commands::Run { date } => handle_run(config, date.unwrap_or_else(today)).await,
        Commands::History { limit } => handle_history(&config, limit),
        Commands::Show { date, limit } => handle_show(&config, date.unwrap_or_else(today), limit),
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn handle_run(config: FeedConfig, run_date: NaiveDate) -> Result<()> {
    let store = Arc::new(
        MongoArticleStore::connect(&config)
            .await
            .context("failed to connect to the article store")?,
    );

    let telemetry: Arc<dyn TelemetrySink> = match &config.telemetry_endpoint {
        Some(endpoint) => Arc::new(HttpTelemetrySink::new(
            endpoint.clone(),
            config.telemetry_api_key.clone(),
        )),
        None => Arc::new(NullTelemetrySink),
    };

    let feed = ArticleFeed::new(config, store, telemetry)?;
    let report = feed.run_daily_feed(run_date).await?;

    println!(
        "{}: {} loaded, {} defective, {} recovered, {} written -> {}",
        report.run_date,
        report.total_rows,
        report.defective_rows,
        report.recovered_rows,
        report.written_rows,
        report.partition_path.display()
    );
    Ok(())
}

fn handle_history(config: &FeedConfig, limit: usize) -> Result<()> {
    let catalog = Catalog::new(config)?;
    catalog.initialize_schema()?;
    let runs = catalog.recent_runs(limit)?;

    if runs.is_empty() {
        println!("No recorded runs.");
        return Ok(());
    }

    println!("{:<38} {:<12} {:<8} DETAILS", "RUN ID", "RUN DATE", "STATUS");
    println!("{}", "-".repeat(100));
    for run in runs {
        println!(
            "{:<38} {:<12} {:<8} {}",
            run.run_id, run.run_date, run.status, run.details
        );
    }
    Ok(())
}

fn handle_show(config: &FeedConfig, date: NaiveDate, limit: usize) -> Result<()> {
    let lake = Lake::new(&config.output_base_path)?;
    let batch = match lake.read_partition(date)? {
        Some(batch) => batch,
        None => bail!("no partition exists for {date}"),
    };

    let display = if limit > 0 && batch.num_rows() > limit {
        batch.slice(0, limit)
    } else {
        batch
    };
    println!("{}", pretty_format_batches(&[display])?);
    Ok(())
}
