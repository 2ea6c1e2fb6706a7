use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod export;
mod matrix;
mod models;
mod offline;
mod paginate;
mod period;
mod recap;
mod report;

use crate::error::RecapError;
use crate::models::ReportPage;
use crate::period::PeriodMode;
use crate::recap::RecapRequest;

#[derive(Parser)]
#[command(name = "attendance-recap")]
#[command(about = "Weekly attendance recap for the school roster", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load the sample roster and attendance
    Seed,
    /// Import attendance records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print one page of the weekly attendance matrix
    Recap {
        #[command(flatten)]
        request: RequestArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Same as `recap`, reading roster and attendance from CSV exports
    RecapOffline {
        #[arg(long)]
        students: PathBuf,
        #[arg(long)]
        attendance: PathBuf,
        #[command(flatten)]
        request: RequestArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Write the full matrix for a period to CSV
    Export {
        #[arg(long)]
        periode: String,
        #[arg(long, value_enum)]
        mode: PeriodMode,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value = "recap.csv")]
        out: PathBuf,
    },
}

#[derive(Args)]
struct RequestArgs {
    /// `YYYY` for tahun, `YYYY-MM` for bulan
    #[arg(long)]
    periode: String,
    #[arg(long, value_enum)]
    mode: PeriodMode,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
    #[arg(long)]
    search: Option<String>,
}

impl From<RequestArgs> for RecapRequest {
    fn from(args: RequestArgs) -> Self {
        RecapRequest {
            periode: args.periode,
            mode: args.mode,
            page: args.page,
            limit: args.limit,
            search: args.search,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

fn print_page(format: OutputFormat, label: &str, page: &ReportPage) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", report::render_json(page)?),
        OutputFormat::Markdown => print!("{}", report::render_markdown(label, page)),
    }
    Ok(())
}

async fn connect() -> anyhow::Result<PgPool> {
    let config = config::Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .map_err(RecapError::from)
        .context("failed to connect to Postgres")?;
    tracing::debug!(max_connections = config.max_connections, "connected to Postgres");
    Ok(pool)
}

/// Exit status and message prefix for a failed command: 2 for rejected
/// input, 75 (EX_TEMPFAIL) when the roster store could not be read, 1 for
/// everything else.
fn failure_status(err: &anyhow::Error) -> (u8, &'static str) {
    match err.downcast_ref::<RecapError>() {
        Some(recap) if recap.is_client_error() => (2, "invalid request"),
        Some(recap) if recap.is_retryable() => (75, "temporary failure"),
        _ => (1, "error"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weekly_attendance_recap=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let (status, prefix) = failure_status(&err);
            eprintln!("{prefix}: {err:#}");
            ExitCode::from(status)
        }
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let pool = connect().await?;
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} attendance records from {}.", csv.display());
        }
        Commands::Recap { request, format } => {
            let request = RecapRequest::from(request);
            let pool = connect().await?;
            let page = recap::run(&pool, &request).await?;
            print_page(format, &request.periode, &page)?;
        }
        Commands::RecapOffline {
            students,
            attendance,
            request,
            format,
        } => {
            let request = RecapRequest::from(request);
            let students = offline::load_students(&students)?;
            let records = offline::load_attendance(&attendance)?;
            let page = recap::run_offline(&students, &records, &request)?;
            print_page(format, &request.periode, &page)?;
        }
        Commands::Export {
            periode,
            mode,
            search,
            out,
        } => {
            let request = RecapRequest {
                periode,
                mode,
                page: None,
                limit: None,
                search,
            };
            // Reject bad input before opening a connection.
            let query = request.validate()?;
            let pool = connect().await?;
            let rows = recap::build_rows(&pool, &query).await?;
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            export::write_csv(file, &query.period.anchors, &rows)?;
            println!("Exported {} students to {}.", rows.len(), out.display());
        }
    }

    Ok(())
}
