//! dbsnap CLI
//!
//! Command-line tool for snapshotting databases and diffing snapshots.

use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use dbsnap_core::dialect::{MysqlDialect, PostgresDialect, SqlDialect};
use dbsnap_core::prelude::*;
use dbsnap_store::{capture_snapshot, load_snapshot, save_snapshot, ConnectionConfig, Connector};

/// Database snapshot and diff tool.
#[derive(Parser)]
#[command(name = "dbsnap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a snapshot of the current database state.
    ///
    /// Connection parameters come from DB_TYPE, DB_HOST, DB_PORT, DB_NAME,
    /// DB_USER and DB_PASSWORD.
    Snapshot {
        /// Snapshot file name (default: <database>-<timestamp>.db).
        name: Option<String>,

        /// Tables to snapshot (default: all tables).
        #[arg(long, value_delimiter = ',')]
        tables: Vec<String>,

        /// Maximum number of rows per table (default: unlimited).
        #[arg(long)]
        limit: Option<u64>,

        /// Output directory for snapshots.
        #[arg(long, default_value = "./snapshots")]
        output_dir: PathBuf,
    },

    /// Compare two snapshots and display the differences.
    Diff {
        /// Path to the first (older) snapshot.
        snapshot1: PathBuf,

        /// Path to the second (newer) snapshot.
        snapshot2: PathBuf,
    },

    /// Generate SQL that migrates snapshot1's state to snapshot2's.
    Migrate {
        /// Path to the first (older) snapshot.
        snapshot1: PathBuf,

        /// Path to the second (newer) snapshot.
        snapshot2: PathBuf,

        /// SQL dialect to generate.
        #[arg(long, value_enum, default_value_t = DialectArg::Mysql)]
        dialect: DialectArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DialectArg {
    Mysql,
    Postgres,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Snapshot {
            name,
            tables,
            limit,
            output_dir,
        } => {
            let config = ConnectionConfig::from_env()?;
            let connector = Connector::connect(&config).await?;

            let filename = match name {
                Some(name) if name.ends_with(".db") => name,
                Some(name) => format!("{name}.db"),
                None => {
                    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
                    format!("{}-{}.db", config.database, timestamp)
                }
            };
            let output_path = output_dir.join(filename);

            info!("Creating snapshot: {}", output_path.display());
            let snapshot = capture_snapshot(&connector, &tables, limit).await?;
            save_snapshot(&snapshot, &output_path).await?;
            info!("Snapshot created successfully: {}", output_path.display());
        }

        Commands::Diff {
            snapshot1,
            snapshot2,
        } => {
            let (snap1, snap2) = load_pair(&snapshot1, &snapshot2).await?;
            let result = compare(&snap1, &snap2)?;
            print!("{}", result.render_summary());
        }

        Commands::Migrate {
            snapshot1,
            snapshot2,
            dialect,
        } => {
            let (snap1, snap2) = load_pair(&snapshot1, &snapshot2).await?;
            let result = compare(&snap1, &snap2)?;

            let mysql = MysqlDialect::new();
            let postgres = PostgresDialect::new();
            let dialect: &dyn SqlDialect = match dialect {
                DialectArg::Mysql => &mysql,
                DialectArg::Postgres => &postgres,
            };

            println!(
                "-- Migration SQL from {} to {}",
                file_label(&snapshot1),
                file_label(&snapshot2)
            );
            println!("-- Generated at: {}\n", Local::now().to_rfc3339());
            println!("{}", generate_sql(&result, dialect));
        }
    }

    Ok(())
}

async fn load_pair(path1: &Path, path2: &Path) -> anyhow::Result<(Snapshot, Snapshot)> {
    info!("Loading snapshot: {}", path1.display());
    let snap1 = load_snapshot(path1).await?;
    info!("Loading snapshot: {}", path2.display());
    let snap2 = load_snapshot(path2).await?;
    Ok((snap1, snap2))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| {
            name.to_string_lossy().into_owned()
        })
}
