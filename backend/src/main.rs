//! Prices CLI - import and export zipped CSV price lists
//!
//! # Commands
//!
//! ```bash
//! prices serve                     # Start HTTP server (port 8080)
//! prices serve --memory            # Same, without a database
//! prices import data.zip           # Import a zip straight into the database
//! prices export out.zip            # Write every stored row to a zip
//! prices init-db                   # Create the prices table if missing
//! ```
//!
//! Database settings come from the environment (or a `.env` file); see
//! `prices::config`.

use clap::{Parser, Subcommand};
use prices::api::logs::{log_info, log_warning};
use prices::{
    ExportPipeline, ImportPipeline, MemoryStore, PostgresStore, PriceStore, RequestLog,
    ServerConfig, StoreConfig,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "prices")]
#[command(about = "Import and export zipped CSV price lists", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve {
        /// Port to listen on (default: PRICES_PORT or 8080)
        #[arg(short, long)]
        port: Option<u16>,

        /// Keep data in memory instead of PostgreSQL
        #[arg(long)]
        memory: bool,
    },

    /// Import a zipped CSV into the database
    Import {
        /// Zip file holding one CSV at its root
        input: PathBuf,
    },

    /// Export every stored row as a zipped CSV
    Export {
        /// Output zip file
        output: PathBuf,
    },

    /// Create the prices table if it does not exist
    InitDb,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { port, memory } => cmd_serve(port, memory).await,
        Commands::Import { input } => cmd_import(&input).await,
        Commands::Export { output } => cmd_export(&output).await,
        Commands::InitDb => cmd_init_db().await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Connect to PostgreSQL using environment settings, creating the table if needed.
async fn open_database() -> Result<Arc<PostgresStore>, Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env()?;
    log_info(format!("🗄️  Connecting to {}", config.masked_url()));
    Ok(Arc::new(PostgresStore::connect(&config).await?))
}

async fn cmd_serve(port: Option<u16>, memory: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServerConfig::from_env()?;
    if let Some(port) = port {
        config = config.with_port(port);
    }

    let store: Arc<dyn PriceStore> = if memory {
        log_warning("Using in-memory store: data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        open_database().await?
    };

    prices::server::start_server(config, store).await
}

async fn cmd_import(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Importing: {}", input.display());

    let bytes = fs::read(input)?;
    let pipeline = ImportPipeline::new(open_database().await?);
    let summary = pipeline.run(&bytes, &RequestLog::start()).await?;

    eprintln!("   Accepted: {}", summary.accepted);
    eprintln!("   Skipped:  {}", summary.rejected);
    println!("{}", serde_json::to_string_pretty(&summary.totals)?);

    Ok(())
}

async fn cmd_export(output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = ExportPipeline::new(open_database().await?);
    let export = pipeline.run(&RequestLog::start()).await?;

    fs::write(output, &export.bytes)?;
    eprintln!("💾 {} rows written to: {}", export.record_count, output.display());

    Ok(())
}

async fn cmd_init_db() -> Result<(), Box<dyn std::error::Error>> {
    // Connecting already applies the schema.
    open_database().await?;
    eprintln!("✅ Table ready");
    Ok(())
}
