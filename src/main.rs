//! izza-back API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use strum::IntoEnumIterator;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use izza_back::api::{create_router, AppState};
use izza_back::config::Config;
use izza_back::metrics;
use izza_back::AppError;
use izza_back::secrets::{caller_identity, resolve_database_credentials, AwsSecretSource, SecretSource};
use izza_back::store::{LandStore, PgStore, StatType};

/// Land search and site analysis API.
#[derive(Parser, Debug)]
#[command(name = "izza-back")]
#[command(about = "Land search and industrial site analysis API")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// HTTP port, overrides PORT.
    #[arg(short, long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve,

    /// Check configuration validity.
    CheckConfig,

    /// Check the database connection and the statistics rows.
    CheckDb,

    /// Check AWS credentials and the database secret.
    CheckAws,
}

fn init_tracing(verbose: bool, config: Option<&Config>) {
    let filter = if verbose {
        EnvFilter::new("izza_back=debug,info")
    } else {
        config
            .and_then(|c| EnvFilter::try_new(&c.rust_log).ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.is_some_and(Config::json_logs) {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

fn finish_config(loaded: Result<Config, AppError>, port: Option<u16>) -> anyhow::Result<Config> {
    let mut config = loaded.context("Failed to load configuration")?;
    if let Some(port) = port {
        config.port = port;
    }
    config
        .validate()
        .context("Configuration validation failed")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logging comes up from the parsed config before validation so its errors get logged.
    let loaded = Config::load();
    init_tracing(args.verbose, loaded.as_ref().ok());
    let config = finish_config(loaded, args.port).inspect_err(|e| error!("{:#}", e))?;

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(&config),
        Some(Command::CheckDb) => cmd_check_db(config).await,
        Some(Command::CheckAws) => cmd_check_aws(&config).await,
        Some(Command::Serve) | None => cmd_serve(config).await,
    }
}

fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("IZZA-BACK - CONFIGURATION CHECK");
    println!("======================================================================");

    println!("Configuration Summary:");
    println!("  Profiles: {}", config.profiles().join(", "));
    println!("  Database: {}", config.database_target());
    println!("  Max Connections: {}", config.db_max_connections);
    println!("  Secrets: {}", if config.requires_secrets() { "AWS Secrets Manager" } else { "Environment" });
    println!("  AWS Region: {}", config.aws_region);
    println!("  Port: {}", config.port);
    println!(
        "  Analysis Base Path: {}",
        if config.base_path.is_empty() { "/" } else { &config.base_path }
    );
    println!("  Log Filter: {}", config.rust_log);
    println!("  Log Format: {}", config.log_format);
    println!("  Range Cache TTL: {}s", config.range_cache_ttl_seconds);
    println!("  Land Marker Limit: {}", config.land_marker_limit);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");
    Ok(())
}

async fn connect(config: &mut Config) -> izza_back::Result<PgStore> {
    if config.requires_secrets() {
        let source = AwsSecretSource::new(&config.aws_region).await;
        resolve_database_credentials(config, &source).await?;
    }

    info!(database = %config.database_target(), "Connecting to database");
    Ok(PgStore::connect(config).await?)
}

async fn cmd_check_db(mut config: Config) -> anyhow::Result<()> {
    let store = connect(&mut config)
        .await
        .context("Failed to connect to database")?;

    print!("Pinging database... ");
    match store.ping().await {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Database ping failed"));
        }
    }

    println!("Statistics rows:");
    for stat_type in StatType::iter() {
        match store.find_statistics(stat_type).await? {
            Some(row) => println!("  {}: {} .. {}", stat_type, row.min_value, row.max_value),
            None => println!("  {}: MISSING", stat_type),
        }
    }
    Ok(())
}

async fn cmd_check_aws(config: &Config) -> anyhow::Result<()> {
    print!("Calling STS GetCallerIdentity... ");
    let identity = caller_identity(&config.aws_region)
        .await
        .inspect_err(|_| println!("FAILED"))?;
    println!("OK");
    println!("  Account: {}", identity.account.as_deref().unwrap_or("-"));
    println!("  ARN: {}", identity.arn.as_deref().unwrap_or("-"));
    println!("  User ID: {}", identity.user_id.as_deref().unwrap_or("-"));

    if let Some(secret_id) = &config.db_secret_id {
        print!("Reading secret {}... ", secret_id);
        let source = AwsSecretSource::new(&config.aws_region).await;
        match source.secret_string(secret_id).await {
            Ok(_) => println!("OK"),
            Err(e) => {
                println!("FAILED");
                println!("  Error: {}", e);
                return Err(anyhow::anyhow!("Secret not readable"));
            }
        }
    }
    Ok(())
}

async fn cmd_serve(mut config: Config) -> anyhow::Result<()> {
    info!(profiles = %config.app_profiles, "Configuration loaded");

    let handle = metrics::install_recorder()?;
    metrics::init_metrics();

    let store = connect(&mut config)
        .await
        .context("Failed to connect to database")?;
    let store: Arc<dyn LandStore> = Arc::new(store);
    if let Err(e) = store.ping().await {
        warn!(error = %e, "Database not answering yet");
    }

    let state = AppState::new(store, &config).with_metrics(handle);
    let router = create_router(state, &config.base_path);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
