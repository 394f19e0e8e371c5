use anyhow::{anyhow, Context, Result};
use api_ingress::{ApiIngress, ApiIngressConfig};
use axum::Router;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use workspace_access::config::WorkspaceAccessConfig;
use workspace_access::WorkspaceAccess;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MEMORY_DSN: &str = "sqlite::memory:";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path) -> Result<String> {
    if dsn.eq_ignore_ascii_case(MEMORY_DSN) || dsn.eq_ignore_ascii_case("sqlite://:memory:") {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }
    if let Some(dir) = p.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create database directory {}", dir.display()))?;
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Workhub Server - workspace access, membership and notifications
#[derive(Parser)]
#[command(name = "workhub-server")]
#[command(about = "Workhub Server - workspace access, membership and notifications")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.data_dir));
    tracing::info!("Workhub Server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config, args),
        Commands::Migrate => {
            let db = connect(&config, &args).await?;
            WorkspaceAccess::migrate(&db).await?;
            println!("Migrations applied");
            Ok(())
        }
    }
}

/// Detect DB backend from URL scheme (sqlite/postgres).
fn detect_from_dsn(cfg: &DatabaseConfig) -> Result<&'static str> {
    let raw = cfg.url.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    if raw.eq_ignore_ascii_case(MEMORY_DSN) {
        return Ok("sqlite");
    }

    let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;
    match url.scheme() {
        "sqlite" | "sqlite3" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

/// The database section in effect: `--mock` swaps in an in-memory SQLite.
fn effective_database(config: &AppConfig, args: &CliArgs) -> Result<DatabaseConfig> {
    if args.mock {
        return Ok(DatabaseConfig {
            url: MEMORY_DSN.to_string(),
            max_conns: Some(1),
            busy_timeout_ms: None,
        });
    }
    config
        .database
        .clone()
        .ok_or_else(|| anyhow!("No database configuration found; add a `database` section or pass --mock"))
}

async fn connect(config: &AppConfig, args: &CliArgs) -> Result<DatabaseConnection> {
    let db_config = effective_database(config, args)?;
    let backend = detect_from_dsn(&db_config)?;

    let mut dsn = db_config.url.trim().to_owned();
    if backend == "sqlite" {
        dsn = absolutize_sqlite_dsn(&dsn, Path::new(&config.server.data_dir))?;
    }

    // Each in-memory SQLite connection is its own database.
    let max_conns = if dsn == MEMORY_DSN {
        1
    } else {
        db_config.max_conns.unwrap_or(10)
    };

    let mut opts = ConnectOptions::new(dsn.clone());
    opts.max_connections(max_conns)
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    if let Some(ms) = db_config.busy_timeout_ms {
        opts.map_sqlx_sqlite_opts(move |o| o.busy_timeout(Duration::from_millis(u64::from(ms))));
    }

    tracing::info!(backend, "Connecting to database: {}", dsn);
    let db = Database::connect(opts)
        .await
        .with_context(|| format!("Cannot connect to database '{dsn}'"))?;
    tracing::info!(backend, "Connected to database");
    Ok(db)
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");

    let wa_config: WorkspaceAccessConfig = config.module_config("workspace_access")?;

    let db = connect(&config, &args).await?;
    WorkspaceAccess::migrate(&db).await?;
    let workspace_access = WorkspaceAccess::init(&wa_config, db)?;

    let mut ingress = ApiIngress::new(ApiIngressConfig::from(&config.server));
    ingress.register_openapi(WorkspaceAccess::openapi());
    let router = ingress.build_router(workspace_access.register_rest(Router::new()))?;

    let listener = ingress.bind().await?;
    ApiIngress::serve(listener, router, api_ingress::shutdown_signal()).await?;

    tracing::info!("Workhub Server stopped");
    Ok(())
}

fn check_config(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    let db = effective_database(&config, &args)?;
    let backend = detect_from_dsn(&db)?;
    let _: WorkspaceAccessConfig = config.module_config("workspace_access")?;
    let ingress = ApiIngressConfig::from(&config.server);

    tracing::info!(backend, bind = %ingress.bind_addr, "Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_sqlite_dsn_is_anchored_in_data_dir() {
        let tmp = std::env::temp_dir().join("workhub-dsn-test");
        let dsn = absolutize_sqlite_dsn("sqlite://db/workhub.db?mode=rwc", &tmp).unwrap();

        assert!(dsn.starts_with("sqlite://"));
        assert!(dsn.ends_with("db/workhub.db?mode=rwc"));
        assert!(Path::new(dsn.trim_start_matches("sqlite://").split('?').next().unwrap())
            .is_absolute());
    }

    #[test]
    fn memory_dsn_is_kept() {
        let dsn = absolutize_sqlite_dsn("sqlite://:memory:", Path::new("/tmp")).unwrap();
        assert_eq!(dsn, MEMORY_DSN);
    }

    #[test]
    fn backend_detection() {
        let db = |url: &str| DatabaseConfig {
            url: url.into(),
            max_conns: None,
            busy_timeout_ms: None,
        };

        assert_eq!(detect_from_dsn(&db("sqlite://x.db")).unwrap(), "sqlite");
        assert_eq!(detect_from_dsn(&db("postgres://u@h/db")).unwrap(), "postgres");
        assert!(detect_from_dsn(&db("mysql://u@h/db")).is_err());
        assert!(detect_from_dsn(&db("  ")).is_err());
    }

    #[test]
    fn mock_overrides_configured_database() {
        let config = AppConfig::default();
        let args = CliArgs {
            mock: true,
            ..Default::default()
        };

        assert_eq!(effective_database(&config, &args).unwrap().url, MEMORY_DSN);
    }
}
