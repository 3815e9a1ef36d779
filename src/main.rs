//! CnosDB Datasource
//!
//! Command-line entry point:
//! - `serve`: run the HTTP API in front of CnosDB
//! - `render`: compile a query model file to SQL
//! - `config`: print a default config file

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use cnosdb_datasource::api::{serve, AppState};
use cnosdb_datasource::config::{generate_default_config, Config, LoggingConfig};
use cnosdb_datasource::datasource::{CnosClient, Datasource, SqlBackend};
use cnosdb_datasource::query::{parse_interval, QueryCompiler, QueryContext, QueryModel, TimeRange};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "cnosdb-datasource")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query model compiler and HTTP backend for CnosDB")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Override the configured host
        #[arg(long)]
        host: Option<String>,
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Compile a query model (JSON) to SQL
    Render {
        /// Model file, or `-` for stdin
        model: PathBuf,
        /// Range start (RFC 3339), defaults to `--to` minus `--last`
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// Range end (RFC 3339), defaults to now
        #[arg(long)]
        to: Option<DateTime<Utc>>,
        /// Range length when `--from` is not given
        #[arg(short, long, default_value = "1 hour")]
        last: String,
        /// Suggested bucket width in milliseconds
        #[arg(short, long)]
        interval_ms: Option<i64>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let loaded = Config::resolve(cli.config.as_deref())?;

    init_tracing(&loaded.config.logging);
    loaded.log();
    let config = loaded.config;

    match cli.command {
        Commands::Serve { host, port } => run_server(config, host, port).await,
        Commands::Render {
            model,
            from,
            to,
            last,
            interval_ms,
        } => {
            let range = render_range(from, to, &last)?;
            let mut ctx = QueryContext::new(range);
            if let Some(ms) = interval_ms {
                ctx = ctx.with_interval_ms(ms);
            }

            let model = read_model(&model)?;
            let compiled = QueryCompiler::new().compile(&model, &ctx)?;
            println!("{}", compiled.sql);
            Ok(())
        }
        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("failed to write {:?}", path))?;
                    eprintln!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
            Ok(())
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "cnosdb_datasource={},tower_http=debug",
            logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run_server(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.api.host = host;
    }
    if let Some(port) = port {
        config.api.port = port;
    }

    tracing::info!(
        "Starting CnosDB datasource v{}",
        env!("CARGO_PKG_VERSION")
    );

    let client = Arc::new(CnosClient::new(config.datasource.clone())?);

    match client.ping().await {
        Ok(ping) if ping.is_success() => tracing::info!("CnosDB connection verified"),
        Ok(ping) => tracing::warn!(status = ping.status, "CnosDB ping returned an error"),
        Err(e) => tracing::warn!("CnosDB not available: {}", e),
    }

    let datasource = Arc::new(Datasource::new(client));
    let state = AppState::new(datasource, config.api.clone());

    serve(state, &config.api).await?;

    tracing::info!("CnosDB datasource stopped");
    Ok(())
}

fn render_range(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    last: &str,
) -> anyhow::Result<TimeRange> {
    let to = to.unwrap_or_else(Utc::now);
    let from = match from {
        Some(from) => from,
        None => {
            let span = parse_interval(last);
            if span <= chrono::Duration::zero() {
                bail!("invalid --last {:?}, expected e.g. \"6 hours\"", last);
            }
            to.checked_sub_signed(span)
                .with_context(|| format!("--last {:?} reaches before the representable range", last))?
        }
    };
    Ok(TimeRange::new(from, to))
}

fn read_model(path: &Path) -> anyhow::Result<QueryModel> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read model from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?
    };

    let value: serde_json::Value =
        serde_json::from_str(&content).context("model is not valid JSON")?;
    Ok(QueryModel::from_json(value)?)
}
