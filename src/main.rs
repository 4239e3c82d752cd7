//! CLI entry point for gradebook.
//!
//! Provides subcommands for fetching and reporting a student's grades,
//! aggregating a saved grades payload offline, and running the CORS proxy
//! used by browser clients.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use gradebook::aggregator::aggregate_payload;
use gradebook::config::Config;
use gradebook::fetch::upstream_client;
use gradebook::infra::classeviva::ClassevivaClient;
use gradebook::output::{append_subject_rows, render_text, to_json};
use gradebook::proxy;
use gradebook::services::{SchoolApi, student_id};
use gradebook::session::Session;
use gradebook::AggregateResult;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "gradebook")]
#[command(about = "Fetch school grades and compute averages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, fetch grades and print the averages report
    Report {
        /// Login user id (e.g. S1234567X)
        #[arg(short, long, env = "CLASSEVIVA_USER")]
        user: Option<String>,

        /// Login password
        #[arg(short, long, env = "CLASSEVIVA_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Print JSON instead of the text report
        #[arg(long, default_value_t = false)]
        json: bool,

        /// CSV file to append per-subject rows to
        #[arg(long)]
        csv: Option<String>,

        /// Always log in, ignoring any saved session
        #[arg(long, default_value_t = false)]
        fresh: bool,
    },
    /// Aggregate a grades JSON payload saved on disk
    Aggregate {
        /// Path to the grades payload (an object with a `grades` array)
        #[arg(value_name = "FILE")]
        input: String,

        /// Print JSON instead of the text report
        #[arg(long, default_value_t = false)]
        json: bool,

        /// CSV file to append per-subject rows to
        #[arg(long)]
        csv: Option<String>,
    },
    /// Run the CORS proxy in front of the upstream API
    Proxy {
        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Allowed CORS origin (overrides CORS_ORIGIN)
        #[arg(long)]
        cors_origin: Option<String>,
    },
    /// Forget the saved session
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/gradebook.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gradebook.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.command {
        Commands::Report {
            user,
            password,
            json,
            csv,
            fresh,
        } => {
            let http = upstream_client(&config.api_key, &config.user_agent)?;
            let api = ClassevivaClient::new(config.base_url.clone(), http);

            let payload = fetch_grades(&api, &config, user, password, fresh).await?;
            let result = aggregate_payload(&payload)?;
            emit(&result, json, csv.as_deref())?;
        }
        Commands::Aggregate { input, json, csv } => {
            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("reading grades payload {input}"))?;
            let result = gradebook::aggregate_json(&content)?;
            emit(&result, json, csv.as_deref())?;
        }
        Commands::Proxy { port, cors_origin } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(origin) = cors_origin {
                config.cors_origin = origin;
            }
            proxy::serve(&config).await?;
        }
        Commands::Logout => {
            Session::clear(&config.session_path)?;
            info!(path = %config.session_path.display(), "Logged out");
        }
    }

    Ok(())
}

/// Fetches the raw grades payload, reusing a saved session when possible.
///
/// A saved session the upstream rejects is discarded and replaced by a
/// fresh login, provided credentials are available.
#[tracing::instrument(skip(api, config, password))]
async fn fetch_grades<A: SchoolApi>(
    api: &A,
    config: &Config,
    user: Option<String>,
    password: Option<String>,
    fresh: bool,
) -> Result<serde_json::Value> {
    let saved = if fresh {
        None
    } else {
        Session::load(&config.session_path)?
            .filter(|s| user.as_deref().is_none_or(|u| u == s.user_id))
    };

    if let Some(session) = saved {
        info!(user_id = %session.user_id, "Using saved session");
        match api.grades(&session.student_id, &session.token).await {
            Ok(payload) => return Ok(payload),
            Err(e) if password.is_some() => {
                warn!(error = %e, "Saved session rejected, logging in again");
                Session::clear(&config.session_path)?;
            }
            Err(e) => return Err(e),
        }
    }

    let user = user.ok_or_else(|| anyhow!("no saved session; pass --user or set CLASSEVIVA_USER"))?;
    let password = password
        .ok_or_else(|| anyhow!("no saved session; pass --password or set CLASSEVIVA_PASSWORD"))?;

    let login = api.login(&user, &password).await?;
    let token = login.token().ok_or_else(|| anyhow!("Invalid token"))?;
    let session = Session::new(&user, token, &student_id(&user));
    session.save(&config.session_path)?;

    api.grades(&session.student_id, &session.token).await
}

fn emit(result: &AggregateResult, json: bool, csv: Option<&str>) -> Result<()> {
    info!(
        periods = result.periods.len(),
        grades = result.grade_count(),
        overall_average = result.overall_average,
        "Grades aggregated"
    );

    if json {
        println!("{}", to_json(result)?);
    } else {
        print!("{}", render_text(result));
    }

    if let Some(path) = csv {
        let rows = append_subject_rows(path, result)?;
        info!(path, rows, "CSV rows appended");
    }

    Ok(())
}
