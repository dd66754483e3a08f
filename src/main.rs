use anyhow::{bail, Context, Result};
use cf2tf::cloudflare::auth::Credentials;
use cf2tf::cloudflare::client::CloudflareClient;
use cf2tf::cloudflare::http::format_api_error;
use cf2tf::config::Config;
use cf2tf::export::ExportContext;
use cf2tf::output::{self, OutputMode};
use cf2tf::resource;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Export Cloudflare resources as Terraform configuration
#[derive(Parser, Debug)]
#[command(name = "cf2tf", version, about, long_about = None)]
struct Args {
    /// API token
    #[arg(long, env = "CLOUDFLARE_API_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Account email, for global API key authentication
    #[arg(long, env = "CLOUDFLARE_EMAIL", global = true)]
    email: Option<String>,

    /// Global API key
    #[arg(long, env = "CLOUDFLARE_API_KEY", hide_env_values = true, global = true)]
    key: Option<String>,

    /// API root, e.g. for a proxy
    #[arg(long, env = "CLOUDFLARE_API_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print HCL resource blocks
    Generate(ExportArgs),

    /// Print import commands for the same resources
    Import {
        #[command(flatten)]
        export: ExportArgs,

        /// Emit Terraform 1.5+ `import` blocks instead of commands
        #[arg(long)]
        modern_import_block: bool,
    },

    /// List supported resource types
    List,

    /// Save default zone/account/base URL
    Config {
        #[arg(short, long)]
        zone: Option<String>,

        #[arg(short, long)]
        account: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
struct ExportArgs {
    /// Resource types, comma separated (e.g. cloudflare_record,cloudflare_page_rule)
    #[arg(short = 'r', long = "resource-type", value_delimiter = ',', required = true)]
    resource_types: Vec<String>,

    /// Zone id
    #[arg(short, long)]
    zone: Option<String>,

    /// Account id
    #[arg(short, long)]
    account: Option<String>,

    /// Parent to export parameterized types under (bucket, script); repeatable
    #[arg(long = "path-param")]
    path_params: Vec<String>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(
    level: LogLevel,
    log_file: Option<&Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let (non_blocking, guard) = match log_file {
        Some(path) => tracing_appender::non_blocking(open_log_file(path)?),
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(log_file.is_some())
        .with_line_number(log_file.is_some())
        .init();

    tracing::debug!("cf2tf started with log level: {:?}", level);

    Ok(Some(guard))
}

/// Open `path` for appending, creating its directory first
fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = match setup_logging(args.log_level, args.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {}", format_api_error(&err));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    match &args.command {
        Command::List => {
            list_resources();
            Ok(())
        }
        Command::Config { zone, account } => save_config(
            zone.as_deref(),
            account.as_deref(),
            args.base_url.as_deref(),
        ),
        Command::Generate(export) => run_export(&args, export, OutputMode::Generate).await,
        Command::Import {
            export,
            modern_import_block,
        } => {
            run_export(
                &args,
                export,
                OutputMode::Import {
                    modern: *modern_import_block,
                },
            )
            .await
        }
    }
}

async fn run_export(args: &Args, export: &ExportArgs, mode: OutputMode) -> Result<()> {
    let config = Config::load();
    let (zone_id, account_id) =
        config.effective_scope(export.zone.as_deref(), export.account.as_deref());
    if zone_id.is_none() && account_id.is_none() {
        bail!("Pass --zone or --account (or save a default with `cf2tf config`)");
    }

    let credentials = Credentials::resolve(
        args.token.as_deref(),
        args.email.as_deref(),
        args.key.as_deref(),
    )?;
    let base_url = config.effective_base_url(args.base_url.as_deref());
    let client = CloudflareClient::new(credentials, base_url.as_deref())?;

    let ctx = ExportContext {
        client,
        zone_id,
        account_id,
        path_params: export.path_params.clone(),
    };

    let exports = ctx.export_all(&export.resource_types).await?;
    let rendered = output::render(&exports, mode)?;
    if rendered.is_empty() {
        tracing::warn!("No resources found");
    }
    output::write_output(&rendered, export.output.as_deref())
}

fn list_resources() {
    let registry = resource::get_registry();
    for key in resource::get_all_resource_keys() {
        if let Some(def) = registry.resources.get(key) {
            println!("{:<40} {:<13} {}", key, def.scope.as_str(), def.display_name);
        }
    }
}

fn save_config(zone: Option<&str>, account: Option<&str>, base_url: Option<&str>) -> Result<()> {
    let mut config = Config::load();
    if zone.is_none() && account.is_none() && base_url.is_none() {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if let Some(zone) = zone {
        config.zone_id = Some(zone.to_string());
    }
    if let Some(account) = account {
        config.account_id = Some(account.to_string());
    }
    if let Some(base_url) = base_url {
        config.base_url = Some(base_url.to_string());
    }
    config.save()?;

    if let Some(path) = Config::config_path() {
        println!("Saved {}", path.display());
    }
    Ok(())
}
