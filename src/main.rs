use anyhow::{bail, Context, Result};
use chronicle_api::config::Config;
use chronicle_api::endpoint::service_endpoint;
use chronicle_api::gcp::auth::TokenSource;
use chronicle_api::gcp::client::ChronicleClient;
use chronicle_api::gcp::http::format_api_error;
use chronicle_api::resource::request::body_bytes;
use chronicle_api::resource::{InstanceResource, LogResource, LogTypeResource, ParserResource};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use reqwest::Request;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Command-line client for the Chronicle API
#[derive(Parser, Debug)]
#[command(name = "chronicle", version, about, long_about = None)]
struct Args {
    /// Google Cloud project of the Chronicle instance
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Instance location (e.g. 'us', 'europe')
    #[arg(short, long, global = true)]
    location: Option<String>,

    /// Chronicle instance id
    #[arg(short, long, global = true)]
    instance: Option<String>,

    /// Region prefix of the API endpoint
    #[arg(long, global = true)]
    region: Option<String>,

    /// API version (e.g. 'v1alpha')
    #[arg(long, global = true)]
    api_version: Option<String>,

    /// Service account to impersonate
    #[arg(long, global = true)]
    service_account: Option<String>,

    /// Use this access token instead of Application Default Credentials
    #[arg(long, global = true)]
    access_token: Option<String>,

    /// Print the request instead of sending it
    #[arg(long, global = true)]
    dry_run: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "json")]
    output: OutputFormat,

    /// Log level for debugging
    #[arg(long, global = true, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chronicle instances
    #[command(subcommand)]
    Instance(InstanceCommand),
    /// Log types and parser dry runs
    #[command(subcommand)]
    LogTypes(LogTypesCommand),
    /// Ingested logs
    #[command(subcommand)]
    Logs(LogsCommand),
    /// Log type parsers
    #[command(subcommand)]
    Parsers(ParsersCommand),
    /// Show or change stored defaults
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum InstanceCommand {
    /// Get the configured instance
    Get,
}

#[derive(ClapArgs, Debug)]
struct PageArgs {
    /// Maximum number of items per page
    #[arg(long, default_value = "")]
    page_size: String,

    /// Token of the page to fetch
    #[arg(long, default_value = "")]
    page_token: String,

    /// Follow nextPageToken and return every page
    #[arg(long)]
    all: bool,
}

#[derive(Subcommand, Debug)]
enum LogTypesCommand {
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    Get {
        log_type: String,
    },
    /// Run parser code against sample logs without saving it
    RunParser {
        log_type: String,
        /// File with the parser code
        #[arg(long)]
        cbn: PathBuf,
        /// File with a parser extension snippet
        #[arg(long)]
        snippet: Option<PathBuf>,
        /// Sample log file; every non-empty line is one log
        #[arg(long = "log")]
        logs: Vec<PathBuf>,
        /// Include the parser state dump in the result
        #[arg(long)]
        statedump: bool,
    },
}

#[derive(Subcommand, Debug)]
enum LogsCommand {
    List {
        log_type: String,
        #[command(flatten)]
        page: PageArgs,
        /// List filter expression
        #[arg(long, default_value = "")]
        filter: String,
    },
    Get {
        log_type: String,
        log_id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ParsersCommand {
    List {
        log_type: String,
        #[command(flatten)]
        page: PageArgs,
        #[arg(long, default_value = "")]
        filter: String,
    },
    Get {
        log_type: String,
        parser_id: String,
    },
    /// Create a parser from a file of parser code
    Create {
        log_type: String,
        #[arg(long)]
        cbn: PathBuf,
        #[arg(long)]
        validated_on_empty_logs: bool,
    },
    Activate {
        log_type: String,
        parser_id: String,
    },
    Deactivate {
        log_type: String,
        parser_id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the stored configuration
    Show,
    /// Store a default (empty value clears it)
    Set { key: String, value: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
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

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Cannot open log file {:?}: {}", log_path, err);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    // CHRONICLE_LOG takes per-module directives, e.g. "chronicle_api::gcp=trace"
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(tracing_level).into())
        .with_env_var("CHRONICLE_LOG")
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("chronicle started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("chronicle").join("chronicle.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".chronicle").join("chronicle.log");
    }
    PathBuf::from("chronicle.log")
}

/// Identifiers and transport settings resolved from flags, env and config
struct Session {
    project: String,
    location: String,
    instance: String,
    endpoint: Url,
    service_account: Option<String>,
    access_token: Option<String>,
    dry_run: bool,
}

impl Session {
    fn resolve(args: &Args, config: &Config) -> Result<Self> {
        let region = args.region.clone().unwrap_or_else(|| config.effective_region());
        let version = args
            .api_version
            .clone()
            .unwrap_or_else(|| config.effective_api_version());
        let endpoint = service_endpoint(&region, &version)
            .with_context(|| format!("Invalid region '{}' or API version '{}'", region, version))?;

        Ok(Self {
            project: args.project.clone().unwrap_or_else(|| config.effective_project()),
            location: args.location.clone().unwrap_or_else(|| config.effective_location()),
            instance: args.instance.clone().unwrap_or_else(|| config.effective_instance()),
            endpoint,
            service_account: args
                .service_account
                .clone()
                .or_else(|| config.effective_service_account()),
            access_token: args.access_token.clone(),
            dry_run: args.dry_run,
        })
    }

    async fn client(&self) -> Result<ChronicleClient> {
        let service_account = self.service_account.as_deref().filter(|sa| !sa.is_empty());
        match &self.access_token {
            Some(token) => {
                let mut tokens = TokenSource::from_access_token(token.as_str());
                if let Some(sa) = service_account {
                    tokens = tokens.impersonate(sa)?;
                }
                ChronicleClient::with_token_source(self.endpoint.clone(), tokens)
            }
            None => ChronicleClient::new(self.endpoint.clone(), service_account).await,
        }
    }

    async fn send(&self, request: Request) -> Result<Value> {
        if self.dry_run {
            return Ok(describe_request(&request));
        }
        self.client().await?.execute(request).await
    }

    async fn send_all<F>(&self, items_key: &str, mut build_page: F) -> Result<Value>
    where
        F: FnMut(&str) -> chronicle_api::Result<Request>,
    {
        if self.dry_run {
            return Ok(describe_request(&build_page("")?));
        }

        let items = self.client().await?.list_all(build_page, items_key).await?;
        let mut map = Map::new();
        map.insert(items_key.to_string(), Value::Array(items));
        Ok(Value::Object(map))
    }

    fn instance(&self) -> Result<InstanceResource> {
        InstanceResource::new(&self.project, &self.location, &self.instance)
            .ok_or_else(missing_identifiers)
    }

    fn log_type(&self, log_type: &str) -> Result<LogTypeResource> {
        LogTypeResource::new(&self.project, &self.location, &self.instance, log_type)
            .ok_or_else(missing_identifiers)
    }

    fn log(&self, log_type: &str, log_id: &str) -> Result<LogResource> {
        LogResource::new(&self.project, &self.location, &self.instance, log_type, log_id)
            .ok_or_else(missing_identifiers)
    }

    fn parser(&self, log_type: &str, parser_id: &str) -> Result<ParserResource> {
        ParserResource::new(&self.project, &self.location, &self.instance, log_type, parser_id)
            .ok_or_else(missing_identifiers)
    }
}

fn missing_identifiers() -> anyhow::Error {
    anyhow::anyhow!(
        "project, location, instance and log type are required. \
         Pass --project/--location/--instance or run 'chronicle config set'"
    )
}

/// Method, URL and decoded body of an unsent request
fn describe_request(request: &Request) -> Value {
    let body = serde_json::from_slice::<Value>(body_bytes(request)).unwrap_or(Value::Null);
    json!({
        "method": request.method().as_str(),
        "url": request.url().as_str(),
        "body": body,
    })
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))
}

/// Every non-empty line of every file is one sample log
fn read_logs(paths: &[PathBuf]) -> Result<Vec<Vec<u8>>> {
    let mut logs = Vec::new();
    for path in paths {
        let content = read_file(path)?;
        logs.extend(
            content
                .split(|b| *b == b'\n')
                .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
                .filter(|line| !line.is_empty())
                .map(<[u8]>::to_vec),
        );
    }
    Ok(logs)
}

fn print_output(value: &Value, format: OutputFormat) -> Result<()> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", text.trim_end());
    Ok(())
}

/// Reads and writes the config file without resolving the service endpoint
fn run_config(command: &ConfigCommand, path: Option<&Path>) -> Result<Value> {
    let mut config = path.map(Config::load_from).unwrap_or_default();
    match command {
        ConfigCommand::Show => {}
        ConfigCommand::Set { key, value } => {
            config.set(key, value)?;
            if let Some(path) = path {
                config.save_to(path)?;
            }
            tracing::info!("Config {} updated", key);
        }
    }
    Ok(serde_json::to_value(&config)?)
}

async fn run(args: &Args, config_path: Option<&Path>) -> Result<Value> {
    if let Command::Config(command) = &args.command {
        return run_config(command, config_path);
    }

    let config = config_path.map(Config::load_from).unwrap_or_default();
    let session = Session::resolve(args, &config)?;
    let endpoint = &session.endpoint;

    match &args.command {
        Command::Config(command) => run_config(command, config_path),
        Command::Instance(InstanceCommand::Get) => {
            session.send(session.instance()?.get(endpoint)?).await
        }
        Command::LogTypes(command) => match command {
            LogTypesCommand::List { page } => {
                let log_types = session.log_type("")?;
                if page.all {
                    session
                        .send_all("logTypes", |token| log_types.list(endpoint, &page.page_size, token))
                        .await
                } else {
                    session
                        .send(log_types.list(endpoint, &page.page_size, &page.page_token)?)
                        .await
                }
            }
            LogTypesCommand::Get { log_type } => {
                session.send(session.log_type(log_type)?.get(endpoint)?).await
            }
            LogTypesCommand::RunParser {
                log_type,
                cbn,
                snippet,
                logs,
                statedump,
            } => {
                let cbn = read_file(cbn)?;
                let snippet = match snippet {
                    Some(path) => read_file(path)?,
                    None => Vec::new(),
                };
                let logs = read_logs(logs)?;
                let request = session
                    .log_type(log_type)?
                    .run_parser(endpoint, &cbn, &snippet, &logs, *statedump)?;
                session.send(request).await
            }
        },
        Command::Logs(command) => match command {
            LogsCommand::List { log_type, page, filter } => {
                let logs = session.log(log_type, "")?;
                if page.all {
                    session
                        .send_all("logs", |token| logs.list(endpoint, &page.page_size, token, filter))
                        .await
                } else {
                    session
                        .send(logs.list(endpoint, &page.page_size, &page.page_token, filter)?)
                        .await
                }
            }
            LogsCommand::Get { log_type, log_id } => {
                session.send(session.log(log_type, log_id)?.get(endpoint)?).await
            }
        },
        Command::Parsers(command) => match command {
            ParsersCommand::List { log_type, page, filter } => {
                let parsers = session.parser(log_type, "")?;
                if page.all {
                    session
                        .send_all("parsers", |token| parsers.list(endpoint, &page.page_size, token, filter))
                        .await
                } else {
                    session
                        .send(parsers.list(endpoint, &page.page_size, &page.page_token, filter)?)
                        .await
                }
            }
            ParsersCommand::Get { log_type, parser_id } => {
                session.send(session.parser(log_type, parser_id)?.get(endpoint)?).await
            }
            ParsersCommand::Create {
                log_type,
                cbn,
                validated_on_empty_logs,
            } => {
                let code = read_file(cbn)?;
                if code.is_empty() {
                    bail!("Parser file {:?} is empty", cbn);
                }
                let request = session
                    .parser(log_type, "")?
                    .with_cbn(code, *validated_on_empty_logs)
                    .create(endpoint)?;
                session.send(request).await
            }
            ParsersCommand::Activate { log_type, parser_id } => {
                session.send(session.parser(log_type, parser_id)?.activate(endpoint)?).await
            }
            ParsersCommand::Deactivate { log_type, parser_id } => {
                session.send(session.parser(log_type, parser_id)?.deactivate(endpoint)?).await
            }
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let output = args.output;

    let _log_guard = setup_logging(args.log_level);

    match run(&args, Config::config_path().as_deref()).await {
        Ok(value) => print_output(&value, output),
        Err(err) => {
            tracing::error!("{:?}", err);
            if err.chain().any(|e| e.to_string().starts_with("API request failed")) {
                eprintln!("Error: {}", format_api_error(&err));
            } else {
                eprintln!("Error: {:#}", err);
            }
            std::process::exit(1);
        }
    }
}
