//! Harper CLI Entry Point
//!
//! Thin command-line wrapper over the `harper` library. Every subcommand
//! builds a session (profile, then flags), runs one operation and prints a
//! single JSON envelope to stdout. Logs go to stderr (`HARPER_LOG` filter).

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use harper::{
    config, AdminCommand, AdminOperation, BulkAction, ConfigLocation, ErrorEnvelope, ErrorInfo,
    HarperError, Metadata, Session, StoredProfile, SuccessEnvelope,
};

/// Harper - HarperDB operations API client
#[derive(Parser)]
#[command(name = "harper")]
#[command(about = "Client for the HarperDB single-endpoint operations API")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    conn: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Named profile from .harper/config.json or ~/.config/harper/profiles.json
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Endpoint URL (overrides the profile)
    #[arg(long, global = true, env = "HARPER_URL")]
    url: Option<String>,

    /// Default schema (overrides the profile)
    #[arg(long, global = true)]
    schema: Option<String>,

    /// Bearer token (overrides the profile)
    #[arg(long, global = true, env = "HARPER_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Echo request and response bodies to stderr
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage connection profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    #[command(flatten)]
    Remote(RemoteCommand),
}

/// Subcommands that talk to the server
#[derive(Subcommand)]
enum RemoteCommand {
    /// Issue operation and refresh tokens
    Token {
        #[arg(long)]
        username: Option<String>,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Run an administrative operation (create_table, add_user, ...)
    Admin(AdminArgs),

    /// Insert records (JSON array or single object)
    Insert(RecordArgs),

    /// Update records (JSON array or single object)
    Update(RecordArgs),

    /// Upsert records (JSON array or single object)
    Upsert(RecordArgs),

    /// Delete records by identifier
    Delete {
        #[arg(long)]
        table: String,
        #[arg(long = "id", required = true)]
        ids: Vec<String>,
    },

    /// Fetch records by identifier
    Get {
        #[arg(long)]
        table: String,
        #[arg(long = "id", required = true)]
        ids: Vec<String>,
    },

    /// Fetch records by attribute value
    Search {
        #[arg(long)]
        table: String,
        #[arg(long)]
        attribute: String,
        #[arg(long)]
        value: String,
    },

    /// Run a SQL statement; SELECT returns rows, others a mutation result
    Sql { statement: String },

    /// Bulk load a CSV file, prints the job identifier
    LoadCsv {
        #[arg(long)]
        table: String,
        /// insert, update or upsert
        #[arg(long, default_value = "insert")]
        action: String,
        #[arg(long)]
        file: PathBuf,
    },

    /// Show the status of an asynchronous job
    Job { id: String },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Save a profile (the first one saved becomes the default)
    Save {
        #[arg(long)]
        name: String,
        #[arg(long = "profile-url")]
        profile_url: Option<String>,
        #[arg(long = "profile-schema")]
        profile_schema: Option<String>,
        #[arg(long)]
        username: Option<String>,
        /// Environment variable holding the token
        #[arg(long)]
        token_env: Option<String>,
        /// Save to the per-user config instead of .harper/config.json
        #[arg(long)]
        global: bool,
    },

    /// List profiles from local and global config
    List,
}

#[derive(Args)]
struct AdminArgs {
    /// Operation name, e.g. create_schema, describe_table, add_user
    #[arg(long)]
    operation: String,
    #[arg(long = "target-schema")]
    target_schema: Option<String>,
    #[arg(long)]
    table: Option<String>,
    #[arg(long)]
    attribute: Option<String>,
    #[arg(long)]
    hash_attribute: Option<String>,
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[arg(long)]
    active: Option<bool>,
}

#[derive(Args)]
struct RecordArgs {
    #[arg(long)]
    table: String,
    /// Inline JSON
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    records: Option<String>,
    /// File containing JSON
    #[arg(long)]
    file: Option<PathBuf>,
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Profile { .. } => "profile",
            Self::Remote(command) => command.name(),
        }
    }

    const fn is_read(&self) -> bool {
        matches!(
            self,
            Self::Remote(
                RemoteCommand::Get { .. } | RemoteCommand::Search { .. } | RemoteCommand::Sql { .. }
            )
        )
    }
}

impl RemoteCommand {
    const fn name(&self) -> &'static str {
        match self {
            Self::Token { .. } => "token",
            Self::Admin(_) => "admin",
            Self::Insert(_) => "insert",
            Self::Update(_) => "update",
            Self::Upsert(_) => "upsert",
            Self::Delete { .. } => "delete",
            Self::Get { .. } => "get",
            Self::Search { .. } => "search",
            Self::Sql { .. } => "sql",
            Self::LoadCsv { .. } => "load-csv",
            Self::Job { .. } => "job",
        }
    }
}

/// Target of the wire echo; events there are only emitted in debug mode
const WIRE_DIRECTIVE: &str = "harper::wire=info";

/// Log filter directives: `HARPER_LOG` (default `warn`) plus the wire echo
fn log_directives(env: Option<&str>) -> String {
    let base = env.map(str::trim).filter(|d| !d.is_empty()).unwrap_or("warn");
    format!("{base},{WIRE_DIRECTIVE}")
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let env_directives = std::env::var("HARPER_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_directives(env_directives.as_deref())))
        .with_writer(std::io::stderr)
        .init();

    let operation = cli.command.name();
    let started = Instant::now();

    match run(&cli) {
        Ok(data) => {
            let elapsed = started.elapsed().as_millis() as u64;
            let meta = match &data {
                Value::Array(rows) if cli.command.is_read() => {
                    Metadata::with_records(elapsed, rows.len())
                }
                _ => Metadata::new(elapsed),
            };
            print_json(&SuccessEnvelope::new(operation, data, meta));
            ExitCode::SUCCESS
        }
        Err(err) => {
            let envelope = match err.downcast_ref::<HarperError>() {
                Some(harper_err) => ErrorEnvelope::from_error(operation, harper_err),
                None => ErrorEnvelope::new(
                    operation,
                    ErrorInfo::new("INVALID_INPUT", format!("{err:#}")),
                ),
            };
            print_json(&envelope);
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{json}"),
        Err(e) => println!(
            r#"{{"ok": false, "error": {{"code": "ENCODING_ERROR", "message": "{}"}}}}"#,
            e.to_string().replace('"', "'")
        ),
    }
}

fn run(cli: &Cli) -> anyhow::Result<Value> {
    match &cli.command {
        Commands::Profile { action } => run_profile(action),
        Commands::Remote(command) => {
            let (session, username) = build_session(&cli.conn)?;
            run_remote(command, &session, username)
        }
    }
}

fn run_remote(
    command: &RemoteCommand,
    session: &Session,
    profile_username: Option<String>,
) -> anyhow::Result<Value> {
    let data = match command {
        RemoteCommand::Token { username, password } => {
            let username = username
                .clone()
                .or(profile_username)
                .context("--username is required when the profile has none")?;
            let password = match password {
                Some(p) => p.clone(),
                None => dialoguer::Password::new()
                    .with_prompt(format!("Password for {username}"))
                    .interact()
                    .context("failed to read password")?,
            };
            serde_json::to_value(session.create_authentication_tokens(&username, &password)?)?
        }
        RemoteCommand::Admin(args) => {
            let mut admin = AdminCommand::new(AdminOperation::from_name(&args.operation));
            admin.schema = args.target_schema.clone();
            admin.table = args.table.clone();
            admin.attribute = args.attribute.clone();
            admin.hash_attribute = args.hash_attribute.clone();
            admin.role = args.role.clone();
            admin.username = args.username.clone();
            admin.password = args.password.clone();
            admin.active = args.active;
            admin.process_as::<Value>(session)?
        }
        RemoteCommand::Insert(args) => {
            serde_json::to_value(session.insert(&args.table, read_records(args)?)?)?
        }
        RemoteCommand::Update(args) => {
            serde_json::to_value(session.update(&args.table, read_records(args)?)?)?
        }
        RemoteCommand::Upsert(args) => {
            serde_json::to_value(session.upsert(&args.table, read_records(args)?)?)?
        }
        RemoteCommand::Delete { table, ids } => serde_json::to_value(session.delete(table, ids)?)?,
        RemoteCommand::Get { table, ids } => session.get::<Value, _, _>(table, ids)?,
        RemoteCommand::Search { table, attribute, value } => {
            session.search_by_value::<Value>(table, attribute, value.as_str())?
        }
        RemoteCommand::Sql { statement } => {
            if is_select(statement) {
                session.select::<Value>(statement)?
            } else {
                serde_json::to_value(session.execute_sql(statement)?)?
            }
        }
        RemoteCommand::LoadCsv { table, action, file } => {
            let action: BulkAction = action.parse()?;
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(file)
                .with_context(|| format!("failed to open {}", file.display()))?;
            let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
            let job_id = session.csv_data_load(table, action, rows.iter())?;
            serde_json::json!({ "job_id": job_id })
        }
        RemoteCommand::Job { id } => serde_json::to_value(session.get_job(id)?)?,
    };

    Ok(data)
}

fn run_profile(action: &ProfileAction) -> anyhow::Result<Value> {
    match action {
        ProfileAction::Save { name, profile_url, profile_schema, username, token_env, global } => {
            let profile = StoredProfile {
                url: profile_url.clone(),
                schema: profile_schema.clone(),
                username: username.clone(),
                token_env: token_env.clone(),
                debug: None,
            };
            let location = if *global { ConfigLocation::Global } else { ConfigLocation::Local };
            config::save_profile(name, profile, location)?;
            Ok(serde_json::json!({ "saved": name }))
        }
        ProfileAction::List => {
            let profiles: Vec<Value> = config::list_profiles()?
                .into_iter()
                .map(|(name, profile, is_default)| {
                    serde_json::json!({ "name": name, "profile": profile, "default": is_default })
                })
                .collect();
            Ok(Value::Array(profiles))
        }
    }
}

/// Build the session: profile first, explicit flags on top
fn build_session(conn: &ConnectionArgs) -> anyhow::Result<(Session, Option<String>)> {
    let profile = match &conn.profile {
        Some(name) => Some(config::resolve_profile(Some(name))?),
        // No default profile is fine when flags carry everything
        None => config::resolve_default_profile()?,
    };

    let mut builder = Session::builder();
    let mut username = None;
    if let Some(profile) = &profile {
        builder = profile.apply(builder);
        username = profile.username.clone();
    }
    if let Some(url) = &conn.url {
        builder = builder.endpoint(url.clone());
    }
    if let Some(schema) = &conn.schema {
        builder = builder.schema(schema.clone());
    }
    if let Some(token) = &conn.token {
        builder = builder.auth_token(token.clone());
    }
    if conn.debug {
        builder = builder.debug(true);
    }

    Ok((builder.build()?, username))
}

/// Records from inline JSON or a file; a single object becomes one record
fn read_records(args: &RecordArgs) -> anyhow::Result<Vec<Value>> {
    let text = match (&args.records, &args.file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => bail!("either --records or --file is required"),
    };

    match serde_json::from_str::<Value>(&text).context("records are not valid JSON")? {
        Value::Array(records) => Ok(records),
        record @ Value::Object(_) => Ok(vec![record]),
        _ => bail!("records must be a JSON object or an array of objects"),
    }
}

fn is_select(statement: &str) -> bool {
    statement.trim_start().get(..6).is_some_and(|head| head.eq_ignore_ascii_case("select"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    use harper::{DebugSink, Direction, TracingSink};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logs_with(directives: &str, emit: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(directives))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, emit);
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_log_directives_default_and_env() {
        assert_eq!(log_directives(None), "warn,harper::wire=info");
        assert_eq!(log_directives(Some("  ")), "warn,harper::wire=info");
        assert_eq!(log_directives(Some("harper=debug")), "harper=debug,harper::wire=info");
    }

    #[test]
    fn test_wire_echo_passes_default_filter() {
        let logs = logs_with(&log_directives(None), || {
            TracingSink.emit(Direction::Request, r#"{"operation": "sql"}"#);
            tracing::info!(target: "harper::transport", "sending command");
        });

        assert!(logs.contains("--- REQUEST ---"));
        assert!(logs.contains(r#""operation": "sql""#));
        assert!(!logs.contains("sending command"));
    }

    #[test]
    fn test_is_select() {
        assert!(is_select("  SELECT * FROM dev.dog"));
        assert!(is_select("select 1"));
        assert!(!is_select("DELETE FROM dev.dog"));
        assert!(!is_select("sel"));
    }

    #[test]
    fn test_cli_parses_remote_and_profile_commands() {
        let cli = Cli::try_parse_from(["harper", "--debug", "sql", "select 1"]).unwrap();
        assert!(cli.conn.debug);
        assert_eq!(cli.command.name(), "sql");
        assert!(cli.command.is_read());

        let cli = Cli::try_parse_from(["harper", "profile", "list"]).unwrap();
        assert_eq!(cli.command.name(), "profile");
        assert!(!cli.command.is_read());
    }
}
