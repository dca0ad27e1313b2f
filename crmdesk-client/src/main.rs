use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

use crmdesk_client::config::{ClientConfig, SessionBackend, SessionSettings};
use crmdesk_client::helpers::session::{
    KeyringSessionStore, LogRedirect, MemorySessionStore, SessionKey, SessionStore,
};
use crmdesk_client::hooks::{CrmHooks, JtbdHooks};
use crmdesk_client::integrations::InMemoryJtbdRepository;
use crmdesk_client::{ApiClient, ClientError, QueryClient};
use insights::jtbd::{JtbdFilters, JtbdSort, SortDirection, SortField, DEFAULT_URGENCY_DAYS};
use shared_types::{
    ActionType, ContactListParams, GoalType, LogFilters, LogLevel, Priority, StagingRecordParams,
    StagingStatus, TransactionFilters, TransactionType,
};

const KEYRING_SERVICE: &str = "crmdesk";

#[derive(Parser, Debug)]
#[command(name = "crmdesk", author, version, about = "Command line client for the CRM API", long_about = None)]
struct Cli {
    #[arg(long)]
    log_file_path: Option<String>,

    /// Config file to use instead of the one in the user config directory
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Browse and search contacts
    Contacts {
        #[command(subcommand)]
        command: ContactCommands,
    },
    /// Read operational logs
    Logs {
        #[command(subcommand)]
        command: LogCommands,
    },
    /// Inspect bulk import runs
    Imports {
        #[command(subcommand)]
        command: ImportCommands,
    },
    /// Browse financial transactions
    Transactions {
        #[command(subcommand)]
        command: TransactionCommands,
    },
    /// Goal tracking insights
    Jtbd {
        /// JSON file with goal tracking records; the built-in sample data is used otherwise
        #[arg(long, value_name = "PATH", global = true)]
        data: Option<PathBuf>,

        #[command(subcommand)]
        command: JtbdCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ContactCommands {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        active: Option<bool>,
        #[arg(long)]
        customer: Option<bool>,
        #[arg(long)]
        skip: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    Show {
        id: i64,
    },
    Search {
        query: String,
    },
    Stats,
}

#[derive(Subcommand, Debug)]
enum LogCommands {
    List {
        #[arg(long)]
        level: Option<LogLevel>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long, default_value_t = 24)]
        hours: u32,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 50)]
        page_size: u32,
    },
    Stats,
    /// Delete entries older than the given number of days
    Cleanup {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
}

#[derive(Subcommand, Debug)]
enum ImportCommands {
    Sessions,
    Records {
        session_id: String,
        #[arg(long, value_parser = parse_variant::<StagingStatus>)]
        status: Option<StagingStatus>,
        #[arg(long)]
        offset: Option<u64>,
        #[arg(long)]
        limit: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
enum TransactionCommands {
    List {
        #[arg(long)]
        customer_id: Option<i64>,
        #[arg(long)]
        scheme: Option<String>,
        #[arg(long = "type", value_parser = parse_variant::<TransactionType>)]
        transaction_type: Option<TransactionType>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        include_duplicates: bool,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
    },
    Show {
        id: i64,
    },
    Summary,
}

#[derive(Subcommand, Debug)]
enum JtbdCommands {
    List {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, value_enum, default_value_t = SortArg::Priority)]
        sort: SortArg,
        #[arg(long)]
        desc: bool,
    },
    Metrics {
        #[command(flatten)]
        filters: FilterArgs,
    },
    Urgent {
        #[arg(long, default_value_t = DEFAULT_URGENCY_DAYS)]
        days: i64,
    },
    Health {
        customer_id: String,
    },
    /// Progress of one customer's goal, or an overview of every goal
    Goals {
        customer_id: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    #[arg(long = "priority")]
    priorities: Vec<Priority>,
    #[arg(long = "action-type")]
    action_types: Vec<ActionType>,
    #[arg(long = "goal-type")]
    goal_types: Vec<GoalType>,
    #[arg(long)]
    on_track_only: bool,
    #[arg(long)]
    has_deadline: bool,
}

impl From<FilterArgs> for JtbdFilters {
    fn from(args: FilterArgs) -> Self {
        JtbdFilters {
            priorities: args.priorities,
            action_types: args.action_types,
            goal_types: args.goal_types,
            on_track_only: args.on_track_only,
            has_deadline: args.has_deadline,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    Priority,
    Deadline,
    Value,
    Impact,
}

impl From<SortArg> for SortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Priority => SortField::Priority,
            SortArg::Deadline => SortField::Deadline,
            SortArg::Value => SortField::Value,
            SortArg::Impact => SortField::Impact,
        }
    }
}

/// Parses a snake_case variant name the way the API spells it
fn parse_variant<T: DeserializeOwned>(value: &str) -> std::result::Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| format!("unknown value '{}'", value))
}

/// The returned guard flushes the log file when dropped; keep it alive until exit
fn init_tracing(log_file_path: Option<&str>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file_path {
        let log_path = std::path::Path::new(log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("crmdesk.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        None
    }
}

/// Builds the configured session store and seeds it with any values set in
/// the config file
fn build_session_store(settings: &SessionSettings) -> Arc<dyn SessionStore> {
    let store: Arc<dyn SessionStore> = match settings.backend {
        SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
        SessionBackend::Keyring => Arc::new(KeyringSessionStore::new(KEYRING_SERVICE)),
    };

    for (key, value) in [
        (SessionKey::Token, &settings.token),
        (SessionKey::TenantId, &settings.tenant_id),
        (SessionKey::Environment, &settings.environment),
    ] {
        if let Some(value) = value {
            store.set(key, value.clone());
        }
    }
    store
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file_path.as_deref());

    let (config, config_path) = match &cli.config {
        Some(path) => (
            ClientConfig::load_from(path).context("Failed to load config")?,
            path.clone(),
        ),
        None => ClientConfig::load().context("Failed to load config")?,
    };
    tracing::debug!("Using config at {:?}", config_path);

    let queries = QueryClient::new(config.cache.query_options());

    let outcome = match cli.command {
        Commands::Jtbd { data, command } => {
            let repository = match data {
                Some(path) => InMemoryJtbdRepository::from_json_file(&path)?,
                None => InMemoryJtbdRepository::with_sample_data()?,
            };
            let hooks = JtbdHooks::new(Arc::new(repository), queries);
            run_jtbd(&hooks, command).await
        }
        Commands::Contacts { command } => run_contacts(&connect(&config, queries)?, command).await,
        Commands::Logs { command } => run_logs(&connect(&config, queries)?, command).await,
        Commands::Imports { command } => run_imports(&connect(&config, queries)?, command).await,
        Commands::Transactions { command } => {
            run_transactions(&connect(&config, queries)?, command).await
        }
    };

    if let Err(err) = &outcome {
        notify(err);
    }
    outcome
}

/// Surfaces client failures on stderr; a 401 has already logged the redirect.
fn notify(err: &anyhow::Error) {
    if let Some(client_err) = err.downcast_ref::<ClientError>() {
        if client_err.is_user_facing() {
            eprintln!("error: {}", client_err);
        }
    }
}

fn connect(config: &ClientConfig, queries: QueryClient) -> Result<CrmHooks> {
    let session = build_session_store(&config.session);
    let api = ApiClient::from_settings(&config.api, session, Arc::new(LogRedirect))?;
    tracing::info!("Talking to {}", api.base_url());
    Ok(CrmHooks::new(api, queries))
}

async fn run_contacts(hooks: &CrmHooks, command: ContactCommands) -> Result<()> {
    match command {
        ContactCommands::List {
            search,
            active,
            customer,
            skip,
            limit,
        } => {
            let params = ContactListParams {
                search,
                is_active: active,
                is_customer: customer,
                skip,
                limit,
            };
            print_json(&hooks.contacts.use_contacts(&params).await?)
        }
        ContactCommands::Show { id } => print_json(&hooks.contacts.use_contact(id).await?),
        ContactCommands::Search { query } => {
            print_json(&hooks.contacts.use_contact_search(&query).await)
        }
        ContactCommands::Stats => print_json(&*hooks.contacts.use_contact_stats().await?),
    }
}

async fn run_logs(hooks: &CrmHooks, command: LogCommands) -> Result<()> {
    match command {
        LogCommands::List {
            level,
            source,
            hours,
            page,
            page_size,
        } => {
            let filters = LogFilters {
                level,
                source,
                hours,
                page,
                page_size,
            };
            print_json(&*hooks.logs.use_logs(&filters).await?)
        }
        LogCommands::Stats => print_json(&*hooks.logs.use_log_stats().await?),
        LogCommands::Cleanup { days } => print_json(&hooks.logs.cleanup_logs(days).await?),
    }
}

async fn run_imports(hooks: &CrmHooks, command: ImportCommands) -> Result<()> {
    match command {
        ImportCommands::Sessions => {
            let sessions = hooks.imports.use_import_sessions().await?;
            let overview = hooks.imports.use_import_overview().await?;
            print_json(&serde_json::json!({
                "sessions": sessions.sessions,
                "total": sessions.total,
                "overview": overview,
            }))
        }
        ImportCommands::Records {
            session_id,
            status,
            offset,
            limit,
        } => {
            let params = StagingRecordParams {
                status,
                offset,
                limit,
            };
            print_json(&*hooks.imports.use_staging_records(&session_id, &params).await?)
        }
    }
}

async fn run_transactions(hooks: &CrmHooks, command: TransactionCommands) -> Result<()> {
    match command {
        TransactionCommands::List {
            customer_id,
            scheme,
            transaction_type,
            from,
            to,
            include_duplicates,
            page,
            page_size,
        } => {
            let filters = TransactionFilters {
                customer_id,
                scheme_name: scheme,
                transaction_type,
                start_date: from,
                end_date: to,
                include_duplicates: include_duplicates.then_some(true),
                page,
                page_size,
            };
            print_json(&*hooks.transactions.use_transactions(&filters).await?)
        }
        TransactionCommands::Show { id } => {
            print_json(&*hooks.transactions.use_transaction(id).await?)
        }
        TransactionCommands::Summary => {
            print_json(&*hooks.transactions.use_transaction_summary().await?)
        }
    }
}

async fn run_jtbd(hooks: &JtbdHooks, command: JtbdCommands) -> Result<()> {
    match command {
        JtbdCommands::List {
            filters,
            sort,
            desc,
        } => {
            let sort = JtbdSort {
                field: sort.into(),
                direction: if desc {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                },
            };
            print_json(&hooks.use_jtbd_data(&filters.into(), sort).await?)
        }
        JtbdCommands::Metrics { filters } => {
            print_json(&hooks.use_jtbd_metrics(&filters.into()).await?)
        }
        JtbdCommands::Urgent { days } => print_json(&hooks.use_urgent_actions(days).await?),
        JtbdCommands::Health { customer_id } => {
            print_json(&hooks.use_customer_health(&customer_id).await?)
        }
        JtbdCommands::Goals { customer_id } => match customer_id {
            Some(id) => print_json(&hooks.use_goal_progress(&id).await?),
            None => print_json(&hooks.use_goals_overview().await?),
        },
    }
}
