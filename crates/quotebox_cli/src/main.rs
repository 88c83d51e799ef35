//! Command-line front end for `quotebox_core`.
//!
//! # Responsibility
//! - Map subcommands onto `QuoteSession` operations.
//! - Print rendered quotes and queued notices; nothing else is decided here.

use clap::{Parser, Subcommand};
use log::info;
use quotebox_core::config::{DEFAULT_ENDPOINT, DEFAULT_FETCH_LIMIT};
use quotebox_core::model::preference::SortOrder;
use quotebox_core::transfer::export_file_name;
use quotebox_core::{
    core_version, default_log_level, init_logging, start_auto_sync, FilterPreference,
    HttpRemoteSource, KeyValueStore, LogLevel, MemoryKeyValueStore, NewQuote, Notice,
    PersistenceAdapter,
    QuoteError, QuoteResult, QuoteSession, RemoteSyncAdapter, ResolutionPolicy, SharedSession,
    SqliteKeyValueStore, StorageError, SyncConfig,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

type CliResult<T> = Result<T, Box<dyn Error>>;

const WATCH_POLL: Duration = Duration::from_millis(200);

#[derive(Parser)]
#[command(name = "quotebox", about = "Random quotes with local storage and remote sync", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite file holding quotes and preferences
    #[arg(long, global = true, env = "QUOTEBOX_DB", default_value = "quotebox.db")]
    db: PathBuf,

    /// Keep everything in memory; nothing is written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Directory for rolling log files; logging is off when omitted
    #[arg(long, global = true, env = "QUOTEBOX_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error; defaults to debug or info by build mode
    #[arg(long, global = true, value_parser = LogLevel::parse)]
    log_level: Option<LogLevel>,

    /// Remote posts endpoint used by sync and push
    #[arg(long, global = true, env = "QUOTEBOX_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Number of remote posts fetched per sync
    #[arg(long, global = true, default_value_t = DEFAULT_FETCH_LIMIT)]
    fetch_limit: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a random quote from the active category
    Show,

    /// List quotes
    List {
        /// Category to list instead of the saved filter
        #[arg(long, short)]
        category: Option<String>,

        /// random|newest|oldest|author
        #[arg(long, short, value_parser = SortOrder::parse)]
        sort: Option<SortOrder>,
    },

    /// List known categories
    Categories,

    /// Add a quote
    Add {
        text: String,

        #[arg(long, short)]
        author: Option<String>,

        #[arg(long, short, default_value = "General")]
        category: String,
    },

    /// Remove a quote by id
    Remove { id: i64 },

    /// Save the category filter and sort order, then show a quote
    Filter {
        /// Category label, or `all`
        category: String,

        #[arg(long, short, value_parser = SortOrder::parse, default_value = "random")]
        sort: SortOrder,
    },

    /// Import quotes from a JSON file
    Import { path: PathBuf },

    /// Export all quotes to a JSON file
    Export {
        /// Output path; defaults to quotes-export-YYYY-MM-DD.json
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Fetch remote quotes and merge them into the store
    Sync {
        /// server-wins|local-wins|merge
        #[arg(long, short, value_parser = ResolutionPolicy::parse, default_value = "server-wins")]
        policy: ResolutionPolicy,

        /// Only report the classification; leave the store untouched
        #[arg(long)]
        dry_run: bool,
    },

    /// Push locally created quotes to the remote endpoint
    Push,

    /// Run auto-sync in the foreground for a number of cycles
    Watch {
        #[arg(long, default_value_t = 30)]
        interval_secs: u64,

        #[arg(long, default_value_t = 3)]
        cycles: u64,

        #[arg(long, short, value_parser = ResolutionPolicy::parse, default_value = "server-wins")]
        policy: ResolutionPolicy,
    },

    /// Show quote and category counts
    Stats,

    /// Clear stored data and reload the default quotes
    Reset,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    if let Some(log_dir) = &cli.log_dir {
        init_logging(cli.log_level.unwrap_or_else(default_log_level), log_dir)?;
    }

    let config = SyncConfig {
        endpoint: cli.endpoint.clone(),
        fetch_limit: cli.fetch_limit,
        ..SyncConfig::default()
    }
    .validate()?;

    let mut session = open_session(&cli, &config)?;
    info!(
        "event=cli_command module=cli status=start session_id={} version={}",
        session.session_id(),
        core_version()
    );

    if let Commands::Watch {
        interval_secs,
        cycles,
        policy,
    } = cli.command
    {
        print_notices(&mut session);
        let config = SyncConfig {
            interval: Duration::from_secs(interval_secs),
            policy,
            ..config
        }
        .validate()?;
        return watch(session, &config, cycles);
    }

    // Operation failures are reported like any other notice.
    if let Err(err) = execute(&mut session, cli.command) {
        eprintln!("{}", Notice::from_error(&err));
    }
    print_notices(&mut session);
    Ok(())
}

fn execute(session: &mut QuoteSession, command: Commands) -> QuoteResult<()> {
    let mut rng = rand::thread_rng();
    match command {
        Commands::Show => println!("{}", session.show_random_quote(&mut rng)),
        Commands::List { category, sort } => {
            let current = session.preference().clone();
            let preference = FilterPreference::new(
                category.unwrap_or(current.category),
                sort.unwrap_or(current.sort_order),
            );
            for quote in session.store().sorted(&preference, &mut rng) {
                println!(
                    "{:>14}  [{}] \"{}\" - {} ({})",
                    quote.id,
                    quote.category,
                    quote.text,
                    quote.author_or_unknown(),
                    quote.source.as_str()
                );
            }
        }
        Commands::Categories => {
            for category in session.categories() {
                println!("{category}");
            }
        }
        Commands::Add {
            text,
            author,
            category,
        } => {
            let id = session.add_quote(&NewQuote::new(text, author.as_deref(), category))?;
            println!("added {id}");
        }
        Commands::Remove { id } => {
            session.remove_quote(id)?;
        }
        Commands::Filter { category, sort } => {
            session.apply_filter(FilterPreference::new(category, sort));
            println!("{}", session.show_random_quote(&mut rng));
        }
        Commands::Import { path } => {
            let input = std::fs::read_to_string(&path).map_err(|err| {
                QuoteError::Import(format!("cannot read `{}`: {err}", path.display()))
            })?;
            let report = session.import_json(&input)?;
            println!(
                "imported={} duplicates={} invalid={}",
                report.imported_count(),
                report.duplicates,
                report.invalid
            );
        }
        Commands::Export { out } => {
            let path = out.unwrap_or_else(|| {
                PathBuf::from(export_file_name(time::OffsetDateTime::now_utc()))
            });
            std::fs::write(&path, session.export_json()?).map_err(|err| {
                StorageError::Unavailable(format!("cannot write `{}`: {err}", path.display()))
            })?;
            println!("exported to {}", path.display());
        }
        Commands::Sync { policy, dry_run } => {
            let review = session.review_remote()?;
            println!(
                "conflicts={} new_remote={} local_only={}",
                review.conflicts.len(),
                review.new_remote_only.len(),
                review.local_only.len()
            );
            if !dry_run {
                let report = session.resolve_pending(policy)?;
                println!("policy={} total={}", report.policy.as_str(), report.total);
            }
        }
        Commands::Push => {
            let pushed = session.push_local();
            println!("pushed {pushed}");
        }
        Commands::Stats => {
            let stats = session.stats();
            println!(
                "total={} filtered={} categories={} sync_state={}",
                stats.total,
                stats.filtered,
                stats.categories,
                session.sync_state().as_str()
            );
        }
        Commands::Reset => session.reset_to_defaults(),
        Commands::Watch { .. } => {}
    }
    Ok(())
}

fn open_session(cli: &Cli, config: &SyncConfig) -> CliResult<QuoteSession> {
    let durable: Box<dyn KeyValueStore> = if cli.ephemeral {
        Box::new(SqliteKeyValueStore::open_in_memory()?)
    } else {
        Box::new(SqliteKeyValueStore::open(&cli.db)?)
    };
    let persistence = PersistenceAdapter::new(durable, Box::new(MemoryKeyValueStore::new()));
    let remote = RemoteSyncAdapter::new(Arc::new(HttpRemoteSource::new(config)));
    Ok(QuoteSession::open(persistence, remote))
}

/// Runs auto-sync until `cycles` ticks have completed, then disables it.
fn watch(session: QuoteSession, config: &SyncConfig, cycles: u64) -> CliResult<()> {
    let shared = session.into_shared();
    run_watch(&shared, config, cycles, WATCH_POLL, |notices| {
        for notice in notices {
            eprintln!("{notice}");
        }
    })?;
    Ok(())
}

/// Hands queued notices to `emit` on every poll while auto-sync runs.
fn run_watch(
    shared: &SharedSession,
    config: &SyncConfig,
    cycles: u64,
    poll: Duration,
    mut emit: impl FnMut(Vec<Notice>),
) -> std::io::Result<()> {
    let mut handle = start_auto_sync(shared, config)?;
    loop {
        let in_flight = drain_shared(shared, &mut emit);
        if handle.ticks() >= cycles && !in_flight {
            break;
        }
        std::thread::sleep(poll);
    }
    handle.stop();
    drain_shared(shared, &mut emit);
    Ok(())
}

/// Emits queued notices; returns whether a sync cycle is still running.
fn drain_shared(shared: &SharedSession, emit: &mut impl FnMut(Vec<Notice>)) -> bool {
    let mut session = shared.lock().unwrap_or_else(PoisonError::into_inner);
    let notices = session.drain_notices();
    if !notices.is_empty() {
        emit(notices);
    }
    session.sync_state().is_in_flight()
}

fn print_notices(session: &mut QuoteSession) {
    for notice in session.drain_notices() {
        eprintln!("{notice}");
    }
}

#[cfg(test)]
mod tests {
    use super::run_watch;
    use quotebox_core::{
        MemoryKeyValueStore, NetworkError, PersistenceAdapter, Quote, QuoteId, QuoteSession,
        RemoteQuoteSource, RemoteSyncAdapter, SqliteKeyValueStore, SyncConfig,
    };
    use std::sync::Arc;
    use std::time::Duration;

    struct EmptyRemote;

    impl RemoteQuoteSource for EmptyRemote {
        fn source_id(&self) -> &str {
            "empty"
        }

        fn fetch(&self) -> Result<Vec<Quote>, NetworkError> {
            Ok(Vec::new())
        }

        fn push(&self, _quotes: &[Quote]) -> Result<Vec<QuoteId>, NetworkError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn watch_emits_notices_while_cycles_are_still_running() {
        let durable = SqliteKeyValueStore::open_in_memory().expect("in-memory db");
        let persistence =
            PersistenceAdapter::new(Box::new(durable), Box::new(MemoryKeyValueStore::new()));
        let mut session =
            QuoteSession::open(persistence, RemoteSyncAdapter::new(Arc::new(EmptyRemote)));
        session.drain_notices();
        let shared = session.into_shared();
        let config = SyncConfig {
            interval: Duration::from_millis(80),
            ..SyncConfig::default()
        };

        let mut batches = Vec::new();
        run_watch(&shared, &config, 3, Duration::from_millis(5), |notices| {
            batches.push(notices.len())
        })
        .expect("auto-sync thread starts");

        assert!(batches.len() >= 2, "notices arrived in {batches:?}");
        assert!(batches.iter().sum::<usize>() >= 3);
    }
}
