//! Application startup and the ingestion run
//!
//! Startup order: arguments, configuration file, logging, then the pipeline.
//! The key format is compiled before any connection is made so that a bad
//! format fails fast.

use super::cli::config::load_config_file;
use super::cli::{Args, ConfigError, LogSettings, Settings};
use crate::core::error_handling::{log_error_with_context, ContextualError};
use crate::core::logging::{init_logging, level_for_verbosity};
use crate::core::retry::{retry_async, RetryPolicy};
use crate::core::shutdown::ShutdownCoordinator;
use crate::ingest::{ListHandler, COUNTERS};
use crate::queue::{feed_lines, ConsumerSummary, MemoryQueue, QueueConsumer, QueueError};
use crate::stats::{LogSink, Stats, StatsSnapshot};
use crate::store::{mask_url, ListStore, MemoryListStore, RedisListStore, StoreError};
use crate::template::{KeyTemplate, TemplateSyntaxError};
use clap::Parser;
use std::io::IsTerminal;
use std::sync::Arc;
use tokio::io::AsyncBufRead;

/// Failures that stop the process before or while the pipeline starts
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid key format '{format}': {source}")]
    InvalidFormat {
        format: String,
        #[source]
        source: TemplateSyntaxError,
    },

    /// `url` is already masked
    #[error("connecting to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Input(QueueError),
}

impl StartupError {
    /// Operation shown for errors that are not user actionable
    pub fn operation(&self) -> &'static str {
        match self {
            StartupError::Config(_) => "Loading configuration",
            StartupError::InvalidFormat { .. } => "Compiling key format",
            StartupError::Connect { .. } => "Connecting to Redis",
            StartupError::Input(_) => "Reading input",
        }
    }
}

impl ContextualError for StartupError {
    fn is_user_actionable(&self) -> bool {
        match self {
            StartupError::Config(ConfigError::Read { .. }) => false,
            StartupError::Config(_)
            | StartupError::InvalidFormat { .. }
            | StartupError::Connect { .. }
            | StartupError::Input(_) => true,
        }
    }

    fn user_message(&self) -> Option<String> {
        self.is_user_actionable().then(|| self.to_string())
    }
}

/// Outcome of one ingestion run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Messages read from the input, when the input was read to the end
    pub input: Option<u64>,
    pub consumer: ConsumerSummary,
    /// Final counter values
    pub stats: StatsSnapshot,
}

/// Entry point used by the binary; returns the process exit code
pub async fn startup() -> i32 {
    let args = Args::parse();

    let settings = match load_settings(args.clone()).await {
        Ok(settings) => settings,
        Err(e) => {
            // Config never resolved: log with what the command line gave us
            let fallback = LogSettings {
                level: level_for_verbosity(
                    args.log_level.as_deref().unwrap_or("info"),
                    args.verbosity(),
                )
                .to_string(),
                format: args.log_format.clone().unwrap_or_else(|| "text".to_string()),
                file: args.effective_log_file().cloned(),
                color: args.color_choice(),
            };
            if start_logging(&fallback).is_err() {
                eprintln!("Error: {}", e);
                return 1;
            }
            report(&e);
            return 1;
        }
    };

    if let Err(e) = start_logging(&settings.log) {
        eprintln!("Error initialising logging: {}", e);
        return 1;
    }

    log::info!(
        "caplist {} starting: format '{}', size {}",
        env!("CARGO_PKG_VERSION"),
        settings.list.format,
        settings.list.size
    );

    let result =
        ShutdownCoordinator::guard_with_coordinator(|coordinator| async move {
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            run(&settings, input, &coordinator).await
        })
        .await;

    match result {
        Ok(summary) => {
            log::info!(
                "Done: {} delivered, {} finished, {} requeued, {} given up",
                summary.consumer.delivered,
                summary.consumer.finished,
                summary.consumer.requeued,
                summary.consumer.given_up
            );
            0
        }
        Err(e) => {
            report(&e);
            1
        }
    }
}

/// Merge the command line with the configuration file and validate
pub async fn load_settings(mut args: Args) -> Result<Settings, StartupError> {
    if let Some(config) = load_config_file(args.config_file.as_deref()).await? {
        args.apply_file_config(&config);
    }
    Ok(args.resolve()?)
}

/// Run the pipeline until `input` is exhausted and drained, or shutdown
///
/// The stats ticker runs for the whole call; shutdown is triggered on the
/// coordinator once consumption ends so every background task stops.
pub async fn run<R>(
    settings: &Settings,
    input: R,
    coordinator: &ShutdownCoordinator,
) -> Result<RunSummary, StartupError>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    KeyTemplate::compile(&settings.list.format).map_err(|source| StartupError::InvalidFormat {
        format: settings.list.format.clone(),
        source,
    })?;

    let store = open_store(settings).await?;
    let stats = Arc::new(Stats::with_counters(&COUNTERS));
    let handler = ListHandler::new(&settings.list, store, Arc::clone(&stats)).map_err(|source| {
        StartupError::InvalidFormat {
            format: settings.list.format.clone(),
            source,
        }
    })?;

    let ticker = stats.tick_every(
        settings.stats_interval,
        Arc::new(LogSink),
        coordinator.subscribe(),
    );

    let queue = MemoryQueue::new("stdin");
    let feeder = {
        let queue = queue.clone();
        tokio::spawn(async move { feed_lines(input, &queue).await })
    };

    let consumer = QueueConsumer::new(
        Arc::new(queue.clone()),
        Arc::new(handler),
        settings.consumer.clone(),
    );
    let consumer_summary = consumer.run(coordinator.subscribe()).await;

    // Without shutdown the consumer only stops once the feeder closed the queue
    let mut input_error = None;
    let input_count = if coordinator.is_shutdown_requested() {
        feeder.abort();
        queue.close();
        None
    } else {
        match feeder.await {
            Ok(Ok(count)) => Some(count),
            Ok(Err(e)) => {
                input_error = Some(e);
                None
            }
            Err(e) => {
                log::warn!("Input reader ended abnormally: {}", e);
                None
            }
        }
    };

    coordinator.trigger_shutdown();
    if let Err(e) = ticker.await {
        log::warn!("Stats ticker ended abnormally: {}", e);
    }

    let snapshot = stats.snapshot();
    log::info!(
        "stats final: {}",
        snapshot
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(" ")
    );

    if let Some(e) = input_error {
        return Err(StartupError::Input(e));
    }

    Ok(RunSummary {
        input: input_count,
        consumer: consumer_summary,
        stats: snapshot,
    })
}

async fn open_store(settings: &Settings) -> Result<Arc<dyn ListStore>, StartupError> {
    if settings.dry_run {
        log::warn!("Dry run: lists are kept in memory and discarded on exit");
        return Ok(Arc::new(MemoryListStore::new()));
    }

    let url = settings.redis_url.as_str();
    let store = retry_async("redis connect", RetryPolicy::default(), || async move {
        let store = RedisListStore::connect(url).await?;
        store.ping().await?;
        Ok::<_, StoreError>(store)
    })
    .await
    .map_err(|source| StartupError::Connect {
        url: mask_url(url),
        source,
    })?;

    log::info!("Writing to {}", store.describe());
    Ok(Arc::new(store))
}

fn start_logging(log: &LogSettings) -> Result<(), Box<dyn std::error::Error>> {
    let color = log.color.unwrap_or_else(|| std::io::stderr().is_terminal());
    let file = log.file.as_ref().map(|p| p.to_string_lossy().into_owned());
    init_logging(
        Some(log.level.as_str()),
        Some(log.format.as_str()),
        file.as_deref(),
        color,
    )
}

fn report(error: &StartupError) {
    log_error_with_context(error, error.operation());
}
