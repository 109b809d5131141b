use clap::Parser;
use tracing_subscriber::EnvFilter;

use demowatch::application::usecases::{DeliverNotificationUseCase, RunOnceUseCase, RunOutcome};
use demowatch::application::{BlobStore, Notifier, StateStore};
use demowatch::domain::format_change;
use demowatch::infrastructure::{
    console_notifier::ConsoleNotifier, fs_store::FsBlobStore, http_feed_source::HttpFeedSource,
    memory_store::InMemoryBlobStore, multi_notifier::MultiNotifier,
    smtp_notifier::SmtpNotifier, sqlite_store::SqliteBlobStore,
};
use demowatch::interfaces::config::{Config, StorageCfg};

#[derive(Parser, Debug)]
#[command(name = "demowatch")]
struct Args {
    /// Path to config.yaml
    #[arg(long, default_value = "config.yaml")]
    config: String,

    /// Run once and exit
    #[arg(long)]
    once: bool,

    /// Do not send mail (console only)
    #[arg(long)]
    dry_run: bool,

    /// Print the names of archived change-sets and exit
    #[arg(long)]
    list_archives: bool,

    /// Render an archived change-set (name or timestamp) and exit
    #[arg(long, value_name = "NAME")]
    show_archive: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                "demowatch=info"
                    .parse()
                    .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::INFO.into()),
            ),
        )
        .init();
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env"));
    }
    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    // 1) load config
    let cfg = Config::load_from_file(&args.config)
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {e}", args.config))?;
    let settings = cfg.to_run_settings()?;

    // 2) build infra
    let blobs: Box<dyn BlobStore> = match &cfg.storage {
        StorageCfg::Fs { root } => Box::new(FsBlobStore::new(root)),
        StorageCfg::Sqlite { url } => Box::new(SqliteBlobStore::new(url).await?),
        StorageCfg::Memory => {
            tracing::warn!("memory storage: state is lost on exit");
            Box::new(InMemoryBlobStore::new())
        }
    };
    let state = StateStore::new(blobs.as_ref());

    if args.list_archives {
        for name in state.list_archives().await? {
            println!("{name}");
        }
        return Ok(());
    }

    if let Some(name) = &args.show_archive {
        let changes = state
            .load_archive(name)
            .await?
            .ok_or_else(|| anyhow::anyhow!("no archive named {name}"))?;
        for change in &changes {
            println!("{}\n", format_change(change, settings.marker_style));
        }
        return Ok(());
    }

    let feed = HttpFeedSource::new(cfg.feed.url.clone(), cfg.feed_timeout())?;

    let mut notifiers: Vec<Box<dyn Notifier>> = vec![Box::new(ConsoleNotifier::new())];
    if args.dry_run {
        tracing::warn!("--dry-run enabled: only console output");
    } else if let Some(smtp) = &cfg.notification.smtp {
        notifiers.push(Box::new(SmtpNotifier::new(smtp)?));
    } else {
        tracing::warn!("notification.smtp not configured, mail disabled");
    }
    let notifier = MultiNotifier::new(notifiers);

    // 3) usecases
    let deliver = DeliverNotificationUseCase {
        notifier: &notifier,
        max_body_chars: cfg.notification.max_body_chars,
        part_delay: cfg.part_delay(),
    };
    let run_once = RunOnceUseCase {
        feed: &feed,
        state,
        deliver,
        settings,
    };

    // 4) run
    if args.once {
        let outcome = run_once.execute().await?;
        report(&outcome);
        return Ok(());
    }

    let poll_interval = cfg.poll_interval_seconds;
    tracing::info!(poll_interval = poll_interval, "polling started");

    loop {
        match run_once.execute().await {
            Ok(outcome) => report(&outcome),
            Err(e) => tracing::error!("run failed, state left untouched: {e}"),
        }
        tokio::time::sleep(std::time::Duration::from_secs(poll_interval)).await;
    }
}

fn report(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Unchanged => tracing::info!("no new data"),
        RunOutcome::Initialized { events } => {
            tracing::info!(events, "initial data fetched and stored")
        }
        RunOutcome::NoChanges => tracing::info!("no changes detected"),
        RunOutcome::Changes { count, archive } => {
            tracing::info!(count, archive = %archive, "changes detected, mail sent, archive saved")
        }
    }
}
