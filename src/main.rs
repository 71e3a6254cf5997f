use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::eyre;

use stakeboard::config::{self, Config};
use stakeboard::notification::{
    NotificationItem, NotificationKey, NotificationLevel, NotificationStore, now_millis,
    parse_address,
};
use stakeboard::poll::poll_until;
use stakeboard::storage::{FileStore, KeyValueStore};

/// Staking dashboard state: notification queues and indexer waits
#[derive(Parser, Debug)]
#[command(version, about = "Inspect and update persisted staking dashboard state")]
struct Args {
    /// Directory holding persisted state (overrides the config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print an account's notifications as JSON
    List {
        #[arg(value_parser = parse_address)]
        address: String,
        /// Include notifications that are currently dismissed
        #[arg(long)]
        all: bool,
    },
    /// Add a notification, superseding any with the same key
    Add {
        #[arg(value_parser = parse_address)]
        address: String,
        #[command(flatten)]
        item: ItemArgs,
        /// Put the notification ahead of others of the same level
        #[arg(long)]
        replace: bool,
    },
    /// Replace an existing notification in place
    Update {
        #[arg(value_parser = parse_address)]
        address: String,
        #[command(flatten)]
        item: ItemArgs,
    },
    /// Remove notifications by key
    Remove {
        #[arg(value_parser = parse_address)]
        address: String,
        #[arg(required = true)]
        keys: Vec<NotificationKey>,
    },
    /// Remove all notifications
    Clear {
        #[arg(value_parser = parse_address)]
        address: String,
    },
    /// Re-sort notifications, critical first
    Sort {
        #[arg(value_parser = parse_address)]
        address: String,
    },
    /// Hide a notification for a while
    Dismiss {
        #[arg(value_parser = parse_address)]
        address: String,
        #[arg(long)]
        key: NotificationKey,
        #[arg(long, default_value_t = 86400)]
        for_secs: u64,
    },
    /// Wait until a storage key has been written
    Wait {
        store_key: String,
        #[arg(long)]
        interval_ms: Option<u64>,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

#[derive(clap::Args, Debug)]
struct ItemArgs {
    #[arg(long)]
    key: NotificationKey,
    #[arg(long, default_value = "info")]
    level: NotificationLevel,
    #[arg(long)]
    title: String,
    #[arg(long)]
    message: String,
    /// Free-form sub-classifier
    #[arg(long = "type")]
    kind: Option<String>,
    /// Mark the notification as not dismissable
    #[arg(long)]
    no_dismiss: bool,
    #[arg(long, requires = "button_href")]
    button_label: Option<String>,
    #[arg(long, requires = "button_label")]
    button_href: Option<String>,
}

impl ItemArgs {
    fn into_item(self) -> NotificationItem {
        let mut item = NotificationItem::new(self.key, self.level, self.title, self.message);
        if let Some(kind) = self.kind {
            item = item.with_kind(kind);
        }
        if self.no_dismiss {
            item = item.not_dismissable();
        }
        if let (Some(label), Some(href)) = (self.button_label, self.button_href) {
            item = item.with_button(label, href);
        }
        item
    }
}

fn main() -> Result<()> {
    init_logging();
    color_eyre::install()?;

    let config_result = config::load_config();
    if let Some(warning) = &config_result.warning {
        eprintln!("warning: {}", warning);
    }

    let args = Args::parse();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(run(args, config_result.config))
}

/// Logs to stderr in `[timestamp] [LEVEL] message` form, `warn` unless
/// RUST_LOG says otherwise.
fn init_logging() {
    use std::io::Write;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format(|buf, record| {
            use std::time::SystemTime;
            let datetime: chrono::DateTime<chrono::Local> = SystemTime::now().into();
            writeln!(
                buf,
                "[{}] [{}] {}",
                datetime.format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .init();
}

async fn run(args: Args, config: Config) -> Result<()> {
    let data_dir = args
        .data_dir
        .unwrap_or_else(|| config.storage.resolved_data_dir());
    let storage = FileStore::new(data_dir);
    log::debug!("Using data dir {:?}", storage.dir());

    match args.command {
        Command::Wait {
            store_key,
            interval_ms,
            timeout_ms,
        } => {
            let mut options = config.poll.options();
            if let Some(ms) = interval_ms {
                options.interval = Duration::from_millis(ms);
            }
            if let Some(ms) = timeout_ms {
                options.timeout = Duration::from_millis(ms);
            }

            let found = poll_until(|| storage.get(&store_key), options).await?;
            if !found {
                return Err(eyre!(
                    "Timed out after {:?} waiting for '{}'",
                    options.timeout,
                    store_key
                ));
            }
            println!("{}", store_key);
            Ok(())
        }
        Command::List { address, all } => {
            let store = open_store(storage, &address).await;
            let notifications = if all {
                store.notification_list().to_vec()
            } else {
                store.visible_notifications(now_millis())
            };
            println!("{}", serde_json::to_string_pretty(&notifications)?);
            Ok(())
        }
        Command::Add {
            address,
            item,
            replace,
        } => {
            let store = open_store(storage, &address).await;
            store.add_notification(item.into_item(), replace).await;
            println!("{} notification(s)", store.notification_list().len());
            Ok(())
        }
        Command::Update { address, item } => {
            let store = open_store(storage, &address).await;
            let key = item.key;
            if !store.update_notification(item.into_item()).await {
                return Err(eyre!("No notification with key '{}'", key));
            }
            Ok(())
        }
        Command::Remove { address, keys } => {
            let store = open_store(storage, &address).await;
            let removed = store.remove_notification(keys).await;
            println!("removed {}", removed);
            Ok(())
        }
        Command::Clear { address } => {
            let store = open_store(storage, &address).await;
            store.clear_notification_list().await;
            Ok(())
        }
        Command::Sort { address } => {
            let store = open_store(storage, &address).await;
            store.sort_notification_list().await;
            Ok(())
        }
        Command::Dismiss {
            address,
            key,
            for_secs,
        } => {
            let store = open_store(storage, &address).await;
            if !store
                .dismiss_notification(key, Duration::from_secs(for_secs))
                .await
            {
                return Err(eyre!("Notification '{}' is missing or cannot be dismissed", key));
            }
            Ok(())
        }
    }
}

async fn open_store(storage: FileStore, address: &str) -> NotificationStore<FileStore> {
    let store = NotificationStore::new(storage);
    store.init_notification(address).await;
    store
}
