use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::*;
use serde_derive::Serialize;

use chanview::event::EventBus;
use chanview::filter::FilterView;
use chanview::row::{ChannelRow, Role};
use chanview::snapshot::SnapshotWallet;
use chanview::ChannelListModel;
use chanview_util::config::{DEFAULT_LOG_LEVEL, DEFAULT_SNAPSHOT_FILE};
use chanview_util::util::{abort_on_panic, read_lines_path, setup_logging};

mod replay;

use replay::{apply, parse_events, ChangeLog};

#[derive(Parser)]
#[clap(author, version, about = "Show a wallet's Lightning channels the way the UI lists them")]
struct Cli {
    #[clap(long, help = "data directory, for the log file and the default snapshot")]
    datadir: Option<PathBuf>,

    #[clap(long, help = "log level, overridden by RUST_LOG")]
    log_level: Option<String>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the channel list
    #[clap(name = "list")]
    List {
        #[clap(long, help = "wallet snapshot, defaults to wallet.json in the data directory")]
        snapshot: Option<PathBuf>,
        #[clap(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
        #[clap(long)]
        json: bool,
    },
    /// Replay a file of wallet events and print every list change
    #[clap(name = "replay")]
    Replay {
        #[clap(long, help = "wallet snapshot, defaults to wallet.json in the data directory")]
        snapshot: Option<PathBuf>,
        #[clap(long, help = "JSON lines, one event per line")]
        events: PathBuf,
        #[clap(long)]
        json: bool,
    },
    /// Print the role table
    #[clap(name = "roles")]
    Roles,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FilterArg {
    All,
    Backups,
    NoBackups,
}

#[derive(Serialize)]
struct ReplayOutput {
    changes: Vec<String>,
    rows: Vec<ChannelRow>,
}

fn load_wallet(datadir: &Path, snapshot: Option<PathBuf>) -> Result<Arc<SnapshotWallet>> {
    let path = snapshot.unwrap_or_else(|| datadir.join(DEFAULT_SNAPSHOT_FILE));
    let wallet =
        SnapshotWallet::from_file(&path).with_context(|| format!("load {}", path.display()))?;
    info!("loaded wallet {} from {}", wallet.to_snapshot().wallet_id, path.display());
    Ok(Arc::new(wallet))
}

fn filtered_rows(model: &ChannelListModel, filter: FilterArg) -> Vec<ChannelRow> {
    let view: Option<FilterView> = match filter {
        FilterArg::All => None,
        FilterArg::Backups => Some(model.filter_model_backups()),
        FilterArg::NoBackups => Some(model.filter_model_no_backups()),
    };
    view.map(|v| v.rows()).unwrap_or_else(|| model.rows())
}

fn print_table(rows: &[ChannelRow]) {
    println!(
        "{:<16} {:<16} {:<16} {:>14} {:>14} {:>14} {}",
        "CHANNEL", "SHORT ID", "STATE", "CAPACITY", "CAN SEND", "CAN RECEIVE", "PEER"
    );
    for row in rows {
        let peer = if row.node_alias.is_empty() { &row.node_id } else { &row.node_alias };
        let state =
            if row.is_backup { format!("{} (backup)", row.state) } else { row.state.clone() };
        println!(
            "{:<16} {:<16} {:<16} {:>14} {:>14} {:>14} {}",
            &row.cid[..row.cid.len().min(16)],
            row.short_cid,
            state,
            row.capacity.to_string(),
            row.can_send.to_string(),
            row.can_receive.to_string(),
            peer
        );
    }
}

fn print_rows(rows: &[ChannelRow], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
    } else {
        print_table(rows);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    if chanview_util::compare_env_var("CHANVIEW_ABORT_ON_PANIC", "1") {
        abort_on_panic();
    }

    let datadir = args.datadir.unwrap_or_else(chanview_util::datadir);
    let log_level = args
        .log_level
        .or_else(chanview_util::log_level)
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    setup_logging(&datadir, "chanview-cli", &log_level)?;

    match args.command {
        Commands::List { snapshot, filter, json } => {
            let wallet = load_wallet(&datadir, snapshot)?;
            let model = ChannelListModel::new(wallet, &EventBus::new());
            info!("{} channels, {} open", model.count(), model.num_open_channels());
            print_rows(&filtered_rows(&model, filter), json)?;
        }
        Commands::Replay { snapshot, events, json } => {
            let wallet = load_wallet(&datadir, snapshot)?;
            let events_path = events.to_string_lossy();
            let events = parse_events(&read_lines_path(&events_path)?)?;
            let bus = EventBus::new();
            let model = ChannelListModel::new(wallet.clone(), &bus);
            let changes = ChangeLog::new();
            model.add_observer(changes.clone());

            let mut log_lines = Vec::new();
            for (i, event) in events.iter().enumerate() {
                apply(&wallet, &bus, &model, event)
                    .with_context(|| format!("event {} ({:?})", i + 1, event))?;
                for change in changes.take() {
                    log_lines.push(format!("{}: {}", i + 1, change));
                }
            }

            if json {
                let output = ReplayOutput { changes: log_lines, rows: model.rows() };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                for line in &log_lines {
                    println!("{}", line);
                }
                print_table(&model.rows());
            }
        }
        Commands::Roles => {
            for role in Role::ALL {
                println!("{:#06x} {}", role.key(), role.name());
            }
        }
    }

    Ok(())
}
