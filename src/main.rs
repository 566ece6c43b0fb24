use clap::Parser;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};

use tabhop::core::config::{self, CliOverrides};
use tabhop::core::store::{FileStore, MemoryStore, Store};
use tabhop::runtime;

#[derive(Parser)]
#[command(name = "tabhop", about = "Alt-tab style switching between recent browser tabs")]
struct Args {
    /// Replay script to run (reads stdin when omitted)
    script: Option<PathBuf>,

    /// Where to persist tab history
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Keep history in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Number of tabs to remember
    #[arg(long)]
    capacity: Option<usize>,

    /// Double press window in milliseconds
    #[arg(long)]
    window_ms: Option<u64>,

    /// Config file (defaults to ~/.tabhop/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let file_config = config::load_config(args.config.as_deref())?;
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            state_file: args.state_file,
            ephemeral: args.ephemeral,
            capacity: args.capacity,
            double_press_window_ms: args.window_ms,
        },
    );

    // Initialize file logger
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Some(ref path) = resolved.log_file
        && path.parent().is_none_or(|dir| std::fs::create_dir_all(dir).is_ok())
        && let Ok(log_file) = File::create(path)
    {
        let _ = WriteLogger::init(resolved.log_level, log_config, log_file);
    }

    let store: Arc<dyn Store> = match resolved.state_file {
        Some(ref path) => {
            let store = FileStore::new(path);
            log::info!("tabhop starting with history at {}", store.path().display());
            Arc::new(store)
        }
        None => {
            log::info!("tabhop starting with in-memory history");
            Arc::new(MemoryStore::new())
        }
    };

    let input: Box<dyn AsyncBufRead + Unpin + Send> = match args.script {
        Some(ref path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let replay = runtime::replay(&resolved, store, input).await?;

    for item in &replay.switches {
        println!("switched to {}", item);
    }
    if replay.errors > 0 {
        println!("{} event(s) could not be handled, see the log", replay.errors);
    }
    println!("history:");
    for item in replay.history.queue.iter() {
        let marker = if replay.history.anchor == Some(item.id) { "*" } else { " " };
        println!(" {} {}", marker, item);
    }

    Ok(())
}
