use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use courier::{MessageQueue, Priority, QueueKey, Selector};

#[derive(Parser)]
#[command(name = "courier-recv")]
#[command(about = "Receive messages in ascending priority order, then remove the queue")]
struct Cli {
    /// Path the queue key is derived from (must match the sender's)
    #[arg(long, default_value = ".")]
    path: PathBuf,

    /// Project id byte for key derivation
    #[arg(long, default_value_t = 'A')]
    project_id: char,

    /// Explicit queue key, bypassing path derivation
    #[arg(long, conflicts_with_all = ["path", "project_id"])]
    key: Option<i32>,

    /// Number of messages to receive
    #[arg(long, default_value_t = 3)]
    count: usize,

    /// Leave the queue in place after receiving
    #[arg(long)]
    keep: bool,
}

fn resolve_key(cli: &Cli) -> Result<QueueKey> {
    if let Some(raw) = cli.key {
        return Ok(QueueKey::from_raw(raw));
    }
    if !cli.project_id.is_ascii() {
        bail!("project id must be a single ascii character");
    }
    QueueKey::from_path(&cli.path, cli.project_id as u8)
        .with_context(|| format!("failed to derive key from {}", cli.path.display()))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let key = resolve_key(&cli)?;
    let queue = MessageQueue::open(key).context("failed to open message queue")?;
    info!("attached to message queue: key={key} id={}", queue.id());

    // msgtyp < 0 dequeues the lowest pending type first, so draining with
    // an upper bound of Priority::MAX yields strictly ascending order.
    for _ in 0..cli.count {
        let message = queue
            .recv(Selector::UpTo(Priority::MAX))
            .context("failed to receive message")?;
        println!(
            "Received message: {} (priority {})",
            message.text(),
            message.priority()
        );
    }

    if cli.keep {
        info!("all {} messages received, queue kept", cli.count);
    } else {
        queue.remove().context("failed to remove message queue")?;
        info!("all {} messages received, queue removed", cli.count);
    }
    Ok(())
}
