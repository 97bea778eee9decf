use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use courier::{Message, MessageQueue, Priority, QueueKey};

#[derive(Parser)]
#[command(name = "courier-send")]
#[command(about = "Create a message queue and send priority-tagged messages")]
struct Cli {
    /// Path the queue key is derived from (must exist)
    #[arg(long, default_value = ".")]
    path: PathBuf,

    /// Project id byte for key derivation
    #[arg(long, default_value_t = 'A')]
    project_id: char,

    /// Explicit queue key, bypassing path derivation
    #[arg(long, conflicts_with_all = ["path", "project_id"])]
    key: Option<i32>,

    /// Queue permission bits, octal
    #[arg(long, default_value = "666", value_parser = parse_mode)]
    mode: u32,

    /// Number of messages to send when prompting interactively
    #[arg(long, default_value_t = 3)]
    count: usize,

    /// Message to send, as PRIO:TEXT (repeatable); prompts on stdin if absent
    #[arg(short, long = "message", value_name = "PRIO:TEXT")]
    messages: Vec<String>,
}

fn parse_mode(s: &str) -> std::result::Result<u32, String> {
    u32::from_str_radix(s, 8).map_err(|_| format!("not an octal mode: {s}"))
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

fn parse_message_arg(arg: &str) -> Result<Message> {
    let (prio, text) = arg
        .split_once(':')
        .with_context(|| format!("expected PRIO:TEXT, got {arg:?}"))?;
    let priority: Priority = prio.parse()?;
    Ok(Message::new(priority, text)?)
}

fn prompt_message(stdin: &mut impl BufRead) -> Result<Message> {
    print!("Enter a message: ");
    io::stdout().flush()?;
    let mut text = String::new();
    if stdin.read_line(&mut text)? == 0 {
        bail!("stdin closed before all messages were entered");
    }
    print!("Enter priority, between 1 and 3: ");
    io::stdout().flush()?;
    let mut prio = String::new();
    if stdin.read_line(&mut prio)? == 0 {
        bail!("stdin closed before all messages were entered");
    }
    let priority: Priority = prio.parse()?;
    Ok(Message::new(priority, text.trim_end_matches('\n'))?)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let key = resolve_key(&cli)?;
    let queue = MessageQueue::create(key, cli.mode).context("failed to create message queue")?;
    info!("message queue created: key={key} id={}", queue.id());

    let messages = if cli.messages.is_empty() {
        let mut stdin = io::stdin().lock();
        let mut messages = Vec::with_capacity(cli.count);
        for _ in 0..cli.count {
            messages.push(prompt_message(&mut stdin)?);
        }
        messages
    } else {
        cli.messages
            .iter()
            .map(|arg| parse_message_arg(arg))
            .collect::<Result<Vec<_>>>()?
    };

    for message in &messages {
        queue.send(message).context("failed to send message")?;
        println!(
            "Sent message: {} (priority {})",
            message.text(),
            message.priority()
        );
    }

    info!("all {} messages sent", messages.len());
    Ok(())
}
