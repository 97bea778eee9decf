//! Priority messaging over System V message queues.
//!
//! A thin, typed wrapper around `msgget`/`msgsnd`/`msgrcv`/`msgctl`: one
//! process creates a queue and enqueues priority-tagged text records, a
//! peer attaches via a shared key and drains them in ascending priority
//! order. The `courier-send` and `courier-recv` binaries demonstrate the
//! exchange end to end.

pub mod error;
pub mod key;
pub mod message;
pub mod queue;

pub use error::{Error, Result};
pub use key::QueueKey;
pub use message::{Message, Priority, MAX_TEXT_LEN, TEXT_CAPACITY};
pub use queue::{MessageQueue, QueueStat, Selector};
