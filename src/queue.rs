//! Safe wrapper over the System V message-queue syscall surface.
//!
//! Every operation is a single syscall checked once for a `-1` return, with
//! errno mapped to a crate error. Blocking calls retry on `EINTR`; the
//! non-blocking variants surface "would block" as `QueueFull` / `Ok(None)`
//! instead. The queue itself is kernel-owned state that outlives the
//! processes using it, so removal is explicit via [`MessageQueue::remove`]
//! rather than tied to drop.

use log::debug;

use crate::key::QueueKey;
use crate::message::{Message, Priority, WireMessage, TEXT_CAPACITY};
use crate::{Error, Result};

/// Which queued message `recv` should take.
///
/// Maps directly onto the `msgtyp` argument of `msgrcv(2)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selector {
    /// First message in arrival order, whatever its priority.
    Any,
    /// First message with exactly this priority.
    Exact(Priority),
    /// Lowest-priority message at or below this bound.
    ///
    /// `UpTo(Priority::MAX)` drains the queue in strictly ascending
    /// priority order.
    UpTo(Priority),
}

impl Selector {
    fn as_mtype(self) -> libc::c_long {
        match self {
            Selector::Any => 0,
            Selector::Exact(priority) => priority.as_mtype(),
            Selector::UpTo(priority) => -priority.as_mtype(),
        }
    }
}

/// Point-in-time snapshot of a queue, from `msgctl(IPC_STAT)`.
#[derive(Clone, Copy, Debug)]
pub struct QueueStat {
    /// Messages currently queued.
    pub messages: u64,
    /// Maximum number of payload bytes the queue may hold.
    pub capacity_bytes: u64,
    /// Pid of the last `msgsnd` caller, 0 if none yet.
    pub last_sender_pid: i32,
    /// Pid of the last `msgrcv` caller, 0 if none yet.
    pub last_receiver_pid: i32,
}

/// Handle to a System V message queue.
pub struct MessageQueue {
    id: libc::c_int,
}

impl MessageQueue {
    /// Creates the queue for `key` (or attaches if it already exists),
    /// with `mode` permission bits (typically `0o666`).
    pub fn create(key: QueueKey, mode: u32) -> Result<Self> {
        let flags = libc::IPC_CREAT | (mode as libc::c_int & 0o777);
        let queue = Self::get(key, flags)?;
        debug!("message queue ready: key={key} id={}", queue.id);
        Ok(queue)
    }

    /// Attaches to an existing queue.
    ///
    /// Returns `Error::QueueNotFound` if no queue exists for `key`.
    pub fn open(key: QueueKey) -> Result<Self> {
        Self::get(key, 0)
    }

    /// Creates a queue not reachable through any key, for same-process or
    /// parent/child use. Tests use this to avoid key collisions.
    pub fn create_private(mode: u32) -> Result<Self> {
        Self::create(QueueKey::PRIVATE, mode)
    }

    fn get(key: QueueKey, flags: libc::c_int) -> Result<Self> {
        let id = unsafe { libc::msgget(key.as_key_t(), flags) };
        if id == -1 {
            let err = std::io::Error::last_os_error();
            return Err(match err.raw_os_error() {
                Some(libc::ENOENT) => Error::QueueNotFound,
                _ => Error::Io(err),
            });
        }
        Ok(MessageQueue { id })
    }

    /// Kernel identifier of the queue, as reported by `msgget`.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Enqueues `message`, blocking while the queue is full.
    pub fn send(&self, message: &Message) -> Result<()> {
        self.send_impl(message, 0)
    }

    /// Enqueues `message` without blocking.
    ///
    /// Returns `Error::QueueFull` if the queue has no room.
    pub fn try_send(&self, message: &Message) -> Result<()> {
        self.send_impl(message, libc::IPC_NOWAIT)
    }

    fn send_impl(&self, message: &Message, flags: libc::c_int) -> Result<()> {
        let wire = message.to_wire();
        loop {
            let rc = unsafe {
                libc::msgsnd(
                    self.id,
                    &wire as *const WireMessage as *const libc::c_void,
                    TEXT_CAPACITY,
                    flags,
                )
            };
            if rc == 0 {
                return Ok(());
            }
            let err = std::io::Error::last_os_error();
            return Err(match err.raw_os_error() {
                Some(libc::EINTR) => continue,
                Some(libc::EAGAIN) => Error::QueueFull,
                Some(libc::EIDRM) | Some(libc::EINVAL) => Error::QueueRemoved,
                _ => Error::Io(err),
            });
        }
    }

    /// Dequeues the message chosen by `selector`, blocking until one is
    /// available.
    pub fn recv(&self, selector: Selector) -> Result<Message> {
        match self.recv_impl(selector, 0)? {
            Some(message) => Ok(message),
            // Blocking msgrcv never reports ENOMSG.
            None => Err(Error::QueueRemoved),
        }
    }

    /// Dequeues the message chosen by `selector`, or returns `Ok(None)`
    /// if no matching message is queued.
    pub fn try_recv(&self, selector: Selector) -> Result<Option<Message>> {
        self.recv_impl(selector, libc::IPC_NOWAIT)
    }

    fn recv_impl(&self, selector: Selector, flags: libc::c_int) -> Result<Option<Message>> {
        let mut wire = WireMessage::zeroed();
        loop {
            let rc = unsafe {
                libc::msgrcv(
                    self.id,
                    &mut wire as *mut WireMessage as *mut libc::c_void,
                    TEXT_CAPACITY,
                    selector.as_mtype(),
                    flags,
                )
            };
            if rc >= 0 {
                return Ok(Some(Message::from_wire(&wire)?));
            }
            let err = std::io::Error::last_os_error();
            return Err(match err.raw_os_error() {
                Some(libc::EINTR) => continue,
                Some(libc::ENOMSG) => return Ok(None),
                Some(libc::EIDRM) | Some(libc::EINVAL) => Error::QueueRemoved,
                _ => Error::Io(err),
            });
        }
    }

    /// Reads the queue's current counters.
    pub fn stat(&self) -> Result<QueueStat> {
        let mut ds: libc::msqid_ds = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::msgctl(self.id, libc::IPC_STAT, &mut ds) };
        if rc == -1 {
            let err = std::io::Error::last_os_error();
            return Err(match err.raw_os_error() {
                Some(libc::EIDRM) | Some(libc::EINVAL) => Error::QueueRemoved,
                _ => Error::Io(err),
            });
        }
        Ok(QueueStat {
            messages: ds.msg_qnum as u64,
            capacity_bytes: ds.msg_qbytes as u64,
            last_sender_pid: ds.msg_lspid as i32,
            last_receiver_pid: ds.msg_lrpid as i32,
        })
    }

    /// Removes the queue from the kernel, consuming the handle.
    ///
    /// Pending messages are discarded and any process blocked on the queue
    /// fails with `QueueRemoved`.
    pub fn remove(self) -> Result<()> {
        let rc = unsafe { libc::msgctl(self.id, libc::IPC_RMID, std::ptr::null_mut()) };
        if rc == -1 {
            let err = std::io::Error::last_os_error();
            return Err(match err.raw_os_error() {
                Some(libc::EIDRM) | Some(libc::EINVAL) => Error::QueueRemoved,
                _ => Error::Io(err),
            });
        }
        debug!("message queue removed: id={}", self.id);
        Ok(())
    }
}
