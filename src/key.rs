//! Queue key derivation.
//!
//! System V queues rendezvous on a `key_t`. The classic idiom (and the one
//! the demo binaries default to) derives the key from an existing filesystem
//! path plus a one-byte project id via `ftok(3)`, so unrelated processes
//! that agree on a directory end up on the same queue. An explicit raw key
//! is also supported for deployments that pass an identifier around instead.

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::{Error, Result};

/// Identifier shared by processes attaching to the same queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueKey(libc::key_t);

impl QueueKey {
    /// Key for a private queue, visible only through the returned queue id.
    pub const PRIVATE: QueueKey = QueueKey(libc::IPC_PRIVATE);

    /// Derives a key from `path` and `project_id` via `ftok(3)`.
    ///
    /// The path must exist and `project_id` must be nonzero; both are
    /// requirements of the underlying call.
    pub fn from_path(path: impl AsRef<Path>, project_id: u8) -> Result<Self> {
        if project_id == 0 {
            return Err(Error::InvalidKey("project id must be nonzero"));
        }
        let c_path = CString::new(path.as_ref().as_os_str().as_bytes())
            .map_err(|_| Error::InvalidKey("path contains a nul byte"))?;
        let key = unsafe { libc::ftok(c_path.as_ptr(), project_id as libc::c_int) };
        if key == -1 {
            return Err(Error::Io(std::io::Error::last_os_error()));
        }
        Ok(QueueKey(key))
    }

    /// Wraps an explicit, caller-chosen key.
    pub fn from_raw(raw: i32) -> Self {
        QueueKey(raw as libc::key_t)
    }

    pub(crate) fn as_key_t(self) -> libc::key_t {
        self.0
    }
}

impl std::fmt::Display for QueueKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::QueueKey;
    use crate::Error;
    use tempfile::tempdir;

    #[test]
    fn derivation_is_stable() {
        let dir = tempdir().expect("tempdir");
        let a = QueueKey::from_path(dir.path(), b'A').expect("ftok");
        let b = QueueKey::from_path(dir.path(), b'A').expect("ftok");
        assert_eq!(a, b);
    }

    #[test]
    fn project_id_separates_keys() {
        let dir = tempdir().expect("tempdir");
        let a = QueueKey::from_path(dir.path(), b'A').expect("ftok");
        let b = QueueKey::from_path(dir.path(), b'B').expect("ftok");
        assert_ne!(a, b);
    }

    #[test]
    fn missing_path_is_io_error() {
        let dir = tempdir().expect("tempdir");
        let gone = dir.path().join("does-not-exist");
        match QueueKey::from_path(&gone, b'A') {
            Err(Error::Io(_)) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn zero_project_id_rejected() {
        let dir = tempdir().expect("tempdir");
        assert!(QueueKey::from_path(dir.path(), 0).is_err());
    }
}
