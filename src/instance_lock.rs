//! Single instance lock using a Unix socket.
//!
//! Two bridges advertising the same accessory would confuse paired clients, so
//! only one may run per user. The socket is released by the OS when the
//! process dies, so a crash never leaves a stale lock behind.

use std::io;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use thiserror::Error;

const SOCKET_NAME: &str = "pool-homekit-bridge.sock";

#[derive(Debug, Error)]
pub enum InstanceLockError {
    #[error("another bridge instance is already running")]
    AlreadyRunning,

    #[error("failed to acquire instance lock: {0}")]
    Io(#[from] io::Error),
}

/// Held for as long as the bridge runs. Dropping it removes the socket file.
pub struct InstanceLock {
    _listener: UnixListener,
    path: PathBuf,
}

impl InstanceLock {
    /// Acquire the lock at the default socket path.
    pub fn acquire() -> Result<Self, InstanceLockError> {
        Self::acquire_at(Self::socket_path())
    }

    /// Acquire the lock at `path`.
    pub fn acquire_at(path: PathBuf) -> Result<Self, InstanceLockError> {
        if path.exists() {
            // A socket nobody answers on was left by a killed process
            if UnixStream::connect(&path).is_ok() {
                return Err(InstanceLockError::AlreadyRunning);
            }
            let _ = std::fs::remove_file(&path);
        }

        match UnixListener::bind(&path) {
            Ok(listener) => Ok(Self {
                _listener: listener,
                path,
            }),
            // Lost the race against another instance starting up
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => Err(InstanceLockError::AlreadyRunning),
            Err(e) => Err(InstanceLockError::Io(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Socket in the user's runtime directory, or `/tmp` when there is none.
    pub fn socket_path() -> PathBuf {
        socket_path_in(dirs::runtime_dir())
    }
}

fn socket_path_in(runtime_dir: Option<PathBuf>) -> PathBuf {
    runtime_dir
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(SOCKET_NAME)
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pool-bridge-{}-{}.sock", tag, std::process::id()))
    }

    #[test]
    fn test_socket_path_uses_runtime_dir() {
        let path = socket_path_in(Some(PathBuf::from("/run/user/1000")));
        assert_eq!(path, PathBuf::from("/run/user/1000/pool-homekit-bridge.sock"));
    }

    #[test]
    fn test_socket_path_fallback_to_tmp() {
        assert_eq!(
            socket_path_in(None),
            PathBuf::from("/tmp/pool-homekit-bridge.sock")
        );
    }

    #[test]
    fn test_second_instance_is_refused() {
        let path = scratch_path("second");
        let first = InstanceLock::acquire_at(path.clone()).unwrap();
        assert!(matches!(
            InstanceLock::acquire_at(path.clone()),
            Err(InstanceLockError::AlreadyRunning)
        ));
        drop(first);
        assert!(!path.exists());
    }

    #[test]
    fn test_stale_socket_is_replaced() {
        let path = scratch_path("stale");
        let _ = std::fs::remove_file(&path);
        // Bind and drop the raw listener: the file stays but nobody listens
        drop(UnixListener::bind(&path).unwrap());
        assert!(path.exists());

        let lock = InstanceLock::acquire_at(path.clone()).unwrap();
        assert_eq!(lock.path(), path.as_path());
    }
}
