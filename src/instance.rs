//! Single-instance enforcement via an advisory `flock` on a well-known file.
//!
//! The lock is tied to the open file, so it disappears when the process
//! exits for any reason; a stale lock file on disk is harmless.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use tracing::debug;

use crate::error::{Error, Result};

pub struct InstanceLock {
    path: PathBuf,
    _lock: Flock<File>,
}

impl InstanceLock {
    /// Take the lock, or fail with `AlreadyRunning` if another vpntop holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;

        let lock = match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => lock,
            Err((_, errno)) if errno == Errno::EWOULDBLOCK => {
                return Err(Error::AlreadyRunning {
                    path: path.to_path_buf(),
                })
            }
            Err((_, errno)) => return Err(Error::Io(errno.into())),
        };

        // Record our pid for humans inspecting the file.
        lock.set_len(0)?;
        let mut file: &File = &lock;
        writeln!(file, "{}", std::process::id())?;

        debug!(path = ?path, "instance lock acquired");
        Ok(Self {
            path: path.to_path_buf(),
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_instance_is_refused() {
        let dir = mktemp::Temp::new_dir().unwrap();
        let path = dir.to_path_buf().join("run").join("vpntop.lock");

        let first = InstanceLock::acquire(&path).unwrap();
        assert_eq!(first.path(), path);
        assert_eq!(
            fs::read_to_string(&path).unwrap().trim(),
            std::process::id().to_string()
        );

        match InstanceLock::acquire(&path) {
            Err(Error::AlreadyRunning { path: held }) => assert_eq!(held, path),
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("lock acquired twice"),
        }

        drop(first);
        assert!(InstanceLock::acquire(&path).is_ok());
    }
}
