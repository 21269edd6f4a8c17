//! Per-output build locks.
//!
//! A build holds an exclusive lock on `<store>/locks/<hash>.lock` from the
//! cache check until its completion marker is written, so two builds of the
//! same inputs never work in the same output directory. The second one waits
//! and then finds the first one's output. Locks are released on drop or when
//! the process exits.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::BuildError;
use super::store::lock_path_in;
use crate::util::hash::ObjectHash;

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Serialize, Deserialize)]
pub struct LockMetadata {
  pub version: u32,
  pub pid: u32,
  pub started_at_unix: u64,
  /// Package being built by the holder.
  pub name: String,
}

pub struct BuildLock {
  _file: File,
  lock_path: PathBuf,
}

impl BuildLock {
  /// Take the lock for `hash`, waiting while another build holds it.
  pub async fn acquire(store: &Path, hash: &ObjectHash, name: &str) -> Result<Self, BuildError> {
    let lock_path = lock_path_in(store, hash);
    let lock_err = |source: io::Error| BuildError::Lock {
      path: lock_path.clone(),
      source,
    };

    if let Some(parent) = lock_path.parent() {
      std::fs::create_dir_all(parent).map_err(lock_err)?;
    }

    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&lock_path)
      .map_err(lock_err)?;

    let mut waiting = false;
    loop {
      match try_lock_exclusive(&file) {
        Ok(()) => break,
        Err(e) if is_contention(&e) => {
          if !waiting {
            let holder = read_metadata(&lock_path);
            info!(
              path = %lock_path.display(),
              pid = ?holder.as_ref().map(|m| m.pid),
              "waiting for a concurrent build of the same inputs"
            );
            waiting = true;
          }
          tokio::time::sleep(LOCK_POLL_INTERVAL).await;
        }
        Err(e) => return Err(lock_err(e)),
      }
    }

    write_metadata(&file, name).map_err(lock_err)?;
    debug!(path = %lock_path.display(), "acquired build lock");

    Ok(BuildLock { _file: file, lock_path })
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }

  /// Reads the metadata through the held handle (a second handle cannot read
  /// a locked file on Windows).
  pub fn read_metadata(&self) -> io::Result<LockMetadata> {
    use std::io::{Seek, SeekFrom};

    let mut file = &self._file;
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).map_err(io::Error::other)
  }
}

fn write_metadata(file: &File, name: &str) -> io::Result<()> {
  let metadata = LockMetadata {
    version: 1,
    pid: std::process::id(),
    started_at_unix: SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .unwrap_or_default()
      .as_secs(),
    name: name.to_string(),
  };

  file.set_len(0)?;
  let mut writer = io::BufWriter::new(file);
  serde_json::to_writer_pretty(&mut writer, &metadata).map_err(io::Error::other)?;
  writer.flush()
}

fn read_metadata(lock_path: &Path) -> Option<LockMetadata> {
  let mut contents = String::new();
  File::open(lock_path).ok()?.read_to_string(&mut contents).ok()?;
  serde_json::from_str(&contents).ok()
}

fn is_contention(err: &io::Error) -> bool {
  // ERROR_LOCK_VIOLATION
  err.kind() == io::ErrorKind::WouldBlock || (cfg!(windows) && err.raw_os_error() == Some(33))
}

#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  flock(file.as_fd(), FlockOperation::NonBlockingLockExclusive)
    .map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(windows)]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::HANDLE;
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};

  let handle = file.as_raw_handle() as HANDLE;

  // SAFETY: OVERLAPPED is a plain data struct that is valid when zero-initialized.
  // LockFileEx is safe to call with a valid file handle and zeroed OVERLAPPED.
  let result = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(
      handle,
      LOCKFILE_FAIL_IMMEDIATELY | LOCKFILE_EXCLUSIVE_LOCK,
      0,
      1,
      0,
      &mut overlapped,
    )
  };

  if result == 0 {
    Err(io::Error::last_os_error())
  } else {
    Ok(())
  }
}
