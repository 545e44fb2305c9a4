use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How long a command waits for another tasky process before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Exclusive advisory lock on a data directory, held for the length of one
/// command so two `tasky` invocations never interleave load and save.
pub struct DataLock {
    _file: File,
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("data directory {path} is busy: another tasky process is running")]
    Busy { path: PathBuf },
}

impl DataLock {
    /// Lock `data_dir`, creating it if needed. Polls until `timeout` runs out.
    pub fn acquire(data_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = data_dir.join(".lock");
        let create_err = |source| LockError::Create {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(data_dir).map_err(create_err)?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(create_err)?;

        let started = Instant::now();
        while try_lock(&file).is_err() {
            if started.elapsed() >= timeout {
                return Err(LockError::Busy {
                    path: data_dir.to_path_buf(),
                });
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Ok(DataLock { _file: file, path })
    }
}

impl Drop for DataLock {
    fn drop(&mut self) {
        // flock is released with the descriptor
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(unix)]
fn try_lock(file: &File) -> std::io::Result<()> {
    use std::os::unix::io::AsRawFd;
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> std::io::Result<()> {
    Ok(())
}
