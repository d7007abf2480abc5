//! Single-instance enforcement for the monitor (spec §4.5).
//!
//! An advisory PID-file lock: on acquire, a live holder is signaled with
//! `SIGTERM` and given a bounded grace period to exit before this process
//! proceeds regardless. This never blocks startup indefinitely — a stuck
//! holder only produces a warning, not a hang.

use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use crazyones_store::atomic::atomic_write;
use tracing::warn;

const POLL_INTERVAL: Duration = Duration::from_millis(200);
const POLL_BOUND: Duration = Duration::from_secs(5);

/// Holds the instance lock for the lifetime of the guard; the lock file
/// is removed on drop.
pub struct InstanceLock {
    path: PathBuf,
}

/// Returns whether a process with the given pid is alive, via a
/// zero-signal `kill` probe.
fn process_is_alive(pid: i32) -> bool {
    // SAFETY: signal 0 performs no action beyond existence/permission
    // checks; pid and the call itself have no other side effects.
    unsafe { libc::kill(pid, 0) == 0 }
}

fn read_pid(path: &Path) -> Option<i32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Acquires the instance lock at `path`, signaling and waiting out any
/// live prior holder first.
///
/// # Errors
/// Returns an error only if the final PID file write fails.
pub fn acquire(path: &Path) -> std::io::Result<InstanceLock> {
    if let Some(holder_pid) = read_pid(path) {
        if process_is_alive(holder_pid) {
            // SAFETY: a valid, previously-observed-live pid; SIGTERM is a
            // standard, non-destructive-to-this-process signal.
            unsafe {
                libc::kill(holder_pid, libc::SIGTERM);
            }

            let deadline = std::time::Instant::now() + POLL_BOUND;
            loop {
                if std::time::Instant::now() >= deadline {
                    warn!(pid = holder_pid, "prior instance did not exit within the grace period, proceeding anyway");
                    break;
                }
                match read_pid(path) {
                    None => break,
                    Some(current) if current != holder_pid && process_is_alive(current) => break,
                    Some(current) if current == holder_pid && !process_is_alive(current) => break,
                    _ => sleep(POLL_INTERVAL),
                }
            }
        }
    }

    let pid = std::process::id();
    atomic_write(path, pid.to_string().as_bytes())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    Ok(InstanceLock { path: path.to_path_buf() })
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn acquiring_an_unheld_lock_writes_our_own_pid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("monitor.pid");

        let lock = acquire(&path).unwrap();
        let stored: i32 = std::fs::read_to_string(&path).unwrap().trim().parse().unwrap();
        assert_eq!(stored, std::process::id() as i32);
        drop(lock);
        assert!(!path.exists());
    }

    #[test]
    fn stale_pid_from_a_dead_process_is_acquired_immediately() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("monitor.pid");
        // PID 1 is almost always alive (init); use a pid very unlikely to
        // be live to exercise the "prior holder already dead" path
        // without needing to spawn and kill a real process.
        std::fs::write(&path, "999999").unwrap();

        let lock = acquire(&path).unwrap();
        let stored: i32 = std::fs::read_to_string(&path).unwrap().trim().parse().unwrap();
        assert_eq!(stored, std::process::id() as i32);
        drop(lock);
    }

    #[test]
    fn process_is_alive_reports_current_process_as_alive() {
        assert!(process_is_alive(std::process::id() as i32));
    }
}
