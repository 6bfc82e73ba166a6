use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::warn;

/// How often the monitor thread checks whether the player is still running.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Bounded wait for the monitor thread during `stop` before assuming the
/// cooperative path failed.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(1);

type ChildSlot = Arc<Mutex<Option<Child>>>;

/// One external `ffplay` process for one playback segment.
///
/// The monitor thread spawns the process, then polls its liveness until it
/// exits on its own (end of file) or a stop is requested. Process errors are
/// swallowed everywhere: a segment that fails to spawn just looks
/// already-exited.
pub struct PlayerProcess {
    child: ChildSlot,
    stop_requested: Arc<AtomicBool>,
    monitor: Option<JoinHandle<()>>,
}

impl PlayerProcess {
    /// Launch the player at `start_offset` seconds into `path`.
    pub fn start(path: &Path, start_offset: f64) -> Self {
        let child: ChildSlot = Arc::new(Mutex::new(None));
        let stop_requested = Arc::new(AtomicBool::new(false));

        let monitor = {
            let path = path.to_path_buf();
            let child = Arc::clone(&child);
            let stop_requested = Arc::clone(&stop_requested);
            thread::spawn(move || monitor_loop(path, start_offset, child, stop_requested))
        };

        PlayerProcess {
            child,
            stop_requested,
            monitor: Some(monitor),
        }
    }

    /// The segment counts as alive while its monitor thread is running.
    pub fn is_alive(&self) -> bool {
        self.monitor.as_ref().is_some_and(|m| !m.is_finished())
    }

    /// Request termination and wait up to `timeout` for the monitor thread to
    /// wind down. Safe to call repeatedly and on never-spawned instances.
    pub fn stop(&mut self, timeout: Duration) {
        self.stop_requested.store(true, Ordering::Release);
        terminate(&self.child);

        if let Some(monitor) = self.monitor.take() {
            let deadline = Instant::now() + timeout;
            while !monitor.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            if monitor.is_finished() {
                let _ = monitor.join();
            } else {
                // One last kill, then proceed as stopped. An orphan here is
                // accepted rather than retried.
                warn!("player monitor did not finish within {timeout:?}");
                kill(&self.child);
            }
        }
    }
}

impl Drop for PlayerProcess {
    fn drop(&mut self) {
        self.stop(STOP_TIMEOUT);
    }
}

/// Build the ffplay invocation. The seek argument is omitted entirely at
/// offsets <= 0: ffplay treats an explicit `-ss 0` differently from no seek
/// argument on some inputs.
fn player_command(path: &Path, start_offset: f64) -> Command {
    let mut cmd = Command::new("ffplay");
    cmd.args(["-nodisp", "-autoexit", "-hide_banner", "-loglevel", "error"]);
    if start_offset > 0.0 {
        cmd.args(["-ss", &start_offset.to_string()]);
    }
    cmd.arg(path).stdout(Stdio::null()).stderr(Stdio::null());
    cmd
}

fn monitor_loop(
    path: PathBuf,
    start_offset: f64,
    child: ChildSlot,
    stop_requested: Arc<AtomicBool>,
) {
    match player_command(&path, start_offset).spawn() {
        Ok(proc) => {
            if let Ok(mut slot) = child.lock() {
                *slot = Some(proc);
            }
        }
        Err(err) => {
            warn!("failed to launch ffplay for {}: {err}", path.display());
            return;
        }
    }

    loop {
        if stop_requested.load(Ordering::Acquire) {
            break;
        }
        if has_exited(&child) {
            // Natural end of file.
            return;
        }
        thread::sleep(POLL_INTERVAL);
    }

    // Stop requested while the process may still be running: ask nicely,
    // then escalate.
    terminate(&child);
    thread::sleep(POLL_INTERVAL);
    kill(&child);
}

fn has_exited(child: &ChildSlot) -> bool {
    let Ok(mut slot) = child.lock() else {
        return true;
    };
    match slot.as_mut() {
        Some(proc) => !matches!(proc.try_wait(), Ok(None)),
        None => true,
    }
}

/// Cooperative termination: SIGTERM where available, plain kill elsewhere.
fn terminate(child: &ChildSlot) {
    let Ok(mut slot) = child.lock() else {
        return;
    };
    if let Some(proc) = slot.as_mut() {
        if matches!(proc.try_wait(), Ok(None)) {
            #[cfg(unix)]
            {
                use nix::sys::signal::{self, Signal};
                use nix::unistd::Pid;
                let _ = signal::kill(Pid::from_raw(proc.id() as i32), Signal::SIGTERM);
            }
            #[cfg(not(unix))]
            {
                let _ = proc.kill();
            }
        }
    }
}

/// Forced termination, reaping the process if it goes down.
fn kill(child: &ChildSlot) {
    let Ok(mut slot) = child.lock() else {
        return;
    };
    if let Some(proc) = slot.as_mut() {
        if matches!(proc.try_wait(), Ok(None)) {
            let _ = proc.kill();
            let _ = proc.wait();
        }
    }
}
