//! External video player supervision.
//!
//! At most one player runs at a time. It is started in its own process
//! group so a forced stop takes its helpers down with it, and a stop always
//! waits for the process to be reaped before reporting idle.

use std::io;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use wait_timeout::ChildExt;

use crate::constants::*;
use crate::error::PlayerError;
use crate::slide::Rect;

/// Everything needed to start one player run.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub path: PathBuf,
    pub muted: bool,
    pub audio_output: String,
    pub window: Option<Rect>,
}

impl Invocation {
    /// omxplayer-style arguments, target file last.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-osd".to_string(),
            "--no-keys".to_string(),
            "-o".to_string(),
            self.audio_output.clone(),
        ];
        if let Some(win) = self.window {
            args.push("--win".to_string());
            args.push(format!(
                "{} {} {} {}",
                win.x.round() as i32,
                win.y.round() as i32,
                (win.x + win.width).round() as i32,
                (win.y + win.height).round() as i32
            ));
        }
        if self.muted {
            args.push("--vol".to_string());
            args.push(MUTED_VOLUME_MILLIBELS.to_string());
        }
        args.push(self.path.to_string_lossy().into_owned());
        args
    }
}

/// A running player as seen by the supervisor.
pub trait PlayerProcess {
    /// Non-blocking exit check.
    fn has_exited(&mut self) -> io::Result<bool>;

    /// Stops the process group and waits until it is gone. `grace` bounds
    /// the wait before escalating to a hard kill.
    fn terminate(&mut self, grace: Duration) -> Result<(), PlayerError>;
}

pub trait Launcher {
    type Process: PlayerProcess;

    fn launch(&mut self, invocation: &Invocation) -> Result<Self::Process, PlayerError>;
}

/// Spawns the real player binary.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    binary: PathBuf,
}

impl CommandLauncher {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }
}

impl Launcher for CommandLauncher {
    type Process = ChildPlayer;

    fn launch(&mut self, invocation: &Invocation) -> Result<ChildPlayer, PlayerError> {
        let args = invocation.args();
        debug!("Spawning {} {:?}", self.binary.display(), args);
        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn()
            .map_err(|source| PlayerError::Spawn {
                path: invocation.path.clone(),
                source,
            })?;
        Ok(ChildPlayer { child, reaped: false })
    }
}

pub struct ChildPlayer {
    child: Child,
    // Once set, the pgid may belong to someone else.
    reaped: bool,
}

impl ChildPlayer {
    fn try_reap(&mut self) -> io::Result<bool> {
        if !self.reaped {
            self.reaped = self.child.try_wait()?.is_some();
        }
        Ok(self.reaped)
    }

    fn signal_group(&self, signal: Signal) -> Result<(), PlayerError> {
        let pgid = self.child.id() as i32;
        match killpg(Pid::from_raw(pgid), signal) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(source) => Err(PlayerError::Signal { pgid, source }),
        }
    }
}

impl PlayerProcess for ChildPlayer {
    fn has_exited(&mut self) -> io::Result<bool> {
        self.try_reap()
    }

    fn terminate(&mut self, grace: Duration) -> Result<(), PlayerError> {
        if self.reaped {
            return Ok(());
        }
        if self.try_reap()? {
            // Leader just went; helpers may still hold the group.
            return self.signal_group(Signal::SIGKILL);
        }
        self.signal_group(Signal::SIGTERM)?;
        if self.child.wait_timeout(grace)?.is_none() {
            warn!("Player {} ignored SIGTERM, killing", self.child.id());
            self.signal_group(Signal::SIGKILL)?;
            self.child.wait()?;
        }
        self.reaped = true;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Spawning,
    Running,
}

/// Result of a per-tick poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Idle,
    Running,
    /// The player exited on its own. `premature` is set when it lived less
    /// than the minimum runtime.
    Ended { premature: bool },
}

struct Running<P> {
    process: P,
    path: PathBuf,
    started_at: Instant,
}

pub struct Supervisor<L: Launcher> {
    launcher: L,
    state: SupervisorState,
    current: Option<Running<L::Process>>,
}

impl<L: Launcher> Supervisor<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            state: SupervisorState::Idle,
            current: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SupervisorState::Running
    }

    #[cfg(test)]
    pub fn current_path(&self) -> Option<&std::path::Path> {
        self.current.as_ref().map(|running| running.path.as_path())
    }

    /// Replaces whatever runs with a new player for `invocation`.
    pub fn spawn(&mut self, invocation: &Invocation, now: Instant) -> Result<(), PlayerError> {
        self.terminate();
        self.state = SupervisorState::Spawning;
        match self.launcher.launch(invocation) {
            Ok(process) => {
                info!("Playing {}", invocation.path.display());
                self.current = Some(Running {
                    process,
                    path: invocation.path.clone(),
                    started_at: now,
                });
                self.state = SupervisorState::Running;
                Ok(())
            }
            Err(e) => {
                self.state = SupervisorState::Idle;
                Err(e)
            }
        }
    }

    pub fn poll(&mut self, now: Instant) -> PollOutcome {
        let Some(running) = self.current.as_mut() else {
            return PollOutcome::Idle;
        };
        match running.process.has_exited() {
            Ok(false) => PollOutcome::Running,
            Ok(true) => {
                let lived = now.saturating_duration_since(running.started_at);
                info!("Player finished {} after {:?}", running.path.display(), lived);
                self.current = None;
                self.state = SupervisorState::Idle;
                PollOutcome::Ended {
                    premature: lived < MIN_PLAYER_RUNTIME,
                }
            }
            Err(e) => {
                warn!("Cannot poll player for {}: {}", running.path.display(), e);
                PollOutcome::Running
            }
        }
    }

    /// Forced stop. Idempotent: a no-op when idle.
    pub fn terminate(&mut self) {
        if let Some(mut running) = self.current.take() {
            info!("Stopping player for {}", running.path.display());
            if let Err(e) = running.process.terminate(PLAYER_TERMINATE_GRACE) {
                warn!("Error while stopping player: {}", e);
            }
        }
        self.state = SupervisorState::Idle;
    }
}

impl<L: Launcher> Drop for Supervisor<L> {
    fn drop(&mut self) {
        self.terminate();
    }
}
