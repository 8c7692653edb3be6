// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Server process management.
//!
//! Spawns the MCP server with all three standard streams piped and owns the
//! child until it has been terminated and reaped. On Linux the child is bound
//! to our lifetime with `PR_SET_PDEATHSIG`, and every child is spawned with
//! `kill_on_drop` so a panicking probe never leaves it running.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::errors::{ProbeError, ProbeResult};

/// How the server went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Termination {
    /// Exit code, `None` when the process died from a signal
    pub code: Option<i32>,
    /// True when the grace period expired and the process had to be killed
    pub forced: bool,
}

/// Lifecycle control over a running server.
#[async_trait]
pub trait ProcessControl: Send {
    /// Ask the server to stop and block until it has exited.
    async fn terminate(&mut self) -> ProbeResult<Termination>;

    /// OS process id, if known.
    fn pid(&self) -> Option<u32>;
}

/// A freshly spawned server and its captured streams.
pub struct SpawnedServer {
    pub process: ServerProcess,
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
    pub stderr: ChildStderr,
}

pub struct ServerProcess {
    child: Child,
    grace: Duration,
}

impl ServerProcess {
    pub fn spawn(cmd: &str, args: &[String], grace: Duration) -> ProbeResult<SpawnedServer> {
        debug!("ServerProcess: spawning '{}' with args {:?}", cmd, args);

        let mut command = Command::new(cmd);
        command
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(target_os = "linux")]
        // SAFETY: prctl is async-signal-safe and touches no memory owned by
        // the parent. PR_SET_PDEATHSIG with SIGKILL makes the kernel kill the
        // server if the probe dies first.
        unsafe {
            command.pre_exec(|| {
                let ret = libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGKILL);
                if ret != 0 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let mut child = command
            .spawn()
            .map_err(|e| ProbeError::Spawn(format!("'{}': {}", cmd, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or(ProbeError::PipeUnavailable("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(ProbeError::PipeUnavailable("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(ProbeError::PipeUnavailable("stderr"))?;

        info!("Server started with pid {:?}", child.id());

        Ok(SpawnedServer {
            process: Self { child, grace },
            stdin,
            stdout,
            stderr,
        })
    }

    #[cfg(any(target_os = "linux", target_os = "macos"))]
    fn request_stop(&mut self) -> ProbeResult<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        let pid = i32::try_from(pid)
            .map_err(|_| ProbeError::Process(format!("pid {} out of range", pid)))?;
        match kill(Pid::from_raw(pid), Signal::SIGTERM) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(ProbeError::Process(format!("SIGTERM failed: {}", e))),
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    fn request_stop(&mut self) -> ProbeResult<()> {
        self.child
            .start_kill()
            .map_err(|e| ProbeError::Process(format!("kill failed: {}", e)))
    }
}

#[async_trait]
impl ProcessControl for ServerProcess {
    async fn terminate(&mut self) -> ProbeResult<Termination> {
        if let Some(status) = self.child.try_wait()? {
            debug!("Server already exited with {}", status);
            return Ok(Termination {
                code: status.code(),
                forced: false,
            });
        }

        self.request_stop()?;

        let waited = tokio::time::timeout(self.grace, self.child.wait()).await;
        match waited {
            Ok(status) => {
                let status = status?;
                info!("Server exited with {}", status);
                Ok(Termination {
                    code: status.code(),
                    forced: false,
                })
            }
            Err(_) => {
                warn!(
                    "Server ignored termination for {:?}, killing",
                    self.grace
                );
                self.child
                    .kill()
                    .await
                    .map_err(|e| ProbeError::Process(format!("kill failed: {}", e)))?;
                let status = self.child.wait().await?;
                Ok(Termination {
                    code: status.code(),
                    forced: true,
                })
            }
        }
    }

    fn pid(&self) -> Option<u32> {
        self.child.id()
    }
}
