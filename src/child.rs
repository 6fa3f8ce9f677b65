use super::Result;
use crate::probe;

use std::process::{ExitStatus, Stdio};

use eyre::eyre;
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info};

/// A child process spawned as a probe target, with piped stdin and stdout.
///
/// Stderr is inherited so diagnostics from the child land in ours.
pub struct ChildProcess {
    pid: Pid,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<BufReader<ChildStdout>>,
    exit_status: Option<ExitStatus>,
}

impl ChildProcess {
    /// Spawns `command` with the given arguments.
    pub fn spawn(command: &str, args: &[String]) -> Result<Self> {
        info!("spawning child: {} {:?}", command, args);

        let mut cmd = Command::new(command);
        cmd.args(args);
        cmd.kill_on_drop(true);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::inherit());

        let mut child = cmd
            .spawn()
            .map_err(|e| eyre!("failed to spawn '{}': {}", command, e))?;

        let pid = match child.id() {
            Some(pid) => Pid::from_raw(pid.try_into()?),
            None => return Err(eyre!("failed to get process ID")),
        };

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().map(BufReader::new);

        info!("child spawned with PID: {}", pid);
        Ok(Self {
            pid,
            child,
            stdin,
            stdout,
            exit_status: None,
        })
    }

    /// Process id of the child. Only meaningful until [`wait`](Self::wait)
    /// has collected the exit status.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Takes ownership of the child's stdin handle, e.g. for a relay task.
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.stdin.take()
    }

    /// Takes ownership of the child's buffered stdout handle.
    pub fn take_stdout(&mut self) -> Option<BufReader<ChildStdout>> {
        self.stdout.take()
    }

    /// Writes `data` to the child's stdin and flushes.
    pub async fn write_input(&mut self, data: &[u8]) -> Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| eyre!("child stdin is not available"))?;
        stdin.write_all(data).await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Reads one line from the child's stdout, including the trailing
    /// newline. Returns an error on EOF.
    pub async fn read_output_line(&mut self) -> Result<String> {
        let stdout = self
            .stdout
            .as_mut()
            .ok_or_else(|| eyre!("child stdout is not available"))?;
        let mut line = String::new();
        let n = stdout.read_line(&mut line).await?;
        if n == 0 {
            return Err(eyre!("child stdout closed before producing output"));
        }
        Ok(line)
    }

    /// Sends a signal to the child.
    pub fn signal(&self, signal: Signal) -> Result<()> {
        probe::send_signal(self.pid, signal)
    }

    /// Sends the termination signal (SIGKILL) to the child.
    pub fn terminate(&self) -> Result<()> {
        debug!("terminating child {}", self.pid);
        self.signal(Signal::SIGKILL)
    }

    /// Waits for the child to exit and collects its exit status.
    ///
    /// This is the reaping point: until it runs, an exited child lingers as
    /// a zombie and still answers the null probe. Only afterwards does
    /// [`probe::probe`] report the pid gone.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        let status = self.child.wait().await?;
        self.exit_status = Some(status);
        info!("child {} exited with status: {:?}", self.pid, status);
        Ok(status)
    }

    /// Exit status of the child, if it has been reaped.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }
}
