use super::Result;

use std::time::Duration;

use eyre::eyre;
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::time::sleep;
use tracing::{debug, trace};

/// Sends the null signal to `pid` to test existence without affecting it.
///
/// Succeeds while the kernel still knows the pid. Note that this includes
/// zombies: a child that has exited but not been reaped still answers the
/// probe. The probe only starts failing once the exit status has been
/// collected.
pub fn probe(pid: Pid) -> Result<()> {
    match kill(pid, None) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => Err(eyre!("process {} not found", pid)),
        Err(Errno::EPERM) => Err(eyre!("not permitted to signal process {}", pid)),
        Err(e) => Err(eyre!("probe of process {} failed: {}", pid, e)),
    }
}

/// Boolean view of [`probe`].
pub fn is_alive(pid: Pid) -> bool {
    probe(pid).is_ok()
}

/// Sends a real signal to `pid`.
pub fn send_signal(pid: Pid, signal: Signal) -> Result<()> {
    debug!("sending signal {:?} to process {}", signal, pid);
    kill(pid, signal).map_err(|e| eyre!("failed to send {:?} to process {}: {}", signal, pid, e))
}

/// Polls the null probe until `pid` stops answering.
///
/// Callers that want a deadline wrap this in `tokio::time::timeout`.
pub async fn wait_until_gone(pid: Pid, interval: Duration) {
    while is_alive(pid) {
        trace!("process {} still alive, polling again in {:?}", pid, interval);
        sleep(interval).await;
    }
    debug!("process {} no longer answers the null probe", pid);
}
