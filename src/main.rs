type Result<T> = color_eyre::eyre::Result<T>;

mod child;
mod cli;
mod probe;
mod signals;

use std::os::unix::process::ExitStatusExt;

use clap::Parser;
use eyre::eyre;
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use tokio::select;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use child::ChildProcess;
use cli::{Cli, Command, WaitConfig};
use signals::Signals;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Check { pids } => run_check(&pids),
        Command::Wait {
            pid,
            interval_ms,
            timeout_secs,
        } => run_wait(pid, WaitConfig::from_cli(interval_ms, timeout_secs)).await,
        Command::Run { command, args } => run_command(&command, &args).await,
    }
}

/// Probe each pid once, reporting one line per pid on stdout.
///
/// Exits 1 if any pid failed the probe; a miss is a report, not a crash.
fn run_check(pids: &[i32]) -> Result<()> {
    let mut all_alive = true;

    for raw in pids {
        let pid = Pid::from_raw(*raw);
        match probe::probe(pid) {
            Ok(()) => println!("{} alive", pid),
            Err(e) => {
                println!("{} {}", pid, e);
                all_alive = false;
            }
        }
    }

    if !all_alive {
        std::process::exit(1);
    }
    Ok(())
}

/// Poll the null probe until the pid is gone, or the deadline passes.
async fn run_wait(pid: i32, config: WaitConfig) -> Result<()> {
    let pid = Pid::from_raw(pid);

    if !probe::is_alive(pid) {
        info!("process {} is already gone", pid);
        return Ok(());
    }

    info!("waiting for process {} to exit", pid);
    match config.timeout {
        Some(deadline) => {
            tokio::time::timeout(deadline, probe::wait_until_gone(pid, config.interval))
                .await
                .map_err(|_| {
                    eyre!("process {} still alive after {:?}", pid, deadline)
                })?;
        }
        None => probe::wait_until_gone(pid, config.interval).await,
    }

    info!("process {} exited", pid);
    Ok(())
}

/// Spawn a command, relay its stdio, and reap it on exit.
///
/// SIGINT and SIGTERM received while the child runs are forwarded to it as
/// SIGTERM. The child's exit code becomes ours.
async fn run_command(command: &str, args: &[String]) -> Result<()> {
    let mut child = ChildProcess::spawn(command, args)?;
    let pid = child.pid();

    // A freshly spawned child must answer the null probe.
    probe::probe(pid)?;
    debug!("process {} answers the null probe", pid);

    let mut child_stdin = child
        .take_stdin()
        .ok_or_else(|| eyre!("child stdin was not piped"))?;
    let mut child_stdout = child
        .take_stdout()
        .ok_or_else(|| eyre!("child stdout was not piped"))?;

    // Relay our stdin to the child and its stdout back to ours. The stdin
    // relay ends when our stdin closes, which closes the child's.
    tokio::spawn(async move {
        let mut stdin = tokio::io::stdin();
        let _ = tokio::io::copy(&mut stdin, &mut child_stdin).await;
    });
    let stdout_relay = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        let _ = tokio::io::copy(&mut child_stdout, &mut stdout).await;
    });

    let mut signal_stream = Signals::new()?;

    let status = loop {
        select! {
            status = child.wait() => break status?,

            Some(()) = signal_stream.next() => {
                info!("termination requested, forwarding SIGTERM to {}", pid);
                if let Err(e) = probe::send_signal(pid, Signal::SIGTERM) {
                    warn!("failed to forward SIGTERM: {}", e);
                }
            }
        }
    };

    // Drain whatever output was still in flight before we exit.
    let _ = stdout_relay.await;

    // The child is reaped, so the probe that succeeded at spawn must fail now.
    if probe::is_alive(pid) {
        warn!("process {} still answers the probe after reaping", pid);
    } else {
        debug!("process {} no longer answers the probe", pid);
    }

    info!("child exited with status: {:?}", status);

    // Exit directly: the stdin relay may still be parked in a blocking read
    // that would stall runtime shutdown. Signal deaths map to 128 + signum
    // so callers can tell a SIGKILL from an ordinary failure.
    let code = status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1);
    std::process::exit(code);
}
