use clap::{Parser, Subcommand};
use std::time::Duration;

/// A liveness prober for processes, built on the null signal
#[derive(Parser)]
#[command(name = "procprobe")]
#[command(about = "Probe process liveness with null signals")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check whether the given process ids are alive
    Check {
        /// Process ids to probe
        #[arg(required = true, value_parser = clap::value_parser!(i32).range(1..))]
        pids: Vec<i32>,
    },

    /// Poll until a process id stops answering the probe
    Wait {
        /// Process id to watch
        #[arg(value_parser = clap::value_parser!(i32).range(1..))]
        pid: i32,

        /// Polling interval (ms)
        #[arg(long, default_value = "100")]
        interval_ms: u64,

        /// Give up after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Spawn a command with piped stdio and report its liveness and exit
    Run {
        /// Command to execute
        command: String,

        /// Arguments for the command
        args: Vec<String>,
    },
}

/// Polling configuration for the `wait` subcommand
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Interval between probes
    pub interval: Duration,
    /// Overall deadline, if any
    pub timeout: Option<Duration>,
}

impl WaitConfig {
    /// Convert raw CLI millisecond/second values into durations
    pub fn from_cli(interval_ms: u64, timeout_secs: Option<u64>) -> Self {
        WaitConfig {
            interval: Duration::from_millis(interval_ms),
            timeout: timeout_secs.map(Duration::from_secs),
        }
    }
}
