use super::Result;

use std::pin::Pin;

use futures::stream::{select_all, Stream, StreamExt};
use tokio::signal::unix::{signal, SignalKind};
use tokio_stream::wrappers::SignalStream;

// SIGINT and SIGTERM, the termination requests `run` forwards to its child.
static SIGNALS: [SignalKind; 2] = [SignalKind::from_raw(2), SignalKind::from_raw(15)];

/// Multiplexed stream of termination requests delivered to this process.
pub struct Signals {
    stream: Pin<Box<dyn Stream<Item = ()>>>,
}

impl Signals {
    pub(super) fn new() -> Result<Self> {
        let mut streams = Vec::with_capacity(SIGNALS.len());
        for kind in SIGNALS {
            streams.push(SignalStream::new(signal(kind)?));
        }

        Ok(Signals {
            stream: Box::pin(select_all(streams)),
        })
    }

    /// Resolves when any of the registered signals arrives.
    pub(super) async fn next(&mut self) -> Option<()> {
        self.stream.next().await
    }
}
