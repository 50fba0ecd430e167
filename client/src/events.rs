use crate::{Error, Result};
use commonware_codec::ReadExt;
use ethers::types::Address;
use futures_util::Stream as FutStream;
use mollinalli_types::Event;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Stream of contract events concerning one player.
///
/// Frames come from any transport (log subscription, relay, test channel) as encoded
/// [`Event`]s. Frames that fail to decode are surfaced as [`Error::InvalidData`] without
/// ending the stream; the stream ends with [`Error::ConnectionClosed`] once the source is
/// exhausted.
pub struct Stream {
    receiver: mpsc::Receiver<Result<Event>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Drop for Stream {
    fn drop(&mut self) {
        self._handle.abort();
    }
}

impl Stream {
    fn capacity_or_default(capacity: usize) -> usize {
        if capacity == 0 {
            DEFAULT_CHANNEL_CAPACITY
        } else {
            capacity
        }
    }

    fn spawn_reader(
        mut frames: mpsc::Receiver<Vec<u8>>,
        tx: mpsc::Sender<Result<Event>>,
        address: Address,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(data) = frames.recv().await {
                let initial_len = data.len();
                trace!(len = initial_len, "received event frame");
                let mut buf = data.as_slice();
                match Event::read(&mut buf) {
                    Ok(event) => {
                        let remaining = buf.len();
                        if remaining != 0 {
                            debug!(
                                len = initial_len,
                                remaining, "decoded event frame with trailing bytes"
                            );
                        }
                        if !event.concerns(&address) {
                            trace!("skipping event for another player");
                            continue;
                        }
                        if tx.send(Ok(event)).await.is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => {
                        warn!(len = initial_len, error = %e, "failed to decode event frame");
                        if tx.send(Err(Error::InvalidData(e))).await.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("event source closed");
            let _ = tx.send(Err(Error::ConnectionClosed)).await;
        })
    }

    /// Watch `frames` for events concerning `address`.
    pub fn new(frames: mpsc::Receiver<Vec<u8>>, address: Address) -> Self {
        Self::new_with_capacity(frames, address, DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn new_with_capacity(
        frames: mpsc::Receiver<Vec<u8>>,
        address: Address,
        capacity: usize,
    ) -> Self {
        let capacity = Self::capacity_or_default(capacity);
        let (tx, rx) = mpsc::channel(capacity);
        let handle = Self::spawn_reader(frames, tx, address);
        Self {
            receiver: rx,
            _handle: handle,
        }
    }

    /// Receive the next event from the stream
    pub async fn next(&mut self) -> Option<Result<Event>> {
        self.receiver.recv().await
    }
}

impl FutStream for Stream {
    type Item = Result<Event>;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
