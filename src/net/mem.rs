//! In-process channel pair used by the test fixture: a full-duplex,
//! in-memory stand-in for a TCP/TLS connection between two parties.

use async_trait::async_trait;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::net::channel::Channel;
use crate::net::stats::Counters;

const BUFFER: usize = 1 << 20;

pub struct InMemoryChannel {
    reader: Mutex<ReadHalf<DuplexStream>>,
    writer: Mutex<WriteHalf<DuplexStream>>,
    counters: Counters,
}

/// A connected pair of in-memory channels: whatever is sent on one side can
/// be received on the other, full duplex.
#[must_use]
pub fn in_memory_pair() -> (InMemoryChannel, InMemoryChannel) {
    let (a, b) = duplex(BUFFER);
    let (ar, aw) = tokio::io::split(a);
    let (br, bw) = tokio::io::split(b);
    (
        InMemoryChannel {
            reader: Mutex::new(ar),
            writer: Mutex::new(aw),
            counters: Counters::default(),
        },
        InMemoryChannel {
            reader: Mutex::new(br),
            writer: Mutex::new(bw),
            counters: Counters::default(),
        },
    )
}

#[async_trait]
impl Channel for InMemoryChannel {
    async fn send(&self, bytes: &[u8]) -> Result<()> {
        let mut w = self.writer.lock().await;
        w.write_all(bytes).await.map_err(|e| Error::Transport(e.to_string()))?;
        self.counters.add_sent(bytes.len() as u64);
        Ok(())
    }

    async fn recv(&self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let mut r = self.reader.lock().await;
        r.read_exact(&mut buf).await.map_err(|e| Error::Transport(e.to_string()))?;
        self.counters.add_received(len as u64);
        Ok(buf)
    }

    fn stats(&self) -> &Counters {
        &self.counters
    }
}
