//! Plain TCP transport for localhost runs, where the three parties trust
//! the loopback interface and skip certificate plumbing entirely.

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::net::channel::Channel;
use crate::net::stats::Counters;

pub struct TcpChannel {
    reader: Mutex<tokio::net::tcp::OwnedReadHalf>,
    writer: Mutex<tokio::net::tcp::OwnedWriteHalf>,
    counters: Counters,
}

impl TcpChannel {
    #[must_use]
    pub fn new(stream: TcpStream) -> Self {
        let _ = stream.set_nodelay(true);
        let (r, w) = stream.into_split();
        TcpChannel {
            reader: Mutex::new(r),
            writer: Mutex::new(w),
            counters: Counters::default(),
        }
    }

    /// Connects out to `addr`, retrying with backoff until the peer's
    /// listener is up — the peer parties are started independently and
    /// there is no ordering guarantee on who binds first.
    pub async fn connect(addr: &str) -> Result<Self> {
        let mut delay = std::time::Duration::from_millis(20);
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(30);
        loop {
            match TcpStream::connect(addr).await {
                Ok(stream) => return Ok(Self::new(stream)),
                Err(e) => {
                    if std::time::Instant::now() >= deadline {
                        return Err(Error::Transport(format!("connect to {addr} failed: {e}")));
                    }
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(std::time::Duration::from_millis(500));
                }
            }
        }
    }

    /// Binds `addr` and accepts exactly one inbound connection.
    pub async fn accept(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| Error::Transport(e.to_string()))?;
        let (stream, _) = listener.accept().await.map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self::new(stream))
    }
}

#[async_trait]
impl Channel for TcpChannel {
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
