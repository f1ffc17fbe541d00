use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::net::stats::Counters;
use crate::ring::Ring;

/// Transport segmentation threshold, in ring elements (spec §4.2/§9). Any
/// logical message longer than this is split into independently
/// send/recv'd chunks, capping peak buffering and letting the two online
/// parties interleave sends and receives within a layer.
pub const SEG: usize = 100_000;

/// A reliable, ordered byte pipe between this party and one peer.
///
/// `send` blocks (awaits) until the bytes are handed to the OS; `recv`
/// blocks until exactly `len` bytes have been received. Any transport error
/// is fatal and aborts the evaluation (spec §4.2/§7): implementations
/// return `Error::Transport` rather than trying to recover.
#[async_trait]
pub trait Channel: Send + Sync {
    async fn send(&self, bytes: &[u8]) -> Result<()>;
    async fn recv(&self, len: usize) -> Result<Vec<u8>>;

    /// Exchanges a one-byte sentinel in both directions; returns only once
    /// both directions have completed. Used as a round barrier between the
    /// offline and online phases and before statistics collection.
    async fn sync(&self) -> Result<()> {
        self.send(&[0xA5]).await?;
        let buf = self.recv(1).await?;
        if buf != [0xA5] {
            return Err(Error::Transport("sync sentinel mismatch".into()));
        }
        Ok(())
    }

    fn stats(&self) -> &Counters;
}

/// Sends a slice of ring elements, segmenting at [`SEG`] so no single frame
/// exceeds the threshold. Each segment is its own independent send.
pub async fn send_ring_values(channel: &dyn Channel, values: &[Ring]) -> Result<()> {
    for chunk in values.chunks(SEG) {
        let mut bytes = Vec::with_capacity(chunk.len() * 4);
        for v in chunk {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        channel.send(&bytes).await?;
    }
    Ok(())
}

/// Receives exactly `count` ring elements, segmenting at [`SEG`] to match
/// the sender's framing.
pub async fn recv_ring_values(channel: &dyn Channel, count: usize) -> Result<Vec<Ring>> {
    let mut out = Vec::with_capacity(count);
    let mut remaining = count;
    while remaining > 0 {
        let take = remaining.min(SEG);
        let bytes = channel.recv(take * 4).await?;
        for chunk in bytes.chunks_exact(4) {
            out.push(Ring::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }
        remaining -= take;
    }
    Ok(out)
}

/// Sends a raw byte buffer, segmenting at `SEG * 4` bytes (the byte
/// equivalent of [`SEG`] ring elements) — used for the dealer's
/// already-serialized batched preprocessing payloads.
pub async fn send_segmented_bytes(channel: &dyn Channel, bytes: &[u8]) -> Result<()> {
    for chunk in bytes.chunks(SEG * 4) {
        channel.send(chunk).await?;
    }
    Ok(())
}

pub async fn recv_segmented_bytes(channel: &dyn Channel, len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(len);
    let mut remaining = len;
    while remaining > 0 {
        let take = remaining.min(SEG * 4);
        out.extend(channel.recv(take).await?);
        remaining -= take;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::mem::in_memory_pair;

    #[tokio::test]
    async fn segmented_round_trip() {
        let (a, b) = in_memory_pair();
        let values: Vec<Ring> = (0..(SEG + 10) as u32).map(Ring).collect();
        let values2 = values.clone();
        let sender = tokio::spawn(async move { send_ring_values(&a, &values2).await });
        let received = recv_ring_values(&b, values.len()).await.unwrap();
        sender.await.unwrap().unwrap();
        assert_eq!(values, received);
    }

    #[tokio::test]
    async fn sync_completes_both_directions() {
        let (a, b) = in_memory_pair();
        let (ra, rb) = tokio::join!(a.sync(), b.sync());
        ra.unwrap();
        rb.unwrap();
    }
}
