//! Transport layer: a `Channel` abstraction with three backends — in-memory
//! (tests), plain TCP (localhost mode), and TLS-wrapped TCP (`tls` feature).

mod channel;
#[cfg(any(test, feature = "in-memory-infra"))]
pub mod mem;
pub mod stats;
pub mod tcp;
#[cfg(feature = "tls")]
pub mod tls;

pub use channel::{recv_ring_values, recv_segmented_bytes, send_ring_values, send_segmented_bytes, Channel, SEG};
pub use stats::{Counters, StatsPoint};
