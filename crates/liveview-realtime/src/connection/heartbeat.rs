//! Idle deadline for inbound WebSocket traffic.
//!
//! Clients ping at least once per presence TTL window. A socket that stays
//! silent for a whole window is treated as dead, so half-open connections
//! are reaped instead of pinning their viewer in the group.

use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::time;

/// Outcome of waiting for the next inbound frame.
#[derive(Debug, PartialEq, Eq)]
pub enum Inbound<T> {
    /// A frame arrived within the window.
    Frame(T),
    /// The stream ended.
    Ended,
    /// Nothing arrived for a whole window.
    Idle,
}

/// Wait for the next item of `stream`, giving up after `window`.
///
/// Every call starts a fresh window, so each received frame resets the
/// deadline.
pub async fn next_inbound<S>(stream: &mut S, window: Duration) -> Inbound<S::Item>
where
    S: Stream + Unpin,
{
    match time::timeout(window, stream.next()).await {
        Ok(Some(item)) => Inbound::Frame(item),
        Ok(None) => Inbound::Ended,
        Err(_) => Inbound::Idle,
    }
}

#[cfg(test)]
mod tests {
    use futures::channel::mpsc;

    use super::*;

    const WINDOW: Duration = Duration::from_secs(120);

    #[tokio::test(start_paused = true)]
    async fn test_silent_stream_goes_idle_after_window() {
        let (_tx, mut rx) = mpsc::unbounded::<u32>();
        let started = time::Instant::now();

        assert_eq!(next_inbound(&mut rx, WINDOW).await, Inbound::Idle);
        assert!(started.elapsed() >= WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_frame_resets_the_window() {
        let (tx, mut rx) = mpsc::unbounded::<u32>();
        let feeder = tokio::spawn(async move {
            for n in 0..3 {
                time::sleep(Duration::from_secs(100)).await;
                tx.unbounded_send(n).unwrap();
            }
            // keep the sender alive past the last window
            time::sleep(Duration::from_secs(1000)).await;
        });

        // 300s of traffic in total, never more than 100s apart
        for n in 0..3 {
            assert_eq!(next_inbound(&mut rx, WINDOW).await, Inbound::Frame(n));
        }
        assert_eq!(next_inbound(&mut rx, WINDOW).await, Inbound::Idle);
        feeder.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_stream_ends() {
        let (tx, mut rx) = mpsc::unbounded::<u32>();
        drop(tx);
        assert_eq!(next_inbound(&mut rx, WINDOW).await, Inbound::Ended);
    }
}
