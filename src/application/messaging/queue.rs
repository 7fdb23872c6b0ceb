//! Outbound queue - Flood-controlled delivery of protocol lines
//!
//! At most [`MAX_BURST_BYTES`] are sent per burst. When the next line would
//! exceed that, the drain loop sends a [`FLOOD_PING`] and locks until the
//! dispatcher sees the matching PONG and calls [`OutboundQueue::unlock`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::application::errors::BotError;
use crate::domain::traits::LineSink;

/// Byte cap per burst
pub const MAX_BURST_BYTES: usize = 1472;

/// Ping sent when the cap is hit; the server answers `PONG <server> :excess`
pub const FLOOD_PING: &str = "PING :excess";

/// Drain loop cadence
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What the drain loop should write next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transmit {
    Line(String),
    /// Send [`FLOOD_PING`]; the queue is now locked
    FloodPing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainState {
    Idle,
    Draining,
    Locked,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<String>,
    transferred: usize,
    locked: bool,
}

/// Pending outbound lines shared by the dispatcher and the drain loop
#[derive(Debug, Default)]
pub struct OutboundQueue {
    state: Mutex<QueueState>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // Critical sections never run user code, so a poisoned lock still
    // holds consistent state.
    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, line: impl Into<String>) {
        self.state().pending.push_back(line.into());
    }

    /// Append a whole command list in order, under one lock
    pub fn extend<I>(&self, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.state().pending.extend(lines);
    }

    /// Release the flood lock
    pub fn unlock(&self) {
        self.state().locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.state().locked
    }

    /// Bytes sent in the current burst
    pub fn transferred(&self) -> usize {
        self.state().transferred
    }

    pub fn len(&self) -> usize {
        self.state().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().pending.is_empty()
    }

    pub fn drain_state(&self) -> DrainState {
        let state = self.state();
        if state.locked {
            DrainState::Locked
        } else if state.pending.is_empty() {
            DrainState::Idle
        } else {
            DrainState::Draining
        }
    }

    /// Snapshot of the pending lines, oldest first
    pub fn pending(&self) -> Vec<String> {
        self.state().pending.iter().cloned().collect()
    }

    /// One step of the drain loop.
    ///
    /// Returns nothing while locked or empty. If the oldest line would push
    /// the burst over the cap it stays queued, the counter resets and the
    /// queue locks behind a flood ping. Otherwise the line is dequeued and counted.
    pub fn tick(&self) -> Option<Transmit> {
        let mut state = self.state();
        if state.locked {
            return None;
        }
        let size = state.pending.front()?.len();
        if state.transferred + size > MAX_BURST_BYTES {
            state.locked = true;
            state.transferred = 0;
            return Some(Transmit::FloodPing);
        }
        state.transferred += size;
        state.pending.pop_front().map(Transmit::Line)
    }
}

/// Drain `queue` into `sink` every `interval` until the sink fails.
///
/// The caller stops the loop by aborting its task when the connection closes.
pub async fn drain<S: LineSink>(
    queue: Arc<OutboundQueue>,
    mut sink: S,
    interval: Duration,
) -> Result<(), BotError> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match queue.tick() {
            Some(Transmit::Line(line)) => sink.send_line(&line).await?,
            Some(Transmit::FloodPing) => {
                tracing::debug!("Burst limit reached, locking queue ({} pending)", queue.len());
                sink.send_line(FLOOD_PING).await?;
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn line(size: usize) -> String {
        "x".repeat(size)
    }

    fn run_until_idle(queue: &OutboundQueue) -> Vec<Transmit> {
        std::iter::from_fn(|| queue.tick()).collect()
    }

    #[test]
    fn test_lines_leave_in_order() {
        let queue = OutboundQueue::new();
        queue.extend(vec!["NICK bot".to_string(), "USER a b c :d".to_string()]);
        queue.push("JOIN #x");

        assert_eq!(
            run_until_idle(&queue),
            vec![
                Transmit::Line("NICK bot".into()),
                Transmit::Line("USER a b c :d".into()),
                Transmit::Line("JOIN #x".into()),
            ]
        );
        assert_eq!(queue.transferred(), 8 + 13 + 7);
        assert_eq!(queue.drain_state(), DrainState::Idle);
    }

    #[test]
    fn test_burst_cap_locks_and_withholds() {
        let queue = OutboundQueue::new();
        queue.extend((0..17).map(|_| line(100)));

        let sent = run_until_idle(&queue);
        assert_eq!(sent.len(), 15);
        assert!(sent[..14].iter().all(|t| matches!(t, Transmit::Line(l) if l.len() == 100)));
        assert_eq!(sent[14], Transmit::FloodPing);

        assert!(queue.is_locked());
        assert_eq!(queue.drain_state(), DrainState::Locked);
        assert_eq!(queue.transferred(), 0);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.tick(), None);
    }

    #[test]
    fn test_unlock_resumes_with_withheld_line() {
        let queue = OutboundQueue::new();
        queue.push(line(1400));
        queue.push("second".to_string());
        queue.push(line(100));

        assert!(matches!(queue.tick(), Some(Transmit::Line(_))));
        assert_eq!(queue.tick(), Some(Transmit::Line("second".into())));
        assert_eq!(queue.tick(), Some(Transmit::FloodPing));
        assert_eq!(queue.tick(), None);

        queue.unlock();
        assert_eq!(queue.tick(), Some(Transmit::Line(line(100))));
        assert_eq!(queue.transferred(), 100);
    }

    #[test]
    fn test_exactly_at_cap_is_sent() {
        let queue = OutboundQueue::new();
        queue.push(line(MAX_BURST_BYTES));
        assert_eq!(queue.tick(), Some(Transmit::Line(line(MAX_BURST_BYTES))));
        assert!(!queue.is_locked());
    }

    #[test]
    fn test_concurrent_pushes_keep_each_list_in_order() {
        let queue = Arc::new(OutboundQueue::new());
        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for batch in 0..50 {
                        queue.extend((0..3).map(|i| format!("{}-{}-{}", worker, batch, i)));
                    }
                })
            })
            .collect();

        let mut drained = Vec::new();
        while drained.len() < 600 {
            match queue.tick() {
                Some(Transmit::Line(l)) => drained.push(l),
                Some(Transmit::FloodPing) => queue.unlock(),
                None => std::thread::yield_now(),
            }
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // Each extend lands contiguously
        for chunk in drained.chunks(3) {
            let prefix = chunk[0].rsplit_once('-').unwrap().0;
            assert!(chunk.iter().all(|l| l.rsplit_once('-').unwrap().0 == prefix));
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        lines: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl LineSink for RecordingSink {
        async fn send_line(&mut self, line: &str) -> Result<(), BotError> {
            self.lines.lock().unwrap().push(line.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_drain_loop_pings_and_waits() {
        let queue = Arc::new(OutboundQueue::new());
        queue.extend((0..17).map(|_| line(100)));
        let sink = RecordingSink::default();
        let lines = sink.lines.clone();

        let task = tokio::spawn(drain(queue.clone(), sink, Duration::from_millis(1)));
        tokio::time::sleep(Duration::from_millis(300)).await;

        {
            let sent = lines.lock().unwrap();
            assert_eq!(sent.len(), 15);
            assert_eq!(sent[14], FLOOD_PING);
        }
        assert_eq!(queue.len(), 3);

        queue.unlock();
        tokio::time::sleep(Duration::from_millis(300)).await;
        task.abort();

        assert_eq!(lines.lock().unwrap().len(), 18);
        assert!(queue.is_empty());
    }
}
