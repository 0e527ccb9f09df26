//! Single-shot completion channels
//!
//! Hardware and background callbacks (announcement end, playback end, the
//! recording save) are modelled as a [`Pending`] value paired with a
//! [`Resolver`]. The resolver is consumed when it fires, so every pending
//! value resolves at most once.

use crate::{MockerviewError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

/// Create a connected resolver/pending pair
pub fn pending<T>() -> (Resolver<T>, Pending<T>) {
    let (tx, rx) = bounded(1);
    (Resolver { tx }, Pending { rx, settled: false })
}

/// Write half of a single-shot completion
#[derive(Debug)]
pub struct Resolver<T> {
    tx: Sender<Result<T>>,
}

impl<T> Resolver<T> {
    /// Resolve with an outcome. The receiving side may already be gone.
    pub fn resolve(self, outcome: Result<T>) {
        let _ = self.tx.try_send(outcome);
    }

    pub fn succeed(self, value: T) {
        self.resolve(Ok(value));
    }

    pub fn fail(self, error: MockerviewError) {
        self.resolve(Err(error));
    }

    /// Whether the pending side was dropped
    pub fn is_abandoned(&self) -> bool {
        self.tx.receiver_count() == 0
    }
}

/// Read half of a single-shot completion
#[derive(Debug)]
pub struct Pending<T> {
    rx: Receiver<Result<T>>,
    settled: bool,
}

impl<T> Pending<T> {
    /// A completion that is already resolved
    pub fn ready(outcome: Result<T>) -> Self {
        let (resolver, pending) = pending();
        resolver.resolve(outcome);
        pending
    }

    /// Non-blocking check. Returns `Some` exactly once.
    pub fn poll(&mut self) -> Option<Result<T>> {
        if self.settled {
            return None;
        }

        match self.rx.try_recv() {
            Ok(outcome) => {
                self.settled = true;
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.settled = true;
                Some(Err(MockerviewError::ChannelError(
                    "completion dropped before resolving".into(),
                )))
            }
        }
    }

    /// Whether the outcome has already been taken
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Block until resolved
    pub fn wait(self) -> Result<T> {
        self.rx.recv().unwrap_or_else(|_| {
            Err(MockerviewError::ChannelError(
                "completion dropped before resolving".into(),
            ))
        })
    }

    /// Block until resolved or the timeout elapses
    pub fn wait_timeout(self, timeout: Duration) -> Result<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => Err(MockerviewError::ChannelError(format!(
                "completion not resolved within {:?}",
                timeout
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(MockerviewError::ChannelError(
                "completion dropped before resolving".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_yields_once() {
        let (resolver, mut pending) = pending::<u32>();
        assert!(pending.poll().is_none());

        resolver.succeed(7);
        assert_eq!(pending.poll().unwrap().unwrap(), 7);
        assert!(pending.poll().is_none());
        assert!(pending.is_settled());
    }

    #[test]
    fn test_dropped_resolver_reports_channel_error() {
        let (resolver, mut pending) = pending::<()>();
        drop(resolver);

        match pending.poll() {
            Some(Err(MockerviewError::ChannelError(_))) => {}
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_ready_and_wait() {
        let pending = Pending::ready(Ok("done"));
        assert_eq!(pending.wait().unwrap(), "done");
    }

    #[test]
    fn test_resolver_notices_abandoned_pending() {
        let (resolver, pending) = pending::<()>();
        assert!(!resolver.is_abandoned());
        drop(pending);
        assert!(resolver.is_abandoned());
        // Resolving into nothing is harmless
        resolver.succeed(());
    }

    #[test]
    fn test_wait_timeout_from_worker_thread() {
        let (resolver, pending) = pending::<u8>();
        std::thread::spawn(move || resolver.succeed(3));
        assert_eq!(pending.wait_timeout(Duration::from_secs(5)).unwrap(), 3);
    }
}
