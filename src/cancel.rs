use crossbeam_channel::{Receiver, Sender, bounded, select};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::FengenError;

/// Shared, cooperative cancellation signal.
///
/// Cancelling drops the only sender of an internal channel, so every stage
/// blocked in [`Cancellation::send`] or [`Cancellation::recv`] wakes up
/// immediately.
#[derive(Clone, Debug)]
pub struct Cancellation {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellation {
    pub fn new() -> Self {
        let (trigger, signal) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                signal,
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), FengenError> {
        if self.is_cancelled() {
            Err(FengenError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Blocking push that gives up on cancellation. A disconnected receiver
    /// means the consumer already stopped, which is reported the same way.
    pub fn send<T>(&self, tx: &Sender<T>, value: T) -> Result<(), FengenError> {
        self.check()?;
        select! {
            send(tx, value) -> res => res.map_err(|_| FengenError::Cancelled),
            recv(self.inner.signal) -> _ => Err(FengenError::Cancelled),
        }
    }

    /// Blocking pop that gives up on cancellation. `Ok(None)` means the
    /// queue is closed and drained.
    pub fn recv<T>(&self, rx: &Receiver<T>) -> Result<Option<T>, FengenError> {
        self.check()?;
        select! {
            recv(rx) -> msg => Ok(msg.ok()),
            recv(self.inner.signal) -> _ => Err(FengenError::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_new_is_not_cancelled() {
        let cancel = Cancellation::new();
        assert!(!cancel.is_cancelled());
        assert!(cancel.check().is_ok());
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let cancel = Cancellation::new();
        let other = cancel.clone();
        other.cancel();
        assert!(cancel.is_cancelled());
        assert!(matches!(cancel.check(), Err(FengenError::Cancelled)));
    }

    #[test]
    fn test_send_and_recv_pass_values_through() {
        let cancel = Cancellation::new();
        let (tx, rx) = bounded(1);
        cancel.send(&tx, 7).unwrap();
        assert_eq!(cancel.recv(&rx).unwrap(), Some(7));

        drop(tx);
        assert_eq!(cancel.recv(&rx).unwrap(), None);
    }

    #[test]
    fn test_cancel_unblocks_full_queue() {
        let cancel = Cancellation::new();
        let (tx, _rx) = bounded(1);
        cancel.send(&tx, 1).unwrap();

        let canceller = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            canceller.cancel();
        });

        assert!(matches!(cancel.send(&tx, 2), Err(FengenError::Cancelled)));
        handle.join().unwrap();
    }

    #[test]
    fn test_cancel_unblocks_empty_queue() {
        let cancel = Cancellation::new();
        let (_tx, rx) = bounded::<u32>(1);

        let canceller = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            canceller.cancel();
        });

        assert!(matches!(cancel.recv(&rx), Err(FengenError::Cancelled)));
        handle.join().unwrap();
    }

    #[test]
    fn test_send_to_closed_queue_is_cancelled() {
        let cancel = Cancellation::new();
        let (tx, rx) = bounded(1);
        drop(rx);
        assert!(matches!(cancel.send(&tx, 1), Err(FengenError::Cancelled)));
    }
}
