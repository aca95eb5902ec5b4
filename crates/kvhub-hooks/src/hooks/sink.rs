//! Bounded per-hook error channel.

use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};

use kvhub_core::error::AppError;

/// Number of undrained errors a hook can accumulate before new ones are dropped.
pub const ERROR_SINK_CAPACITY: usize = 100;

/// Outcome of offering an error to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// The error was queued.
    Queued,
    /// The queue was full; the error was dropped.
    Full,
    /// The hook was unregistered (or the reader went away); the error was dropped.
    Closed,
}

/// Sending half, owned by the registration.
///
/// Closing takes the sender out, so a dispatch that snapshotted the
/// registration before unregistration finds `None` and skips.
#[derive(Debug)]
pub(crate) struct ErrorSink {
    tx: Mutex<Option<mpsc::Sender<AppError>>>,
}

impl ErrorSink {
    /// Creates a sink and the reader handed back to the registrant.
    pub(crate) fn channel() -> (Self, HookErrors) {
        let (tx, rx) = mpsc::channel(ERROR_SINK_CAPACITY);
        (
            Self {
                tx: Mutex::new(Some(tx)),
            },
            HookErrors { rx },
        )
    }

    /// Offers `err` without waiting.
    pub(crate) fn deliver(&self, err: AppError) -> Delivery {
        let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = guard.as_ref() else {
            return Delivery::Closed;
        };
        match tx.try_send(err) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => Delivery::Full,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    /// Drops the sender so the reader sees end-of-stream once drained.
    /// Returns `false` if already closed.
    pub(crate) fn close(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }
}

/// Read side of a hook's error stream.
///
/// Yields every failure the hook reported, up to [`ERROR_SINK_CAPACITY`]
/// undrained. After the hook is unregistered, buffered errors can still be
/// read and then [`HookErrors::recv`] returns `None`.
#[derive(Debug)]
pub struct HookErrors {
    rx: mpsc::Receiver<AppError>,
}

impl HookErrors {
    /// Waits for the next error. Returns `None` once the hook is
    /// unregistered and the buffer is drained.
    pub async fn recv(&mut self) -> Option<AppError> {
        self.rx.recv().await
    }

    /// Takes the next buffered error without waiting.
    pub fn try_recv(&mut self) -> Result<AppError, TryRecvError> {
        self.rx.try_recv()
    }

    /// Drains every currently buffered error.
    pub fn drain(&mut self) -> Vec<AppError> {
        let mut errors = Vec::new();
        while let Ok(err) = self.rx.try_recv() {
            errors.push(err);
        }
        errors
    }
}
