//! Cooperative cancellation for waits on the durability collaborator.
//!
//! A [`CancellationSignal`] is handed to every mutating container operation.
//! Firing it stops the caller from waiting on the dirty notification; it never
//! rolls back a mutation that was already applied.

use std::{
    future::Future,
    pin::pin,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use futures::future::{Either, select};
use tokio::sync::Notify;

use crate::error::{ContainerError, ContainerResult};

#[derive(Debug, Default)]
struct SignalState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A cloneable cancellation handle.
///
/// All clones observe the same state. The default signal is live until
/// [`cancel`](CancellationSignal::cancel) is called on it or one of its clones.
///
/// # Example
///
/// ```ignore
/// use docstash::prelude::*;
///
/// let cancel = CancellationSignal::new();
/// let waiter = cancel.clone();
///
/// cancel.cancel();
/// assert!(waiter.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    state: Arc<SignalState>,
}

impl CancellationSignal {
    /// Creates a new signal that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the signal, waking every task waiting in [`cancelled`](Self::cancelled).
    ///
    /// Calling this more than once has no further effect.
    pub fn cancel(&self) {
        if !self.state.cancelled.swap(true, Ordering::SeqCst) {
            self.state.notify.notify_waiters();
        }
    }

    /// Returns `true` once the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Completes when the signal fires.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent `cancel` cannot slip between them.
            let notified = self.state.notify.notified();

            if self.is_cancelled() {
                return;
            }

            notified.await;
        }
    }

    /// Drives `future` to completion unless the signal fires first.
    ///
    /// Returns [`ContainerError::Cancelled`] if the signal wins the race, including
    /// when it had already fired before the call.
    pub async fn run<F, T>(&self, future: F) -> ContainerResult<T>
    where
        F: Future<Output = ContainerResult<T>>,
    {
        if self.is_cancelled() {
            return Err(ContainerError::Cancelled);
        }

        let future = pin!(future);
        let cancelled = pin!(self.cancelled());

        match select(future, cancelled).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => Err(ContainerError::Cancelled),
        }
    }
}
