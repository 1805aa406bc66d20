// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Debounced state emission.
//!
//! Chatty devices report many changes per physical event (a Z-Wave node
//! can send a dozen value-changed notifications while waking up).
//! [`UpdateDebouncer`] coalesces such a burst into a single emission.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

type EmitCallback = Arc<dyn Fn() + Send + Sync>;

/// Single-flight, time-coalesced emission.
///
/// The first [`schedule_update`](Self::schedule_update) of a burst arms a
/// one-shot timer; later calls while it is pending are no-ops. When the
/// timer fires the emit callback runs once and the debouncer becomes idle
/// again. The delay is measured from the first call of the burst.
///
/// The timer is a `tokio` task owned by the debouncer: [`cancel`](Self::cancel)
/// or dropping the debouncer aborts it, so an emission never runs after
/// its owner is gone.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
/// use hubstate_lib::scheduler::UpdateDebouncer;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let emitted = Arc::new(AtomicU32::new(0));
/// let emitted_clone = emitted.clone();
/// let debouncer = UpdateDebouncer::new(move || {
///     emitted_clone.fetch_add(1, Ordering::SeqCst);
/// });
///
/// assert!(debouncer.schedule_update());
/// assert!(!debouncer.schedule_update());
///
/// tokio::time::sleep(Duration::from_millis(150)).await;
/// assert_eq!(emitted.load(Ordering::SeqCst), 1);
/// # }
/// ```
pub struct UpdateDebouncer {
    delay: Duration,
    pending: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
    emit: EmitCallback,
}

impl UpdateDebouncer {
    /// Default coalescing window.
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

    /// Creates a debouncer with the default 100ms window.
    #[must_use]
    pub fn new<F>(emit: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::with_delay(Self::DEFAULT_DELAY, emit)
    }

    /// Creates a debouncer with a custom window.
    #[must_use]
    pub fn with_delay<F>(delay: Duration, emit: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            delay,
            pending: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
            emit: Arc::new(emit),
        }
    }

    /// Returns the coalescing window.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Requests an emission.
    ///
    /// Returns `true` if this call armed the timer, `false` if an emission
    /// was already pending or no `tokio` runtime is running (the owner is
    /// not attached to a live host yet, so there is nothing to notify).
    pub fn schedule_update(&self) -> bool {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No runtime available, skipping state update");
            return false;
        };

        if self
            .pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::trace!("State update already pending");
            return false;
        }

        let delay = self.delay;
        let pending = Arc::clone(&self.pending);
        let emit = Arc::clone(&self.emit);
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            emit();
            pending.store(false, Ordering::Release);
        });

        if let Some(previous) = self.task.lock().replace(handle) {
            // Only finished tasks can be left here
            previous.abort();
        }
        true
    }

    /// Returns `true` while an emission is armed and has not fired yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Aborts a pending emission.
    ///
    /// Returns `true` if one was pending.
    pub fn cancel(&self) -> bool {
        let Some(handle) = self.task.lock().take() else {
            return false;
        };
        handle.abort();
        self.pending.swap(false, Ordering::AcqRel)
    }
}

impl Drop for UpdateDebouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for UpdateDebouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateDebouncer")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish_non_exhaustive()
    }
}
