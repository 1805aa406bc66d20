// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback management for entity state emissions.
//!
//! This module provides the core types for managing subscription callbacks:
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`CallbackRegistry`] - Registry for storing and dispatching callbacks

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::handle::SubscriptionSource;

/// Unique identifier for a subscription.
///
/// This ID is returned when creating a subscription and can be used to
/// unsubscribe later. IDs are unique within the registry that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Creates a new subscription ID with the given value.
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// Monotonic source of subscription IDs.
#[derive(Debug)]
pub(crate) struct IdGenerator(AtomicU64);

impl IdGenerator {
    pub(crate) const fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    pub(crate) fn next(&self) -> SubscriptionId {
        SubscriptionId::new(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Registry of callbacks notified whenever an entity emits its state.
///
/// The host framework registers here to learn that presentation state
/// should be recomputed or persisted. Uses `parking_lot::RwLock` for
/// interior mutability so it can be shared between the event loop and
/// debounce tasks.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use hubstate_lib::subscription::CallbackRegistry;
///
/// let registry = CallbackRegistry::<u8>::new();
/// let seen = Arc::new(AtomicU32::new(0));
/// let seen_clone = seen.clone();
///
/// let id = registry.subscribe(move |value| {
///     seen_clone.fetch_add(u32::from(*value), Ordering::SeqCst);
/// });
///
/// registry.dispatch(&5);
/// assert_eq!(seen.load(Ordering::SeqCst), 5);
///
/// registry.unsubscribe(id);
/// registry.dispatch(&5);
/// assert_eq!(seen.load(Ordering::SeqCst), 5);
/// ```
pub struct CallbackRegistry<T> {
    ids: IdGenerator,
    callbacks: RwLock<HashMap<SubscriptionId, Callback<T>>>,
}

impl<T> CallbackRegistry<T> {
    /// Creates a new empty callback registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: IdGenerator::new(),
            callbacks: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a callback and returns its ID.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.ids.next();
        self.callbacks.write().insert(id, Arc::new(callback));
        id
    }

    /// Unregisters a callback by its subscription ID.
    ///
    /// Returns `true` if a callback was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks.write().remove(&id).is_some()
    }

    /// Clears all callbacks.
    pub fn clear(&self) {
        self.callbacks.write().clear();
    }

    /// Calls every registered callback with `value`.
    ///
    /// Callbacks run outside the lock, so a callback may unsubscribe
    /// itself. Returns the number of callbacks invoked.
    pub fn dispatch(&self, value: &T) -> usize {
        let callbacks: Vec<Callback<T>> = self.callbacks.read().values().cloned().collect();
        for callback in &callbacks {
            callback(value);
        }
        callbacks.len()
    }

    /// Returns the number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.callbacks.read().len()
    }

    /// Returns `true` if there are no registered callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callback_count() == 0
    }
}

impl<T> SubscriptionSource for CallbackRegistry<T> {
    fn release(&self, id: SubscriptionId) -> bool {
        self.unsubscribe(id)
    }
}

impl<T> Default for CallbackRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for CallbackRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}
