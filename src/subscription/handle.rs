// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Owned subscription handles.

use std::sync::Weak;

use super::SubscriptionId;

/// Something a [`Subscription`] can be released from.
pub trait SubscriptionSource: Send + Sync {
    /// Removes the subscription with the given ID.
    ///
    /// Returns `true` if it was still registered.
    fn release(&self, id: SubscriptionId) -> bool;
}

/// Handle to a live subscription.
///
/// Setup calls return a `Subscription` that the owner stores. The
/// subscription is torn down when the handle is dropped or
/// [`unsubscribe`](Self::unsubscribe) is called, so no callback outlives
/// the entity that registered it.
///
/// The handle holds only a weak reference to its source: dropping the
/// source first is fine.
#[must_use = "dropping a Subscription immediately unsubscribes it"]
pub struct Subscription {
    id: SubscriptionId,
    source: Option<Weak<dyn SubscriptionSource>>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, source: Weak<dyn SubscriptionSource>) -> Self {
        Self {
            id,
            source: Some(source),
        }
    }

    /// Returns the subscription ID.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns `true` while the source is alive and the handle not released.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.source
            .as_ref()
            .is_some_and(|source| source.strong_count() > 0)
    }

    /// Tears the subscription down.
    ///
    /// Returns `true` if the source still held it.
    pub fn unsubscribe(mut self) -> bool {
        self.release()
    }

    fn release(&mut self) -> bool {
        self.source
            .take()
            .and_then(|weak| weak.upgrade())
            .is_some_and(|source| source.release(self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::subscription::CallbackRegistry;

    fn handle_for(registry: &Arc<CallbackRegistry<()>>, id: SubscriptionId) -> Subscription {
        let weak: Weak<CallbackRegistry<()>> = Arc::downgrade(registry);
        Subscription::new(id, weak)
    }

    #[test]
    fn drop_releases_callback() {
        let registry = Arc::new(CallbackRegistry::<()>::new());
        let id = registry.subscribe(|()| {});
        let handle = handle_for(&registry, id);

        assert!(handle.is_active());
        drop(handle);
        assert!(registry.is_empty());
    }

    #[test]
    fn explicit_unsubscribe() {
        let registry = Arc::new(CallbackRegistry::<()>::new());
        let id = registry.subscribe(|()| {});
        let handle = handle_for(&registry, id);

        assert_eq!(handle.id(), id);
        assert!(handle.unsubscribe());
        assert!(registry.is_empty());
    }

    #[test]
    fn source_dropped_first() {
        let registry = Arc::new(CallbackRegistry::<()>::new());
        let id = registry.subscribe(|()| {});
        let handle = handle_for(&registry, id);

        drop(registry);
        assert!(!handle.is_active());
        assert!(!handle.unsubscribe());
    }
}
