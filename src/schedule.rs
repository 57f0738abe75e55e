//! Cooperative single-threaded scheduler.
//!
//! Components never hold callbacks. They register as an owner, then ask for
//! timers (one-shot, at an absolute time in milliseconds) or per-frame
//! subscriptions. The frame loop drains due timers with
//! [`Scheduler::pop_due`] and dispatches each back to its owner.
//!
//! Releasing an owner drops every timer and subscription it holds, so a
//! component that has been torn down can never receive another event.
//!
//! ```ignore
//! let owner = scheduler.register_owner();
//! scheduler.set_timeout(owner, now + 500, STEP);
//!
//! // Frame loop:
//! for fired in scheduler.pop_due(now) {
//!     if fired.owner == owner { /* handle fired.token */ }
//! }
//!
//! // Teardown:
//! scheduler.release(owner);
//! ```

use std::collections::{BTreeMap, BTreeSet};

/// A component registered with the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerId(u32);

/// A pending one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// A per-frame subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// A timer whose deadline has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub id: TimerId,
    pub owner: OwnerId,
    /// Owner-chosen tag telling the owner what the timer was for.
    pub token: u32,
    /// When the timer was due, in milliseconds.
    pub deadline: u64,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    owner: OwnerId,
    token: u32,
}

/// Timers and frame subscriptions for every mounted component.
#[derive(Debug, Default)]
pub struct Scheduler {
    next_owner: u32,
    next_id: u64,
    // Keyed by (deadline, id); ids grow, so equal deadlines fire in FIFO order
    timers: BTreeMap<(u64, TimerId), Timer>,
    subscriptions: BTreeMap<SubscriptionId, OwnerId>,
    owners: BTreeSet<OwnerId>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an owner handle for a component.
    pub fn register_owner(&mut self) -> OwnerId {
        let owner = OwnerId(self.next_owner);
        self.next_owner += 1;
        self.owners.insert(owner);
        owner
    }

    /// Whether `owner` is registered and not yet released.
    pub fn is_registered(&self, owner: OwnerId) -> bool {
        self.owners.contains(&owner)
    }

    /// Fire `token` for `owner` once `at_ms` is reached.
    ///
    /// Timers for an owner that is not registered are dropped and never
    /// fire.
    pub fn set_timeout(&mut self, owner: OwnerId, at_ms: u64, token: u32) -> TimerId {
        let id = self.next_timer_id();
        if self.owners.contains(&owner) {
            self.timers.insert((at_ms, id), Timer { owner, token });
        } else {
            log::debug!("Dropping timer for released owner {:?}", owner);
        }
        id
    }

    /// Cancel a pending timer. Returns `false` if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let key = self.timers.keys().find(|(_, t)| *t == id).copied();
        key.and_then(|k| self.timers.remove(&k)).is_some()
    }

    /// Ask for a callback every frame.
    pub fn subscribe_frames(&mut self, owner: OwnerId) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        if self.owners.contains(&owner) {
            self.subscriptions.insert(id, owner);
        }
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Drop every timer and subscription of `owner` and unregister it.
    pub fn release(&mut self, owner: OwnerId) {
        let timers = self.timers.len();
        let subs = self.subscriptions.len();
        self.timers.retain(|_, t| t.owner != owner);
        self.subscriptions.retain(|_, o| *o != owner);
        self.owners.remove(&owner);
        log::debug!(
            "Released {:?}: {} timers, {} subscriptions",
            owner,
            timers - self.timers.len(),
            subs - self.subscriptions.len()
        );
    }

    /// Remove and return every timer due at or before `now`, earliest first.
    pub fn pop_due(&mut self, now: u64) -> Vec<FiredTimer> {
        let later = self.timers.split_off(&(now.saturating_add(1), TimerId(0)));
        let due = std::mem::replace(&mut self.timers, later);
        due.into_iter()
            .map(|((deadline, id), timer)| FiredTimer {
                id,
                owner: timer.owner,
                token: timer.token,
                deadline,
            })
            .collect()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.keys().next().map(|(deadline, _)| *deadline)
    }

    pub fn is_subscribed(&self, owner: OwnerId) -> bool {
        self.subscriptions.values().any(|o| *o == owner)
    }

    /// Number of timers still pending for `owner`.
    pub fn pending_for(&self, owner: OwnerId) -> usize {
        self.timers.values().filter(|t| t.owner == owner).count()
    }

    /// Owners with at least one frame subscription, in subscription order.
    pub fn frame_subscribers(&self) -> impl Iterator<Item = OwnerId> + '_ {
        self.subscriptions.values().copied()
    }

    fn next_timer_id(&mut self) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        id
    }
}
