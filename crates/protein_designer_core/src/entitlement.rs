//! crates/protein_designer_core/src/entitlement.rs
//!
//! Plan-based permission and quota for starting new generations.

use tracing::debug;

use crate::domain::{User, UserUpdate};

/// Owns the user record of one session and answers whether another generation
/// may start.
///
/// There is no internal locking: callers serialize access (the designer session
/// keeps the tracker behind its own mutex) and must check [`can_generate`]
/// before calling [`record_generation`].
///
/// [`can_generate`]: EntitlementTracker::can_generate
/// [`record_generation`]: EntitlementTracker::record_generation
#[derive(Debug, Clone)]
pub struct EntitlementTracker {
    user: User,
}

impl EntitlementTracker {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn can_generate(&self) -> bool {
        self.user.plan.is_unlimited() || self.user.generations_used < self.user.generations_limit
    }

    /// Generations left before the quota is exhausted, or `None` when unlimited.
    pub fn remaining(&self) -> Option<u32> {
        if self.user.plan.is_unlimited() {
            return None;
        }
        Some(self.user.generations_limit.saturating_sub(self.user.generations_used))
    }

    /// Counts one finished generation. No clamp against the limit is applied;
    /// the counter saturates at `u32::MAX` instead of wrapping.
    pub fn record_generation(&mut self) {
        self.user.generations_used = self.user.generations_used.saturating_add(1);
        debug!(
            user_id = %self.user.id,
            used = self.user.generations_used,
            limit = self.user.generations_limit,
            "Recorded generation"
        );
    }

    /// Merges `update` into the user record; the last write wins.
    pub fn update(&mut self, update: UserUpdate) {
        if let Some(email) = update.email {
            self.user.email = email;
        }
        if let Some(plan) = update.plan {
            self.user.plan = plan;
        }
        if let Some(used) = update.generations_used {
            self.user.generations_used = used;
        }
        if let Some(limit) = update.generations_limit {
            self.user.generations_limit = limit;
        }
    }
}
