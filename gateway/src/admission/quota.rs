//! Process-local upload quota per client identity

use dashmap::{mapref::entry::Entry, DashMap};

use super::ClientIdentity;

/// Maximum cumulative spend per client identity
pub const QUOTA_CEILING: u32 = 10;

/// Tracks how many units each client has spent during the process lifetime
///
/// Spend never decreases and there is no reset, so a client that reaches the
/// ceiling stays blocked until the process restarts.
#[derive(Debug)]
pub struct QuotaTracker {
    ledger: DashMap<ClientIdentity, u32>,
    ceiling: u32,
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::new(QUOTA_CEILING)
    }
}

impl QuotaTracker {
    /// Creates an empty ledger with the given ceiling
    #[must_use]
    pub fn new(ceiling: u32) -> Self {
        Self {
            ledger: DashMap::new(),
            ceiling,
        }
    }

    /// Maximum spend allowed per identity
    #[must_use]
    pub const fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Reserves `cost` units for `identity` if that keeps it within the ceiling
    ///
    /// The check and the increment happen while holding the entry's shard lock,
    /// so concurrent callers cannot jointly overshoot. A refused reservation
    /// leaves the ledger untouched.
    pub fn try_reserve(&self, identity: &ClientIdentity, cost: u32) -> bool {
        match self.ledger.entry(identity.clone()) {
            Entry::Occupied(mut entry) => {
                let spent = *entry.get();
                match spent.checked_add(cost) {
                    Some(total) if total <= self.ceiling => {
                        entry.insert(total);
                        true
                    }
                    _ => false,
                }
            }
            Entry::Vacant(entry) => {
                if cost > self.ceiling {
                    return false;
                }
                entry.insert(cost);
                true
            }
        }
    }

    /// Units spent so far by `identity`
    #[must_use]
    pub fn spent(&self, identity: &ClientIdentity) -> u32 {
        self.ledger.get(identity).map_or(0, |spent| *spent)
    }

    /// Units `identity` may still spend
    #[must_use]
    pub fn remaining(&self, identity: &ClientIdentity) -> u32 {
        self.ceiling.saturating_sub(self.spent(identity))
    }
}
