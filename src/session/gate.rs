//! Free-tier usage gate
//!
//! Counts user-initiated queries and uploads against a fixed threshold and
//! blocks further actions once the threshold is reached, until a paid
//! entitlement is recorded. State is loaded from the [`UsageStore`] once and
//! mirrored back on every mutation.
//!
//! The paid flag is trusted client-side. It stands in for a server-verified
//! entitlement check, which this client does not have an endpoint for.

use crate::error::{GovernaiError, Result};
use crate::storage::{keys, UsageStore};
use std::sync::{Arc, Mutex, MutexGuard};

/// Point-in-time view of the usage state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSnapshot {
    /// Actions consumed so far
    pub query_count: u32,
    /// Whether the paid flag is set
    pub is_paid: bool,
    /// Free action threshold
    pub limit: u32,
}

impl UsageSnapshot {
    /// True when new actions must be refused
    pub fn is_blocked(&self) -> bool {
        !self.is_paid && self.query_count >= self.limit
    }

    /// Free actions left; `None` once paid
    pub fn remaining_free_queries(&self) -> Option<u32> {
        if self.is_paid {
            None
        } else {
            Some(self.limit.saturating_sub(self.query_count))
        }
    }
}

#[derive(Debug)]
struct GateState {
    query_count: u32,
    is_paid: bool,
    prompt_visible: bool,
}

/// Usage limiter shared by queries and uploads
pub struct UsageGate {
    limit: u32,
    state: Mutex<GateState>,
    store: Arc<dyn UsageStore>,
}

impl UsageGate {
    /// Load persisted usage state
    ///
    /// An unparsable counter is treated as zero.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be read
    ///
    /// # Examples
    ///
    /// ```
    /// use governai::session::UsageGate;
    /// use governai::storage::MemoryUsageStore;
    /// use std::sync::Arc;
    ///
    /// let gate = UsageGate::load(Arc::new(MemoryUsageStore::new()), 5).unwrap();
    /// assert_eq!(gate.snapshot().query_count, 0);
    /// assert!(gate.check().is_ok());
    /// ```
    pub fn load(store: Arc<dyn UsageStore>, limit: u32) -> Result<Self> {
        let query_count = match store.get(keys::QUERY_COUNT)? {
            Some(raw) => raw.trim().parse::<u32>().unwrap_or_else(|_| {
                tracing::warn!("Ignoring unparsable stored query count: {:?}", raw);
                0
            }),
            None => 0,
        };
        let is_paid = store.get(keys::PAID)?.as_deref() == Some("true");

        tracing::debug!(query_count, is_paid, limit, "Loaded usage state");

        Ok(Self {
            limit,
            state: Mutex::new(GateState {
                query_count,
                is_paid,
                prompt_visible: false,
            }),
            store,
        })
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check whether a new action may start
    ///
    /// A rejection raises the upgrade prompt.
    ///
    /// # Errors
    ///
    /// Returns [`GovernaiError::UsageLimitReached`] when the threshold is
    /// reached and the paid flag is not set
    pub fn check(&self) -> std::result::Result<(), GovernaiError> {
        let mut state = self.lock();
        if !state.is_paid && state.query_count >= self.limit {
            state.prompt_visible = true;
            return Err(GovernaiError::UsageLimitReached {
                limit: self.limit,
                used: state.query_count,
            });
        }
        Ok(())
    }

    /// Count one action and persist the new total
    ///
    /// Returns `true` when this action reached the threshold and the upgrade
    /// prompt was raised. The in-memory count is updated even if persisting
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the new count cannot be written
    pub fn record_usage(&self) -> Result<bool> {
        let (count, signalled) = {
            let mut state = self.lock();
            state.query_count = state.query_count.saturating_add(1);
            let signalled = !state.is_paid && state.query_count >= self.limit;
            if signalled {
                state.prompt_visible = true;
            }
            (state.query_count, signalled)
        };

        self.store.set(keys::QUERY_COUNT, &count.to_string())?;
        if signalled {
            tracing::info!(count, limit = self.limit, "Free query limit reached");
        }
        Ok(signalled)
    }

    /// Record a paid entitlement and clear the upgrade prompt
    ///
    /// Calling this again is a no-op apart from re-persisting the flag.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the flag cannot be written
    pub fn mark_paid(&self) -> Result<()> {
        let was_paid = {
            let mut state = self.lock();
            let was_paid = state.is_paid;
            state.is_paid = true;
            state.prompt_visible = false;
            was_paid
        };
        self.store.set(keys::PAID, "true")?;
        if !was_paid {
            tracing::info!("Usage marked as paid");
        }
        Ok(())
    }

    /// Clear the counter and paid flag, both in memory and in storage
    ///
    /// # Errors
    ///
    /// Returns a storage error if either key cannot be removed
    pub fn reset(&self) -> Result<()> {
        {
            let mut state = self.lock();
            state.query_count = 0;
            state.is_paid = false;
            state.prompt_visible = false;
        }
        self.store.clear(keys::QUERY_COUNT)?;
        self.store.clear(keys::PAID)?;
        tracing::info!("Usage state reset");
        Ok(())
    }

    /// Whether the upgrade prompt should be shown
    pub fn prompt_visible(&self) -> bool {
        self.lock().prompt_visible
    }

    /// Hide the upgrade prompt without changing the gate
    pub fn dismiss_prompt(&self) {
        self.lock().prompt_visible = false;
    }

    /// Current usage state
    pub fn snapshot(&self) -> UsageSnapshot {
        let state = self.lock();
        UsageSnapshot {
            query_count: state.query_count,
            is_paid: state.is_paid,
            limit: self.limit,
        }
    }
}
