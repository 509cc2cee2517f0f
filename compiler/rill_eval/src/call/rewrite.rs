//! The installed-strategy slot of a call site.
//!
//! A rewrite replaces the whole strategy; readers clone the `Arc` out of the
//! lock and never observe a partially built strategy. Installation is
//! compare-and-install: a rewrite derived from a strategy that another
//! thread already replaced is dropped, and the caller continues with the
//! strategy that won.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::strategy::{CallStrategy, MissReason};

pub(super) struct StrategySlot {
    current: RwLock<Arc<CallStrategy>>,
    rewrites: AtomicUsize,
}

impl StrategySlot {
    pub(super) fn new(initial: CallStrategy) -> Self {
        StrategySlot {
            current: RwLock::new(Arc::new(initial)),
            rewrites: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub(super) fn load(&self) -> Arc<CallStrategy> {
        Arc::clone(&self.current.read())
    }

    /// Number of rewrites installed so far.
    pub(super) fn rewrites(&self) -> usize {
        self.rewrites.load(Ordering::Acquire)
    }

    /// Install `next` in place of `observed`, if `observed` is still
    /// installed. Returns whichever strategy is installed afterwards.
    pub(super) fn replace(
        &self,
        observed: &Arc<CallStrategy>,
        next: CallStrategy,
        reason: MissReason,
    ) -> Arc<CallStrategy> {
        let from = observed.tier();
        let to = next.tier();
        debug_assert!(
            from.may_transition_to(to),
            "illegal call strategy transition {from} -> {to}"
        );
        let next = Arc::new(next);

        let mut current = self.current.write();
        if !Arc::ptr_eq(&current, observed) {
            let winner = Arc::clone(&current);
            drop(current);
            tracing::trace!(
                from = %from,
                lost_to = %winner.tier(),
                "call strategy rewrite lost race"
            );
            return winner;
        }
        *current = Arc::clone(&next);
        self.rewrites.fetch_add(1, Ordering::AcqRel);
        drop(current);

        tracing::debug!(from = %from, to = %to, reason = %reason, "call strategy rewritten");
        next
    }
}

impl std::fmt::Debug for StrategySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategySlot")
            .field("tier", &self.load().tier())
            .field("rewrites", &self.rewrites())
            .finish()
    }
}
