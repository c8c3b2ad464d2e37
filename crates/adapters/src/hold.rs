// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outstanding-call bookkeeping shared by the fakes
#![cfg_attr(coverage_nightly, coverage(off))]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts calls that are currently suspended inside a fake.
///
/// The count drops when the suspended future is dropped, so a caller that
/// cancels its task (rather than ignoring the result) brings it back to zero.
#[derive(Clone, Default)]
pub(crate) struct HeldCalls {
    count: Arc<AtomicUsize>,
}

impl HeldCalls {
    /// Suspend forever. Only cancellation ends the call.
    pub(crate) async fn park<T>(&self) -> T {
        let _guard = self.enter();
        std::future::pending::<T>().await
    }

    /// Mark a call as outstanding until the guard is dropped.
    pub(crate) fn enter(&self) -> HeldGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        HeldGuard {
            count: Arc::clone(&self.count),
        }
    }

    pub(crate) fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

pub(crate) struct HeldGuard {
    count: Arc<AtomicUsize>,
}

impl Drop for HeldGuard {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::SeqCst);
    }
}
