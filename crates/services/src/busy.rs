use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-flight flag shared by one service instance.
#[derive(Debug, Clone, Default)]
pub(crate) struct BusyFlag {
    busy: Arc<AtomicBool>,
}

impl BusyFlag {
    /// Claims the flag, or returns `None` while another run holds it.
    pub(crate) fn try_acquire(&self) -> Option<BusyGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the flag on drop, including on early return or cancellation.
#[derive(Debug)]
pub(crate) struct BusyGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
