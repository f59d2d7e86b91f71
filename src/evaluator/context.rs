use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why a [`Context`] says work should stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Cancelled,
    DeadlineExceeded,
}

/// Caller-supplied cancellation and deadline signal.
///
/// Evaluators consult it once before starting a request; nothing aborts a
/// request that is already on the wire.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

/// Trips the cancellation flag of every [`Context`] cloned from its pair.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_cancel(self) -> (Self, CancelHandle) {
        let flag = self
            .cancelled
            .clone()
            .unwrap_or_else(|| Arc::new(AtomicBool::new(false)));
        let handle = CancelHandle { flag: flag.clone() };
        (
            Self {
                cancelled: Some(flag),
                deadline: self.deadline,
            },
            handle,
        )
    }

    /// Keeps the earlier of the existing deadline and `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn check(&self) -> Result<(), Interrupt> {
        if let Some(flag) = &self.cancelled {
            if flag.load(Ordering::SeqCst) {
                return Err(Interrupt::Cancelled);
            }
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Interrupt::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_never_interrupts() {
        assert_eq!(Context::background().check(), Ok(()));
    }

    #[test]
    fn cancel_reaches_clones() {
        let (ctx, handle) = Context::background().with_cancel();
        let clone = ctx.clone();
        assert_eq!(clone.check(), Ok(()));
        handle.cancel();
        assert_eq!(ctx.check(), Err(Interrupt::Cancelled));
        assert_eq!(clone.check(), Err(Interrupt::Cancelled));
    }

    #[test]
    fn elapsed_deadline_is_exceeded() {
        let ctx = Context::background().with_timeout(Duration::ZERO);
        assert_eq!(ctx.check(), Err(Interrupt::DeadlineExceeded));
    }

    #[test]
    fn earlier_deadline_is_kept() {
        let soon = Instant::now() + Duration::from_secs(1);
        let later = soon + Duration::from_secs(60);
        let ctx = Context::background().with_deadline(soon).with_deadline(later);
        assert_eq!(ctx.deadline(), Some(soon));
    }
}
