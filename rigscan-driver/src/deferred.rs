use std::time::{Duration, Instant};

/// Action the orchestrator runs on a later tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DeferredAction {
    SendStep,
    StartMeasure,
}

/// Holds at most one scheduled action. Scheduling replaces the previous
/// one, so a stale action can never fire after a state change.
#[derive(Debug, Default)]
pub(crate) struct PendingSlot {
    slot: Option<(Instant, DeferredAction)>,
}

impl PendingSlot {
    pub(crate) fn schedule(&mut self, now: Instant, delay: Duration, action: DeferredAction) {
        if let Some((_, replaced)) = self.slot.replace((now + delay, action)) {
            log::debug!("Replaced pending {:?} with {:?}", replaced, action);
        }
    }

    pub(crate) fn cancel(&mut self) -> Option<DeferredAction> {
        self.slot.take().map(|(_, action)| action)
    }

    /// Takes the action if it is due at `now`.
    pub(crate) fn take_due(&mut self, now: Instant) -> Option<DeferredAction> {
        match self.slot {
            Some((due, action)) if due <= now => {
                self.slot = None;
                Some(action)
            }
            _ => None,
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.slot.is_some()
    }

    pub(crate) fn action(&self) -> Option<DeferredAction> {
        self.slot.map(|(_, action)| action)
    }
}
