//! Deferred actions driven by the simulation clock.

use std::time::Duration;

/// Action performed when a timer fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TimerAction {
    StartNextWave,
}

/// Handle used to cancel a pending timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct TimerId(u32);

#[derive(Clone, Copy, Debug)]
struct Pending {
    id: TimerId,
    remaining: Duration,
    action: TimerAction,
}

/// Cancellable one-shot timers that only advance when the simulation ticks.
///
/// Pausing the simulation therefore pauses every pending timer.
#[derive(Debug, Default)]
pub(crate) struct DeferredTimers {
    pending: Vec<Pending>,
    next_id: u32,
}

impl DeferredTimers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers `action` to fire once `delay` of simulation time has passed.
    pub(crate) fn schedule(&mut self, delay: Duration, action: TimerAction) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.pending.push(Pending {
            id,
            remaining: delay,
            action,
        });
        id
    }

    /// Drops a pending timer. Returns `false` when it already fired or was cancelled.
    pub(crate) fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.id != id);
        self.pending.len() != before
    }

    pub(crate) fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Advances every timer by `dt` and appends the actions that fired, in scheduling order.
    pub(crate) fn advance(&mut self, dt: Duration, out: &mut Vec<TimerAction>) {
        for timer in &mut self.pending {
            timer.remaining = timer.remaining.saturating_sub(dt);
        }
        out.extend(
            self.pending
                .iter()
                .filter(|timer| timer.remaining.is_zero())
                .map(|timer| timer.action),
        );
        self.pending.retain(|timer| !timer.remaining.is_zero());
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_the_delay_has_elapsed() {
        let mut timers = DeferredTimers::new();
        let _ = timers.schedule(Duration::from_millis(100), TimerAction::StartNextWave);

        let mut fired = Vec::new();
        timers.advance(Duration::from_millis(60), &mut fired);
        assert!(fired.is_empty());
        assert_eq!(timers.len(), 1);

        timers.advance(Duration::from_millis(40), &mut fired);
        assert_eq!(fired, vec![TimerAction::StartNextWave]);
        assert_eq!(timers.len(), 0);

        timers.advance(Duration::from_millis(500), &mut fired);
        assert_eq!(fired.len(), 1);
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut timers = DeferredTimers::new();
        let first = timers.schedule(Duration::from_millis(10), TimerAction::StartNextWave);
        let second = timers.schedule(Duration::from_millis(20), TimerAction::StartNextWave);
        assert_ne!(first, second);

        assert!(timers.cancel(first));
        assert!(!timers.cancel(first));

        let mut fired = Vec::new();
        timers.advance(Duration::from_millis(15), &mut fired);
        assert!(fired.is_empty());

        timers.cancel_all();
        timers.advance(Duration::from_millis(15), &mut fired);
        assert!(fired.is_empty());
    }
}
