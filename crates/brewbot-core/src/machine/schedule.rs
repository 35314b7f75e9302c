// ── Timed transitions as data ──
//
// The machine never sleeps. Each timed phase pushes the transition that
// ends it onto this queue, and whoever owns the machine calls `advance`
// once the earliest deadline has passed.

use brewbot_api::MachineStatus;
use tokio::time::Instant;

/// A transition that fires on its own once `due` is reached, provided the
/// machine is still in `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTransition {
    pub due: Instant,
    pub from: MachineStatus,
    pub to: MachineStatus,
}

/// Pending transitions ordered by deadline.
#[derive(Debug, Default)]
pub(crate) struct Schedule {
    queue: Vec<ScheduledTransition>,
}

impl Schedule {
    pub(crate) fn push(&mut self, transition: ScheduledTransition) {
        let idx = self.queue.partition_point(|t| t.due <= transition.due);
        self.queue.insert(idx, transition);
    }

    /// Remove and return the earliest transition if it is due at `now`.
    pub(crate) fn pop_due(&mut self, now: Instant) -> Option<ScheduledTransition> {
        if self.queue.first().is_some_and(|t| t.due <= now) {
            Some(self.queue.remove(0))
        } else {
            None
        }
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.queue.first().map(|t| t.due)
    }

    pub(crate) fn clear(&mut self) {
        self.queue.clear();
    }

    pub(crate) fn as_slice(&self) -> &[ScheduledTransition] {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;

    fn at(base: Instant, secs: u64, from: MachineStatus, to: MachineStatus) -> ScheduledTransition {
        ScheduledTransition {
            due: base + Duration::from_secs(secs),
            from,
            to,
        }
    }

    #[test]
    fn pops_in_deadline_order() {
        let t0 = Instant::now();
        let mut schedule = Schedule::default();
        schedule.push(at(t0, 8, MachineStatus::Heat, MachineStatus::Dispense));
        schedule.push(at(t0, 3, MachineStatus::Pump, MachineStatus::Heat));

        assert_eq!(schedule.next_deadline(), Some(t0 + Duration::from_secs(3)));
        assert_eq!(schedule.pop_due(t0 + Duration::from_secs(2)), None);

        let first = schedule.pop_due(t0 + Duration::from_secs(10));
        assert_eq!(first.map(|t| t.to), Some(MachineStatus::Heat));
        let second = schedule.pop_due(t0 + Duration::from_secs(10));
        assert_eq!(second.map(|t| t.to), Some(MachineStatus::Dispense));
        assert!(schedule.as_slice().is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let t0 = Instant::now();
        let mut schedule = Schedule::default();
        schedule.push(at(t0, 5, MachineStatus::Grind, MachineStatus::UserPrompt));
        schedule.clear();
        assert_eq!(schedule.next_deadline(), None);
    }
}
