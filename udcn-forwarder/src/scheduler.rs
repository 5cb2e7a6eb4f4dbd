//! A pull-based timer queue. The reactor loop calls `poll_due` once per
//! tick; a cancelled token simply never appears in that call's results, so
//! cancellation needs no synchronization with an in-flight callback — there
//! isn't one, since nothing fires until the loop asks for it.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

use crate::name_tree::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// `Finalize` carries the `isSatisfied`/`freshnessPeriod` arguments
/// `onInterestFinalize` needs, since the only thing the scheduler itself
/// remembers between `schedule` and firing is this event value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledEvent {
    Unsatisfy(NodeId),
    Finalize(NodeId, bool, Option<Duration>),
}

#[derive(Default)]
pub struct Scheduler {
    next_id: u64,
    heap: BinaryHeap<Reverse<(Instant, u64)>>,
    live: HashMap<u64, ScheduledEvent>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Instant, after: Duration, event: ScheduledEvent) -> TimerToken {
        let id = self.next_id;
        self.next_id += 1;
        self.heap.push(Reverse((now + after, id)));
        self.live.insert(id, event);
        TimerToken(id)
    }

    /// Idempotent: cancelling an already-fired or already-cancelled token
    /// is a no-op.
    pub fn cancel(&mut self, token: TimerToken) {
        self.live.remove(&token.0);
    }

    /// Pops every event due at or before `now`, in scheduled order.
    pub fn poll_due(&mut self, now: Instant) -> Vec<ScheduledEvent> {
        let mut due = Vec::new();
        while let Some(&Reverse((when, id))) = self.heap.peek() {
            if when > now {
                break;
            }
            self.heap.pop();
            if let Some(event) = self.live.remove(&id) {
                due.push(event);
            }
        }
        due
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse((when, _))| *when)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_events_fire_in_scheduled_order() {
        let mut scheduler = Scheduler::new();
        let now = Instant::now();
        scheduler.schedule(now, Duration::from_millis(10), ScheduledEvent::Unsatisfy(NodeId::from_test(1)));
        scheduler.schedule(now, Duration::from_millis(5), ScheduledEvent::Finalize(NodeId::from_test(2), true, None));
        let due = scheduler.poll_due(now + Duration::from_millis(20));
        assert_eq!(
            due,
            vec![
                ScheduledEvent::Finalize(NodeId::from_test(2), true, None),
                ScheduledEvent::Unsatisfy(NodeId::from_test(1)),
            ]
        );
    }

    #[test]
    fn cancel_before_due_prevents_dispatch() {
        let mut scheduler = Scheduler::new();
        let now = Instant::now();
        let token = scheduler.schedule(now, Duration::from_millis(5), ScheduledEvent::Unsatisfy(NodeId::from_test(1)));
        scheduler.cancel(token);
        scheduler.cancel(token);
        assert!(scheduler.poll_due(now + Duration::from_millis(10)).is_empty());
    }

    #[test]
    fn nothing_fires_before_its_deadline() {
        let mut scheduler = Scheduler::new();
        let now = Instant::now();
        scheduler.schedule(now, Duration::from_millis(100), ScheduledEvent::Unsatisfy(NodeId::from_test(1)));
        assert!(scheduler.poll_due(now + Duration::from_millis(10)).is_empty());
    }
}
