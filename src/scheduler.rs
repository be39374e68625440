use std::time::{Duration, Instant};

/// How long a burst of resizes must go quiet before the calendar is redrawn
pub(crate) const RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);

/// Redraws after the page reports it has loaded, since the layout may still
/// be settling
pub(crate) const LOAD_RETRIES: [Duration; 3] = [
    Duration::from_millis(60),
    Duration::from_millis(250),
    Duration::from_millis(800),
];

/// Redraws after the page builder reports its own layout pass is done
pub(crate) const FRAMEWORK_RETRIES: [Duration; 3] = [
    Duration::from_millis(80),
    Duration::from_millis(250),
    Duration::from_millis(800),
];

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum Trigger {
    /// The page and the content are available
    Ready,
    Resize,
    Load,
    FrameworkReady,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum SchedulerState {
    Idle,
    Scheduled,
}

/// Decides when the calendar pipeline should run.
///
/// The scheduler never sleeps or spawns anything: the caller reports
/// triggers, waits until [`Scheduler::next_deadline()`] by whatever means it
/// has, and then asks [`Scheduler::take_due()`] whether to run.  At most one
/// resize timer is pending at a time; each resize replaces it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Scheduler {
    resize: Option<Instant>,
    // Kept sorted
    retries: Vec<Instant>,
}

impl Scheduler {
    pub(crate) fn new() -> Scheduler {
        Scheduler::default()
    }

    pub(crate) fn state(&self) -> SchedulerState {
        if self.resize.is_none() && self.retries.is_empty() {
            SchedulerState::Idle
        } else {
            SchedulerState::Scheduled
        }
    }

    pub(crate) fn trigger(&mut self, trigger: Trigger, now: Instant) {
        match trigger {
            Trigger::Ready => self.schedule(now),
            Trigger::Resize => self.resize = Some(now + RESIZE_DEBOUNCE),
            Trigger::Load => {
                for delay in LOAD_RETRIES {
                    self.schedule(now + delay);
                }
            }
            Trigger::FrameworkReady => {
                for delay in FRAMEWORK_RETRIES {
                    self.schedule(now + delay);
                }
            }
        }
    }

    fn schedule(&mut self, when: Instant) {
        let i = self.retries.partition_point(|&t| t <= when);
        self.retries.insert(i, when);
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        match (self.resize, self.retries.first().copied()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Time left until the next deadline, or `None` if idle
    pub(crate) fn timeout(&self, now: Instant) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Clears every deadline at or before `now` and returns whether any were
    /// cleared.  Several deadlines falling due together call for only one
    /// run, as each run redraws everything.
    pub(crate) fn take_due(&mut self, now: Instant) -> bool {
        let mut due = false;
        if self.resize.is_some_and(|t| t <= now) {
            self.resize = None;
            due = true;
        }
        let n = self.retries.partition_point(|&t| t <= now);
        if n > 0 {
            self.retries.drain(..n);
            due = true;
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_ready_runs_immediately() {
        let t0 = Instant::now();
        let mut sched = Scheduler::new();
        assert_eq!(sched.state(), SchedulerState::Idle);
        sched.trigger(Trigger::Ready, t0);
        assert_eq!(sched.state(), SchedulerState::Scheduled);
        assert_eq!(sched.timeout(t0), Some(Duration::ZERO));
        assert!(sched.take_due(t0));
        assert_eq!(sched.state(), SchedulerState::Idle);
        assert!(!sched.take_due(t0 + ms(1000)));
    }

    #[test]
    fn test_resize_debounce_restarts() {
        let t0 = Instant::now();
        let mut sched = Scheduler::new();
        sched.trigger(Trigger::Resize, t0);
        sched.trigger(Trigger::Resize, t0 + ms(100));
        assert!(!sched.take_due(t0 + ms(150)));
        sched.trigger(Trigger::Resize, t0 + ms(200));
        assert_eq!(sched.next_deadline(), Some(t0 + ms(350)));
        assert!(!sched.take_due(t0 + ms(349)));
        assert!(sched.take_due(t0 + ms(350)));
        assert_eq!(sched.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_load_retries() {
        let t0 = Instant::now();
        let mut sched = Scheduler::new();
        sched.trigger(Trigger::Load, t0);
        let mut runs = Vec::new();
        let mut now = t0;
        while let Some(deadline) = sched.next_deadline() {
            now = deadline;
            if sched.take_due(now) {
                runs.push(now - t0);
            }
        }
        assert_eq!(runs, vec![ms(60), ms(250), ms(800)]);
        assert_eq!(now, t0 + ms(800));
    }

    #[test]
    fn test_due_deadlines_coalesce() {
        let t0 = Instant::now();
        let mut sched = Scheduler::new();
        sched.trigger(Trigger::Load, t0);
        sched.trigger(Trigger::FrameworkReady, t0);
        sched.trigger(Trigger::Resize, t0 + ms(100));
        assert_eq!(sched.next_deadline(), Some(t0 + ms(60)));
        // Load's 60ms and 250ms, framework's 80ms and 250ms, and the resize
        assert!(sched.take_due(t0 + ms(260)));
        assert_eq!(sched.next_deadline(), Some(t0 + ms(800)));
        assert!(sched.take_due(t0 + ms(800)));
        assert_eq!(sched.state(), SchedulerState::Idle);
    }
}
