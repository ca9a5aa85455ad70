// File: src/core/scheduler.rs
//! Deferred execution for a single-threaded host: a yield point for scan
//! slices, timers for debouncing, and the `Debounce` utility built on them.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

pub type Task = Box<dyn FnOnce()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

pub trait Scheduler {
    /// Runs `task` at the host's next idle opportunity.
    fn schedule_work(&self, task: Task);

    /// Runs `task` once `delay` has elapsed, unless cancelled first.
    fn schedule_after(&self, delay: Duration, task: Task) -> TimerId;

    /// Cancelling a timer that already fired is a no-op.
    fn cancel_timer(&self, id: TimerId);
}

/// A cooperative event loop with a virtual clock.
///
/// Idle work runs in FIFO order. Timers fire in deadline order when the clock
/// is moved forward with [`LocalScheduler::advance`].
#[derive(Default)]
pub struct LocalScheduler {
    now: Cell<Duration>,
    idle: RefCell<VecDeque<Task>>,
    timers: RefCell<BTreeMap<(Duration, u64), Task>>,
    next_timer: Cell<u64>,
}

impl LocalScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now.get()
    }

    pub fn pending_work(&self) -> usize {
        self.idle.borrow().len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Runs one queued task. Returns false when the queue was empty.
    pub fn run_next(&self) -> bool {
        // The borrow must end before the task runs; tasks schedule more work.
        let task = self.idle.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs queued tasks, including ones they enqueue, until none remain.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    /// Moves the clock forward, firing every timer that comes due and
    /// draining idle work after each one. Returns the number of timers fired.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let mut fired = 0;
        loop {
            let due = {
                let mut timers = self.timers.borrow_mut();
                match timers.keys().next().copied() {
                    Some(key) if key.0 <= target => timers.remove(&key).map(|task| (key.0, task)),
                    _ => None,
                }
            };
            let Some((deadline, task)) = due else { break };
            self.now.set(deadline);
            task();
            fired += 1;
            self.run_until_idle();
        }
        self.now.set(target);
        fired
    }
}

impl Scheduler for LocalScheduler {
    fn schedule_work(&self, task: Task) {
        self.idle.borrow_mut().push_back(task);
    }

    fn schedule_after(&self, delay: Duration, task: Task) -> TimerId {
        let seq = self.next_timer.get();
        self.next_timer.set(seq + 1);
        self.timers.borrow_mut().insert((self.now.get() + delay, seq), task);
        TimerId(seq)
    }

    fn cancel_timer(&self, id: TimerId) {
        self.timers.borrow_mut().retain(|(_, seq), _| *seq != id.0);
    }
}

/// Collapses bursts of triggers into one call of `action`, made once `window`
/// has passed without another trigger.
pub struct Debounce {
    scheduler: Rc<dyn Scheduler>,
    window: Duration,
    action: Rc<dyn Fn()>,
    pending: Rc<Cell<Option<TimerId>>>,
}

pub fn debounce(scheduler: Rc<dyn Scheduler>, window: Duration, action: impl Fn() + 'static) -> Debounce {
    Debounce {
        scheduler,
        window,
        action: Rc::new(action),
        pending: Rc::new(Cell::new(None)),
    }
}

impl Debounce {
    /// Restarts the quiet window.
    pub fn trigger(&self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel_timer(id);
        }
        let pending = Rc::clone(&self.pending);
        let action = Rc::clone(&self.action);
        let id = self.scheduler.schedule_after(
            self.window,
            Box::new(move || {
                pending.set(None);
                action();
            }),
        );
        self.pending.set(Some(id));
    }

    pub fn cancel(&self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel_timer(id);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }
}
