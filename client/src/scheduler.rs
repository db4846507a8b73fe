//! Delayed continuations driven by the session tick.
//!
//! Nothing here owns a runtime timer: the frame loop asks for whatever is due
//! and runs it on the same logical thread that handles network messages.

use std::time::{Duration, Instant};

/// Cancellation token for a scheduled continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Deferred {
    /// Ask for the co-located roster after a map change.
    RequestMapPlayers,
    /// Send `auth_login` if a token is configured.
    Authenticate,
    /// Hide the "using portal" banner.
    DismissBanner { portal_id: String },
}

#[derive(Debug)]
struct ScheduledTask {
    id: TimerId,
    due: Instant,
    action: Deferred,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: u64,
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration, action: Deferred) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.tasks.push(ScheduledTask {
            id,
            due: now + delay,
            action,
        });
        id
    }

    /// Returns false if the task already ran or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.tasks.iter().any(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.tasks.iter().map(|task| task.due).min()
    }

    /// Removes and returns every action due at `now`, oldest deadline first.
    /// Ties run in scheduling order.
    pub fn take_due(&mut self, now: Instant) -> Vec<Deferred> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.tasks.len() {
            if self.tasks[i].due <= now {
                due.push(self.tasks.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|task| (task.due, task.id));
        due.into_iter().map(|task| task.action).collect()
    }
}
