//! Timer-agnostic polling decisions.
//!
//! The browser binds these to `gloo-timers`, the CLI to `tokio::time`. Both
//! feed every freshly fetched list into [`PollController::observe`] and act
//! on the returned [`PollTransition`].

use std::time::Duration;

use crate::status::{any_processing, HasStatus};

/// Period of the redo-OCR style side-channel poll.
pub const BOUNDED_POLL_PERIOD: Duration = Duration::from_secs(2);
/// Wall-clock budget of the side-channel poll.
pub const BOUNDED_POLL_BUDGET: Duration = Duration::from_secs(30);

/// Which screen is polling; decides the timer period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollProfile {
    /// Upload list of a group.
    Uploads,
    /// Uploads inside one batch.
    Batch,
    /// Marking jobs of a group.
    MarkingJobs,
    /// Results of a marking job.
    Results,
}

impl PollProfile {
    /// Interval between silent refreshes.
    pub fn period(self) -> Duration {
        match self {
            Self::Uploads | Self::Batch => Duration::from_secs(3),
            Self::MarkingJobs => Duration::from_secs(2),
            Self::Results => Duration::from_secs(4),
        }
    }

    /// Same as [`PollProfile::period`], in whole milliseconds for browser
    /// timers.
    pub fn period_ms(self) -> u32 {
        u32::try_from(self.period().as_millis()).unwrap_or(u32::MAX)
    }
}

/// What the caller must do with its timer after an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTransition {
    /// Start one repeating timer.
    Arm,
    /// Stop the repeating timer.
    Disarm,
    /// Leave the timer as it is.
    Unchanged,
}

/// Tracks whether a repeating refresh timer is armed.
#[derive(Debug, Default, Clone)]
pub struct PollController {
    armed: bool,
    torn_down: bool,
}

impl PollController {
    /// Controller with no timer armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// True while the caller should hold a live timer.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Feed the latest fetched list.
    pub fn observe<'a, T, I>(&mut self, items: I) -> PollTransition
    where
        T: HasStatus + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        self.observe_flag(any_processing(items))
    }

    /// Same as [`PollController::observe`] when the caller already knows
    /// whether anything is processing.
    pub fn observe_flag(&mut self, processing: bool) -> PollTransition {
        if self.torn_down {
            return PollTransition::Unchanged;
        }
        match (processing, self.armed) {
            (true, false) => {
                self.armed = true;
                PollTransition::Arm
            },
            (false, true) => {
                self.armed = false;
                PollTransition::Disarm
            },
            _ => PollTransition::Unchanged,
        }
    }

    /// The owner is going away. Disarms unconditionally; later observations
    /// are ignored.
    pub fn teardown(&mut self) -> PollTransition {
        self.torn_down = true;
        if std::mem::take(&mut self.armed) {
            PollTransition::Disarm
        } else {
            PollTransition::Unchanged
        }
    }
}

/// Side-channel poll with a fixed tick budget, independent of status.
#[derive(Debug, Clone)]
pub struct BoundedPoll {
    period: Duration,
    remaining: u32,
}

impl Default for BoundedPoll {
    fn default() -> Self {
        Self::new(BOUNDED_POLL_BUDGET, BOUNDED_POLL_PERIOD)
    }
}

impl BoundedPoll {
    /// Poll every `period` until `budget` has elapsed.
    pub fn new(budget: Duration, period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let ticks = budget.as_millis() / period.as_millis();
        Self {
            period,
            remaining: u32::try_from(ticks).unwrap_or(u32::MAX),
        }
    }

    /// Interval between ticks.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Same as [`BoundedPoll::period`], in milliseconds.
    pub fn period_ms(&self) -> u32 {
        u32::try_from(self.period.as_millis()).unwrap_or(u32::MAX)
    }

    /// Consume one tick. Returns false once the budget is spent; the caller
    /// then drops its timer.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    /// Ticks left in the budget.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// True once no ticks are left.
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Monotonic request counter. A response is applied only if its ticket is
/// still the latest one issued.
///
/// A blocking load (initial or user-driven) holds the sequence until it
/// settles: silent refreshes are refused meanwhile, so a poll tick cannot
/// supersede the load whose result or error the user is waiting for.
#[derive(Debug, Default, Clone)]
pub struct RequestSequence {
    latest: u64,
    blocking: Option<u64>,
}

impl RequestSequence {
    /// Fresh counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticket for a request about to be sent.
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    /// Ticket for a blocking load; supersedes anything in flight.
    pub fn issue_blocking(&mut self) -> u64 {
        let ticket = self.issue();
        self.blocking = Some(ticket);
        ticket
    }

    /// Ticket for a silent refresh, or `None` while a blocking load is
    /// pending.
    pub fn issue_silent(&mut self) -> Option<u64> {
        if self.blocking.is_some() {
            return None;
        }
        Some(self.issue())
    }

    /// Record that the response for `ticket` arrived. Returns whether it
    /// should be applied.
    pub fn settle(&mut self, ticket: u64) -> bool {
        if self.blocking == Some(ticket) {
            self.blocking = None;
        }
        self.is_latest(ticket)
    }

    /// True when no newer request has been issued since `ticket`.
    pub fn is_latest(&self, ticket: u64) -> bool {
        ticket == self.latest
    }

    /// Invalidate every outstanding ticket.
    pub fn invalidate(&mut self) {
        self.latest += 1;
        self.blocking = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::ResourceStatus;

    struct Item(ResourceStatus);

    impl HasStatus for Item {
        fn status(&self) -> &ResourceStatus {
            &self.0
        }
    }

    fn items(raw: &[&str]) -> Vec<Item> {
        raw.iter()
            .map(|s| Item(ResourceStatus::parse(Some(s))))
            .collect()
    }

    #[test]
    fn nothing_processing_never_arms() {
        let mut controller = PollController::new();
        for _ in 0..3 {
            assert_eq!(
                controller.observe(&items(&["completed", "failed", "reviewing"])),
                PollTransition::Unchanged
            );
        }
        assert!(!controller.is_armed());
        assert_eq!(controller.observe(&Vec::<Item>::new()), PollTransition::Unchanged);
    }

    #[test]
    fn arms_once_and_disarms_when_work_finishes() {
        let mut controller = PollController::new();
        assert_eq!(controller.observe(&items(&["completed", "processing"])), PollTransition::Arm);
        assert_eq!(controller.observe(&items(&["queued", "processing"])), PollTransition::Unchanged);
        assert_eq!(controller.observe(&items(&["pending"])), PollTransition::Unchanged);
        assert!(controller.is_armed());
        assert_eq!(controller.observe(&items(&["completed", "failed"])), PollTransition::Disarm);
        assert!(!controller.is_armed());
    }

    #[test]
    fn teardown_disarms_and_ignores_late_responses() {
        let mut controller = PollController::new();
        assert_eq!(controller.observe(&items(&["uploading"])), PollTransition::Arm);
        assert_eq!(controller.teardown(), PollTransition::Disarm);
        assert_eq!(controller.observe(&items(&["processing"])), PollTransition::Unchanged);
        assert!(!controller.is_armed());
        assert_eq!(controller.teardown(), PollTransition::Unchanged);
    }

    #[test]
    fn bounded_poll_spends_exactly_its_budget() {
        let mut poll = BoundedPoll::default();
        assert_eq!(poll.period_ms(), 2000);
        let mut ticks = 0;
        while poll.tick() {
            ticks += 1;
        }
        assert_eq!(ticks, 15);
        assert!(poll.is_exhausted());
        assert!(!poll.tick());
    }

    #[test]
    fn only_latest_ticket_wins() {
        let mut seq = RequestSequence::new();
        let first = seq.issue();
        let second = seq.issue();
        assert!(!seq.is_latest(first));
        assert!(seq.is_latest(second));
        seq.invalidate();
        assert!(!seq.is_latest(second));
    }

    #[test]
    fn silent_refresh_waits_for_pending_blocking_load() {
        let mut seq = RequestSequence::new();
        let page_change = seq.issue_blocking();
        assert_eq!(seq.issue_silent(), None);
        assert!(seq.settle(page_change));

        let tick = seq.issue_silent().expect("polling resumes once the load settled");
        assert!(seq.settle(tick));
    }

    #[test]
    fn newer_blocking_load_keeps_silent_refresh_held() {
        let mut seq = RequestSequence::new();
        let first = seq.issue_blocking();
        let second = seq.issue_blocking();
        assert!(!seq.settle(first));
        assert_eq!(seq.issue_silent(), None);
        assert!(seq.settle(second));
        assert!(seq.issue_silent().is_some());
    }

    #[test]
    fn blocking_load_supersedes_silent_refresh_in_flight() {
        let mut seq = RequestSequence::new();
        let tick = seq.issue_silent().expect("idle sequence allows polling");
        let load = seq.issue_blocking();
        assert!(!seq.settle(tick));
        assert!(seq.settle(load));
    }

    #[test]
    fn profile_periods() {
        assert_eq!(PollProfile::Uploads.period_ms(), 3000);
        assert_eq!(PollProfile::MarkingJobs.period_ms(), 2000);
        assert_eq!(PollProfile::Results.period_ms(), 4000);
    }
}
